use data_encoding::BASE32_NOPAD;
use otpkit::{hotp::Hotp, OtpOptions};

pub fn main() -> anyhow::Result<()> {
    // An 8-digit counter-based generator
    let hotp = Hotp::new(OtpOptions::new().with_digits(8));

    let secret = BASE32_NOPAD.decode(b"HXDMVJECJJWSRB3HWIZR4IFUGFTMXBOZ")?;

    // Print the codes for the first few counter values
    for counter in 0..5 {
        println!("Counter {}: {}", counter, hotp.generate(counter, &secret)?);
    }

    // Print the provisioning URI an authenticator app would scan
    let uri = hotp.to_uri("user@example.com", Some("ExampleIssuer"), &secret, 5)?;
    println!("Provisioning URI: {uri}");

    Ok(())
}
