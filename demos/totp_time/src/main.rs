use std::time::SystemTime;

use data_encoding::BASE32_NOPAD;
use otpkit::totp::Totp;

pub fn main() -> anyhow::Result<()> {
    // Initialize the TOTP with the defaults (SHA1 hash, 6 digits and 30 seconds period)
    let totp = Totp::default();

    let secret = BASE32_NOPAD.decode(b"HXDMVJECJJWSRB3HWIZR4IFUGFTMXBOZ")?;

    // Generate the code for the current system time
    let now = SystemTime::now();
    let code = totp.generate(&secret)?;

    // Print the code
    println!(
        "Code: {}, Remaining time: {}",
        code,
        totp.remaining_seconds(now)
    );

    Ok(())
}
