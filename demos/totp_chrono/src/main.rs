use std::time::{Duration, SystemTime};

use chrono::offset;
use data_encoding::BASE32_NOPAD;
use otpkit::totp::Totp;

pub fn main() -> anyhow::Result<()> {
    // Initialize the TOTP with the defaults (SHA1 hash, 6 digits and 30 seconds period)
    let totp = Totp::default();

    let secret = BASE32_NOPAD.decode(b"HXDMVJECJJWSRB3HWIZR4IFUGFTMXBOZ")?;

    // Get seconds since Unix Epoch through chrono
    let now = offset::Local::now().timestamp();
    let time = SystemTime::UNIX_EPOCH + Duration::from_secs(now as u64);

    // Generate the code for that instant
    let code = totp.generate_with_time(time, &secret)?;

    // Print the code
    println!(
        "Code: {}, Remaining time: {}",
        code,
        totp.remaining_seconds(time)
    );

    Ok(())
}
