use std::time::SystemTime;

use crate::{
    otp,
    uri::{self, OtpUriInput},
    Algorithm, OtpError, OtpOptions, DEFAULT_ALGORITHM, DEFAULT_DIGITS, DEFAULT_PERIOD, MAX_DIGITS,
};

/// Time-based one-time password generator as specified by
/// [RFC 6238](https://datatracker.ietf.org/doc/html/rfc6238).
///
/// The counter of the underlying HMAC construction is derived from wall-clock
/// time divided into fixed-length periods. The generator is stateless; the
/// secret is supplied on every call and never retained.
#[derive(Debug, Clone, PartialEq)]
pub struct Totp {
    digits: i32,
    algorithm: Algorithm,
    period: i64,
}

impl Default for Totp {
    fn default() -> Self {
        Self::new(OtpOptions::default())
    }
}

impl Totp {
    /// Creates a generator from the given options.
    ///
    /// Configured values are kept verbatim, out-of-range ones included, and
    /// resolved against the defaults (SHA1 hash, 6 digits, 30 seconds) each
    /// time they are read.
    pub fn new(options: OtpOptions) -> Self {
        Self {
            digits: options.digits,
            algorithm: options.algorithm,
            period: options.period,
        }
    }

    /// The hashing algorithm. The unset sentinel resolves to SHA1.
    pub fn algorithm(&self) -> Algorithm {
        match self.algorithm {
            Algorithm::Default => DEFAULT_ALGORITHM,
            algorithm => algorithm,
        }
    }

    /// The number of digits in the generated codes. A configured value
    /// outside 1..=8 resolves to 6.
    pub fn digits(&self) -> i32 {
        if self.digits <= 0 || self.digits > MAX_DIGITS {
            return DEFAULT_DIGITS;
        }

        self.digits
    }

    /// The period in seconds a code stays valid. A configured value of zero
    /// or less resolves to 30; there is no upper bound.
    pub fn period(&self) -> i64 {
        if self.period <= 0 {
            return DEFAULT_PERIOD;
        }

        self.period
    }

    /// Generates the code for the current system time.
    pub fn generate(&self, secret: &[u8]) -> Result<String, OtpError> {
        self.generate_with_time(SystemTime::now(), secret)
    }

    /// Generates the code for the given time.
    ///
    /// The counter is the number of whole periods elapsed since the Unix
    /// epoch; times before the epoch count as the epoch itself.
    pub fn generate_with_time(&self, time: SystemTime, secret: &[u8]) -> Result<String, OtpError> {
        otp::generate_otp(
            self.algorithm(),
            secret,
            self.counter_at(time),
            self.digits() as u32,
        )
    }

    /// Seconds until the code for the given time expires.
    pub fn remaining_seconds(&self, time: SystemTime) -> i64 {
        let period = self.period();

        period - (unix_seconds(time) % period as u64) as i64
    }

    /// Checks a submitted code against the current system time, accepting
    /// one period of drift either way as RFC 6238 recommends.
    pub fn validate(&self, code: &str, secret: &[u8]) -> Result<bool, OtpError> {
        self.validate_with_time(code, SystemTime::now(), secret)
    }

    /// Checks a submitted code against the given time, accepting one period
    /// of drift either way.
    pub fn validate_with_time(
        &self,
        code: &str,
        time: SystemTime,
        secret: &[u8],
    ) -> Result<bool, OtpError> {
        self.validate_window(code, time, 1, 1, secret)
    }

    /// Checks a submitted code against every period from `past_steps` before
    /// the given time through `future_steps` after it.
    ///
    /// Codes of the wrong length are rejected without any comparison;
    /// matching codes are compared in constant time.
    pub fn validate_window(
        &self,
        code: &str,
        time: SystemTime,
        past_steps: u64,
        future_steps: u64,
        secret: &[u8],
    ) -> Result<bool, OtpError> {
        if code.len() != self.digits() as usize {
            return Ok(false);
        }

        let counter = self.counter_at(time);
        let first = counter.saturating_sub(past_steps);
        let last = counter.saturating_add(future_steps);

        for step in first..=last {
            let expected =
                otp::generate_otp(self.algorithm(), secret, step, self.digits() as u32)?;

            if constant_time_eq(code.as_bytes(), expected.as_bytes()) {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Builds the `otpauth://totp/` provisioning URI for this generator.
    ///
    /// The period parameter is emitted only when it differs from the default
    /// of 30 seconds; a counter parameter is never emitted for this type.
    pub fn to_uri(
        &self,
        account_name: &str,
        issuer: Option<&str>,
        secret: &[u8],
    ) -> Result<String, OtpError> {
        uri::otp_to_uri(OtpUriInput::Totp(self), account_name, issuer, secret)
    }

    fn counter_at(&self, time: SystemTime) -> u64 {
        unix_seconds(time) / self.period() as u64
    }
}

fn unix_seconds(time: SystemTime) -> u64 {
    time.duration_since(SystemTime::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }

    diff == 0
}
