use crate::{
    otp,
    uri::{self, OtpUriInput},
    Algorithm, OtpError, OtpOptions, DEFAULT_DIGITS, MAX_DIGITS,
};

/// Counter-based one-time password generator as specified by
/// [RFC 4226](https://datatracker.ietf.org/doc/html/rfc4226).
///
/// The hashing algorithm is pinned to HMAC-SHA1 by the standard; only the
/// digit count is configurable. The generator is stateless: the counter and
/// the secret are supplied on every call and never retained.
#[derive(Debug, Clone, PartialEq)]
pub struct Hotp {
    digits: i32,
}

impl Default for Hotp {
    fn default() -> Self {
        Self::new(OtpOptions::default())
    }
}

impl Hotp {
    /// Creates a generator from the given options. Only
    /// [`with_digits`](OtpOptions::with_digits) applies here; the algorithm
    /// and period options are meaningless for the counter-based variant.
    pub fn new(options: OtpOptions) -> Self {
        Self {
            digits: options.digits,
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

    /// Generates the code for the provided counter and secret,
    /// truncated to [`digits`](Self::digits) characters.
    pub fn generate(&self, counter: u64, secret: &[u8]) -> Result<String, OtpError> {
        otp::generate_otp(Algorithm::Sha1, secret, counter, self.digits() as u32)
    }

    /// Builds the `otpauth://hotp/` provisioning URI for this generator.
    ///
    /// The counter parameter is always emitted; it has no implicit default.
    pub fn to_uri(
        &self,
        account_name: &str,
        issuer: Option<&str>,
        secret: &[u8],
        counter: u64,
    ) -> Result<String, OtpError> {
        uri::otp_to_uri(OtpUriInput::Hotp(self, counter), account_name, issuer, secret)
    }
}
