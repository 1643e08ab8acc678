pub mod hotp;
pub mod totp;
pub mod uri;

pub(crate) mod otp;

use std::{fmt::Display, num, str::FromStr};

pub(crate) const DEFAULT_DIGITS: i32 = 6;
pub(crate) const MAX_DIGITS: i32 = 8;
pub(crate) const DEFAULT_PERIOD: i64 = 30;
pub(crate) const DEFAULT_ALGORITHM: Algorithm = Algorithm::Sha1;

#[derive(Debug, thiserror::Error)]
pub enum OtpError {
    #[error("Unsupported hashing algorithm")]
    UnsupportedAlgorithm,
    #[error("Could not key the HMAC with the provided secret")]
    InvalidHmacKey,
    #[error("Invalid digest")]
    InvalidDigest(Vec<u8>),
    #[error("Invalid hashing algorithm, found {0}. Expected one of: SHA1, SHA256 or SHA512")]
    InvalidHashingAlgorithm(String),
    #[error("The provided URI is not of a valid type, found {0}. Expected: {1}")]
    InvalidUriType(String, String),
    #[error("Could not parse the URI")]
    UriParse(url::ParseError),
    #[error("Could not decode the URI label")]
    UriLabelDecode(std::string::FromUtf8Error),
    #[error("Could not retrieve the secret from the URI")]
    UriMissingSecret,
    #[error("Could not retrieve the counter from the URI")]
    UriMissingHotpCounter,
    #[error("Could not decode the secret")]
    SecretDecode(data_encoding::DecodeError),
    #[error("Could not parse an integer. Failed parsing: {1}")]
    IntegerParse(num::ParseIntError, String),
}

/// The hashing algorithm driving the HMAC.
///
/// [`Algorithm::Default`] marks the absence of an explicit choice; every
/// consumer resolves it to SHA1 at read time.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub enum Algorithm {
    #[default]
    Default,
    Sha1,
    Sha256,
    Sha512,
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sha256 => write!(f, "SHA256"),
            Self::Sha512 => write!(f, "SHA512"),
            _ => write!(f, "SHA1"),
        }
    }
}

impl FromStr for Algorithm {
    type Err = OtpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_uppercase();

        match normalized.as_str() {
            "SHA1" => Ok(Self::Sha1),
            "SHA256" => Ok(Self::Sha256),
            "SHA512" => Ok(Self::Sha512),
            _ => Err(OtpError::InvalidHashingAlgorithm(s.to_string())),
        }
    }
}

/// Configuration collected before a generator is built.
///
/// Values are stored exactly as given, including out-of-range ones; the
/// generators resolve them against the defaults on every read. Setters
/// consume and return the options, so they chain, and the last write wins.
#[derive(Debug, Default, Clone, Copy)]
pub struct OtpOptions {
    pub(crate) digits: i32,
    pub(crate) algorithm: Algorithm,
    pub(crate) period: i64,
}

impl OtpOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of digits to generate
    pub fn with_digits(mut self, digits: i32) -> Self {
        self.digits = digits;

        self
    }

    /// Sets the hashing algorithm (time-based generator only)
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;

        self
    }

    /// Sets the period in seconds (time-based generator only)
    pub fn with_period(mut self, period: i64) -> Self {
        self.period = period;

        self
    }
}
