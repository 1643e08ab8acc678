use std::{borrow::Cow, str::FromStr};

use data_encoding::BASE32_NOPAD;

use crate::{
    hotp::Hotp, totp::Totp, Algorithm, OtpError, OtpOptions, DEFAULT_ALGORITHM, DEFAULT_DIGITS,
    DEFAULT_PERIOD,
};

const TOTP_TYPE: &str = "totp";
const HOTP_TYPE: &str = "hotp";

const URI_SECRET_QUERY: &str = "secret";
const URI_ISSUER_QUERY: &str = "issuer";
const URI_HASH_QUERY: &str = "algorithm";
const URI_PERIOD_QUERY: &str = "period";
const URI_COUNTER_QUERY: &str = "counter";
const URI_DIGITS_QUERY: &str = "digits";

/// The OTP variant an `otpauth://` URI carries, taken from its host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OtpType {
    Totp,
    Hotp,
}

impl OtpType {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Totp => TOTP_TYPE,
            Self::Hotp => HOTP_TYPE,
        }
    }
}

pub(crate) enum OtpUriInput<'a> {
    Totp(&'a Totp),
    Hotp(&'a Hotp, u64),
}

/// Serializes a generator into its `otpauth://{type}/{label}?{query}` form.
///
/// The label is the percent-escaped account name, prefixed with the issuer
/// when one is supplied. Query parameters are emitted in insertion order:
/// the base32 secret always, then the issuer, then the algorithm, digit
/// count and period only when they differ from their defaults, and the
/// counter always for the counter-based type. No sorting is applied;
/// consumers that need canonical comparison must compare structurally.
pub(crate) fn otp_to_uri(
    input: OtpUriInput,
    account_name: &str,
    issuer: Option<&str>,
    secret: &[u8],
) -> Result<String, OtpError> {
    let otp_uri_type = match input {
        OtpUriInput::Totp(_) => TOTP_TYPE,
        OtpUriInput::Hotp(..) => HOTP_TYPE,
    };

    let mut uri =
        url::Url::parse(&format!("otpauth://{otp_uri_type}/")).map_err(OtpError::UriParse)?;

    // The account name is fully escaped up front; the path serializer alone
    // would leave characters like `@` in place. The issuer keeps the looser
    // path-segment escaping so the conventional `Issuer:account` label shape
    // survives.
    let account_name = urlencoding::encode(account_name);
    match issuer {
        Some(issuer) if !issuer.is_empty() => {
            uri.set_path(&format!("{issuer}:{account_name}"));
        }
        _ => uri.set_path(&account_name),
    }

    {
        let mut query_params = uri.query_pairs_mut();

        query_params.append_pair(URI_SECRET_QUERY, &BASE32_NOPAD.encode(secret));

        if let Some(issuer) = issuer.filter(|i| !i.is_empty()) {
            query_params.append_pair(URI_ISSUER_QUERY, issuer);
        }

        match input {
            OtpUriInput::Totp(totp) => {
                if totp.algorithm() != DEFAULT_ALGORITHM {
                    query_params.append_pair(URI_HASH_QUERY, &totp.algorithm().to_string());
                }
                if totp.digits() != DEFAULT_DIGITS {
                    query_params.append_pair(URI_DIGITS_QUERY, &totp.digits().to_string());
                }
                if totp.period() != DEFAULT_PERIOD {
                    query_params.append_pair(URI_PERIOD_QUERY, &totp.period().to_string());
                }
            }
            OtpUriInput::Hotp(hotp, counter) => {
                if hotp.digits() != DEFAULT_DIGITS {
                    query_params.append_pair(URI_DIGITS_QUERY, &hotp.digits().to_string());
                }
                query_params.append_pair(URI_COUNTER_QUERY, &counter.to_string());
            }
        }
    }

    Ok(uri.to_string())
}

/// A parsed `otpauth://` provisioning URI.
///
/// Absent `digits` and `period` parameters materialize as their defaults of
/// 6 and 30; an absent `algorithm` stays the unset sentinel so "the URI did
/// not specify one" remains distinguishable. Unknown parameters are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct OtpUri {
    pub otp_type: OtpType,
    pub account_name: String,
    pub issuer: Option<String>,
    pub secret: Vec<u8>,
    pub algorithm: Algorithm,
    pub digits: i32,
    pub period: i64,
    pub counter: Option<u64>,
}

impl OtpUri {
    /// Rebuilds the counter-based generator this URI describes, along with
    /// its counter value.
    pub fn to_hotp(&self) -> Result<(Hotp, u64), OtpError> {
        if self.otp_type != OtpType::Hotp {
            return Err(OtpError::InvalidUriType(
                self.otp_type.as_str().into(),
                HOTP_TYPE.into(),
            ));
        }

        let counter = self.counter.ok_or(OtpError::UriMissingHotpCounter)?;

        Ok((
            Hotp::new(OtpOptions::new().with_digits(self.digits)),
            counter,
        ))
    }

    /// Rebuilds the time-based generator this URI describes.
    pub fn to_totp(&self) -> Result<Totp, OtpError> {
        if self.otp_type != OtpType::Totp {
            return Err(OtpError::InvalidUriType(
                self.otp_type.as_str().into(),
                TOTP_TYPE.into(),
            ));
        }

        Ok(Totp::new(
            OtpOptions::new()
                .with_digits(self.digits)
                .with_algorithm(self.algorithm)
                .with_period(self.period),
        ))
    }
}

impl FromStr for OtpUri {
    type Err = OtpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uri = url::Url::parse(s).map_err(OtpError::UriParse)?;

        let otp_type = match uri.domain() {
            Some(TOTP_TYPE) => OtpType::Totp,
            Some(HOTP_TYPE) => OtpType::Hotp,
            domain => {
                return Err(OtpError::InvalidUriType(
                    domain.unwrap_or("None").into(),
                    format!("{TOTP_TYPE} or {HOTP_TYPE}"),
                ))
            }
        };

        let (issuer, account_name) = parse_label(uri.path())?;

        let mut secret = None;
        let mut algorithm = Algorithm::default();
        let mut digits = DEFAULT_DIGITS;
        let mut period = DEFAULT_PERIOD;
        let mut counter = None;

        for params in uri.query_pairs() {
            match params.0 {
                Cow::Borrowed(URI_SECRET_QUERY) => {
                    secret = Some(
                        BASE32_NOPAD
                            .decode(params.1.as_bytes())
                            .map_err(OtpError::SecretDecode)?,
                    )
                }
                Cow::Borrowed(URI_HASH_QUERY) => {
                    algorithm = Algorithm::from_str(params.1.as_ref())?
                }
                Cow::Borrowed(URI_DIGITS_QUERY) => {
                    digits = i32::from_str(params.1.as_ref())
                        .map_err(|e| OtpError::IntegerParse(e, URI_DIGITS_QUERY.into()))?
                }
                Cow::Borrowed(URI_PERIOD_QUERY) => {
                    period = i64::from_str(params.1.as_ref())
                        .map_err(|e| OtpError::IntegerParse(e, URI_PERIOD_QUERY.into()))?
                }
                Cow::Borrowed(URI_COUNTER_QUERY) => {
                    counter = Some(
                        u64::from_str(params.1.as_ref())
                            .map_err(|e| OtpError::IntegerParse(e, URI_COUNTER_QUERY.into()))?,
                    )
                }
                _ => (),
            }
        }

        let secret = match secret {
            Some(secret) if !secret.is_empty() => secret,
            _ => return Err(OtpError::UriMissingSecret),
        };

        if otp_type == OtpType::Hotp && counter.is_none() {
            return Err(OtpError::UriMissingHotpCounter);
        }

        Ok(Self {
            otp_type,
            account_name,
            issuer,
            secret,
            algorithm,
            digits,
            period,
            counter,
        })
    }
}

/// Splits a URI path into issuer and account name.
///
/// The split on `:` happens before percent-decoding, so an escaped `%3A`
/// inside either part is never mistaken for the separator.
fn parse_label(path: &str) -> Result<(Option<String>, String), OtpError> {
    let label = path.strip_prefix('/').unwrap_or(path);

    match label.split_once(':') {
        Some((issuer, account_name)) => Ok((
            Some(decode_label_part(issuer)?),
            decode_label_part(account_name)?,
        )),
        None => Ok((None, decode_label_part(label)?)),
    }
}

fn decode_label_part(part: &str) -> Result<String, OtpError> {
    Ok(urlencoding::decode(part)
        .map_err(OtpError::UriLabelDecode)?
        .into_owned())
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::{OtpType, OtpUri};
    use crate::{hotp::Hotp, totp::Totp, Algorithm, OtpError, OtpOptions};

    const SECRET: &[u8] = b"12345678901234567890";

    #[test]
    fn parses_a_built_hotp_uri() {
        let built = Hotp::default()
            .to_uri("user@example.com", Some("ExampleIssuer"), SECRET, 0)
            .unwrap();

        let parsed = OtpUri::from_str(&built).unwrap();

        assert_eq!(OtpType::Hotp, parsed.otp_type);
        assert_eq!("user@example.com", parsed.account_name);
        assert_eq!(Some("ExampleIssuer".to_string()), parsed.issuer);
        assert_eq!(SECRET, parsed.secret);
        assert_eq!(Algorithm::Default, parsed.algorithm);
        assert_eq!(6, parsed.digits);
        assert_eq!(Some(0), parsed.counter);
    }

    #[test]
    fn parses_a_built_totp_uri() {
        let totp = Totp::new(
            OtpOptions::new()
                .with_algorithm(Algorithm::Sha256)
                .with_digits(8)
                .with_period(60),
        );

        let built = totp
            .to_uri("user@example.com", Some("ExampleIssuer"), SECRET)
            .unwrap();

        let parsed = OtpUri::from_str(&built).unwrap();

        assert_eq!(OtpType::Totp, parsed.otp_type);
        assert_eq!(Algorithm::Sha256, parsed.algorithm);
        assert_eq!(8, parsed.digits);
        assert_eq!(60, parsed.period);
        assert_eq!(None, parsed.counter);
    }

    #[test]
    fn absent_parameters_materialize_as_defaults() {
        let parsed = OtpUri::from_str(
            "otpauth://totp/user%40example.com?secret=GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ",
        )
        .unwrap();

        assert_eq!(Algorithm::Default, parsed.algorithm);
        assert_eq!(6, parsed.digits);
        assert_eq!(30, parsed.period);
        assert_eq!(None, parsed.issuer);
        assert_eq!("user@example.com", parsed.account_name);
    }

    #[test]
    fn round_trips_through_the_rebuilt_generator() {
        let totp = Totp::new(OtpOptions::new().with_digits(8).with_period(60));

        let built = totp.to_uri("user@example.com", None, SECRET).unwrap();
        let rebuilt = OtpUri::from_str(&built).unwrap().to_totp().unwrap();

        assert_eq!(totp, rebuilt);
    }

    #[test]
    fn rebuilds_the_hotp_generator_and_counter() {
        let built = Hotp::new(OtpOptions::new().with_digits(8))
            .to_uri("user@example.com", None, SECRET, 42)
            .unwrap();

        let (hotp, counter) = OtpUri::from_str(&built).unwrap().to_hotp().unwrap();

        assert_eq!(8, hotp.digits());
        assert_eq!(42, counter);
    }

    #[rstest]
    #[case("otpauth://totp/user?secret=GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ")]
    #[case("otpauth://hotp/user?secret=GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ&counter=1")]
    fn rejects_a_type_mismatch(#[case] uri: &str) {
        let parsed = OtpUri::from_str(uri).unwrap();

        let mismatch = match parsed.otp_type {
            OtpType::Totp => parsed.to_hotp().map(|_| ()),
            OtpType::Hotp => parsed.to_totp().map(|_| ()),
        };

        assert!(matches!(mismatch, Err(OtpError::InvalidUriType(_, _))));
    }

    #[test]
    fn rejects_an_unknown_uri_type() {
        let result = OtpUri::from_str("otpauth://motp/user?secret=GEZDGNBVGY3TQOJQ");

        assert!(matches!(result, Err(OtpError::InvalidUriType(_, _))));
    }

    #[test]
    fn rejects_a_missing_secret() {
        let result = OtpUri::from_str("otpauth://totp/user?period=60");

        assert!(matches!(result, Err(OtpError::UriMissingSecret)));
    }

    #[test]
    fn rejects_a_hotp_uri_without_a_counter() {
        let result = OtpUri::from_str("otpauth://hotp/user?secret=GEZDGNBVGY3TQOJQ");

        assert!(matches!(result, Err(OtpError::UriMissingHotpCounter)));
    }

    #[test]
    fn rejects_a_malformed_counter() {
        let result =
            OtpUri::from_str("otpauth://hotp/user?secret=GEZDGNBVGY3TQOJQ&counter=twelve");

        assert!(matches!(result, Err(OtpError::IntegerParse(_, _))));
    }

    #[test]
    fn rejects_a_malformed_secret() {
        let result = OtpUri::from_str("otpauth://totp/user?secret=notbase32!");

        assert!(matches!(result, Err(OtpError::SecretDecode(_))));
    }

    #[test]
    fn rejects_an_unknown_algorithm() {
        let result =
            OtpUri::from_str("otpauth://totp/user?secret=GEZDGNBVGY3TQOJQ&algorithm=MD5");

        assert!(matches!(result, Err(OtpError::InvalidHashingAlgorithm(_))));
    }

    #[test]
    fn ignores_unknown_parameters() {
        let parsed = OtpUri::from_str(
            "otpauth://totp/user?secret=GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ&image=ignored",
        )
        .unwrap();

        assert_eq!(SECRET, parsed.secret);
    }

    #[test]
    fn an_escaped_colon_in_the_account_name_is_not_a_separator() {
        let parsed = OtpUri::from_str(
            "otpauth://totp/Issuer:acct%3Aname?secret=GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ",
        )
        .unwrap();

        assert_eq!(Some("Issuer".to_string()), parsed.issuer);
        assert_eq!("acct:name", parsed.account_name);
    }
}
