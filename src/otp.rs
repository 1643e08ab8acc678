use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha512};

use crate::{Algorithm, OtpError};

/// Calculates the keyed-hash digest of `msg` for the given algorithm.
///
/// This is the single fallible step of code generation: an [`Algorithm`]
/// value matching none of the three supported digests is rejected here.
pub(crate) fn hmac_digest(
    algorithm: Algorithm,
    secret: &[u8],
    msg: &[u8],
) -> Result<Vec<u8>, OtpError> {
    match algorithm {
        Algorithm::Sha1 => {
            let mut mac =
                Hmac::<Sha1>::new_from_slice(secret).map_err(|_| OtpError::InvalidHmacKey)?;
            mac.update(msg);
            Ok(mac.finalize().into_bytes().to_vec())
        }
        Algorithm::Sha256 => {
            let mut mac =
                Hmac::<Sha256>::new_from_slice(secret).map_err(|_| OtpError::InvalidHmacKey)?;
            mac.update(msg);
            Ok(mac.finalize().into_bytes().to_vec())
        }
        Algorithm::Sha512 => {
            let mut mac =
                Hmac::<Sha512>::new_from_slice(secret).map_err(|_| OtpError::InvalidHmacKey)?;
            mac.update(msg);
            Ok(mac.finalize().into_bytes().to_vec())
        }
        Algorithm::Default => Err(OtpError::UnsupportedAlgorithm),
    }
}

/// Applies RFC 4226 dynamic truncation to an HMAC digest.
///
/// The low nibble of the final digest byte selects a 4-byte window, read
/// big-endian with the top bit masked off to avoid sign ambiguity. The
/// window always fits inside a 20/32/64-byte digest.
pub(crate) fn truncate(digest: &[u8]) -> Result<u32, OtpError> {
    let offset = match digest.last() {
        Some(last) => usize::from(last & 0x0f),
        None => return Err(OtpError::InvalidDigest(Vec::from(digest))),
    };

    let code_bytes: [u8; 4] = match digest.get(offset..offset + 4).map(TryInto::try_into) {
        Some(Ok(bytes)) => bytes,
        _ => return Err(OtpError::InvalidDigest(Vec::from(digest))),
    };

    Ok(u32::from_be_bytes(code_bytes) & 0x7fff_ffff)
}

/// Encodes a truncated code as exactly `digits` decimal characters,
/// zero-padded on the left. Only the low-order digits are kept when the
/// code is wider than the requested length.
pub(crate) fn encode(code: u32, digits: u32) -> String {
    format!(
        "{:0width$}",
        code % 10u32.pow(digits),
        width = digits as usize
    )
}

/// Generates a one-time password for an 8-byte big-endian counter message.
pub(crate) fn generate_otp(
    algorithm: Algorithm,
    secret: &[u8],
    counter: u64,
    digits: u32,
) -> Result<String, OtpError> {
    let digest = hmac_digest(algorithm, secret, &counter.to_be_bytes())?;
    let code = truncate(&digest)?;

    Ok(encode(code, digits))
}

#[cfg(test)]
mod tests {
    use data_encoding::HEXLOWER;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::{encode, generate_otp, hmac_digest, truncate};
    use crate::{Algorithm, OtpError};

    const SECRET: &[u8] = b"12345678901234567890";

    #[rstest]
    #[case(Algorithm::Sha1, 20)]
    #[case(Algorithm::Sha256, 32)]
    #[case(Algorithm::Sha512, 64)]
    fn digest_lengths(#[case] algorithm: Algorithm, #[case] expected_len: usize) {
        let digest = hmac_digest(algorithm, SECRET, &0u64.to_be_bytes()).unwrap();

        assert_eq!(expected_len, digest.len());
    }

    #[test]
    fn default_algorithm_is_rejected_by_the_selector() {
        let result = hmac_digest(Algorithm::Default, SECRET, &0u64.to_be_bytes());

        assert!(matches!(result, Err(OtpError::UnsupportedAlgorithm)));
    }

    // HMAC-SHA1 digest for counter 0 from RFC 4226 appendix D
    #[test]
    fn truncate_reference_digest() {
        let digest = HEXLOWER
            .decode(b"cc93cf18508d94934c64b65d8ba7667fb7cde4b0")
            .unwrap();

        assert_eq!(1_284_755_224, truncate(&digest).unwrap());
    }

    #[test]
    fn truncate_matches_the_selector_output() {
        let digest = hmac_digest(Algorithm::Sha1, SECRET, &0u64.to_be_bytes()).unwrap();

        assert_eq!(1_284_755_224, truncate(&digest).unwrap());
    }

    #[test]
    fn truncate_rejects_an_empty_digest() {
        assert!(matches!(truncate(&[]), Err(OtpError::InvalidDigest(_))));
    }

    #[rstest]
    #[case(0, 6, "000000")]
    #[case(755_224, 6, "755224")]
    #[case(1_284_755_224, 8, "84755224")]
    #[case(1_284_755_224, 6, "755224")]
    #[case(12_345, 8, "00012345")]
    #[case(2_147_483_647, 8, "47483647")]
    #[case(7, 1, "7")]
    #[case(19, 1, "9")]
    fn encode_pads_and_truncates(#[case] code: u32, #[case] digits: u32, #[case] expected: &str) {
        assert_eq!(expected, encode(code, digits));
    }

    #[rstest]
    fn generated_length_always_matches_digits(#[values(1, 2, 3, 4, 5, 6, 7, 8)] digits: u32) {
        let code = generate_otp(Algorithm::Sha1, SECRET, 42, digits).unwrap();

        assert_eq!(digits as usize, code.len());
    }
}
