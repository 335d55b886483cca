use crate::SdkError;
use serde::Serialize;
use std::{fmt, str::FromStr};

/// 32-byte Aptos account address.
///
/// Parses both the long and the short (`0x1`) hex form and always displays the long form.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct AptosAddress(pub [u8; 32]);

impl AptosAddress {
    pub const LENGTH: usize = 32;

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl FromStr for AptosAddress {
    type Err = SdkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.is_empty() || digits.len() > 2 * Self::LENGTH {
            return Err(SdkError::invalid_address(s, "expected 1 to 64 hex digits"));
        }

        // odd length short forms get a leading zero nibble
        let padded = format!("{digits:0>64}");
        let mut bytes = [0u8; 32];
        const_hex::decode_to_slice(padded, &mut bytes)
            .map_err(|err| SdkError::invalid_address(s, err))?;

        Ok(Self(bytes))
    }
}

impl fmt::Display for AptosAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&const_hex::encode_prefixed(self.0))
    }
}

impl From<[u8; 32]> for AptosAddress {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("0x1"; "short")]
    #[test_case("1"; "no prefix")]
    #[test_case("0x0000000000000000000000000000000000000000000000000000000000000001"; "long")]
    fn test_parse_one(input: &str) {
        let address: AptosAddress = input.parse().unwrap();
        let mut expected = [0u8; 32];
        expected[31] = 1;
        assert_eq!(address.0, expected);
        assert_eq!(
            address.to_string(),
            "0x0000000000000000000000000000000000000000000000000000000000000001"
        );
    }

    #[test]
    fn test_odd_length() {
        let address: AptosAddress = "0xabc".parse().unwrap();
        assert_eq!(address.0[30..], [0x0a, 0xbc]);
    }

    #[test_case(""; "empty")]
    #[test_case("0x"; "prefix only")]
    #[test_case("0xzz"; "not hex")]
    #[test_case(&"1".repeat(65); "too long")]
    fn test_parse_errors(input: &str) {
        assert!(matches!(input.parse::<AptosAddress>(), Err(SdkError::InvalidAddress { .. })));
    }

    #[test]
    fn test_bcs_is_raw_bytes() {
        let address: AptosAddress = "0x1".parse().unwrap();
        assert_eq!(bcs::to_bytes(&address).unwrap(), address.0.to_vec());
    }
}
