//! Minimal Solidity ABI codec.
//!
//! Covers what the entity contract needs: function selectors, `address` and
//! dynamic `string` arguments, and a single `string` return value.

use alloy_primitives::{Address, hex};
use thiserror::Error;

const WORD: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AbiError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),
    #[error("return data truncated: need {needed} bytes, have {actual}")]
    Truncated { needed: usize, actual: usize },
    #[error("offset or length does not fit in usize")]
    OutOfRange,
    #[error("string is not valid utf-8")]
    InvalidUtf8,
}

pub fn keccak256(input: &[u8]) -> [u8; 32] {
    alloy_primitives::keccak256(input).0
}

/// First four bytes of the keccak-256 of a canonical signature such as
/// `ownerToEntity(address)`.
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = keccak256(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

pub fn encode_address(address: &Address) -> [u8; WORD] {
    address.into_word().0
}

/// Encodes a lone `string` argument: head offset, length word, padded bytes.
pub fn encode_string(value: &str) -> Vec<u8> {
    let bytes = value.as_bytes();
    let padded = bytes.len().div_ceil(WORD) * WORD;
    let mut out = Vec::with_capacity(2 * WORD + padded);
    out.extend_from_slice(&u64_word(WORD as u64));
    out.extend_from_slice(&u64_word(bytes.len() as u64));
    out.extend_from_slice(bytes);
    out.resize(2 * WORD + padded, 0);
    out
}

/// Decodes return data holding a single `string`.
pub fn decode_string(data: &[u8]) -> Result<String, AbiError> {
    let offset = read_usize(data, 0)?;
    let len = read_usize(data, offset)?;
    let start = offset.saturating_add(WORD);
    let end = start.saturating_add(len);
    if data.len() < end {
        return Err(AbiError::Truncated {
            needed: end,
            actual: data.len(),
        });
    }
    String::from_utf8(data[start..end].to_vec()).map_err(|_| AbiError::InvalidUtf8)
}

/// Calldata for a call: selector followed by already-encoded arguments.
pub fn calldata(selector: [u8; 4], args: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(4 + args.len());
    out.extend_from_slice(&selector);
    out.extend_from_slice(args);
    out
}

pub fn encode_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

pub fn decode_hex(input: &str) -> Result<Vec<u8>, AbiError> {
    let trimmed = input.strip_prefix("0x").unwrap_or(input);
    hex::decode(trimmed).map_err(|_| AbiError::InvalidHex(input.to_owned()))
}

fn u64_word(value: u64) -> [u8; WORD] {
    let mut word = [0_u8; WORD];
    word[WORD - 8..].copy_from_slice(&value.to_be_bytes());
    word
}

fn read_usize(data: &[u8], at: usize) -> Result<usize, AbiError> {
    let end = at.saturating_add(WORD);
    if data.len() < end {
        return Err(AbiError::Truncated {
            needed: end,
            actual: data.len(),
        });
    }
    let word = &data[at..end];
    if word[..WORD - 8].iter().any(|b| *b != 0) {
        return Err(AbiError::OutOfRange);
    }
    let mut tail = [0_u8; 8];
    tail.copy_from_slice(&word[WORD - 8..]);
    usize::try_from(u64::from_be_bytes(tail)).map_err(|_| AbiError::OutOfRange)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keccak_of_empty_input() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn selector_matches_erc20_transfer() {
        assert_eq!(hex::encode(selector("transfer(address,uint256)")), "a9059cbb");
    }

    #[test]
    fn address_is_left_padded() -> anyhow::Result<()> {
        let address: Address = "0x00000000000000000000000000000000000000aA".parse()?;
        let word = encode_address(&address);
        assert!(word[..31].iter().all(|b| *b == 0));
        assert_eq!(word[31], 0xaa);
        Ok(())
    }

    #[test]
    fn string_layout_matches_solidity() {
        let encoded = encode_string("hello");
        assert_eq!(encoded.len(), 96);
        assert_eq!(encoded[31], 0x20);
        assert_eq!(encoded[63], 5);
        assert_eq!(&encoded[64..69], b"hello");
        assert!(encoded[69..].iter().all(|b| *b == 0));
    }

    #[test]
    fn empty_string_is_two_words() {
        let encoded = encode_string("");
        assert_eq!(encoded.len(), 64);
        assert_eq!(decode_string(&encoded).unwrap(), "");
    }

    #[test]
    fn decodes_multi_word_string() {
        let text = "an entity description longer than one abi word";
        assert_eq!(decode_string(&encode_string(text)).unwrap(), text);
    }

    #[test]
    fn truncated_return_data_rejected() {
        let mut encoded = encode_string("hello world");
        encoded.truncate(70);
        assert!(matches!(
            decode_string(&encoded),
            Err(AbiError::Truncated { .. })
        ));
        assert!(matches!(decode_string(&[]), Err(AbiError::Truncated { .. })));
    }

    #[test]
    fn offsets_beyond_usize_rejected() {
        let mut data = encode_string("hello");
        // Offset word 0x1_0000_0020: only the low 32 bits would survive a cast.
        data[27] = 0x01;
        let result = decode_string(&data);
        if usize::BITS < 64 {
            assert_eq!(result, Err(AbiError::OutOfRange));
        } else {
            assert!(matches!(result, Err(AbiError::Truncated { .. })));
        }
    }

    #[test]
    fn high_word_bytes_rejected() {
        let mut data = encode_string("hello");
        data[0] = 0x01;
        assert_eq!(decode_string(&data), Err(AbiError::OutOfRange));
    }

    #[test]
    fn hex_accepts_optional_prefix() {
        assert_eq!(decode_hex("0x0aff").unwrap(), vec![0x0a, 0xff]);
        assert_eq!(decode_hex("0aff").unwrap(), vec![0x0a, 0xff]);
        assert_eq!(encode_hex(&[0x0a, 0xff]), "0x0aff");
        assert!(decode_hex("0xzz").is_err());
    }
}
