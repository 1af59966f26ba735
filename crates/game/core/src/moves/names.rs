//! Player names and reward addresses.

use sha2::{Digest, Sha256};

use crate::config::GameConfig;

/// Names are 1 to 10 characters of letters, digits, `_`, `-` and single
/// inner spaces.
pub fn is_valid_player_name(name: &str) -> bool {
    if name.is_empty() || name.len() > GameConfig::MAX_PLAYER_NAME_LENGTH {
        return false;
    }
    if name.starts_with(' ') || name.ends_with(' ') || name.contains("  ") {
        return false;
    }
    name.bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b' '))
}

const BASE58_ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Decodes a base58 string into bytes, keeping leading zero bytes.
fn base58_decode(s: &str) -> Option<Vec<u8>> {
    let mut out: Vec<u8> = Vec::with_capacity(s.len());
    for c in s.bytes() {
        let mut carry = BASE58_ALPHABET.iter().position(|&a| a == c)? as u32;
        for byte in out.iter_mut().rev() {
            carry += u32::from(*byte) * 58;
            *byte = (carry & 0xff) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            out.insert(0, (carry & 0xff) as u8);
            carry >>= 8;
        }
    }
    let zeros = s.bytes().take_while(|&c| c == b'1').count();
    let mut bytes = vec![0u8; zeros];
    bytes.extend(out);
    Some(bytes)
}

/// Version byte, 20-byte hash and a 4-byte double SHA-256 checksum.
pub fn is_valid_address(address: &str) -> bool {
    const LEN: usize = 25;
    let Some(bytes) = base58_decode(address) else {
        return false;
    };
    if bytes.len() != LEN {
        return false;
    }
    let (payload, checksum) = bytes.split_at(LEN - 4);
    let digest = Sha256::digest(Sha256::digest(payload));
    digest[..4] == *checksum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_reject_odd_spacing_and_symbols() {
        assert!(is_valid_player_name("domob"));
        assert!(is_valid_player_name("a b-c_9"));
        assert!(!is_valid_player_name(""));
        assert!(!is_valid_player_name(" lead"));
        assert!(!is_valid_player_name("trail "));
        assert!(!is_valid_player_name("two  gaps"));
        assert!(!is_valid_player_name("dot.name"));
        assert!(!is_valid_player_name("elevenchars"));
    }

    #[test]
    fn address_checksum_is_verified() {
        // genesis coinbase address of the bitcoin network
        assert!(is_valid_address("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa"));
        assert!(!is_valid_address("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNb"));
        assert!(!is_valid_address("0OIl"));
        assert!(!is_valid_address("1111"));
    }
}
