//! Decimal coin amounts as typed by players ("12.5", " 3 ").

use crate::config::GameConfig;

const MAX_WHOLE_DIGITS: usize = 10;

/// Parses a decimal amount with up to eight fractional digits into base
/// units. Surrounding whitespace is accepted; anything else fails.
pub fn parse_money(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut pos = 0;
    let mut whole: i64 = 0;
    let mut whole_digits = 0;
    let mut units: i64 = 0;

    while pos < bytes.len() {
        let b = bytes[pos];
        if b == b'.' {
            pos += 1;
            let mut mult = GameConfig::CENT * 10;
            while pos < bytes.len() && bytes[pos].is_ascii_digit() && mult > 0 {
                units += mult * i64::from(bytes[pos] - b'0');
                mult /= 10;
                pos += 1;
            }
            break;
        }
        if b.is_ascii_whitespace() {
            break;
        }
        if !b.is_ascii_digit() {
            return None;
        }
        whole_digits += 1;
        if whole_digits > MAX_WHOLE_DIGITS {
            return None;
        }
        whole = whole * 10 + i64::from(b - b'0');
        pos += 1;
    }
    if !bytes[pos..].iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    Some(whole * GameConfig::COIN + units)
}

/// Formats base units the way [`parse_money`] reads them (`"12.50000000"`).
pub fn format_money(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let abs = amount.unsigned_abs();
    let coin = GameConfig::COIN as u64;
    format!("{sign}{}.{:08}", abs / coin, abs % coin)
}
