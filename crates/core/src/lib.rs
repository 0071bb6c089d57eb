pub mod code;
pub mod constant;
pub mod decoder;
pub mod encoder;
pub mod hex_bytes;
pub mod line_table;
pub mod opcode;
pub mod result;
pub mod validator;

pub use code::CodeUnit;
pub use constant::Constant;
pub use hex_bytes::HexBytes;
pub use opcode::{Opcode, OperandKind};

/// Strips an optional `0x` prefix along with whitespace and `_` separators from a hex string.
///
/// Returns an error when the remaining digit count is odd, since every byte needs two digits.
///
/// # Example
/// ```
/// use suture_core::normalize_hex_string;
///
/// assert_eq!(normalize_hex_string("0x40 00_31 00").unwrap(), "40003100");
/// assert!(normalize_hex_string("0x400").is_err());
/// ```
pub fn normalize_hex_string(input: &str) -> result::Result<String> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let normalized: String = digits
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .collect();

    if !normalized.len().is_multiple_of(2) {
        return Err(result::Error::HexDecode(hex::FromHexError::OddLength));
    }
    Ok(normalized)
}

