//! Byte buffer wrapper that travels through JSON as lowercase hexadecimal.
//!
//! Code units keep their instruction stream and line table in `HexBytes` so serialized units
//! stay readable (`"code": "4000310000"` rather than an array of integers). The wrapper
//! derefs to a slice, so byte-oriented code keeps working without conversions.

use crate::normalize_hex_string;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::Deref;

/// Wrapper around `Vec<u8>` that renders as contiguous lowercase hex for debug and serialization.
///
/// # Examples
///
/// ```
/// use suture_core::HexBytes;
///
/// let bytes = HexBytes::from(vec![0x40, 0x00, 0x31, 0x00]);
/// assert_eq!(format!("{bytes:?}"), "40003100");
/// assert_eq!(HexBytes::from_hex("0x4000_3100").unwrap(), bytes);
/// ```
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct HexBytes(pub Vec<u8>);

impl HexBytes {
    /// Parses a hex string, accepting a `0x` prefix, whitespace and `_` separators.
    pub fn from_hex(input: &str) -> crate::result::Result<Self> {
        let normalized = normalize_hex_string(input)?;
        Ok(Self(hex::decode(normalized)?))
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl From<Vec<u8>> for HexBytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for HexBytes {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<HexBytes> for Vec<u8> {
    fn from(bytes: HexBytes) -> Self {
        bytes.0
    }
}

impl AsRef<[u8]> for HexBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Deref for HexBytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.0.as_slice()
    }
}

impl fmt::Debug for HexBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl Serialize for HexBytes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for HexBytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct HexBytesVisitor;

        impl<'de> Visitor<'de> for HexBytesVisitor {
            type Value = HexBytes;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a hex string")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                HexBytes::from_hex(v).map_err(E::custom)
            }

            fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                self.visit_str(&v)
            }
        }

        deserializer.deserialize_str(HexBytesVisitor)
    }
}

impl PartialEq<Vec<u8>> for HexBytes {
    fn eq(&self, other: &Vec<u8>) -> bool {
        &self.0 == other
    }
}

impl PartialEq<HexBytes> for Vec<u8> {
    fn eq(&self, other: &HexBytes) -> bool {
        self == &other.0
    }
}
