//! Operand overflow guard.

use crate::{Error, Result};
use suture_core::decoder::prefixes_for;

/// Checks that `value` fits a single operand byte.
pub fn check(value: usize) -> Result<u8> {
    check_site(value, || "operand".to_string())
}

/// Like [`check`], naming the destination of `value` in the error.
pub fn check_site(value: usize, site: impl FnOnce() -> String) -> Result<u8> {
    u8::try_from(value).map_err(|_| Error::Capacity {
        value,
        site: site(),
    })
}

/// Splits `value` into the fewest operand chunks that hold it, most-significant first.
pub fn chunks(value: u32) -> Vec<u8> {
    let width = prefixes_for(value) + 1;
    value.to_be_bytes()[4 - width..].to_vec()
}
