//! Line table adjustment after insertions.

use crate::mapping::InsertionMap;
use crate::{Result, guard};
use suture_core::line_table;

/// Rewrites `table` so its entries cover the bytes recorded in `inserted`.
///
/// Each entry's span is taken in final coordinates; an insertion falling inside it lengthens
/// that entry, so the inserted bytes are attributed to the line executing at that point. An
/// insertion exactly at a line start belongs to the line that starts there, and insertions
/// past the last entry extend the final line without touching the table.
pub fn adjust(table: &[u8], inserted: &InsertionMap) -> Result<Vec<u8>> {
    let mut pending = inserted.iter().peekable();
    let mut adjusted = Vec::with_capacity(table.len());
    let mut start = 0usize;

    for entry in line_table::entries(table)? {
        let mut delta = usize::from(entry.byte_delta);
        if delta > 0 {
            while let Some(&(at, len)) = pending.peek() {
                if at >= start + delta {
                    break;
                }
                delta += len;
                pending.next();
            }
        }

        let byte_delta = guard::check_site(delta, || {
            format!("line table entry starting at offset {start}")
        })?;
        adjusted.extend_from_slice(&[byte_delta, entry.line_delta as u8]);
        start += delta;
    }

    tracing::debug!(
        "Adjusted line table: {} entries, {} insertion(s) past the last entry",
        adjusted.len() / 2,
        pending.count()
    );
    Ok(adjusted)
}
