//! Delta-encoded line tables.
//!
//! A line table is a flat sequence of `(byte delta, line delta)` byte pairs. Walking the pairs
//! from `(offset 0, first_line)` and applying "advance the offset, then the line" reconstructs
//! the mapping from instruction offsets to source lines. Byte deltas are unsigned; line deltas
//! are signed two's-complement bytes.

use crate::result::{Error, Result};

/// One decoded `(byte delta, line delta)` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineEntry {
    pub byte_delta: u8,
    pub line_delta: i8,
}

/// Splits a raw table into entries.
pub fn entries(table: &[u8]) -> Result<Vec<LineEntry>> {
    if !table.len().is_multiple_of(2) {
        return Err(Error::LineTable(format!(
            "table length {} is not a whole number of pairs",
            table.len()
        )));
    }
    Ok(table
        .chunks_exact(2)
        .map(|pair| LineEntry {
            byte_delta: pair[0],
            line_delta: pair[1] as i8,
        })
        .collect())
}

/// Returns the `(offset, line)` pairs where a new source line begins, in offset order.
///
/// A start is reported only once the table advances past it with a non-zero byte delta and
/// the line actually changed, so filler entries never produce duplicate starts.
pub fn line_starts(table: &[u8], first_line: u32) -> Result<Vec<(usize, u32)>> {
    let mut starts = Vec::new();
    let mut last_line: Option<i64> = None;
    let mut line = i64::from(first_line);
    let mut offset = 0usize;

    let emit = |offset: usize, line: i64, starts: &mut Vec<(usize, u32)>| -> Result<()> {
        let line = u32::try_from(line)
            .map_err(|_| Error::LineTable(format!("line {line} at offset {offset} is negative")))?;
        starts.push((offset, line));
        Ok(())
    };

    for entry in entries(table)? {
        if entry.byte_delta != 0 {
            if last_line != Some(line) {
                emit(offset, line, &mut starts)?;
                last_line = Some(line);
            }
            offset += usize::from(entry.byte_delta);
        }
        line += i64::from(entry.line_delta);
    }
    if last_line != Some(line) {
        emit(offset, line, &mut starts)?;
    }

    Ok(starts)
}

/// Encodes line starts back into a delta table.
///
/// Offsets must be strictly increasing. Byte deltas above 255 and line deltas outside the
/// signed byte range are split across filler entries.
pub fn encode(starts: &[(usize, u32)], first_line: u32) -> Result<Vec<u8>> {
    let mut table = Vec::with_capacity(starts.len() * 2);
    let mut prev_offset = 0usize;
    let mut prev_line = i64::from(first_line);

    for (i, &(offset, line)) in starts.iter().enumerate() {
        if i == 0 && offset == 0 && i64::from(line) == prev_line {
            continue;
        }
        if i > 0 && offset <= prev_offset {
            return Err(Error::LineTable(format!(
                "line start offsets must increase (offset {offset} after {prev_offset})"
            )));
        }

        let mut byte_delta = offset - prev_offset;
        let mut line_delta = i64::from(line) - prev_line;
        while byte_delta > usize::from(u8::MAX) {
            table.extend_from_slice(&[u8::MAX, 0]);
            byte_delta -= usize::from(u8::MAX);
        }
        while line_delta > i64::from(i8::MAX) {
            table.extend_from_slice(&[byte_delta as u8, i8::MAX as u8]);
            byte_delta = 0;
            line_delta -= i64::from(i8::MAX);
        }
        while line_delta < i64::from(i8::MIN) {
            table.extend_from_slice(&[byte_delta as u8, i8::MIN as u8]);
            byte_delta = 0;
            line_delta -= i64::from(i8::MIN);
        }
        table.extend_from_slice(&[byte_delta as u8, line_delta as i8 as u8]);

        prev_offset = offset;
        prev_line = i64::from(line);
    }

    Ok(table)
}
