//! The compiled code unit: an instruction stream plus the tables its operands index into.

use crate::constant::Constant;
use crate::line_table;
use crate::result::Result;
use crate::HexBytes;
use serde::{Deserialize, Serialize};

/// A compiled, self-contained executable fragment.
///
/// Instructions reference `names`, `constants` and `locals` by position. `line_table` holds
/// delta-encoded `(byte delta, line delta)` pairs starting from `first_line` at offset 0.
/// The remaining fields are metadata that the insertion engine passes through unchanged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeUnit {
    pub arg_count: u32,
    pub keyword_only_arg_count: u32,
    pub local_count: u32,
    pub stack_size: u32,
    pub flags: u32,
    pub code: HexBytes,
    pub constants: Vec<Constant>,
    pub names: Vec<String>,
    pub locals: Vec<String>,
    pub filename: String,
    pub name: String,
    pub qualified_name: String,
    pub first_line: u32,
    pub line_table: HexBytes,
    pub free_vars: Vec<String>,
    pub cell_vars: Vec<String>,
}

impl CodeUnit {
    /// Returns the `(offset, line)` pairs at which source lines begin.
    pub fn line_starts(&self) -> Result<Vec<(usize, u32)>> {
        line_table::line_starts(&self.line_table, self.first_line)
    }

    /// Returns the offset of the last instruction that starts `line`, if any.
    ///
    /// A line can start more than once (loop headers, multi-line statements); the last start
    /// wins, matching how breakpoints resolve a line to a single location.
    pub fn offset_of_line(&self, line: u32) -> Result<Option<usize>> {
        Ok(self
            .line_starts()?
            .into_iter()
            .filter(|&(_, l)| l == line)
            .map(|(offset, _)| offset)
            .last())
    }

    /// Resolves the source line executing at `offset`.
    pub fn line_at(&self, offset: usize) -> Result<u32> {
        let mut current = self.first_line;
        for (start, line) in self.line_starts()? {
            if start > offset {
                break;
            }
            current = line;
        }
        Ok(current)
    }
}
