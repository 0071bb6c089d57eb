//! Symbol table merging.
//!
//! The snippet's tables are appended after the target's, so target operands keep their
//! meaning and only the snippet's operands move, by the target table's original length.

use crate::{Result, guard};
use suture_core::{OperandKind, decoder};
use tracing::debug;

/// Table an operand can index into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    /// Global and attribute names.
    Names,
    /// Constant pool.
    Constants,
    /// Fast locals.
    Locals,
}

impl SymbolKind {
    fn operand_kind(self) -> OperandKind {
        match self {
            SymbolKind::Names => OperandKind::Name,
            SymbolKind::Constants => OperandKind::Constant,
            SymbolKind::Locals => OperandKind::Local,
        }
    }

    /// Singular name used in error sites.
    pub fn label(self) -> &'static str {
        match self {
            SymbolKind::Names => "name",
            SymbolKind::Constants => "constant",
            SymbolKind::Locals => "local",
        }
    }
}

/// Snippet code with shifted operands plus the concatenated table.
#[derive(Clone, Debug, PartialEq)]
pub struct Merged<T> {
    /// Snippet code with its operands moved past the base table.
    pub code: Vec<u8>,
    /// Base entries followed by the snippet's.
    pub table: Vec<T>,
}

/// Shifts every `kind` operand in `code` by `base.len()` and returns `base ++ extra`.
///
/// Operands are rewritten within the width the instruction already has: an unprefixed
/// operand that would exceed 255 is a capacity error rather than a reason to grow the
/// instruction.
pub fn merge_table<T: Clone>(
    kind: SymbolKind,
    code: &[u8],
    base: &[T],
    extra: &[T],
) -> Result<Merged<T>> {
    let shift = base.len();
    let mut shifted = code.to_vec();

    if shift > 0 {
        for ins in decoder::decode(code)? {
            if ins.op.operand_kind() != kind.operand_kind() {
                continue;
            }
            let Some(arg) = ins.arg else {
                continue;
            };

            let value = arg as usize + shift;
            let top_shift = 8 * ins.ext;
            let top = guard::check_site(value >> top_shift, || {
                format!("{} operand of {} at offset {}", kind.label(), ins.op, ins.pc)
            })?;

            let mut positions = ins.operand_positions();
            if let Some(first) = positions.next() {
                shifted[first] = top;
            }
            for (i, position) in positions.enumerate() {
                let chunk_shift = 8 * (ins.ext - 1 - i);
                shifted[position] = (value >> chunk_shift) as u8;
            }
            debug!(
                "Shifted {} operand at pc={}: {} -> {}",
                kind.label(),
                ins.pc,
                arg,
                value
            );
        }
    }

    let mut table = Vec::with_capacity(base.len() + extra.len());
    table.extend_from_slice(base);
    table.extend_from_slice(extra);

    Ok(Merged {
        code: shifted,
        table,
    })
}
