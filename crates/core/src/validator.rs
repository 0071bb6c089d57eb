//! Structural validation of a code unit.
//!
//! Checks that every jump lands on an instruction boundary and that every symbol operand
//! indexes inside its table. Stack depth and reachability are not analysed.

use std::collections::HashSet;

use crate::{
    CodeUnit, OperandKind, decoder,
    result::{Error, Result},
};

/// Validate the instruction stream and symbol references of `unit`.
///
/// Returns the first violation found, in instruction order. The line table is decoded as well
/// so a malformed table is reported here rather than at first use.
pub fn validate(unit: &CodeUnit) -> Result<()> {
    let instructions = decoder::decode(&unit.code)?;
    let starts: HashSet<usize> = instructions.iter().map(|ins| ins.pc).collect();

    for ins in &instructions {
        let Some(arg) = ins.arg else {
            continue;
        };
        let index = arg as usize;

        let (table, len) = match ins.op.operand_kind() {
            OperandKind::Name => ("name", unit.names.len()),
            OperandKind::Constant => ("constant", unit.constants.len()),
            OperandKind::Local => ("local", unit.locals.len()),
            OperandKind::RelativeJump | OperandKind::AbsoluteJump => {
                if let Some(target) = ins.jump_target()
                    && !starts.contains(&target)
                {
                    tracing::debug!(
                        "{} at pc={} targets {} which is not an instruction start",
                        ins.op,
                        ins.pc,
                        target
                    );
                    return Err(Error::InvalidJumpTarget {
                        pc: ins.pc,
                        target,
                    });
                }
                continue;
            }
            _ => continue,
        };

        if index >= len {
            return Err(Error::SymbolOutOfRange {
                table,
                pc: ins.pc,
                index,
                len,
            });
        }
    }

    unit.line_starts()?;
    tracing::debug!(
        "Validated {} instructions of '{}'",
        instructions.len(),
        unit.name
    );
    Ok(())
}
