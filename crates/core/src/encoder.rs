//! Module for encoding wordcode instructions back into a byte stream.

use crate::decoder::{Instruction, parse_assembly, prefixes_for};
use crate::opcode::{INSTRUCTION_WIDTH, MAX_EXTENDED_ARGS};
use crate::result::{Error, Result};
use crate::Opcode;

/// Encodes a sequence of instructions into wordcode.
///
/// Each instruction is emitted with exactly `ext` `EXTENDED_ARG` prefixes, so an instruction
/// decoded from a stream re-encodes to the same bytes. Unused high chunks are written as zero.
///
/// # Examples
/// ```
/// use suture_core::{Opcode, decoder::Instruction, encoder::encode};
///
/// let jump = Instruction::new(Opcode::JUMP_ABSOLUTE, Some(0x0104));
/// assert_eq!(encode(&[jump]).unwrap(), vec![0x7f, 0x01, 0x68, 0x04]);
/// ```
pub fn encode(instructions: &[Instruction]) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(instructions.len() * INSTRUCTION_WIDTH);

    for ins in instructions {
        tracing::trace!(
            "Encoding instruction: pc={}, opcode='{}', arg={:?}, ext={}",
            ins.pc,
            ins.op,
            ins.arg,
            ins.ext
        );

        if ins.op == Opcode::EXTENDED_ARG {
            return Err(Error::InvalidOperand(format!(
                "standalone EXTENDED_ARG at pc={}",
                ins.pc
            )));
        }
        if ins.ext > MAX_EXTENDED_ARGS {
            return Err(Error::OperandTooWide(ins.pc));
        }

        let value = ins.arg.unwrap_or(0);
        if prefixes_for(value) > ins.ext {
            tracing::error!(
                "Operand {} of {} at pc={} needs {} prefixes, only {} reserved",
                value,
                ins.op,
                ins.pc,
                prefixes_for(value),
                ins.ext
            );
            return Err(Error::InvalidOperand(format!(
                "{} operand {} does not fit {} prefix(es) at pc={}",
                ins.op, value, ins.ext, ins.pc
            )));
        }

        for shift in (1..=ins.ext).rev() {
            let chunk = value.checked_shr(8 * shift as u32).unwrap_or(0) as u8;
            bytes.extend_from_slice(&[Opcode::EXTENDED_ARG.to_byte(), chunk]);
        }
        bytes.extend_from_slice(&[ins.op.to_byte(), value as u8]);
    }

    tracing::debug!(
        "Successfully encoded {} instructions into {} bytes",
        instructions.len(),
        bytes.len()
    );
    Ok(bytes)
}

/// Parses an assembly listing and encodes it in one step.
pub fn assemble(asm: &str) -> Result<Vec<u8>> {
    encode(&parse_assembly(asm)?)
}
