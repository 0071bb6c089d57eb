//! Suture's single entry-point for turning byte sequences into instruction streams.

use crate::opcode::{INSTRUCTION_WIDTH, MAX_EXTENDED_ARGS, OperandKind};
use crate::result::{Error, Result};
use crate::Opcode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Single decoded instruction with its `EXTENDED_ARG` prefixes folded in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// Byte offset of the instruction, including its prefix chain
    pub pc: usize,
    /// Parsed opcode
    pub op: Opcode,
    /// Full operand, `None` for opcodes below `HAVE_ARGUMENT`
    pub arg: Option<u32>,
    /// Number of `EXTENDED_ARG` prefixes in front of the opcode
    pub ext: usize,
}

impl Instruction {
    /// Creates an instruction with the narrowest encoding for its operand.
    pub fn new(op: Opcode, arg: Option<u32>) -> Self {
        Self {
            pc: 0,
            op,
            arg,
            ext: arg.map_or(0, prefixes_for),
        }
    }

    /// Returns the byte size of this instruction including its prefixes.
    #[inline]
    pub fn byte_size(&self) -> usize {
        INSTRUCTION_WIDTH * (self.ext + 1)
    }

    /// Offset of the opcode byte itself, after the prefix chain.
    #[inline]
    pub fn op_pc(&self) -> usize {
        self.pc + INSTRUCTION_WIDTH * self.ext
    }

    /// Offset of the first byte after this instruction.
    #[inline]
    pub fn end_pc(&self) -> usize {
        self.pc + self.byte_size()
    }

    /// Byte positions of every operand chunk, most-significant first.
    pub fn operand_positions(&self) -> impl Iterator<Item = usize> + use<> {
        let pc = self.pc;
        (0..=self.ext).map(move |i| pc + INSTRUCTION_WIDTH * i + 1)
    }

    /// Resolves where a jump lands. `None` for non-jump instructions.
    pub fn jump_target(&self) -> Option<usize> {
        let arg = self.arg? as usize;
        match self.op.operand_kind() {
            OperandKind::RelativeJump => Some(self.end_pc() + arg),
            OperandKind::AbsoluteJump => Some(arg),
            _ => None,
        }
    }
}

/// Number of `EXTENDED_ARG` prefixes needed to encode `value`.
pub fn prefixes_for(value: u32) -> usize {
    match value {
        0..=0xff => 0,
        0x100..=0xffff => 1,
        0x1_0000..=0xff_ffff => 2,
        _ => 3,
    }
}

/// Decodes a wordcode stream into instructions.
///
/// `EXTENDED_ARG` chains are folded into the instruction they prefix; the folded instruction
/// keeps the offset of the first prefix so instruction boundaries stay intact.
pub fn decode(code: &[u8]) -> Result<Vec<Instruction>> {
    if !code.len().is_multiple_of(INSTRUCTION_WIDTH) {
        return Err(Error::OddLength(code.len()));
    }

    let mut instructions = Vec::with_capacity(code.len() / INSTRUCTION_WIDTH);
    let mut chain_start = 0usize;
    let mut ext = 0usize;
    let mut extended: u32 = 0;

    for (index, pair) in code.chunks_exact(INSTRUCTION_WIDTH).enumerate() {
        let pc = index * INSTRUCTION_WIDTH;
        let op = Opcode::parse(pair[0]);

        if op == Opcode::EXTENDED_ARG {
            if ext == 0 {
                chain_start = pc;
            }
            ext += 1;
            if ext > MAX_EXTENDED_ARGS {
                return Err(Error::OperandTooWide(chain_start));
            }
            extended = (extended | u32::from(pair[1])) << 8;
            continue;
        }

        let start = if ext > 0 { chain_start } else { pc };
        let arg = op
            .has_operand()
            .then_some(extended | u32::from(pair[1]));
        instructions.push(Instruction {
            pc: start,
            op,
            arg,
            ext,
        });
        ext = 0;
        extended = 0;
    }

    if ext > 0 {
        return Err(Error::DanglingExtendedArg(chain_start));
    }

    Ok(instructions)
}

/// Parses an assembly listing into instructions.
///
/// Each non-empty line holds `MNEMONIC [operand]`, optionally preceded by a six-digit hex
/// offset column as printed by the `Display` impl. `#` starts a comment. Offsets are
/// recomputed from the parsed instructions.
pub fn parse_assembly(asm: &str) -> Result<Vec<Instruction>> {
    let mut instructions = Vec::new();
    let mut pc = 0usize;

    for (line_no, raw) in asm.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let mut parts = line.split_whitespace().peekable();
        if parts
            .peek()
            .is_some_and(|first| first.len() == 6 && first.chars().all(|c| c.is_ascii_hexdigit()))
        {
            parts.next();
        }

        let mnemonic = parts.next().ok_or_else(|| Error::ParseError {
            line: line_no,
            msg: "missing opcode".to_string(),
            raw: raw.to_string(),
        })?;
        let op = Opcode::from_str(mnemonic).map_err(|msg| Error::ParseError {
            line: line_no,
            msg,
            raw: raw.to_string(),
        })?;
        if op == Opcode::EXTENDED_ARG {
            return Err(Error::ParseError {
                line: line_no,
                msg: "EXTENDED_ARG is implied by wide operands".to_string(),
                raw: raw.to_string(),
            });
        }

        let arg = match (op.has_operand(), parts.next()) {
            (true, Some(token)) => Some(parse_operand(token).ok_or_else(|| Error::ParseError {
                line: line_no,
                msg: format!("invalid operand '{token}'"),
                raw: raw.to_string(),
            })?),
            (true, None) => {
                return Err(Error::ParseError {
                    line: line_no,
                    msg: format!("{op} requires an operand"),
                    raw: raw.to_string(),
                });
            }
            (false, None) => None,
            (false, Some(token)) => {
                return Err(Error::ParseError {
                    line: line_no,
                    msg: format!("{op} takes no operand, found '{token}'"),
                    raw: raw.to_string(),
                });
            }
        };

        if let Some(extra) = parts.next() {
            return Err(Error::ParseError {
                line: line_no,
                msg: format!("unexpected token '{extra}'"),
                raw: raw.to_string(),
            });
        }

        let mut instruction = Instruction::new(op, arg);
        instruction.pc = pc;
        pc += instruction.byte_size();
        instructions.push(instruction);
    }

    Ok(instructions)
}

fn parse_operand(token: &str) -> Option<u32> {
    match token.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => token.parse().ok(),
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // pc: six-digit hex, opcode left-padded to 20 chars, then optional operand
        match self.arg {
            Some(arg) => write!(f, "{:06x}  {:<20} {}", self.pc, self.op, arg),
            None => write!(f, "{:06x}  {}", self.pc, self.op),
        }
    }
}
