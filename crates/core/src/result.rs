//! Core results and error types

use thiserror::Error;

/// Core error type encompassing all core module errors.
#[derive(Debug, Error)]
pub enum Error {
    /// An `EXTENDED_ARG` prefix is not followed by any instruction.
    #[error("dangling EXTENDED_ARG chain starting at offset {0}")]
    DanglingExtendedArg(usize),

    /// Failed to decode hex string.
    #[error("hex decode failed: {0}")]
    HexDecode(#[from] hex::FromHexError),

    /// A jump lands somewhere other than the start of an instruction.
    #[error("jump at offset {pc} targets {target}, which is not an instruction start")]
    InvalidJumpTarget {
        /// Offset of the jump instruction (start of its prefix chain).
        pc: usize,
        /// Decoded destination offset.
        target: usize,
    },

    /// An operand does not fit the width reserved for it.
    #[error("invalid operand: {0}")]
    InvalidOperand(String),

    /// A line table is malformed.
    #[error("invalid line table: {0}")]
    LineTable(String),

    /// A byte sequence that must hold whole instructions has an odd length.
    #[error("odd byte length {0}; every instruction is two bytes wide")]
    OddLength(usize),

    /// An instruction carries more `EXTENDED_ARG` prefixes than a 32-bit operand allows.
    #[error("operand of instruction at offset {0} is wider than 32 bits")]
    OperandTooWide(usize),

    /// Failed to parse assembly at the specified line.
    #[error("assembly parse error at line {line}: {msg} ⇒ `{raw}`")]
    ParseError {
        /// The line number where parsing failed.
        line: usize,
        /// Description of the parsing error.
        msg: String,
        /// The raw content that failed to parse.
        raw: String,
    },

    /// A symbol operand indexes past the end of its table.
    #[error("{table} index {index} at offset {pc} is out of range (table holds {len} entries)")]
    SymbolOutOfRange {
        /// Which table was indexed.
        table: &'static str,
        /// Offset of the referencing instruction.
        pc: usize,
        /// The operand value.
        index: usize,
        /// Length of the table.
        len: usize,
    },
}

/// Core result type
pub type Result<T> = std::result::Result<T, Error>;
