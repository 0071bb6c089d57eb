//! Wordcode instruction set understood by the insertion engine.
//!
//! Every instruction occupies exactly two bytes: the opcode and a one-byte operand. Opcodes
//! below [`HAVE_ARGUMENT`] ignore their operand byte. Operands wider than one byte are
//! expressed by prefixing the instruction with one or more `EXTENDED_ARG` instructions, each
//! contributing the next-higher 8 bits, most-significant chunk first.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Width of every instruction in bytes.
pub const INSTRUCTION_WIDTH: usize = 2;

/// First opcode byte whose operand is meaningful.
pub const HAVE_ARGUMENT: u8 = 0x40;

/// Maximum number of `EXTENDED_ARG` prefixes in front of one instruction (32-bit operands).
pub const MAX_EXTENDED_ARGS: usize = 3;

/// Compiled-in "produce no value and exit" epilogue every snippet ends with.
pub const EPILOGUE: [u8; 2] = [0x31, 0x00];

/// How an opcode interprets its operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperandKind {
    /// Operand byte is ignored.
    None,
    /// Index into the name table.
    Name,
    /// Index into the constant table.
    Constant,
    /// Index into the local-variable table.
    Local,
    /// Forward distance measured from the end of the instruction.
    RelativeJump,
    /// Absolute byte offset into the instruction stream.
    AbsoluteJump,
    /// High-order bits for the next instruction's operand.
    Extended,
    /// Plain immediate value (argument counts, comparison kinds, unknown opcodes).
    Immediate,
}

impl OperandKind {
    /// Returns true for relative and absolute jumps.
    #[inline]
    pub fn is_jump(self) -> bool {
        matches!(self, OperandKind::RelativeJump | OperandKind::AbsoluteJump)
    }
}

macro_rules! opcodes {
    ($($name:ident = $byte:literal => $kind:ident),* $(,)?) => {
        /// A single wordcode opcode.
        #[allow(non_camel_case_types)]
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum Opcode {
            $($name,)*
            /// Any byte without a mnemonic. Carried through the engine untouched.
            UNKNOWN(u8),
        }

        impl Opcode {
            /// Maps a raw byte to its opcode. Never fails; unassigned bytes become `UNKNOWN`.
            pub fn parse(byte: u8) -> Self {
                match byte {
                    $($byte => Opcode::$name,)*
                    other => Opcode::UNKNOWN(other),
                }
            }

            /// Returns the byte encoding of this opcode.
            pub fn to_byte(self) -> u8 {
                match self {
                    $(Opcode::$name => $byte,)*
                    Opcode::UNKNOWN(byte) => byte,
                }
            }

            /// Classifies the operand of this opcode.
            pub fn operand_kind(self) -> OperandKind {
                match self {
                    $(Opcode::$name => OperandKind::$kind,)*
                    Opcode::UNKNOWN(byte) if byte >= HAVE_ARGUMENT => OperandKind::Immediate,
                    Opcode::UNKNOWN(_) => OperandKind::None,
                }
            }

            fn mnemonic(self) -> Option<&'static str> {
                match self {
                    $(Opcode::$name => Some(stringify!($name)),)*
                    Opcode::UNKNOWN(_) => None,
                }
            }
        }

        impl FromStr for Opcode {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(stringify!($name) => Ok(Opcode::$name),)*
                    other => other
                        .strip_prefix("UNKNOWN_0x")
                        .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                        .map(Opcode::UNKNOWN)
                        .ok_or_else(|| format!("unknown mnemonic '{other}'")),
                }
            }
        }
    };
}

opcodes! {
    NOP = 0x00 => None,
    POP_TOP = 0x01 => None,
    ROT_TWO = 0x02 => None,
    DUP_TOP = 0x03 => None,
    UNARY_NOT = 0x0a => None,
    BINARY_ADD = 0x10 => None,
    BINARY_SUBTRACT = 0x11 => None,
    BINARY_MULTIPLY = 0x12 => None,
    GET_ITER = 0x20 => None,
    POP_BLOCK = 0x21 => None,
    PRINT_EXPR = 0x28 => None,
    RETURN_VALUE = 0x30 => None,
    RETURN_NONE = 0x31 => None,

    LOAD_CONST = 0x40 => Constant,

    LOAD_NAME = 0x48 => Name,
    STORE_NAME = 0x49 => Name,
    DELETE_NAME = 0x4a => Name,
    LOAD_GLOBAL = 0x4b => Name,
    STORE_GLOBAL = 0x4c => Name,
    LOAD_ATTR = 0x4d => Name,
    STORE_ATTR = 0x4e => Name,
    IMPORT_NAME = 0x4f => Name,
    LOAD_METHOD = 0x50 => Name,

    LOAD_FAST = 0x58 => Local,
    STORE_FAST = 0x59 => Local,
    DELETE_FAST = 0x5a => Local,

    JUMP_FORWARD = 0x60 => RelativeJump,
    FOR_ITER = 0x61 => RelativeJump,
    SETUP_LOOP = 0x62 => RelativeJump,

    JUMP_ABSOLUTE = 0x68 => AbsoluteJump,
    POP_JUMP_IF_FALSE = 0x69 => AbsoluteJump,
    POP_JUMP_IF_TRUE = 0x6a => AbsoluteJump,
    JUMP_IF_FALSE_OR_POP = 0x6b => AbsoluteJump,
    JUMP_IF_TRUE_OR_POP = 0x6c => AbsoluteJump,

    CALL_FUNCTION = 0x70 => Immediate,
    CALL_METHOD = 0x71 => Immediate,
    BUILD_TUPLE = 0x72 => Immediate,
    COMPARE_OP = 0x73 => Immediate,

    EXTENDED_ARG = 0x7f => Extended,
}

impl Opcode {
    /// Returns true when the operand byte carries meaning for this opcode.
    #[inline]
    pub fn has_operand(self) -> bool {
        self.to_byte() >= HAVE_ARGUMENT
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mnemonic() {
            // `pad` keeps width/alignment flags working in listings.
            Some(name) => f.pad(name),
            None => f.pad(&format!("UNKNOWN_0x{:02x}", self.to_byte())),
        }
    }
}
