pub mod guard;
pub mod inserter;
pub mod jump_retarget;
pub mod lines;
pub mod mapping;
pub mod merge;

pub use inserter::{InsertConfig, Outcome, Rewrite, insert_code};
pub use mapping::InsertionMap;

use thiserror::Error;

/// Transform error type encompassing all insertion errors.
#[derive(Debug, Error)]
pub enum Error {
    /// A value does not fit the single byte reserved for it.
    #[error("{site}: value {value} exceeds the 255 capacity of one operand byte")]
    Capacity {
        /// The value that overflowed.
        value: usize,
        /// Where the value was headed (operand or line table entry).
        site: String,
    },

    /// Core operation failed.
    #[error("core operation failed: {0}")]
    Core(#[from] suture_core::result::Error),

    /// The requested insertion point is not the start of an instruction.
    #[error("insertion offset {0} is not an instruction boundary")]
    InvalidOffset(usize),

    /// A jump operand grew beyond what three `EXTENDED_ARG` prefixes can carry.
    #[error("jump at offset {0} needs an operand wider than 32 bits")]
    OperandTooWide(usize),

    /// A merged table has more entries than a code unit can count.
    #[error("{kind} table has {len} entries, more than a code unit can hold")]
    TableTooLarge {
        /// Which table overflowed.
        kind: &'static str,
        /// Number of entries after merging.
        len: usize,
    },

    /// The snippet cannot hold the epilogue it is expected to end with.
    #[error("snippet is {len} bytes long, shorter than its {epilogue}-byte epilogue")]
    SnippetTooShort {
        /// Snippet length in bytes.
        len: usize,
        /// Expected epilogue length in bytes.
        epilogue: usize,
    },
}

/// Transform result type
pub type Result<T> = std::result::Result<T, Error>;
