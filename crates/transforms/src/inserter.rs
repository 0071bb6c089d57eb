//! Snippet insertion.

use crate::jump_retarget::{self, Retargeted};
use crate::mapping::InsertionMap;
use crate::merge::{SymbolKind, merge_table};
use crate::{Error, Result, lines};
use serde::{Deserialize, Serialize};
use suture_core::opcode::EPILOGUE;
use suture_core::{CodeUnit, HexBytes, validator};

/// Configuration for snippet insertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsertConfig {
    /// Length in bytes of the epilogue every snippet ends with
    pub epilogue_len: usize,
    /// Validate the rewritten unit before returning it
    pub validate: bool,
}

impl Default for InsertConfig {
    fn default() -> Self {
        Self {
            epilogue_len: EPILOGUE.len(),
            validate: true,
        }
    }
}

/// A successfully rewritten code unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rewrite {
    /// The new unit
    pub unit: CodeUnit,
    /// Offset in the original unit the snippet was inserted before
    pub offset: usize,
    /// Every byte range spliced in, in coordinates of the new unit
    pub insertions: InsertionMap,
}

/// Result of an insertion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// No instruction starts the requested line; nothing was done.
    Unchanged,
    Rewritten(Box<Rewrite>),
}

impl Outcome {
    pub fn rewritten(&self) -> Option<&Rewrite> {
        match self {
            Outcome::Rewritten(rewrite) => Some(rewrite.as_ref()),
            Outcome::Unchanged => None,
        }
    }
}

/// Inserts `snippet` into `target` in front of the first instruction of `before_line`.
///
/// The snippet's trailing epilogue is dropped, its symbol operands are moved past the
/// target's tables, and every jump and line table entry affected by the new bytes is
/// retargeted. Either a complete new unit is returned or nothing is: inputs are never
/// modified.
pub fn insert_code(
    target: &CodeUnit,
    snippet: &CodeUnit,
    before_line: u32,
    config: &InsertConfig,
) -> Result<Outcome> {
    tracing::debug!(
        "Inserting '{}' ({} bytes) into '{}' ({} bytes) before line {}",
        snippet.name,
        snippet.code.len(),
        target.name,
        target.code.len(),
        before_line
    );

    // Step 1: Resolve the line to an offset
    let Some(offset) = target.offset_of_line(before_line)? else {
        tracing::info!(
            "Line {} has no instruction start in '{}', leaving it unchanged",
            before_line,
            target.name
        );
        return Ok(Outcome::Unchanged);
    };
    tracing::debug!("  Line {} starts at offset {}", before_line, offset);

    // Step 2: Drop the epilogue
    let body = strip_epilogue(&snippet.code, config.epilogue_len)?;

    // Step 3: Merge symbol tables
    let names = merge_table(SymbolKind::Names, body, &target.names, &snippet.names)?;
    let constants = merge_table(
        SymbolKind::Constants,
        &names.code,
        &target.constants,
        &snippet.constants,
    )?;
    let locals = merge_table(
        SymbolKind::Locals,
        &constants.code,
        &target.locals,
        &snippet.locals,
    )?;
    tracing::debug!(
        "  Merged tables: {} names, {} constants, {} locals",
        names.table.len(),
        constants.table.len(),
        locals.table.len()
    );

    // Step 4: Place the snippet and retarget jumps
    let placed = jump_retarget::rebase(&locals.code, offset)?;
    let Retargeted { code, inserted } = jump_retarget::retarget(&target.code, offset, &placed)?;
    tracing::debug!(
        "  Spliced {} bytes in {} insertion(s)",
        inserted.total(),
        inserted.len()
    );

    // Step 5: Adjust the line table
    let line_table = lines::adjust(&target.line_table, &inserted)?;

    // Step 6: Assemble the new unit
    let local_count = local_count(locals.table.len())?;
    let unit = CodeUnit {
        code: HexBytes(code),
        names: names.table,
        constants: constants.table,
        local_count,
        locals: locals.table,
        line_table: HexBytes(line_table),
        ..target.clone()
    };

    if config.validate {
        validator::validate(&unit)?;
    }

    tracing::info!(
        "Inserted {} bytes into '{}' before line {} (offset {}), {} -> {} bytes",
        inserted.total(),
        unit.name,
        before_line,
        offset,
        target.code.len(),
        unit.code.len()
    );

    Ok(Outcome::Rewritten(Box::new(Rewrite {
        unit,
        offset,
        insertions: inserted,
    })))
}

fn local_count(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::TableTooLarge {
        kind: SymbolKind::Locals.label(),
        len,
    })
}

fn strip_epilogue(code: &[u8], epilogue_len: usize) -> Result<&[u8]> {
    let Some(split) = code.len().checked_sub(epilogue_len) else {
        return Err(Error::SnippetTooShort {
            len: code.len(),
            epilogue: epilogue_len,
        });
    };
    let (body, epilogue) = code.split_at(split);
    if epilogue_len == EPILOGUE.len() && epilogue != EPILOGUE {
        tracing::warn!(
            "Snippet ends with {:02x?} instead of the expected epilogue {:02x?}",
            epilogue,
            EPILOGUE
        );
    }
    Ok(body)
}
