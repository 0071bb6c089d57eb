//! Module for the `decode` subcommand, which prints an annotated disassembly of a code unit.
//!
//! Each instruction is listed with its offset and full operand; line starts are shown in the
//! left margin and symbol operands are resolved against the unit's tables.

use async_trait::async_trait;
use clap::Args;
use std::collections::BTreeMap;
use std::error::Error;
use std::path::PathBuf;
use suture_core::decoder::{self, Instruction};
use suture_core::{CodeUnit, OperandKind};

/// Arguments for the `decode` subcommand.
#[derive(Args)]
pub struct DecodeArgs {
    /// JSON file holding the code unit.
    pub unit: PathBuf,
}

/// Executes the `decode` subcommand.
#[async_trait]
impl super::Command for DecodeArgs {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        let unit = super::read_unit(&self.unit).await?;
        println!(
            "{} ({}), first line {}, {} bytes",
            unit.qualified_name,
            unit.filename,
            unit.first_line,
            unit.code.len()
        );
        print!("{}", render_listing(&unit)?);
        Ok(())
    }
}

/// Renders the disassembly of `unit`, one instruction per line.
pub fn render_listing(unit: &CodeUnit) -> suture_core::result::Result<String> {
    let instructions = decoder::decode(&unit.code)?;
    let starts: BTreeMap<usize, u32> = unit.line_starts()?.into_iter().collect();

    let mut listing = String::new();
    for ins in &instructions {
        let margin = starts
            .get(&ins.pc)
            .map(|line| format!("{line:>5}"))
            .unwrap_or_else(|| " ".repeat(5));
        listing.push_str(&format!("{margin}  {ins}{}\n", annotate(unit, ins)));
    }
    Ok(listing)
}

fn annotate(unit: &CodeUnit, ins: &Instruction) -> String {
    let Some(arg) = ins.arg else {
        return String::new();
    };
    let index = arg as usize;
    let resolved = match ins.op.operand_kind() {
        OperandKind::Name => unit.names.get(index).cloned(),
        OperandKind::Constant => unit.constants.get(index).map(ToString::to_string),
        OperandKind::Local => unit.locals.get(index).cloned(),
        OperandKind::RelativeJump | OperandKind::AbsoluteJump => {
            ins.jump_target().map(|target| format!("to {target}"))
        }
        _ => return String::new(),
    };
    format!(" ({})", resolved.as_deref().unwrap_or("<out of range>"))
}
