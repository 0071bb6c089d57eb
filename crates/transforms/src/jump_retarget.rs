//! Jump retargeting for byte-level insertions.
//!
//! Splicing bytes into a wordcode stream moves every instruction after the splice point, so
//! every jump that spans the splice point must grow by the inserted length. A grown operand
//! may no longer fit the prefixes it has, in which case `EXTENDED_ARG` instructions must be
//! inserted in front of the jump, which is itself an insertion that moves other jumps.
//!
//! [`retarget`] resolves this as a fixed point over a worklist of pending insertions:
//!
//! 1. Pop the next insertion and resolve the offset it splices at.
//! 2. Grow every jump that spans that offset. Operand chunks are written in place; chunks
//!    that have no slot are queued as an `EXTENDED_ARG` insertion in front of the jump.
//! 3. Splice the insertion into a fresh buffer.
//! 4. Move pending insertions and applied records at or after the splice point.
//!
//! The loop terminates: apart from the seed, every queued insertion adds at least one prefix
//! to a jump, and a jump never carries more than three prefixes (a 32-bit operand), so at
//! most `1 + 3 * jumps` insertions are ever processed.

use crate::mapping::InsertionMap;
use crate::{Error, Result, guard};
use std::collections::VecDeque;
use suture_core::opcode::{INSTRUCTION_WIDTH, MAX_EXTENDED_ARGS};
use suture_core::{Opcode, OperandKind, decoder};
use tracing::{debug, trace};

/// Where a pending insertion applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Anchor {
    /// Before the instruction starting at this offset.
    Offset(usize),
    /// In front of the prefix chain of the jump whose opcode sits at this offset.
    Prefix(usize),
    /// Nothing is spliced; absolute targets are displaced by this amount.
    Origin(usize),
}

impl Anchor {
    fn shift(&mut self, at: usize, len: usize) {
        match self {
            Anchor::Offset(offset) | Anchor::Prefix(offset) if *offset >= at => *offset += len,
            _ => {}
        }
    }
}

#[derive(Clone, Debug)]
struct Insertion {
    anchor: Anchor,
    bytes: Vec<u8>,
}

/// Where one operand chunk of a jump is stored.
#[derive(Clone, Copy, Debug)]
enum Slot {
    Stream(usize),
    Current(usize),
    Queued(usize, usize),
}

/// Output of [`retarget`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Retargeted {
    /// The new instruction stream.
    pub code: Vec<u8>,
    /// Every splice performed, in final coordinates.
    pub inserted: InsertionMap,
}

/// Splices `insert` into `code` before the instruction at `offset` and retargets jumps.
///
/// `insert` is taken as-is: its absolute jumps must already be expressed in the coordinates
/// of the combined stream (see [`rebase`]).
pub fn retarget(code: &[u8], offset: usize, insert: &[u8]) -> Result<Retargeted> {
    let boundary = offset == code.len()
        || decoder::decode(code)?
            .iter()
            .any(|ins| ins.pc == offset);
    if !boundary {
        return Err(Error::InvalidOffset(offset));
    }

    let mut worklist = Worklist::new(code, 0);
    worklist.pending.push_back(Insertion {
        anchor: Anchor::Offset(offset),
        bytes: insert.to_vec(),
    });
    worklist.run()?;

    Ok(Retargeted {
        code: worklist.code,
        inserted: worklist.inserted,
    })
}

/// Rewrites a standalone fragment that is about to be placed at `base`.
///
/// Absolute jump targets are fragment-local; each is displaced by `base`. Operands that
/// outgrow their width receive `EXTENDED_ARG` prefixes exactly as in [`retarget`], with the
/// fragment's absolute targets compared in combined-stream coordinates.
pub fn rebase(code: &[u8], base: usize) -> Result<Vec<u8>> {
    if base == 0 {
        return Ok(code.to_vec());
    }

    let mut worklist = Worklist::new(code, base);
    worklist.pending.push_back(Insertion {
        anchor: Anchor::Origin(base),
        bytes: Vec::new(),
    });
    worklist.run()?;

    debug!(
        "Rebased {}-byte fragment onto offset {} ({} bytes of prefixes added)",
        code.len(),
        base,
        worklist.inserted.total()
    );
    Ok(worklist.code)
}

struct Worklist {
    code: Vec<u8>,
    /// Combined-stream offset of `code[0]`, used for absolute targets.
    origin: usize,
    pending: VecDeque<Insertion>,
    inserted: InsertionMap,
}

impl Worklist {
    fn new(code: &[u8], origin: usize) -> Self {
        Self {
            code: code.to_vec(),
            origin,
            pending: VecDeque::new(),
            inserted: InsertionMap::new(),
        }
    }

    fn run(&mut self) -> Result<()> {
        let mut rounds = 0usize;
        while let Some(current) = self.pending.pop_front() {
            rounds += 1;
            self.apply(current)?;
        }
        debug!(
            "Worklist settled after {} round(s), {} insertion(s)",
            rounds,
            self.inserted.len()
        );
        Ok(())
    }

    /// Resolves the byte offset an anchor splices at.
    fn resolve(&self, anchor: Anchor) -> usize {
        match anchor {
            Anchor::Offset(offset) => offset,
            Anchor::Prefix(op_pc) => {
                let mut start = op_pc;
                while start >= INSTRUCTION_WIDTH
                    && self.code.get(start - INSTRUCTION_WIDTH)
                        == Some(&Opcode::EXTENDED_ARG.to_byte())
                {
                    start -= INSTRUCTION_WIDTH;
                }
                start
            }
            Anchor::Origin(_) => 0,
        }
    }

    fn apply(&mut self, mut current: Insertion) -> Result<()> {
        let at = self.resolve(current.anchor);
        let growth = match current.anchor {
            Anchor::Origin(displacement) => displacement,
            _ => current.bytes.len(),
        };
        trace!(
            "Applying {:?}: {} byte(s) at offset {}",
            current.anchor,
            growth,
            at
        );

        for ins in decoder::decode(&self.code)? {
            let kind = ins.op.operand_kind();
            if !kind.is_jump() {
                continue;
            }
            if ins.arg.is_none() {
                continue;
            }
            let op_pc = ins.op_pc();

            // Chunks not yet in the stream, most-significant first.
            let queued = self
                .pending
                .iter()
                .position(|p| p.anchor == Anchor::Prefix(op_pc));
            let own = current.anchor == Anchor::Prefix(op_pc);

            let mut slots = Vec::with_capacity(MAX_EXTENDED_ARGS + 1);
            if let Some(q) = queued {
                let count = self.pending[q].bytes.len() / INSTRUCTION_WIDTH;
                slots.extend((0..count).map(|i| Slot::Queued(q, INSTRUCTION_WIDTH * i + 1)));
            }
            if own {
                let count = current.bytes.len() / INSTRUCTION_WIDTH;
                slots.extend((0..count).map(|i| Slot::Current(INSTRUCTION_WIDTH * i + 1)));
            }
            slots.extend(ins.operand_positions().map(Slot::Stream));

            let mut value = 0usize;
            for slot in &slots {
                value = (value << 8) | usize::from(self.read(&current, *slot));
            }

            let grows = match (kind, current.anchor) {
                (OperandKind::AbsoluteJump, Anchor::Origin(_)) => true,
                (_, Anchor::Origin(_)) => false,
                (OperandKind::RelativeJump, _) => {
                    op_pc < at && at < op_pc + INSTRUCTION_WIDTH + value
                }
                (_, Anchor::Prefix(_)) => self.origin + at < value,
                _ => self.origin + at <= value,
            };
            if !grows {
                continue;
            }

            let grown = value + growth;
            let grown = u32::try_from(grown).map_err(|_| Error::OperandTooWide(ins.pc))?;
            debug!(
                "{} at pc={:#x}: operand {} -> {} ({} slot(s))",
                ins.op,
                ins.pc,
                value,
                grown,
                slots.len()
            );

            if let [slot] = slots.as_slice()
                && let Ok(byte) = guard::check(grown as usize)
            {
                self.write(&mut current, *slot, byte);
                continue;
            }

            let chunks = guard::chunks(grown);
            let spill = chunks.len().saturating_sub(slots.len());
            if slots.len() - 1 + spill > MAX_EXTENDED_ARGS {
                return Err(Error::OperandTooWide(ins.pc));
            }

            // Low chunks fill the existing slots right-aligned, zero-padded on the left.
            let mut padded = vec![0u8; slots.len().saturating_sub(chunks.len())];
            padded.extend_from_slice(&chunks[spill..]);
            for (slot, byte) in slots.iter().zip(padded) {
                self.write(&mut current, *slot, byte);
            }

            if spill > 0 {
                let prefix: Vec<u8> = chunks[..spill]
                    .iter()
                    .flat_map(|&chunk| [Opcode::EXTENDED_ARG.to_byte(), chunk])
                    .collect();
                debug!(
                    "Queueing {} EXTENDED_ARG prefix(es) in front of {} at pc={:#x}",
                    spill, ins.op, ins.pc
                );
                match queued {
                    Some(q) => {
                        let bytes = &mut self.pending[q].bytes;
                        let tail = std::mem::replace(bytes, prefix);
                        bytes.extend(tail);
                    }
                    None => self.pending.push_back(Insertion {
                        anchor: Anchor::Prefix(op_pc),
                        bytes: prefix,
                    }),
                }
            }
        }

        if let Anchor::Origin(_) = current.anchor {
            return Ok(());
        }

        let len = current.bytes.len();
        let mut spliced = Vec::with_capacity(self.code.len() + len);
        spliced.extend_from_slice(&self.code[..at]);
        spliced.extend_from_slice(&current.bytes);
        spliced.extend_from_slice(&self.code[at..]);
        self.code = spliced;

        for pending in self.pending.iter_mut() {
            pending.anchor.shift(at, len);
        }
        self.inserted.record(at, len);
        Ok(())
    }

    fn read(&self, current: &Insertion, slot: Slot) -> u8 {
        match slot {
            Slot::Stream(position) => self.code[position],
            Slot::Current(position) => current.bytes[position],
            Slot::Queued(entry, position) => self.pending[entry].bytes[position],
        }
    }

    fn write(&mut self, current: &mut Insertion, slot: Slot, byte: u8) {
        match slot {
            Slot::Stream(position) => self.code[position] = byte,
            Slot::Current(position) => current.bytes[position] = byte,
            Slot::Queued(entry, position) => self.pending[entry].bytes[position] = byte,
        }
    }
}
