//! Turns an edit script into the wire-level batch of operations.
//!
//! The batch offset contract: every op's offset addresses the text as
//! it stands *after all prior ops in the same batch*, tracked by an
//! implicit cursor starting at 0.
//!
//! - `Keep` advances the cursor by the run length and emits nothing.
//! - `Add` emits `Insert` at the cursor, then advances by the run
//!   length.
//! - `Delete` emits `Delete` over `[cursor, cursor + len)` and does
//!   not advance — the deleted span collapses, so the next op applies
//!   at the same position.

use lrc_proto::{Delete, Edit, Insert};

use crate::diff::{EditRun, RunKind};

/// Encode an edit script into an ordered op batch.
///
/// Applying the ops in order to the old text reproduces the new text
/// exactly (under the document store's own apply rules). Relies on
/// the planner keeping surrogate pairs whole within runs, so an Add
/// run's units always form a valid insert body.
pub fn encode_batch(script: &[EditRun]) -> Vec<Edit> {
    let mut cursor: u32 = 0;
    let mut ops = Vec::new();
    for run in script {
        let len = run.units.len() as u32;
        match run.kind {
            RunKind::Keep => cursor += len,
            RunKind::Add => {
                ops.push(Edit::Insert(Insert {
                    id: None,
                    utf16_index: cursor,
                    body: String::from_utf16_lossy(&run.units),
                }));
                cursor += len;
            }
            RunKind::Delete => {
                ops.push(Edit::Delete(Delete {
                    id: None,
                    utf16_start: cursor,
                    utf16_end: cursor + len,
                }));
            }
        }
    }
    ops
}
