//! Minimal edit script between two UTF-16 code-unit sequences.
//!
//! The sequences are first segmented into atoms: a surrogate pair is
//! one atom, every other unit stands alone. The search never splits
//! an atom, so runs always hold whole scalar values — an insert body
//! that ends up in a `String` can never be left holding a lone
//! surrogate.
//!
//! The problem is modeled as a shortest-path search over the grid of
//! atom-coordinate pairs `(i, j)` with `0 ≤ i ≤ |A|`, `0 ≤ j ≤ |B|`:
//!
//! ```text
//!        B →
//!   A  (0,0)──del──►(1,0)
//!   ↓    │ ╲
//!       ins  keep (free, only if A[i] == B[j])
//!        │     ╲
//!      (0,1)   (1,1) ──► … ──► (|A|,|B|)
//! ```
//!
//! Diagonal (keep) edges are free, horizontal/vertical edges (delete/
//! insert) cost one. The frontier is a priority queue ordered by cost
//! ascending, then `i + j` descending — preferring nodes that have
//! consumed more of both sequences biases the result toward long
//! matching runs instead of scattered single-unit matches — then `i`
//! descending, which makes the order total over coordinates and the
//! resulting script fully deterministic. Each coordinate is expanded
//! at most once, bounding the search to `O(|A|·|B|)` steps; the first
//! pop of the terminal coordinate carries the true edit distance.
//!
//! Expanded nodes live in a growable arena and reference their
//! predecessor by index, so path reconstruction is a plain index walk
//! with no ownership cycles.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

/// The kind of one run in an edit script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    /// Units present in both sequences.
    Keep,
    /// Units present only in the new sequence.
    Add,
    /// Units present only in the old sequence.
    Delete,
}

/// A maximal run of same-kind steps, carrying its code-unit payload.
///
/// For `Keep` and `Delete` the units come from the old sequence, for
/// `Add` from the new one. Concatenating the `Keep` + `Delete` runs
/// reproduces the old sequence; `Keep` + `Add` reproduces the new.
/// Surrogate pairs never split across runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRun {
    pub kind: RunKind,
    pub units: Vec<u16>,
}

/// One expanded search node. `parent` is an index into the arena.
struct Node {
    cost: u32,
    a: usize,
    b: usize,
    parent: Option<usize>,
}

/// Heap key for the frontier. `BinaryHeap` is a max-heap, so the
/// ordering is inverted where "smaller is better".
#[derive(PartialEq, Eq)]
struct Frontier {
    cost: u32,
    sum: usize,
    a: usize,
    node: usize,
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .cmp(&self.cost)
            .then(self.sum.cmp(&other.sum))
            .then(self.a.cmp(&other.a))
            .then(other.node.cmp(&self.node))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Encode a string as the UTF-16 code units the wire protocol
/// addresses.
pub fn utf16_units(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}

fn is_high_surrogate(unit: u16) -> bool {
    (0xD800..=0xDBFF).contains(&unit)
}

fn is_low_surrogate(unit: u16) -> bool {
    (0xDC00..=0xDFFF).contains(&unit)
}

/// Segment a unit sequence into `(start, len)` atom spans. A high
/// surrogate followed by a low surrogate is one atom of two units.
fn atom_spans(units: &[u16]) -> Vec<(usize, usize)> {
    let mut spans = Vec::with_capacity(units.len());
    let mut i = 0;
    while i < units.len() {
        let len = if is_high_surrogate(units[i])
            && units.get(i + 1).is_some_and(|&u| is_low_surrogate(u))
        {
            2
        } else {
            1
        };
        spans.push((i, len));
        i += len;
    }
    spans
}

fn atom(units: &[u16], span: (usize, usize)) -> &[u16] {
    &units[span.0..span.0 + span.1]
}

/// Compute the minimal edit script transforming `a` into `b`,
/// expressed as merged [`EditRun`]s.
///
/// Pure function: identical inputs always return the identical
/// script. `O(|a|·|b|)` worst case, near-linear when the sequences
/// mostly agree — the common case for a single keystroke.
pub fn diff(a: &[u16], b: &[u16]) -> Vec<EditRun> {
    let a_atoms = atom_spans(a);
    let b_atoms = atom_spans(b);

    let mut arena: Vec<Node> = Vec::with_capacity(a_atoms.len() + b_atoms.len() + 1);
    let mut frontier: BinaryHeap<Frontier> = BinaryHeap::new();
    let mut seen: HashSet<(usize, usize)> = HashSet::new();

    push(&mut arena, &mut frontier, &mut seen, 0, 0, 0, None);

    let mut goal = None;
    while let Some(entry) = frontier.pop() {
        let node = entry.node;
        let (i, j, cost) = (arena[node].a, arena[node].b, arena[node].cost);
        if i == a_atoms.len() && j == b_atoms.len() {
            goal = Some(node);
            break;
        }
        if i < a_atoms.len()
            && j < b_atoms.len()
            && atom(a, a_atoms[i]) == atom(b, b_atoms[j])
        {
            push(&mut arena, &mut frontier, &mut seen, cost, i + 1, j + 1, Some(node));
        }
        if i < a_atoms.len() {
            push(&mut arena, &mut frontier, &mut seen, cost + 1, i + 1, j, Some(node));
        }
        if j < b_atoms.len() {
            push(&mut arena, &mut frontier, &mut seen, cost + 1, i, j + 1, Some(node));
        }
    }

    let Some(goal) = goal else {
        // Unreachable: delete/insert edges connect every coordinate
        // to the terminal one.
        return Vec::new();
    };

    // Walk predecessors terminal→root, then read the path forward.
    let mut path = Vec::new();
    let mut cursor = Some(goal);
    while let Some(idx) = cursor {
        path.push(idx);
        cursor = arena[idx].parent;
    }
    path.reverse();

    let mut runs: Vec<EditRun> = Vec::new();
    for step in path.windows(2) {
        let (prev, next) = (&arena[step[0]], &arena[step[1]]);
        let moved_a = next.a != prev.a;
        let moved_b = next.b != prev.b;
        let (kind, units) = if moved_a && moved_b {
            (RunKind::Keep, atom(a, a_atoms[prev.a]))
        } else if moved_a {
            (RunKind::Delete, atom(a, a_atoms[prev.a]))
        } else {
            (RunKind::Add, atom(b, b_atoms[prev.b]))
        };
        match runs.last_mut() {
            Some(run) if run.kind == kind => run.units.extend_from_slice(units),
            _ => runs.push(EditRun {
                kind,
                units: units.to_vec(),
            }),
        }
    }
    runs
}

fn push(
    arena: &mut Vec<Node>,
    frontier: &mut BinaryHeap<Frontier>,
    seen: &mut HashSet<(usize, usize)>,
    cost: u32,
    a: usize,
    b: usize,
    parent: Option<usize>,
) {
    if !seen.insert((a, b)) {
        return;
    }
    let node = arena.len();
    arena.push(Node { cost, a, b, parent });
    frontier.push(Frontier {
        cost,
        sum: a + b,
        a,
        node,
    });
}
