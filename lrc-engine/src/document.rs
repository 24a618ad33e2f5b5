//! The replicated channel transcript.
//!
//! One [`Transcript`] per connected channel session, owned
//! exclusively by the update loop — no internal locking, because
//! nothing else may touch it. It maps protocol-assigned message ids
//! to message state and remembers the order in which ids were *first
//! observed* (by any operation kind), which is the display order and
//! never changes afterwards.
//!
//! Mutation is only possible through the `apply_*` entry points, so
//! the id lookup and the first-seen ordering can never drift apart.
//!
//! Offsets are tolerant: an insert past the end of a message pads
//! the gap with ASCII spaces, a delete past the end clamps to the
//! text length. Out-of-range offsets are never an error and never
//! panic.

use std::collections::HashMap;

use lrc_proto::Edit;

/// Message text addressed by UTF-16 code unit, the wire protocol's
/// only offset unit.
///
/// Kept as raw code units rather than a `String` so every wire
/// offset lands directly; display conversion is lossy, replacing any
/// unpaired surrogate a mid-pair edit may have produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Utf16Text {
    units: Vec<u16>,
}

impl Utf16Text {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_str(s: &str) -> Self {
        Self {
            units: s.encode_utf16().collect(),
        }
    }

    /// Length in UTF-16 code units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn units(&self) -> &[u16] {
        &self.units
    }

    /// Insert `body` at a code-unit offset. An offset past the end
    /// pads the gap with spaces first.
    pub fn insert(&mut self, index: u32, body: &str) {
        let index = index as usize;
        if index > self.units.len() {
            self.units.resize(index, b' ' as u16);
        }
        self.units.splice(index..index, body.encode_utf16());
    }

    /// Remove the code units in `[start, end)`. `end` clamps to the
    /// text length; an empty or fully out-of-range span is a no-op.
    pub fn delete(&mut self, start: u32, end: u32) {
        if end <= start {
            return;
        }
        let start = start as usize;
        let end = (end as usize).min(self.units.len());
        if start >= self.units.len() {
            return;
        }
        self.units.drain(start..end);
    }

    /// Lossy conversion for display.
    pub fn display(&self) -> String {
        String::from_utf16_lossy(&self.units)
    }
}

/// One transcript entry: display metadata plus the live-edited text.
/// `active` is true while the author is still editing, false once the
/// message has been published.
#[derive(Debug, Clone, Default)]
pub struct Message {
    pub nick: Option<String>,
    pub handle: Option<String>,
    pub color: Option<u32>,
    pub active: bool,
    text: Utf16Text,
}

impl Message {
    /// Placeholder created when an operation names an id we have
    /// never seen an Init for.
    fn stub() -> Self {
        Self {
            active: true,
            ..Self::default()
        }
    }

    pub fn text(&self) -> &Utf16Text {
        &self.text
    }

    pub fn display(&self) -> String {
        self.text.display()
    }
}

/// The transcript: id → message state, plus the stable first-seen
/// display order. Created on entering a channel, dropped on
/// disconnect.
#[derive(Debug, Default)]
pub struct Transcript {
    messages: HashMap<u32, Message>,
    order: Vec<u32>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite the message for `id` with empty text and
    /// fresh metadata. The whole-state overwrite makes duplicate
    /// delivery of the same Init harmless.
    pub fn apply_init(
        &mut self,
        id: u32,
        nick: Option<String>,
        handle: Option<String>,
        color: Option<u32>,
    ) {
        let message = self.touch(id);
        *message = Message {
            nick,
            handle,
            color,
            active: true,
            ..Message::stub()
        };
    }

    /// Insert `body` into a message's text, creating a stub entry if
    /// the id has never been seen.
    pub fn apply_insert(&mut self, id: u32, utf16_index: u32, body: &str) {
        self.touch(id).text.insert(utf16_index, body);
    }

    /// Delete a span from a message's text, creating a stub entry if
    /// the id has never been seen.
    pub fn apply_delete(&mut self, id: u32, utf16_start: u32, utf16_end: u32) {
        self.touch(id).text.delete(utf16_start, utf16_end);
    }

    /// Mark a message published. A publish for an id never locally
    /// observed is ignored — it creates no entry.
    pub fn apply_pub(&mut self, id: u32) {
        if let Some(message) = self.messages.get_mut(&id) {
            message.active = false;
        }
    }

    /// Apply each op of a batch in order, addressing the outer
    /// batch's id throughout (sub-op ids are overridden).
    pub fn apply_edit_batch(&mut self, id: u32, edits: &[Edit]) {
        for edit in edits {
            match edit {
                Edit::Insert(ins) => self.apply_insert(id, ins.utf16_index, &ins.body),
                Edit::Delete(del) => self.apply_delete(id, del.utf16_start, del.utf16_end),
            }
        }
    }

    pub fn get(&self, id: u32) -> Option<&Message> {
        self.messages.get(&id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Ids in first-appearance order.
    pub fn order(&self) -> &[u32] {
        &self.order
    }

    /// Messages in first-appearance order — the render handles the
    /// presentation layer iterates after every mutating apply.
    pub fn in_order(&self) -> impl Iterator<Item = (u32, &Message)> {
        self.order
            .iter()
            .filter_map(|id| self.messages.get(id).map(|m| (*id, m)))
    }

    /// Look up the message for `id`, appending to the display order
    /// on first appearance.
    fn touch(&mut self, id: u32) -> &mut Message {
        let order = &mut self.order;
        self.messages.entry(id).or_insert_with(|| {
            order.push(id);
            Message::stub()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lrc_proto::{Delete, Insert};

    #[test]
    fn test_utf16_insert_delete_roundtrip() {
        let mut text = Utf16Text::from_str("hello world");
        text.insert(5, ", cruel");
        assert_eq!(text.display(), "hello, cruel world");
        text.delete(5, 12);
        assert_eq!(text.display(), "hello world");
    }

    #[test]
    fn test_insert_past_end_pads_with_spaces() {
        // Length-2 text, insert at index 5: indices 2..4 get spaces,
        // "x" lands at index 5, final length 6.
        let mut text = Utf16Text::from_str("ab");
        text.insert(5, "x");
        assert_eq!(text.display(), "ab   x");
        assert_eq!(text.len(), 6);
    }

    #[test]
    fn test_delete_clamps_to_length() {
        let mut text = Utf16Text::from_str("abc");
        text.delete(1, 99);
        assert_eq!(text.display(), "a");
    }

    #[test]
    fn test_delete_degenerate_spans_are_noops() {
        let mut text = Utf16Text::from_str("abc");
        text.delete(2, 2);
        text.delete(3, 1);
        text.delete(50, 60);
        assert_eq!(text.display(), "abc");
    }

    #[test]
    fn test_utf16_offsets_count_surrogate_pairs() {
        // The crab is two code units; "!" goes after it, at index 2.
        let mut text = Utf16Text::from_str("🦀");
        assert_eq!(text.len(), 2);
        text.insert(2, "!");
        assert_eq!(text.display(), "🦀!");
    }

    #[test]
    fn test_init_creates_active_empty_message() {
        let mut transcript = Transcript::new();
        transcript.apply_init(7, Some("alice".into()), None, Some(0x008148));
        let message = transcript.get(7).unwrap();
        assert!(message.active);
        assert!(message.text().is_empty());
        assert_eq!(message.nick.as_deref(), Some("alice"));
    }

    #[test]
    fn test_reinit_overwrites_text_but_keeps_order() {
        let mut transcript = Transcript::new();
        transcript.apply_insert(1, 0, "first");
        transcript.apply_insert(2, 0, "second");
        transcript.apply_init(1, Some("alice".into()), None, None);
        assert_eq!(transcript.order(), &[1, 2]);
        assert!(transcript.get(1).unwrap().text().is_empty());
        assert_eq!(transcript.get(2).unwrap().display(), "second");
    }

    #[test]
    fn test_insert_on_unseen_id_creates_stub() {
        let mut transcript = Transcript::new();
        transcript.apply_insert(3, 0, "hi");
        let message = transcript.get(3).unwrap();
        assert!(message.active);
        assert!(message.nick.is_none());
        assert_eq!(message.display(), "hi");
    }

    #[test]
    fn test_insert_padding_scenario() {
        // Insert(index=5, "x") on length-2 text pads with spaces.
        let mut transcript = Transcript::new();
        transcript.apply_insert(3, 0, "ab");
        transcript.apply_insert(3, 5, "x");
        let message = transcript.get(3).unwrap();
        assert_eq!(message.text().len(), 6);
        assert_eq!(message.display(), "ab   x");
    }

    #[test]
    fn test_pub_on_unseen_id_is_noop() {
        let mut transcript = Transcript::new();
        transcript.apply_pub(42);
        assert!(transcript.is_empty());
        assert!(transcript.get(42).is_none());
    }

    #[test]
    fn test_pub_deactivates() {
        let mut transcript = Transcript::new();
        transcript.apply_insert(5, 0, "done");
        transcript.apply_pub(5);
        assert!(!transcript.get(5).unwrap().active);
        assert_eq!(transcript.get(5).unwrap().display(), "done");
    }

    #[test]
    fn test_first_appearance_order_is_stable() {
        // Touching ids [5, 2, 5, 9] in mixed operation kinds yields
        // first-seen order [5, 2, 9].
        let mut transcript = Transcript::new();
        transcript.apply_insert(5, 0, "a");
        transcript.apply_init(2, None, None, None);
        transcript.apply_delete(5, 0, 1);
        transcript.apply_insert(9, 0, "c");
        assert_eq!(transcript.order(), &[5, 2, 9]);

        let ids: Vec<u32> = transcript.in_order().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![5, 2, 9]);
    }

    #[test]
    fn test_edit_batch_overrides_sub_op_ids() {
        let mut transcript = Transcript::new();
        transcript.apply_insert(1, 0, "hello");
        let edits = vec![
            Edit::Delete(Delete {
                id: Some(999),
                utf16_start: 1,
                utf16_end: 2,
            }),
            Edit::Insert(Insert {
                id: Some(999),
                utf16_index: 1,
                body: "a".into(),
            }),
        ];
        transcript.apply_edit_batch(1, &edits);
        assert_eq!(transcript.get(1).unwrap().display(), "hallo");
        assert!(transcript.get(999).is_none());
    }
}
