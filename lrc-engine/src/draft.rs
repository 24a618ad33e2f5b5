//! The local composer's synchronization state machine.
//!
//! ```text
//! Idle ──first keystroke──► Composing
//!   ▲                           │ Init echo ∨ signet view
//!   │                           ▼
//!   │                   AwaitingCorrelation
//!   │                           │ the other one arrives
//!   │                           ▼
//!   └────────publish──── Publishable
//! ```
//!
//! Two facts must join before a draft can be durably published: the
//! host's Init echo carrying our message id, and a signet view from
//! the identity stream whose `lrc_id` matches it. The two streams
//! are independent and unordered relative to each other, so either
//! fact may arrive first; while a draft is in flight, signet views
//! that precede the echo are parked and matched retroactively.
//!
//! Publishing resets all correlation state immediately, so a stale
//! signet can never misattribute a later message.

use std::collections::HashMap;

use lrc_proto::{Event, MessageRecord, SignetView};

use crate::diff::{diff, utf16_units};
use crate::encode::encode_batch;

/// Where the draft currently stands. Derived from state, never
/// stored, so it cannot go stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftPhase {
    /// No message in flight.
    Idle,
    /// Text announced and syncing; no correlation fact yet.
    Composing,
    /// Exactly one of (message id, signet URI) known.
    AwaitingCorrelation,
    /// Both facts present — publish may proceed.
    Publishable,
}

/// Everything `publish` decides: the Pub event always goes on the
/// document stream; the record exists only when the signet
/// correlation completed in time.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishOutcome {
    pub pub_event: Event,
    pub record: Option<MessageRecord>,
}

/// Tracks the last text the remote side acknowledged, diffs each
/// local change against it, and joins the myid/signet facts that
/// gate publishing.
#[derive(Debug, Default)]
pub struct DraftSynchronizer {
    last_synced: Option<String>,
    my_id: Option<u32>,
    signet_uri: Option<String>,
    /// Signet views seen before our own id was known, by lrc id.
    parked_signets: HashMap<u32, String>,
}

impl DraftSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> DraftPhase {
        if self.last_synced.is_none() {
            return DraftPhase::Idle;
        }
        match (self.my_id.is_some(), self.signet_uri.is_some()) {
            (true, true) => DraftPhase::Publishable,
            (false, false) => DraftPhase::Composing,
            _ => DraftPhase::AwaitingCorrelation,
        }
    }

    /// The last text the remote side has acknowledged, if a draft is
    /// in flight.
    pub fn last_synced(&self) -> Option<&str> {
        self.last_synced.as_deref()
    }

    pub fn my_id(&self) -> Option<u32> {
        self.my_id
    }

    pub fn signet_uri(&self) -> Option<&str> {
        self.signet_uri.as_deref()
    }

    /// Fold in the current composer text, returning the events to
    /// send on the document stream.
    ///
    /// The first non-empty text announces the message: Init, then an
    /// Insert at offset 0 with the full text. Every later change
    /// becomes one EditBatch of the minimal diff against the last
    /// synced text. Unchanged text produces nothing.
    pub fn update(&mut self, text: &str) -> Vec<Event> {
        match &self.last_synced {
            None => {
                if text.is_empty() {
                    return Vec::new();
                }
                self.last_synced = Some(text.to_string());
                vec![Event::init(), Event::insert(0, text)]
            }
            Some(prev) => {
                if prev == text {
                    return Vec::new();
                }
                let script = diff(&utf16_units(prev), &utf16_units(text));
                let ops = encode_batch(&script);
                self.last_synced = Some(text.to_string());
                if ops.is_empty() {
                    Vec::new()
                } else {
                    vec![Event::edit_batch(ops)]
                }
            }
        }
    }

    /// Record the host's acknowledgment that `id` is ours, promoting
    /// any signet view that arrived ahead of it.
    pub fn observe_init_echo(&mut self, id: u32) {
        self.my_id = Some(id);
        if let Some(uri) = self.parked_signets.remove(&id) {
            self.signet_uri = Some(uri);
        }
    }

    /// Fold in a signet view from the identity stream.
    ///
    /// Views only matter while a draft is waiting for its Init echo:
    /// with no draft in flight, or with our own id already known, a
    /// non-matching view can never correlate and is dropped rather
    /// than parked — otherwise a busy channel would grow the park by
    /// one entry per message anyone publishes.
    pub fn observe_signet(&mut self, view: &SignetView) {
        if self.last_synced.is_none() {
            return;
        }
        match self.my_id {
            Some(id) if id == view.lrc_id => {
                self.signet_uri = Some(view.uri.clone());
            }
            Some(_) => {}
            None => {
                self.parked_signets.insert(view.lrc_id, view.uri.clone());
            }
        }
    }

    /// Commit the draft. Returns `None` when nothing is in flight.
    ///
    /// A Pub always goes out on the document stream. The durable
    /// record is built only when the signet correlation completed;
    /// otherwise the message stays visible in the transcript through
    /// the events already sent. All draft state resets either way.
    pub fn publish(
        &mut self,
        nick: Option<String>,
        color: Option<u32>,
        posted_at: impl Into<String>,
    ) -> Option<PublishOutcome> {
        let body = self.last_synced.take()?;
        let record = self
            .signet_uri
            .take()
            .map(|uri| MessageRecord::new(uri, body, nick, color.map(u64::from), posted_at));
        self.my_id = None;
        self.parked_signets.clear();
        Some(PublishOutcome {
            pub_event: Event::publish(),
            record,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lrc_proto::{Edit, SIGNET_VIEW_TYPE};

    fn signet(lrc_id: u32, uri: &str) -> SignetView {
        SignetView {
            record_type: SIGNET_VIEW_TYPE.to_string(),
            uri: uri.to_string(),
            issuer_handle: "host.example.com".into(),
            channel_uri: "at://did:plc:abc/org.xcvr.feed.channel/3k1".into(),
            lrc_id,
            author_handle: "alice.example.com".into(),
            started_at: "2024-11-05T12:30:00Z".into(),
        }
    }

    #[test]
    fn test_first_keystroke_sends_init_then_full_insert() {
        let mut draft = DraftSynchronizer::new();
        assert_eq!(draft.phase(), DraftPhase::Idle);

        let events = draft.update("hi");
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], Event::init());
        assert_eq!(events[1], Event::insert(0, "hi"));
        assert_eq!(draft.phase(), DraftPhase::Composing);
        assert_eq!(draft.last_synced(), Some("hi"));
    }

    #[test]
    fn test_empty_text_while_idle_sends_nothing() {
        let mut draft = DraftSynchronizer::new();
        assert!(draft.update("").is_empty());
        assert_eq!(draft.phase(), DraftPhase::Idle);
    }

    #[test]
    fn test_changes_become_one_edit_batch() {
        let mut draft = DraftSynchronizer::new();
        draft.update("hello");
        let events = draft.update("hallo");
        assert_eq!(events.len(), 1);
        match &events[0] {
            Event::EditBatch(batch) => {
                assert!(batch.id.is_none());
                assert_eq!(batch.edits.len(), 2);
                assert!(matches!(batch.edits[0], Edit::Delete(_)));
                assert!(matches!(batch.edits[1], Edit::Insert(_)));
            }
            other => panic!("expected EditBatch, got {other:?}"),
        }
        assert_eq!(draft.last_synced(), Some("hallo"));
    }

    #[test]
    fn test_unchanged_text_sends_nothing() {
        let mut draft = DraftSynchronizer::new();
        draft.update("hello");
        assert!(draft.update("hello").is_empty());
    }

    #[test]
    fn test_echo_then_signet_reaches_publishable() {
        let mut draft = DraftSynchronizer::new();
        draft.update("hi");
        draft.observe_init_echo(7);
        assert_eq!(draft.phase(), DraftPhase::AwaitingCorrelation);
        draft.observe_signet(&signet(7, "at://x/signet/1"));
        assert_eq!(draft.phase(), DraftPhase::Publishable);
        assert_eq!(draft.signet_uri(), Some("at://x/signet/1"));
    }

    #[test]
    fn test_signet_then_echo_reaches_publishable() {
        // Same two facts, opposite arrival order.
        let mut draft = DraftSynchronizer::new();
        draft.update("hi");
        draft.observe_signet(&signet(7, "at://x/signet/1"));
        assert_eq!(draft.phase(), DraftPhase::Composing);
        draft.observe_init_echo(7);
        assert_eq!(draft.phase(), DraftPhase::Publishable);
        assert_eq!(draft.signet_uri(), Some("at://x/signet/1"));
    }

    #[test]
    fn test_other_authors_signets_do_not_correlate() {
        let mut draft = DraftSynchronizer::new();
        draft.update("hi");
        draft.observe_init_echo(7);
        draft.observe_signet(&signet(9, "at://x/signet/other"));
        assert_eq!(draft.phase(), DraftPhase::AwaitingCorrelation);
        assert!(draft.signet_uri().is_none());
    }

    #[test]
    fn test_publish_when_publishable_builds_record() {
        let mut draft = DraftSynchronizer::new();
        draft.update("hello channel");
        draft.observe_init_echo(7);
        draft.observe_signet(&signet(7, "at://x/signet/1"));

        let outcome = draft
            .publish(Some("wanderer".into()), Some(33096), "2024-11-05T12:31:00Z")
            .unwrap();
        assert_eq!(outcome.pub_event, Event::publish());
        let record = outcome.record.unwrap();
        assert_eq!(record.signet_uri, "at://x/signet/1");
        assert_eq!(record.body, "hello channel");
        assert_eq!(record.color, Some(33096));

        // Everything resets so a stale correlation can't leak into
        // the next message.
        assert_eq!(draft.phase(), DraftPhase::Idle);
        assert!(draft.my_id().is_none());
        assert!(draft.signet_uri().is_none());
    }

    #[test]
    fn test_publish_without_signet_skips_record_but_clears_state() {
        let mut draft = DraftSynchronizer::new();
        draft.update("hello");
        draft.observe_init_echo(7);

        let outcome = draft.publish(None, None, "now").unwrap();
        assert_eq!(outcome.pub_event, Event::publish());
        assert!(outcome.record.is_none());
        assert_eq!(draft.phase(), DraftPhase::Idle);
    }

    #[test]
    fn test_publish_while_idle_is_none() {
        let mut draft = DraftSynchronizer::new();
        assert!(draft.publish(None, None, "now").is_none());
    }

    #[test]
    fn test_signets_while_idle_are_dropped() {
        let mut draft = DraftSynchronizer::new();
        for n in 0..1000 {
            draft.observe_signet(&signet(n, &format!("at://x/signet/{n}")));
        }
        assert!(draft.parked_signets.is_empty());

        // A later draft must not correlate against any of them.
        draft.update("hi");
        draft.observe_init_echo(3);
        assert_eq!(draft.phase(), DraftPhase::AwaitingCorrelation);
        assert!(draft.signet_uri().is_none());
    }

    #[test]
    fn test_signets_after_echo_are_not_parked() {
        let mut draft = DraftSynchronizer::new();
        draft.update("hi");
        draft.observe_init_echo(7);
        draft.observe_signet(&signet(9, "at://x/signet/other"));
        assert!(draft.parked_signets.is_empty());
    }

    #[test]
    fn test_parked_signets_cleared_on_publish() {
        let mut draft = DraftSynchronizer::new();
        draft.update("first");
        draft.observe_signet(&signet(3, "at://x/signet/stale"));
        draft.publish(None, None, "now");

        // New draft; echo for id 3 must not pick up the stale park.
        draft.update("second");
        draft.observe_init_echo(3);
        assert_eq!(draft.phase(), DraftPhase::AwaitingCorrelation);
        assert!(draft.signet_uri().is_none());
    }
}
