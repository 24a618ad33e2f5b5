//! The single-threaded update loop state.
//!
//! [`ChannelEngine`] is the exclusive owner of the transcript and the
//! draft synchronizer; every mutation flows through
//! [`ChannelEngine::handle_session_event`] (or the local-composer
//! entry points) on one task. The session's background readers only
//! ever hand events over a channel, so nothing here needs a lock.
//!
//! The engine reports nothing itself: failures come back as values
//! and the transcript is exposed as ordered render handles for the
//! presentation layer to draw after every mutating apply.

use lrc_proto::{Event, ProtocolError, SignetView};

use crate::document::{Message, Transcript};
use crate::draft::{DraftPhase, DraftSynchronizer, PublishOutcome};
use crate::error::EngineError;
use crate::session::SessionEvent;

/// Per-channel engine state: one transcript, one draft, the topic.
/// Created on entering a channel session, dropped on disconnect.
#[derive(Debug, Default)]
pub struct ChannelEngine {
    transcript: Transcript,
    draft: DraftSynchronizer,
    topic: Option<String>,
}

impl ChannelEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one session event into the engine state.
    ///
    /// A returned error is terminal for the connection; the caller
    /// decides whether to tear down or reconnect.
    pub fn handle_session_event(&mut self, event: SessionEvent) -> Result<(), EngineError> {
        match event {
            SessionEvent::Document(event) => self.apply_event(event),
            SessionEvent::Signet(view) => {
                self.handle_signet(&view);
                Ok(())
            }
            SessionEvent::Fault(e) => Err(e),
            SessionEvent::Closed => Err(EngineError::Closed),
        }
    }

    /// Apply one inbound document-stream event.
    ///
    /// Mutating events without a message id are a hard decode error;
    /// the connection is considered broken.
    pub fn apply_event(&mut self, event: Event) -> Result<(), EngineError> {
        match event {
            Event::Ping | Event::Pong | Event::Mute | Event::Unmute | Event::Set(_) => Ok(()),
            Event::Init(init) => {
                let id = require_id(init.id, "init")?;
                if init.echoed == Some(true) {
                    self.draft.observe_init_echo(id);
                }
                self.transcript
                    .apply_init(id, init.nick, init.external_id, init.color);
                Ok(())
            }
            Event::Pub(p) => {
                let id = require_id(p.id, "pub")?;
                self.transcript.apply_pub(id);
                Ok(())
            }
            Event::Insert(ins) => {
                let id = require_id(ins.id, "insert")?;
                self.transcript.apply_insert(id, ins.utf16_index, &ins.body);
                Ok(())
            }
            Event::Delete(del) => {
                let id = require_id(del.id, "delete")?;
                self.transcript
                    .apply_delete(id, del.utf16_start, del.utf16_end);
                Ok(())
            }
            Event::Get(get) => {
                if let Some(topic) = get.topic {
                    self.topic = Some(topic);
                }
                Ok(())
            }
            Event::EditBatch(batch) => {
                let id = require_id(batch.id, "edit batch")?;
                self.transcript.apply_edit_batch(id, &batch.edits);
                Ok(())
            }
        }
    }

    /// Fold a signet view into the draft correlation.
    pub fn handle_signet(&mut self, view: &SignetView) {
        self.draft.observe_signet(view);
    }

    /// Fold in the local composer's current text, returning the
    /// events to put on the wire.
    pub fn compose(&mut self, text: &str) -> Vec<Event> {
        self.draft.update(text)
    }

    /// Commit the local draft. See [`DraftSynchronizer::publish`].
    pub fn publish(
        &mut self,
        nick: Option<String>,
        color: Option<u32>,
        posted_at: impl Into<String>,
    ) -> Option<PublishOutcome> {
        self.draft.publish(nick, color, posted_at)
    }

    pub fn draft_phase(&self) -> DraftPhase {
        self.draft.phase()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// The ordered render handles, by first appearance.
    pub fn render_handles(&self) -> impl Iterator<Item = (u32, &Message)> {
        self.transcript.in_order()
    }

    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }
}

fn require_id(id: Option<u32>, kind: &'static str) -> Result<u32, EngineError> {
    id.ok_or_else(|| ProtocolError::MissingId(kind).into())
}
