//! # lrc-engine — Live-editing synchronization engine for LRC
//!
//! The client-side core of a live relay chat: a replicated channel
//! transcript whose messages are edited character-by-character in
//! real time, and a local draft that is diffed into wire batches and
//! published as a durable signed record once the identity layer
//! correlates it.
//!
//! ## Architecture
//!
//! ```text
//! keystrokes ──► DraftSynchronizer ──► diff ──► encode ──┐
//!                                                        ▼
//!                                   ConnectionSession (outbound mpsc)
//!                                                        │
//!                                                        ▼ wire
//! wire ──► ConnectionSession (readers) ──► SessionEvent mpsc
//!                                                        │
//!                              single-threaded update loop
//!                                                        │
//!                  ┌─────────────────────────────────────┤
//!                  ▼                                     ▼
//!            Transcript.apply_*                 signet correlation
//!          (render handles out)               (unblocks publishing)
//! ```
//!
//! ## Modules
//!
//! - [`diff`] — minimal edit script over UTF-16 code units
//! - [`encode`] — edit script → cursor-relative wire op batch
//! - [`document`] — the replicated transcript and its apply rules
//! - [`draft`] — local composer state machine and publish gating
//! - [`session`] — sockets, background tasks, event channels
//! - [`engine`] — the update-loop owner tying it together
//! - [`directory`] — channel listing/resolution (HTTP)
//! - [`publish`] — durable record creation with one token-refresh
//!   retry
//! - [`error`] — the terminal failure taxonomy

pub mod diff;
pub mod directory;
pub mod document;
pub mod draft;
pub mod encode;
pub mod engine;
pub mod error;
pub mod publish;
pub mod session;

pub use diff::{diff, utf16_units, EditRun, RunKind};
pub use document::{Message, Transcript, Utf16Text};
pub use draft::{DraftPhase, DraftSynchronizer, PublishOutcome};
pub use encode::encode_batch;
pub use engine::ChannelEngine;
pub use error::EngineError;
pub use publish::{CreatedRecord, PublisherConfig, RecordPublisher};
pub use session::{ConnectionSession, SessionConfig, SessionEvent, TOPIC_SENTINEL};
