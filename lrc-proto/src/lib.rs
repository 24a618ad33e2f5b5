//! # lrc-proto — Wire types for the live relay chat protocol
//!
//! Two independent streams cross the wire, and this crate owns the
//! types for both:
//!
//! ```text
//! ┌──────────────┐   binary frames    ┌──────────────┐
//! │ LRC client   │ ◄────────────────► │ channel host │
//! │              │  Event (bincode)   │              │
//! └──────┬───────┘                    └──────────────┘
//!        │
//!        │   JSON frames / HTTP bodies
//!        ▼
//! ┌──────────────┐
//! │ identity     │   $type-tagged lexicon records
//! │ layer        │   (signet views, channels, …)
//! └──────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`event`] — the binary document-event protocol: one
//!   bincode-encoded [`Event`] per WebSocket binary frame
//! - [`lexicon`] — the JSON records shared with the identity layer

pub mod event;
pub mod lexicon;

pub use event::{
    Delete, Edit, EditBatch, Event, Get, Init, Insert, ProtocolError, Pub, Set,
};
pub use lexicon::{
    ChannelView, MessageRecord, Profile, Resolution, SignetView, TypedRecord,
    MESSAGE_RECORD_TYPE, SIGNET_VIEW_TYPE,
};
