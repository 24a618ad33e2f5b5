//! Binary protocol for the LRC document-event stream.
//!
//! One encoded [`Event`] per WebSocket binary frame; no extra length
//! framing. Events are a tagged union over everything a channel host
//! can say about the live transcript: message lifecycle (`Init`,
//! `Pub`), text mutation (`Insert`, `Delete`, `EditBatch`), identity
//! announcements (`Set`, `Get`) and keepalives.
//!
//! All text offsets are UTF-16 code-unit indices, never code points
//! or grapheme clusters.
//!
//! Message ids are stamped by the host: outbound client events leave
//! `id` empty, inbound document events must carry one — an inbound
//! mutation without an id is a [`ProtocolError::MissingId`], which the
//! engine treats as a broken connection.

use serde::{Deserialize, Serialize};

/// Announces a new in-progress message. The host assigns the id and
/// echoes the event back; `echoed == Some(true)` marks the client's
/// own announcement coming back around.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Init {
    pub id: Option<u32>,
    pub nick: Option<String>,
    pub external_id: Option<String>,
    pub color: Option<u32>,
    pub echoed: Option<bool>,
}

/// Finalizes a message: it stops being live-edited and becomes part
/// of the permanent transcript.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pub {
    pub id: Option<u32>,
}

/// Inserts `body` at a UTF-16 offset in a message's text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insert {
    pub id: Option<u32>,
    pub utf16_index: u32,
    pub body: String,
}

/// Removes the code units in `[utf16_start, utf16_end)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delete {
    pub id: Option<u32>,
    pub utf16_start: u32,
    pub utf16_end: u32,
}

/// Client identity announcement (nick / external handle / color).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Set {
    pub nick: Option<String>,
    pub external_id: Option<String>,
    pub color: Option<u32>,
}

/// Topic probe. The client sends a sentinel value on connect; the
/// host answers with the channel topic filled in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Get {
    pub topic: Option<String>,
}

/// One step of an edit batch. Sub-op ids are ignored on apply — the
/// outer batch id wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Edit {
    Insert(Insert),
    Delete(Delete),
}

/// An ordered group of Insert/Delete ops applied atomically to one
/// message. Offsets are cursor-relative: each op addresses the text
/// as it stands after all prior ops in the same batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditBatch {
    pub id: Option<u32>,
    pub edits: Vec<Edit>,
}

/// Top-level protocol event.
///
/// Serialized with bincode for minimal overhead, exactly one event
/// per socket frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    Ping,
    Pong,
    Init(Init),
    Pub(Pub),
    Insert(Insert),
    Delete(Delete),
    Mute,
    Unmute,
    Set(Set),
    Get(Get),
    EditBatch(EditBatch),
}

impl Event {
    /// Create the announcement for a new local message (no id yet —
    /// the host assigns one and echoes it back).
    pub fn init() -> Self {
        Event::Init(Init::default())
    }

    /// Create a publish event for the client's own live message.
    pub fn publish() -> Self {
        Event::Pub(Pub::default())
    }

    /// Create an insert of `body` at a UTF-16 offset.
    pub fn insert(utf16_index: u32, body: impl Into<String>) -> Self {
        Event::Insert(Insert {
            id: None,
            utf16_index,
            body: body.into(),
        })
    }

    /// Create a delete of the span `[utf16_start, utf16_end)`.
    pub fn delete(utf16_start: u32, utf16_end: u32) -> Self {
        Event::Delete(Delete {
            id: None,
            utf16_start,
            utf16_end,
        })
    }

    /// Create an identity announcement.
    pub fn set(nick: Option<String>, external_id: Option<String>, color: Option<u32>) -> Self {
        Event::Set(Set {
            nick,
            external_id,
            color,
        })
    }

    /// Create a topic probe.
    pub fn get_topic(sentinel: impl Into<String>) -> Self {
        Event::Get(Get {
            topic: Some(sentinel.into()),
        })
    }

    /// Create an edit batch over the client's own live message.
    pub fn edit_batch(edits: Vec<Edit>) -> Self {
        Event::EditBatch(EditBatch { id: None, edits })
    }

    /// Serialize to binary wire format.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        bincode::serde::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| ProtocolError::Serialization(e.to_string()))
    }

    /// Deserialize from binary wire format.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let (event, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())
            .map_err(|e| ProtocolError::Deserialization(e.to_string()))?;
        Ok(event)
    }
}

/// Protocol errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    Serialization(String),
    Deserialization(String),
    /// An inbound document mutation arrived without a message id.
    MissingId(&'static str),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Serialization(e) => write!(f, "serialization error: {e}"),
            Self::Deserialization(e) => write!(f, "deserialization error: {e}"),
            Self::MissingId(kind) => write!(f, "inbound {kind} event missing message id"),
        }
    }
}

impl std::error::Error for ProtocolError {}
