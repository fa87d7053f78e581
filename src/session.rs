//! Recognition sessions and their identifiers.
//!
//! A [`Session`] is one listen, capture, recognize cycle. It owns the
//! captured audio and is consumed by exactly one recognition request.

use uuid::Uuid;

/// Generate a fresh opaque session identifier.
///
/// Uses a random v4 UUID in simple (hyphen-free) form, so the value is safe
/// to embed in a URL path segment. Uniqueness is probabilistic; no state is
/// kept between calls.
pub fn new_session_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// A single capture awaiting recognition.
#[derive(Debug)]
pub struct Session {
    id: String,
    audio: Vec<u8>,
}

impl Session {
    /// Start a session for `audio` under a fresh identifier.
    pub fn new(audio: Vec<u8>) -> Self {
        Self {
            id: new_session_id(),
            audio,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn audio(&self) -> &[u8] {
        &self.audio
    }
}
