//! SSE-side extension payloads carried by the application boundary's BEGIN,
//! DATA, and END frames.

use bytes::Bytes;

/// Carried by the SSE BEGIN frame the factory emits toward the application.
#[derive(Debug, Clone, Default)]
pub struct SseBeginExtension {
    pub path_info: Option<String>,
    pub last_event_id: Option<String>,
}

/// Carried by an application DATA frame.
#[derive(Debug, Clone, Default)]
pub struct SseDataExtension {
    /// Milliseconds-since-epoch; `0` means "no timestamp".
    pub timestamp: i64,
    pub id: Option<Bytes>,
    pub r#type: Option<Bytes>,
}

/// Carried by an application END frame that wants to emit a terminal,
/// identified event before closing.
#[derive(Debug, Clone, Default)]
pub struct SseEndExtension {
    pub id: Option<Bytes>,
}
