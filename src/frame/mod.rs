//! Frame kinds and the correlation identifiers shared by both transport
//! boundaries.
//!
//! The wire encoding of these frames (a 4-byte type-id prefix plus a
//! length-prefixed body) is the ambient binary framing format named in the
//! specification's external-interfaces section; this module only models the
//! decoded shape the core operates on, the way `h2::frame` models decoded
//! HTTP/2 frames above the octet-level `Head` parsing.

pub mod http;
pub mod sse;

pub use self::http::HeaderList;
pub use self::sse::{SseBeginExtension, SseDataExtension, SseEndExtension};

use bytes::Bytes;

/// Fields every frame carries, regardless of kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub route_id: u64,
    pub stream_id: u64,
    pub trace_id: u64,
    pub authorization: u64,
}

impl FrameHeader {
    pub fn new(route_id: u64, stream_id: u64, trace_id: u64, authorization: u64) -> Self {
        FrameHeader {
            route_id,
            stream_id,
            trace_id,
            authorization,
        }
    }

    /// Odd stream ids are client-originated (initial); even ids are replies.
    pub fn is_initial(&self) -> bool {
        self.stream_id & 1 == 1
    }

    pub fn is_reply(&self) -> bool {
        !self.is_initial()
    }

    /// Returns a copy of this header addressed to a different stream id,
    /// keeping the same route/trace/authorization — used when a handler
    /// replies on the paired id.
    pub fn with_stream_id(self, stream_id: u64) -> Self {
        FrameHeader { stream_id, ..self }
    }
}

/// Opaque envelope carried by BEGIN/DATA/END/CHALLENGE frames. Which variant
/// is legal depends on which boundary (HTTP or SSE) and which frame kind it
/// is attached to; callers pick it apart with `as_*` helpers below.
#[derive(Debug, Clone)]
pub enum Extension {
    HttpBegin(HeaderList),
    SseBegin(SseBeginExtension),
    SseData(SseDataExtension),
    SseEnd(SseEndExtension),
    HttpChallenge(HeaderList),
}

impl Extension {
    pub fn as_http_begin(&self) -> Option<&HeaderList> {
        match self {
            Extension::HttpBegin(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_sse_data(&self) -> Option<&SseDataExtension> {
        match self {
            Extension::SseData(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_sse_end(&self) -> Option<&SseEndExtension> {
        match self {
            Extension::SseEnd(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_http_challenge(&self) -> Option<&HeaderList> {
        match self {
            Extension::HttpChallenge(h) => Some(h),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BeginFrame {
    pub header: FrameHeader,
    pub extension: Option<Extension>,
}

#[derive(Debug, Clone)]
pub struct DataFrame {
    pub header: FrameHeader,
    pub payload: Bytes,
    /// Per-frame padding the sender is being charged for this frame, as
    /// reported by the peer's most recent WINDOW.
    pub padding: i32,
    pub extension: Option<Extension>,
}

#[derive(Debug, Clone)]
pub struct EndFrame {
    pub header: FrameHeader,
    pub extension: Option<Extension>,
}

#[derive(Debug, Clone, Copy)]
pub struct WindowFrame {
    pub header: FrameHeader,
    pub credit: i32,
    pub padding: i32,
    pub group_id: u32,
    pub capabilities: u8,
}

#[derive(Debug, Clone)]
pub struct ChallengeFrame {
    pub header: FrameHeader,
    pub extension: Extension,
}

/// A decoded frame crossing either transport boundary.
#[derive(Debug, Clone)]
pub enum Frame {
    Begin(BeginFrame),
    Data(DataFrame),
    End(EndFrame),
    Abort(FrameHeader),
    Window(WindowFrame),
    Reset(FrameHeader),
    Challenge(ChallengeFrame),
}

impl Frame {
    pub fn header(&self) -> &FrameHeader {
        match self {
            Frame::Begin(f) => &f.header,
            Frame::Data(f) => &f.header,
            Frame::End(f) => &f.header,
            Frame::Abort(h) => h,
            Frame::Window(f) => &f.header,
            Frame::Reset(h) => h,
            Frame::Challenge(f) => &f.header,
        }
    }

    pub fn kind(&self) -> FrameKind {
        match self {
            Frame::Begin(_) => FrameKind::Begin,
            Frame::Data(_) => FrameKind::Data,
            Frame::End(_) => FrameKind::End,
            Frame::Abort(_) => FrameKind::Abort,
            Frame::Window(_) => FrameKind::Window,
            Frame::Reset(_) => FrameKind::Reset,
            Frame::Challenge(_) => FrameKind::Challenge,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Begin,
    Data,
    End,
    Abort,
    Window,
    Reset,
    Challenge,
}

/// Bits an endpoint can announce in a WINDOW frame's capabilities mask.
/// Bit position equals the variant's ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Capability {
    Challenge = 0,
}

impl Capability {
    pub const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}
