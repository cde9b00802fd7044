//! `SseEventCodec` — the pure function from `(flags, id?, type?, timestamp?,
//! data?, comment?)` to an on-wire SSE event-frame byte sequence.
//!
//! Field order and the fragment-termination rule follow the SSE grammar
//! exactly as laid out in the specification's §4.6; nothing here inspects
//! budgets or streams, matching `h2::frame::ping::Ping::encode`'s shape of
//! "take a `BufMut`, write bytes, done".

use bytes::{BufMut, Bytes, BytesMut};

bitflags::bitflags! {
    /// Fragment markers on an encoded SSE event. The two bits are
    /// independent: `INIT` marks the first fragment, `FIN` the last. A
    /// single-fragment event sets both.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EventFlags: u8 {
        const INIT = 0x01;
        const FIN  = 0x02;
    }
}

/// Upper bound on per-event SSE overhead: `data:` (5) + `id:` (3) + a
/// 255-byte id (255) + `event:` (6) + a 16-byte type (16) + three newlines
/// (3). Ids or types longer than these bounds must be truncated or rejected
/// upstream of this codec — it does not enforce the bound itself.
pub const MAXIMUM_HEADER_SIZE: i32 = 5 + 3 + 255 + 6 + 16 + 3;

/// Parameters for one encoded SSE event (or event fragment).
#[derive(Debug, Clone, Copy, Default)]
pub struct EventSpec<'a> {
    pub flags: EventFlags,
    pub id: Option<&'a [u8]>,
    pub event_type: Option<&'a [u8]>,
    /// `0` means "omit the `timestamp:` line".
    pub timestamp: i64,
    pub data: Option<&'a [u8]>,
    pub comment: Option<&'a [u8]>,
}

impl<'a> EventSpec<'a> {
    pub fn new(flags: EventFlags) -> Self {
        EventSpec {
            flags,
            ..Default::default()
        }
    }

    pub fn id(mut self, id: &'a [u8]) -> Self {
        self.id = Some(id);
        self
    }

    pub fn event_type(mut self, ty: &'a [u8]) -> Self {
        self.event_type = Some(ty);
        self
    }

    pub fn timestamp(mut self, ts: i64) -> Self {
        self.timestamp = ts;
        self
    }

    pub fn data(mut self, data: &'a [u8]) -> Self {
        self.data = Some(data);
        self
    }

    pub fn comment(mut self, comment: &'a [u8]) -> Self {
        self.comment = Some(comment);
        self
    }
}

/// Exact encoded length of `spec`, without writing anything. Callers check
/// this against remaining window budget before committing the frame to the
/// shared arena.
pub fn encoded_len(spec: &EventSpec<'_>) -> usize {
    let mut len = 0usize;

    if let Some(comment) = spec.comment {
        len += 1 + comment.len() + 1; // ":" <comment> "\n"
    }
    if let Some(id) = spec.id {
        if !id.is_empty() {
            len += 3 + id.len() + 1; // "id:" <id> "\n"
        }
    }
    if let Some(ty) = spec.event_type {
        len += 6 + ty.len() + 1; // "event:" <type> "\n"
    }
    if spec.timestamp != 0 {
        len += 10 + decimal_len(spec.timestamp) + 1; // "timestamp:" <n> "\n"
    }
    if let Some(data) = spec.data {
        len += 5 + data.len() + 1; // "data:" <data> "\n"
    }
    if spec.flags.contains(EventFlags::FIN) {
        len += 1; // blank line terminator
    }

    len
}

fn decimal_len(value: i64) -> usize {
    if value == 0 {
        return 1;
    }
    let mut n = value.unsigned_abs();
    let mut digits = 0;
    while n > 0 {
        digits += 1;
        n /= 10;
    }
    digits + usize::from(value < 0)
}

/// Encodes `spec` into `dst`, returning the number of bytes written.
///
/// Line order: comment, id, event-type, timestamp, data, then a blank line
/// iff `FIN` is set. When `INIT` is set without `FIN`, the blank line is
/// omitted so a subsequent fragment continuation-appends to the same
/// logical event.
pub fn encode(spec: &EventSpec<'_>, dst: &mut BytesMut) -> usize {
    let start = dst.len();

    if let Some(comment) = spec.comment {
        dst.put_u8(b':');
        dst.put_slice(comment);
        dst.put_u8(b'\n');
    }

    if let Some(id) = spec.id {
        if !id.is_empty() {
            dst.put_slice(b"id:");
            dst.put_slice(id);
            dst.put_u8(b'\n');
        }
    }

    if let Some(ty) = spec.event_type {
        dst.put_slice(b"event:");
        dst.put_slice(ty);
        dst.put_u8(b'\n');
    }

    if spec.timestamp != 0 {
        dst.put_slice(b"timestamp:");
        dst.put_slice(spec.timestamp.to_string().as_bytes());
        dst.put_u8(b'\n');
    }

    if let Some(data) = spec.data {
        dst.put_slice(b"data:");
        dst.put_slice(data);
        dst.put_u8(b'\n');
    }

    if spec.flags.contains(EventFlags::FIN) {
        dst.put_u8(b'\n');
    }

    dst.len() - start
}

/// Convenience wrapper over [`encode`] for callers that just want owned
/// bytes (tests, one-off encodes outside the hot path).
pub fn encode_to_bytes(spec: &EventSpec<'_>) -> Bytes {
    let mut buf = BytesMut::with_capacity(encoded_len(spec));
    encode(spec, &mut buf);
    buf.freeze()
}
