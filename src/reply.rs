//! `ReplyHandler` — the application→network half of a stream pair, and the
//! bulk of the adapter core (spec §4.3–§4.4).
//!
//! Tracks two independent credit budgets with [`CreditWindow`], defers a
//! trailing `id:` event into a pooled slot when the network side is short on
//! window, and turns an asynchronous CHALLENGE into a synthetic SSE event —
//! mirroring the way `h2::proto::streams::flow_control::FlowControl` keeps
//! send/recv windows apart while a stream's state enum gates which frames
//! are legal.

use bytes::{Bytes, BytesMut};

use crate::codec::{self, EventFlags, EventSpec, MAXIMUM_HEADER_SIZE};
use crate::collaborators::{BufferPool, Slot};
use crate::config::Config;
use crate::flow::CreditWindow;
use crate::frame::{
    BeginFrame, ChallengeFrame, DataFrame, EndFrame, Extension, Frame, FrameHeader, HeaderList,
    WindowFrame,
};
use crate::outbound::Outbound;

/// `streamState` from spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyState {
    BeforeBegin,
    AfterBeginOrData,
    Closed,
}

/// Per-stream-pair state owned by the application→network half.
#[derive(Debug)]
pub struct ReplyHandler {
    application_route_id: u64,
    application_reply_id: u64,
    network_route_id: u64,
    network_reply_id: u64,
    timestamp_requested: bool,

    state: ReplyState,

    network_reply_budget: CreditWindow,
    network_reply_padding: i32,
    /// Sentinel `-1` until the first WINDOW arrives; the first credit value
    /// until `networkReplyBudget` reaches it, then `0` forever.
    minimum_network_reply_budget: i32,

    application_reply_budget: CreditWindow,

    network_slot: Option<Slot>,
    network_slot_len: usize,
    deferred_end: bool,
}

impl ReplyHandler {
    pub fn new(
        application_route_id: u64,
        application_reply_id: u64,
        network_route_id: u64,
        network_reply_id: u64,
        timestamp_requested: bool,
    ) -> Self {
        ReplyHandler {
            application_route_id,
            application_reply_id,
            network_route_id,
            network_reply_id,
            timestamp_requested,
            state: ReplyState::BeforeBegin,
            network_reply_budget: CreditWindow::new(),
            network_reply_padding: 0,
            minimum_network_reply_budget: -1,
            application_reply_budget: CreditWindow::new(),
            network_slot: None,
            network_slot_len: 0,
            deferred_end: false,
        }
    }

    pub fn state(&self) -> ReplyState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == ReplyState::Closed
    }

    pub fn network_reply_id(&self) -> u64 {
        self.network_reply_id
    }

    pub fn application_reply_id(&self) -> u64 {
        self.application_reply_id
    }

    fn application_header(&self, trace_id: u64) -> FrameHeader {
        FrameHeader::new(self.application_route_id, self.application_reply_id, trace_id, 0)
    }

    fn network_header(&self, trace_id: u64) -> FrameHeader {
        FrameHeader::new(self.network_route_id, self.network_reply_id, trace_id, 0)
    }

    // ---- application → network -------------------------------------

    /// Dispatches one frame arriving from the application side, per spec
    /// §4.3's `BeforeBegin`/`AfterBeginOrData` table.
    pub fn on_application_frame(&mut self, frame: &Frame, pool: &mut dyn BufferPool) -> Vec<Outbound> {
        match self.state {
            ReplyState::BeforeBegin => self.handle_before_begin(frame),
            ReplyState::AfterBeginOrData => self.handle_after_begin(frame, pool),
            ReplyState::Closed => Vec::new(),
        }
    }

    fn handle_before_begin(&mut self, frame: &Frame) -> Vec<Outbound> {
        match frame {
            Frame::Begin(begin) => {
                let mut headers = HeaderList::new();
                headers.push(":status", "200");
                let content_type = if self.timestamp_requested {
                    "text/event-stream;ext=timestamp"
                } else {
                    "text/event-stream"
                };
                headers.push("content-type", content_type);
                self.state = ReplyState::AfterBeginOrData;
                tracing::debug!(reply_id = self.network_reply_id, "application begin; opening SSE response");
                vec![Outbound::ToNetwork(Frame::Begin(BeginFrame {
                    header: self.network_header(begin.header.trace_id),
                    extension: Some(Extension::HttpBegin(headers)),
                }))]
            }
            other => {
                tracing::warn!(
                    reply_id = self.application_reply_id,
                    kind = ?other.kind(),
                    "frame before application begin; resetting"
                );
                self.state = ReplyState::Closed;
                vec![Outbound::ToApplication(Frame::Reset(
                    self.application_header(other.header().trace_id),
                ))]
            }
        }
    }

    fn handle_after_begin(&mut self, frame: &Frame, pool: &mut dyn BufferPool) -> Vec<Outbound> {
        match frame {
            Frame::Data(data) => self.handle_application_data(data),
            Frame::End(end) => self.handle_application_end(end, pool),
            Frame::Abort(header) => {
                self.state = ReplyState::Closed;
                vec![Outbound::ToNetwork(Frame::Abort(self.network_header(header.trace_id)))]
            }
            _ => Vec::new(),
        }
    }

    fn handle_application_data(&mut self, data: &DataFrame) -> Vec<Outbound> {
        let data_length = data.payload.len().max(0) as i32;
        self.application_reply_budget.spend(data_length + data.padding);

        if self.application_reply_budget.is_negative() {
            tracing::warn!(
                reply_id = self.application_reply_id,
                "application data overdrew budget; resetting application, aborting network"
            );
            self.state = ReplyState::Closed;
            return vec![
                Outbound::ToApplication(Frame::Reset(self.application_header(data.header.trace_id))),
                Outbound::ToNetwork(Frame::Abort(self.network_header(data.header.trace_id))),
            ];
        }

        let ext = data.extension.as_ref().and_then(Extension::as_sse_data);
        let id = ext.and_then(|e| e.id.as_deref());
        let event_type = ext.and_then(|e| e.r#type.as_deref());
        let timestamp = if self.timestamp_requested {
            ext.map(|e| e.timestamp).unwrap_or(0)
        } else {
            0
        };

        let mut spec = EventSpec::new(EventFlags::INIT | EventFlags::FIN).timestamp(timestamp);
        if let Some(id) = id {
            spec = spec.id(id);
        }
        if let Some(ty) = event_type {
            spec = spec.event_type(ty);
        }
        if !data.payload.is_empty() {
            spec = spec.data(&data.payload);
        }

        let mut buf = BytesMut::with_capacity(codec::encoded_len(&spec));
        let written = codec::encode(&spec, &mut buf) as i32;
        self.network_reply_budget.spend(written + self.network_reply_padding);

        vec![Outbound::ToNetwork(Frame::Data(DataFrame {
            header: self.network_header(data.header.trace_id),
            payload: buf.freeze(),
            padding: self.network_reply_padding,
            extension: None,
        }))]
    }

    fn handle_application_end(&mut self, end: &EndFrame, pool: &mut dyn BufferPool) -> Vec<Outbound> {
        let id = end
            .extension
            .as_ref()
            .and_then(Extension::as_sse_end)
            .and_then(|e| e.id.as_deref());

        let Some(id) = id else {
            self.state = ReplyState::Closed;
            return vec![Outbound::ToNetwork(Frame::End(EndFrame {
                header: self.network_header(end.header.trace_id),
                extension: None,
            }))];
        };

        let spec = EventSpec::new(EventFlags::INIT | EventFlags::FIN).id(id);
        let mut buf = BytesMut::with_capacity(codec::encoded_len(&spec));
        let written = codec::encode(&spec, &mut buf) as i32;

        if self
            .network_reply_budget
            .try_spend(written + self.network_reply_padding)
        {
            self.state = ReplyState::Closed;
            return vec![
                Outbound::ToNetwork(Frame::Data(DataFrame {
                    header: self.network_header(end.header.trace_id),
                    payload: buf.freeze(),
                    padding: self.network_reply_padding,
                    extension: None,
                })),
                Outbound::ToNetwork(Frame::End(EndFrame {
                    header: self.network_header(end.header.trace_id),
                    extension: None,
                })),
            ];
        }

        match self.acquire_or_extend_slot(pool, &buf) {
            true => {
                self.deferred_end = true;
                tracing::debug!(
                    reply_id = self.network_reply_id,
                    "final id frame deferred to slot; waiting on next window"
                );
                Vec::new()
            }
            false => {
                tracing::warn!(
                    reply_id = self.network_reply_id,
                    "pool exhausted deferring final id frame; closing without it"
                );
                self.state = ReplyState::Closed;
                vec![Outbound::ToNetwork(Frame::End(EndFrame {
                    header: self.network_header(end.header.trace_id),
                    extension: None,
                }))]
            }
        }
    }

    // ---- network → application (throttle side) ----------------------

    /// Handles a WINDOW arriving from the HTTP peer, per spec §4.3.
    pub fn on_network_window(
        &mut self,
        window: &WindowFrame,
        pool: &mut dyn BufferPool,
        config: &Config,
    ) -> Vec<Outbound> {
        let mut out = Vec::new();

        self.network_reply_budget.grant(window.credit);
        self.network_reply_padding = window.padding;

        if self.minimum_network_reply_budget == -1 {
            self.minimum_network_reply_budget = window.credit;
            if let Some(comment) = config.initial_comment() {
                let spec = EventSpec::new(EventFlags::INIT | EventFlags::FIN).comment(comment);
                let mut buf = BytesMut::with_capacity(codec::encoded_len(&spec));
                let written = codec::encode(&spec, &mut buf) as i32;
                self.network_reply_budget.spend(written + self.network_reply_padding);
                debug_assert!(!self.network_reply_budget.is_negative());
                out.push(Outbound::ToNetwork(Frame::Data(DataFrame {
                    header: self.network_header(window.header.trace_id),
                    payload: buf.freeze(),
                    padding: self.network_reply_padding,
                    extension: None,
                })));
            }
        }

        if self.network_reply_budget.budget() < self.minimum_network_reply_budget {
            return out;
        }
        self.minimum_network_reply_budget = 0;

        if let Some(slot) = self.network_slot {
            let cost = self.network_slot_len as i32 + self.network_reply_padding;
            if self.network_reply_budget.try_spend(cost) {
                let payload = Bytes::copy_from_slice(&pool.buffer(slot)[..self.network_slot_len]);
                pool.release(slot);
                self.network_slot = None;
                self.network_slot_len = 0;
                out.push(Outbound::ToNetwork(Frame::Data(DataFrame {
                    header: self.network_header(window.header.trace_id),
                    payload,
                    padding: self.network_reply_padding,
                    extension: None,
                })));
                if self.deferred_end {
                    self.deferred_end = false;
                    self.state = ReplyState::Closed;
                    out.push(Outbound::ToNetwork(Frame::End(EndFrame {
                        header: self.network_header(window.header.trace_id),
                        extension: None,
                    })));
                }
            }
        }

        let application_reply_padding = self.network_reply_padding + MAXIMUM_HEADER_SIZE;
        let credit = self.network_reply_budget.budget() - self.application_reply_budget.budget();
        if credit > 0 {
            self.application_reply_budget.grant(credit);
            out.push(Outbound::ToApplication(Frame::Window(WindowFrame {
                header: self.application_header(window.header.trace_id),
                credit,
                padding: application_reply_padding,
                group_id: window.group_id,
                capabilities: 0,
            })));
        }

        out
    }

    /// Handles a RESET arriving from the HTTP peer, per spec §4.3.
    pub fn on_network_reset(&mut self, header: &FrameHeader) -> Vec<Outbound> {
        self.state = ReplyState::Closed;
        vec![Outbound::ToApplication(Frame::Reset(
            self.application_header(header.trace_id),
        ))]
    }

    /// Handles a CHALLENGE arriving from the HTTP peer, per spec §4.4.
    pub fn on_network_challenge(
        &mut self,
        challenge: &ChallengeFrame,
        pool: &mut dyn BufferPool,
        config: &Config,
    ) -> Vec<Outbound> {
        let Some(headers) = challenge.extension.as_http_challenge() else {
            return Vec::new();
        };

        let json = build_challenge_json(headers);
        let spec = EventSpec::new(EventFlags::INIT | EventFlags::FIN)
            .event_type(config.challenge_event_type().as_bytes())
            .data(&json);
        let mut buf = BytesMut::with_capacity(codec::encoded_len(&spec));
        let written = codec::encode(&spec, &mut buf) as i32;
        let cost = written + self.network_reply_padding;

        if self.network_reply_budget.budget() > cost {
            self.network_reply_budget.spend(cost);
            return vec![Outbound::ToNetwork(Frame::Data(DataFrame {
                header: self.network_header(challenge.header.trace_id),
                payload: buf.freeze(),
                padding: self.network_reply_padding,
                extension: None,
            }))];
        }

        if !self.acquire_or_extend_slot(pool, &buf) {
            tracing::warn!(reply_id = self.network_reply_id, "pool exhausted; dropping challenge");
        }
        Vec::new()
    }

    /// Appends `bytes` to the single held slot, acquiring one first if none
    /// is held yet. Returns `false` iff a new slot was needed and the pool
    /// could not supply one (`PoolExhausted`).
    fn acquire_or_extend_slot(&mut self, pool: &mut dyn BufferPool, bytes: &[u8]) -> bool {
        if self.network_slot.is_none() {
            let Some(slot) = pool.acquire(self.network_reply_id) else {
                return false;
            };
            pool.buffer(slot).clear();
            self.network_slot = Some(slot);
            self.network_slot_len = 0;
        }
        let slot = self.network_slot.expect("just ensured present");
        pool.buffer(slot).extend_from_slice(bytes);
        self.network_slot_len += bytes.len();
        true
    }
}

/// Builds `{"method": <value>, "headers": {...}}` per spec §4.4, with
/// `method` written first (and omitted entirely when absent) so the output
/// matches the literal byte sequence in spec §8 scenario 7 — a plain
/// `serde_json::Map` would alphabetize `headers` before `method`.
fn build_challenge_json(headers: &HeaderList) -> Vec<u8> {
    let mut out = String::from("{");

    if let Some(method) = headers.get_first(":method") {
        out.push_str("\"method\":");
        out.push_str(&serde_json::to_string(method).expect("string serialization cannot fail"));
        out.push(',');
    }

    out.push_str("\"headers\":{");
    let mut first = true;
    for (name, value) in headers.iter() {
        if HeaderList::is_pseudo(name) {
            continue;
        }
        if !first {
            out.push(',');
        }
        first = false;
        out.push_str(&serde_json::to_string(name).expect("string serialization cannot fail"));
        out.push(':');
        out.push_str(&serde_json::to_string(value).expect("string serialization cannot fail"));
    }
    out.push_str("}}");

    out.into_bytes()
}
