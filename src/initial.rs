//! `InitialHandler` — the network→application half of a stream pair.
//!
//! Owns `connectInitialId` toward the application and the original odd
//! network stream id toward the HTTP peer. Forwards END/ABORT from the
//! network to the application, and relays WINDOW/RESET throttle signals the
//! application sends back toward the HTTP peer, the way `h2`'s
//! `proto::streams::Streams` shuttles a `Reason` between a stream's two
//! directions without holding any codec state of its own.

use crate::frame::{Capability, Frame, FrameHeader};
use crate::outbound::Outbound;

/// The network-side identity of a stream pair's initial half, plus enough of
/// the application side to forward frames there.
#[derive(Debug, Clone, Copy)]
pub struct InitialHandler {
    network_route_id: u64,
    application_route_id: u64,
    network_initial_id: u64,
    application_initial_id: u64,
    /// `acceptReplyId` — the id the paired `ReplyHandler` is registered
    /// under; used only to know what to clear on ABORT.
    accept_reply_id: u64,
}

impl InitialHandler {
    pub fn new(
        network_route_id: u64,
        application_route_id: u64,
        network_initial_id: u64,
        application_initial_id: u64,
        accept_reply_id: u64,
    ) -> Self {
        InitialHandler {
            network_route_id,
            application_route_id,
            network_initial_id,
            application_initial_id,
            accept_reply_id,
        }
    }

    pub fn accept_reply_id(&self) -> u64 {
        self.accept_reply_id
    }

    fn application_header(&self, trace_id: u64) -> FrameHeader {
        FrameHeader::new(self.application_route_id, self.application_initial_id, trace_id, 0)
    }

    fn network_header(&self, trace_id: u64) -> FrameHeader {
        FrameHeader::new(self.network_route_id, self.network_initial_id, trace_id, 0)
    }

    /// Handles a frame arriving on the network stream, per spec §4.2.
    ///
    /// `correlation_present` reports whether a correlation entry still
    /// exists under `acceptReplyId` at the moment of an ABORT — callers pass
    /// the result of probing (and, if present, removing) their
    /// `Correlations` map, since this type holds no map reference itself.
    pub fn on_network_frame(&mut self, frame: &Frame, correlation_removed: bool) -> Vec<Outbound> {
        match frame {
            Frame::Begin(_) => Vec::new(),
            Frame::End(end) => {
                tracing::debug!(initial_id = self.application_initial_id, "network end; forwarding to application");
                vec![Outbound::ToApplication(Frame::End(crate::frame::EndFrame {
                    header: self.application_header(end.header.trace_id),
                    extension: None,
                }))]
            }
            Frame::Abort(header) => {
                tracing::debug!(initial_id = self.application_initial_id, "network abort; forwarding to application");
                let mut out = vec![Outbound::ToApplication(Frame::Abort(
                    self.application_header(header.trace_id),
                ))];
                if correlation_removed {
                    out.push(Outbound::ClearThrottle(self.accept_reply_id));
                }
                out
            }
            other => {
                tracing::warn!(
                    initial_id = self.network_initial_id,
                    kind = ?other.kind(),
                    "unexpected frame kind on network initial stream; resetting"
                );
                vec![Outbound::ToNetwork(Frame::Reset(
                    self.network_header(other.header().trace_id),
                ))]
            }
        }
    }

    /// Handles a throttle signal (WINDOW/RESET) arriving from the
    /// application side, relaying it toward the HTTP peer, per spec §4.2.
    pub fn on_application_throttle(&mut self, frame: &Frame) -> Vec<Outbound> {
        match frame {
            Frame::Window(window) => {
                let capabilities = window.capabilities | Capability::Challenge.bit();
                vec![Outbound::ToNetwork(Frame::Window(crate::frame::WindowFrame {
                    header: self.network_header(window.header.trace_id),
                    credit: window.credit,
                    padding: window.padding,
                    group_id: window.group_id,
                    capabilities,
                }))]
            }
            Frame::Reset(header) => {
                vec![Outbound::ToNetwork(Frame::Reset(
                    self.network_header(header.trace_id),
                ))]
            }
            _ => Vec::new(),
        }
    }
}
