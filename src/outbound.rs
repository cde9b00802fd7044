//! What a handler wants the surrounding runtime to do after processing one
//! frame. Handlers never call a sink directly — they hand back a list of
//! actions, the way a pure function would, and the external dispatcher
//! (out of scope per the specification) performs the actual delivery.

use crate::frame::Frame;

/// One action resulting from a single frame dispatch.
#[derive(Debug, Clone)]
pub enum Outbound {
    /// Deliver `Frame` to the application side.
    ToApplication(Frame),
    /// Deliver `Frame` to the network (HTTP) side.
    ToNetwork(Frame),
    /// The correlation/throttle registration for this stream id should be
    /// torn down; the handler that owned it has terminated.
    ClearThrottle(u64),
}
