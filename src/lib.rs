//! Bridges HTTP subscriptions to an internal application-stream boundary,
//! framing outbound events as `text/event-stream` under a credit-based
//! window protocol.
//!
//! The six core components are, leaf-first: [`codec`] (pure SSE framing),
//! [`request`] (HTTP BEGIN classification), [`correlation`] (the pending-
//! handler map), [`initial`] (network→application half), [`reply`]
//! (application→network half, the bulk of the core), and [`factory`] (the
//! entry point that ties the rest together). See `DESIGN.md` for the
//! grounding of each module against the teacher repository.

pub mod codec;
pub mod collaborators;
pub mod config;
pub mod correlation;
pub mod factory;
pub mod flow;
pub mod frame;
pub mod initial;
pub mod outbound;
pub mod reply;
pub mod request;

pub use collaborators::{BufferPool, IdSupplier, Route, RouteResolver, Slot};
pub use config::Config;
pub use correlation::Correlations;
pub use factory::{NewStream, StreamFactory, SubscriptionIds};
pub use initial::InitialHandler;
pub use outbound::Outbound;
pub use reply::{ReplyHandler, ReplyState};
