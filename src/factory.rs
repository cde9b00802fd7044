//! `StreamFactory` — the entry point of the adapter core (spec §4.1).
//!
//! Classifies an inbound BEGIN the way `h2::server::Peer::convert_poll_message`
//! classifies an inbound HEADERS frame into a typed request before anything
//! downstream touches it, then wires up the two halves of a stream pair the
//! way `h2::server::Builder::handshake` wires a fresh `Connection`. Unlike
//! `h2`, there is no accept loop here: one call classifies exactly one BEGIN.

use crate::collaborators::{IdSupplier, Route, RouteResolver};
use crate::config::Config;
use crate::correlation::Correlations;
use crate::frame::{BeginFrame, EndFrame, Extension, Frame, FrameHeader, HeaderList, SseBeginExtension, WindowFrame};
use crate::initial::InitialHandler;
use crate::outbound::Outbound;
use crate::reply::ReplyHandler;
use crate::request::{self, ParsedRequest};

/// Identifiers minted for a freshly classified subscription, handed back so
/// the caller can register the returned [`InitialHandler`] for throttle
/// delivery and route subsequent application frames.
#[derive(Debug, Clone, Copy)]
pub struct SubscriptionIds {
    /// The id frames toward the application are addressed from; register
    /// the returned `InitialHandler`'s throttle callback under this id.
    pub connect_initial_id: u64,
    /// The id the application must reply on; owned by `Correlations` until
    /// the application's BEGIN arrives.
    pub connect_reply_id: u64,
    /// The id the paired `ReplyHandler`'s throttle callback should be
    /// registered under once it becomes active.
    pub accept_reply_id: u64,
}

/// Outcome of classifying one inbound frame.
pub enum NewStream {
    /// Not a BEGIN, or an application BEGIN with no matching correlation.
    None,
    /// A CORS preflight or method-rejection short-circuit: no handler is
    /// created, `outbound` carries the whole response.
    Rejected(Vec<Outbound>),
    /// A fresh SSE subscription was classified. `initial` should be
    /// registered under `ids.connect_initial_id`; the paired `ReplyHandler`
    /// already lives in `Correlations` under `ids.connect_reply_id`.
    Subscribed {
        outbound: Vec<Outbound>,
        ids: SubscriptionIds,
        initial: InitialHandler,
    },
    /// The application's reply BEGIN matched a pending correlation entry;
    /// the caller now owns this handler and should dispatch the BEGIN to it.
    ReplyBegin(ReplyHandler),
}

/// Classifies inbound BEGIN frames and builds stream-pair handlers.
///
/// Stateless beyond its `Config`: everything else it needs (id minting,
/// route resolution, the correlation map) is passed in by the caller, the
/// way `h2::server::Builder` only holds `Settings` and takes the I/O object
/// as a parameter to `handshake` rather than owning it.
#[derive(Debug, Clone, Default)]
pub struct StreamFactory {
    config: Config,
}

impl StreamFactory {
    pub fn new(config: Config) -> Self {
        StreamFactory { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Classifies `frame`, per spec §4.1.
    pub fn new_stream(
        &self,
        frame: &Frame,
        ids: &mut dyn IdSupplier,
        router: &mut dyn RouteResolver,
        correlations: &mut Correlations<ReplyHandler>,
    ) -> NewStream {
        let Frame::Begin(begin) = frame else {
            return NewStream::None;
        };

        if begin.header.is_reply() {
            return match correlations.remove(begin.header.stream_id) {
                Some(reply) => NewStream::ReplyBegin(reply),
                None => NewStream::None,
            };
        }

        let Some(headers) = begin.extension.as_ref().and_then(Extension::as_http_begin) else {
            tracing::debug!(stream_id = begin.header.stream_id, "BEGIN without HTTP extension; not an SSE subscription");
            return NewStream::None;
        };

        let parsed = request::parse(headers);

        if parsed.is_cors_preflight {
            tracing::debug!(stream_id = begin.header.stream_id, "CORS preflight");
            return NewStream::Rejected(cors_preflight_response(&begin.header));
        }

        if parsed.method.as_deref() != Some("GET") {
            tracing::debug!(
                stream_id = begin.header.stream_id,
                method = ?parsed.method,
                "method not allowed on SSE endpoint"
            );
            return NewStream::Rejected(method_not_allowed_response(&begin.header));
        }

        self.subscribe(&begin.header, &parsed, ids, router, correlations)
    }

    fn subscribe(
        &self,
        network_begin_header: &FrameHeader,
        parsed: &ParsedRequest,
        ids: &mut dyn IdSupplier,
        router: &mut dyn RouteResolver,
        correlations: &mut Correlations<ReplyHandler>,
    ) -> NewStream {
        let route_id = network_begin_header.route_id;
        let path_info = parsed.path_info.clone();
        let path_prefix_matches: &dyn Fn(&str) -> bool = &|prefix: &str| {
            path_info.as_deref().is_some_and(|p| p.starts_with(prefix))
        };

        let Some(Route { id: resolved_route_id }) =
            router.resolve(route_id, network_begin_header.authorization, path_prefix_matches)
        else {
            tracing::debug!(route_id, "no route matches SSE subscription");
            return NewStream::None;
        };

        let network_initial_id = network_begin_header.stream_id;
        let network_reply_id = ids.supply_reply_id(network_initial_id);
        let connect_initial_id = ids.supply_initial_id(resolved_route_id);
        let connect_reply_id = ids.supply_reply_id(connect_initial_id);
        let trace_id = ids.supply_trace_id();

        let initial = InitialHandler::new(
            resolved_route_id,
            resolved_route_id,
            network_initial_id,
            connect_initial_id,
            network_reply_id,
        );
        let reply = ReplyHandler::new(
            resolved_route_id,
            connect_reply_id,
            resolved_route_id,
            network_reply_id,
            parsed.timestamp_requested,
        );
        correlations.insert(connect_reply_id, reply);

        tracing::debug!(
            network_initial_id,
            connect_initial_id,
            connect_reply_id,
            network_reply_id,
            "subscribed SSE stream"
        );

        let begin_extension = SseBeginExtension {
            path_info: parsed.path_info.clone(),
            last_event_id: parsed.last_event_id.clone(),
        };
        let outbound = vec![Outbound::ToApplication(Frame::Begin(BeginFrame {
            header: FrameHeader::new(
                resolved_route_id,
                connect_initial_id,
                trace_id,
                network_begin_header.authorization,
            ),
            extension: Some(Extension::SseBegin(begin_extension)),
        }))];

        NewStream::Subscribed {
            outbound,
            ids: SubscriptionIds {
                connect_initial_id,
                connect_reply_id,
                accept_reply_id: network_reply_id,
            },
            initial,
        }
    }
}

fn ack_zero_window(header: &FrameHeader) -> Outbound {
    Outbound::ToNetwork(Frame::Window(WindowFrame {
        header: *header,
        credit: 0,
        padding: 0,
        group_id: 0,
        capabilities: 0,
    }))
}

fn cors_preflight_response(header: &FrameHeader) -> Vec<Outbound> {
    let mut headers = HeaderList::new();
    headers.push(":status", "204");
    headers.push("access-control-allow-methods", "GET");
    vec![
        ack_zero_window(header),
        Outbound::ToNetwork(Frame::Begin(BeginFrame {
            header: *header,
            extension: Some(Extension::HttpBegin(headers)),
        })),
        Outbound::ToNetwork(Frame::End(EndFrame {
            header: *header,
            extension: None,
        })),
    ]
}

fn method_not_allowed_response(header: &FrameHeader) -> Vec<Outbound> {
    let mut headers = HeaderList::new();
    headers.push(":status", "405");
    vec![
        ack_zero_window(header),
        Outbound::ToNetwork(Frame::Begin(BeginFrame {
            header: *header,
            extension: Some(Extension::HttpBegin(headers)),
        })),
        Outbound::ToNetwork(Frame::End(EndFrame {
            header: *header,
            extension: None,
        })),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::fakes::{SequentialIds, StaticRoutes};

    fn headers(pairs: &[(&str, &str)]) -> HeaderList {
        let mut h = HeaderList::new();
        for (n, v) in pairs {
            h.push(*n, *v);
        }
        h
    }

    fn begin(header: FrameHeader, pairs: &[(&str, &str)]) -> Frame {
        Frame::Begin(BeginFrame {
            header,
            extension: Some(Extension::HttpBegin(headers(pairs))),
        })
    }

    #[test]
    fn cors_preflight_short_circuits_without_handler() {
        let factory = StreamFactory::new(Config::default());
        let mut ids = SequentialIds::new(10);
        let mut router = StaticRoutes::with_route(1, None);
        let mut correlations = Correlations::new();

        let frame = begin(
            FrameHeader::new(1, 7, 0, 0),
            &[
                (":method", "OPTIONS"),
                ("access-control-request-method", "GET"),
            ],
        );

        match factory.new_stream(&frame, &mut ids, &mut router, &mut correlations) {
            NewStream::Rejected(outbound) => {
                assert_eq!(outbound.len(), 3);
                assert!(matches!(outbound[0], Outbound::ToNetwork(Frame::Window(_))));
                match &outbound[1] {
                    Outbound::ToNetwork(Frame::Begin(b)) => {
                        let h = b.extension.as_ref().unwrap().as_http_begin().unwrap();
                        assert_eq!(h.get_first(":status"), Some("204"));
                        assert_eq!(h.get_first("access-control-allow-methods"), Some("GET"));
                    }
                    _ => panic!("expected HTTP begin"),
                }
                assert!(matches!(outbound[2], Outbound::ToNetwork(Frame::End(_))));
            }
            _ => panic!("expected rejection"),
        }
        assert!(correlations.is_empty());
    }

    #[test]
    fn non_get_method_is_rejected_with_405() {
        let factory = StreamFactory::new(Config::default());
        let mut ids = SequentialIds::new(10);
        let mut router = StaticRoutes::with_route(1, None);
        let mut correlations = Correlations::new();

        let frame = begin(FrameHeader::new(1, 7, 0, 0), &[(":method", "POST")]);

        match factory.new_stream(&frame, &mut ids, &mut router, &mut correlations) {
            NewStream::Rejected(outbound) => match &outbound[1] {
                Outbound::ToNetwork(Frame::Begin(b)) => {
                    let h = b.extension.as_ref().unwrap().as_http_begin().unwrap();
                    assert_eq!(h.get_first(":status"), Some("405"));
                }
                _ => panic!("expected HTTP begin"),
            },
            _ => panic!("expected rejection"),
        }
    }

    #[test]
    fn get_without_route_match_yields_no_handler() {
        let factory = StreamFactory::new(Config::default());
        let mut ids = SequentialIds::new(10);
        let mut router = StaticRoutes::with_route(99, None); // different route id
        let mut correlations = Correlations::new();

        let frame = begin(
            FrameHeader::new(1, 7, 0, 0),
            &[(":method", "GET"), (":path", "/events")],
        );

        assert!(matches!(
            factory.new_stream(&frame, &mut ids, &mut router, &mut correlations),
            NewStream::None
        ));
    }

    #[test]
    fn happy_path_subscription_carries_path_info_and_last_event_id() {
        let factory = StreamFactory::new(Config::default());
        let mut ids = SequentialIds::new(10);
        let mut router = StaticRoutes::with_route(1, None);
        let mut correlations = Correlations::new();

        let frame = begin(
            FrameHeader::new(1, 7, 0, 0),
            &[(":method", "GET"), (":path", "/events?lastEventId=42&x=1")],
        );

        match factory.new_stream(&frame, &mut ids, &mut router, &mut correlations) {
            NewStream::Subscribed { outbound, ids: sub_ids, .. } => {
                assert_eq!(outbound.len(), 1);
                match &outbound[0] {
                    Outbound::ToApplication(Frame::Begin(b)) => {
                        let ext = match b.extension.as_ref().unwrap() {
                            Extension::SseBegin(e) => e,
                            _ => panic!("expected SSE begin extension"),
                        };
                        assert_eq!(ext.path_info.as_deref(), Some("/events?x=1"));
                        assert_eq!(ext.last_event_id.as_deref(), Some("42"));
                    }
                    _ => panic!("expected application begin"),
                }
                assert!(correlations.contains(sub_ids.connect_reply_id));
            }
            _ => panic!("expected subscription"),
        }
    }

    #[test]
    fn route_prefix_filter_rejects_non_matching_path() {
        let factory = StreamFactory::new(Config::default());
        let mut ids = SequentialIds::new(10);
        let mut router = StaticRoutes::with_route(1, Some("/admin"));
        let mut correlations = Correlations::new();

        let frame = begin(
            FrameHeader::new(1, 7, 0, 0),
            &[(":method", "GET"), (":path", "/events")],
        );

        assert!(matches!(
            factory.new_stream(&frame, &mut ids, &mut router, &mut correlations),
            NewStream::None
        ));
    }

    #[test]
    fn application_reply_begin_consumes_correlation_entry() {
        let factory = StreamFactory::new(Config::default());
        let mut ids = SequentialIds::new(10);
        let mut router = StaticRoutes::with_route(1, None);
        let mut correlations = Correlations::new();

        let frame = begin(
            FrameHeader::new(1, 7, 0, 0),
            &[(":method", "GET"), (":path", "/events")],
        );
        let sub_ids = match factory.new_stream(&frame, &mut ids, &mut router, &mut correlations) {
            NewStream::Subscribed { ids, .. } => ids,
            _ => panic!("expected subscription"),
        };

        let reply_begin = Frame::Begin(BeginFrame {
            header: FrameHeader::new(1, sub_ids.connect_reply_id, 0, 0),
            extension: None,
        });
        assert!(matches!(
            factory.new_stream(&reply_begin, &mut ids, &mut router, &mut correlations),
            NewStream::ReplyBegin(_)
        ));
        assert!(correlations.is_empty());

        // A second BEGIN on the same (now-consumed) id finds nothing.
        assert!(matches!(
            factory.new_stream(&reply_begin, &mut ids, &mut router, &mut correlations),
            NewStream::None
        ));
    }
}
