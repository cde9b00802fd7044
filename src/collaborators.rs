//! Traits for the collaborators the specification calls out as external:
//! the stream-identifier supplier, the route-table manager, and the
//! buffer-pool allocator. The HTTP wire codec and the controller/management
//! plane are also out of scope, but have no call shape the core needs to
//! name — they sit below `Frame` and above `StreamFactory` respectively.
//!
//! Production callers wire these to the real subsystems; tests wire them to
//! small in-memory fakes (see each module's `#[cfg(test)]` blocks and
//! `tests/scenarios.rs`).

/// Supplies fresh stream/trace identifiers when a new stream pair is
/// created.
pub trait IdSupplier {
    fn supply_initial_id(&mut self, route_id: u64) -> u64;
    fn supply_reply_id(&mut self, stream_id: u64) -> u64;
    fn supply_trace_id(&mut self) -> u64;
}

/// A resolved application route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub id: u64,
}

/// Looks up an application route for an incoming SSE subscription.
///
/// `path_prefix_matches` is evaluated by the resolver against each
/// candidate route's configured path prefix; see `DESIGN.md` for why the
/// core tightens route matching to a prefix check instead of accepting
/// every route regardless of `pathInfo`.
pub trait RouteResolver {
    fn resolve(
        &mut self,
        route_id: u64,
        authorization: u64,
        path_prefix_matches: &dyn Fn(&str) -> bool,
    ) -> Option<Route>;
}

/// Opaque handle to a single buffer-pool slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot(pub u64);

/// A pool of pinned byte buffers, one of which a `ReplyHandler` may hold at
/// a time to defer a frame it couldn't immediately emit.
pub trait BufferPool {
    fn acquire(&mut self, stream_id: u64) -> Option<Slot>;
    fn buffer(&mut self, slot: Slot) -> &mut Vec<u8>;
    fn release(&mut self, slot: Slot);
}

#[cfg(any(test, feature = "test-support"))]
pub mod fakes {
    //! In-memory collaborator fakes used by unit and integration tests.

    use super::*;
    use std::collections::HashMap;

    #[derive(Debug, Default)]
    pub struct SequentialIds {
        next: u64,
    }

    impl SequentialIds {
        pub fn new(start: u64) -> Self {
            SequentialIds { next: start }
        }
    }

    impl IdSupplier for SequentialIds {
        fn supply_initial_id(&mut self, _route_id: u64) -> u64 {
            let id = self.next;
            self.next += 2;
            id
        }

        fn supply_reply_id(&mut self, stream_id: u64) -> u64 {
            stream_id + 1
        }

        fn supply_trace_id(&mut self) -> u64 {
            let id = self.next;
            self.next += 2;
            id
        }
    }

    /// Resolves any route whose configured prefix (or no prefix at all)
    /// satisfies the caller's filter.
    #[derive(Debug, Default)]
    pub struct StaticRoutes {
        pub routes: Vec<(Route, Option<String>)>,
    }

    impl StaticRoutes {
        pub fn with_route(id: u64, prefix: Option<&str>) -> Self {
            StaticRoutes {
                routes: vec![(Route { id }, prefix.map(str::to_string))],
            }
        }
    }

    impl RouteResolver for StaticRoutes {
        fn resolve(
            &mut self,
            route_id: u64,
            _authorization: u64,
            path_prefix_matches: &dyn Fn(&str) -> bool,
        ) -> Option<Route> {
            self.routes.iter().find_map(|(route, prefix)| {
                if route.id != route_id {
                    return None;
                }
                match prefix {
                    Some(p) if !path_prefix_matches(p) => None,
                    _ => Some(*route),
                }
            })
        }
    }

    #[derive(Debug, Default)]
    pub struct HeapBufferPool {
        next_slot: u64,
        slots: HashMap<u64, Vec<u8>>,
    }

    impl BufferPool for HeapBufferPool {
        fn acquire(&mut self, _stream_id: u64) -> Option<Slot> {
            let id = self.next_slot;
            self.next_slot += 1;
            self.slots.insert(id, Vec::new());
            Some(Slot(id))
        }

        fn buffer(&mut self, slot: Slot) -> &mut Vec<u8> {
            self.slots.entry(slot.0).or_default()
        }

        fn release(&mut self, slot: Slot) {
            self.slots.remove(&slot.0);
        }
    }

    /// A pool that is always exhausted, for exercising `PoolExhausted`.
    #[derive(Debug, Default)]
    pub struct ExhaustedBufferPool;

    impl BufferPool for ExhaustedBufferPool {
        fn acquire(&mut self, _stream_id: u64) -> Option<Slot> {
            None
        }

        fn buffer(&mut self, _slot: Slot) -> &mut Vec<u8> {
            unreachable!("never handed out a slot")
        }

        fn release(&mut self, _slot: Slot) {
            unreachable!("never handed out a slot")
        }
    }
}
