//! `RequestParser` — extracts `pathInfo` and `lastEventId` from an HTTP
//! BEGIN extension, scrubbing a `lastEventId` query parameter out of the
//! forwarded path the way a reverse proxy strips a routing-only parameter
//! before passing a request upstream.

use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::{Captures, Regex};

use crate::frame::HeaderList;

static PATH_AND_QUERY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<path>[^?]*)(?P<query>\?.*)$").unwrap());

static LAST_EVENT_ID_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\?|&)lastEventId=([^&]*)(&|$)").unwrap());

/// Extracted `accept`/`:path`/`last-event-id` facts about an incoming HTTP
/// BEGIN, plus the CORS preflight predicates and method.
#[derive(Debug, Clone, Default)]
pub struct ParsedRequest {
    pub path_info: Option<String>,
    pub last_event_id: Option<String>,
    pub method: Option<String>,
    pub timestamp_requested: bool,
    pub is_cors_preflight: bool,
}

/// Parses the HTTP BEGIN extension's header list into `pathInfo` and
/// `lastEventId`, per spec §4.5.
pub fn parse(headers: &HeaderList) -> ParsedRequest {
    let method = headers.get_first(":method").map(str::to_string);
    let timestamp_requested = headers
        .get_folded("accept")
        .map(|accept| {
            accept
                .split(',')
                .flat_map(|range| range.split(';'))
                .any(|tok| tok.trim() == "ext=timestamp")
        })
        .unwrap_or(false);

    let is_cors_preflight = method.as_deref() == Some("OPTIONS")
        && (headers.contains("access-control-request-method")
            || headers.contains("access-control-request-headers"));

    let mut last_event_id = headers.get_folded("last-event-id");
    let path_info = scrub_last_event_id(headers.get_folded(":path"), &mut last_event_id);

    ParsedRequest {
        path_info,
        last_event_id,
        method,
        timestamp_requested,
        is_cors_preflight,
    }
}

/// Scans `path_info`'s query string for `lastEventId` occurrences, removing
/// every one of them and, if `last_event_id` is still `None`, setting it
/// from the first occurrence's (percent-decoded) value.
fn scrub_last_event_id(
    path_info: Option<String>,
    last_event_id: &mut Option<String>,
) -> Option<String> {
    let path_info = path_info?;

    let Some(caps) = PATH_AND_QUERY.captures(&path_info) else {
        return Some(path_info);
    };

    let path = caps.name("path").unwrap().as_str();
    let query = caps.name("query").unwrap().as_str();

    let mut candidate: Option<String> = None;
    let new_query = LAST_EVENT_ID_PARAM.replace_all(query, |c: &Captures<'_>| {
        let leading = &c[1];
        let value = &c[2];
        let trailing = &c[3];

        if candidate.is_none() {
            candidate = Some(decode_if_percent_encoded(value));
        }

        if trailing.is_empty() {
            String::new()
        } else {
            leading.to_string()
        }
    });

    if last_event_id.is_none() {
        *last_event_id = candidate;
    }

    Some(format!("{path}{new_query}"))
}

fn decode_if_percent_encoded(value: &str) -> String {
    if value.contains('%') {
        percent_decode_str(value)
            .decode_utf8()
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| value.to_string())
    } else {
        value.to_string()
    }
}
