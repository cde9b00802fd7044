//! HTTP-side extension payloads: the ordered header list carried by HTTP
//! BEGIN and HTTP CHALLENGE frames.

/// An ordered list of `(name, value)` header pairs, as carried by the HTTP
/// BEGIN and HTTP CHALLENGE extensions. Pseudo-headers (`:method`, `:path`,
/// `:status`, ...) are ordinary entries whose name begins with `:`.
#[derive(Debug, Clone, Default)]
pub struct HeaderList {
    pairs: Vec<(String, String)>,
}

impl HeaderList {
    pub fn new() -> Self {
        HeaderList { pairs: Vec::new() }
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// A pseudo-header name always begins with ASCII `:`.
    pub fn is_pseudo(name: &str) -> bool {
        name.as_bytes().first() == Some(&b':')
    }

    /// Looks up a header by name, folding duplicate entries into one value
    /// joined by `", "` in insertion order. Header names are compared
    /// case-sensitively, matching the lower-cased wire representation the
    /// external HTTP codec is expected to hand the adapter.
    pub fn get_folded(&self, name: &str) -> Option<String> {
        let mut out: Option<String> = None;
        for (n, v) in &self.pairs {
            if n == name {
                match &mut out {
                    Some(acc) => {
                        acc.push_str(", ");
                        acc.push_str(v);
                    }
                    None => out = Some(v.clone()),
                }
            }
        }
        out
    }

    /// First value for `name`, without folding duplicates. Used where the
    /// spec only cares about presence (e.g. CORS preflight predicates).
    pub fn get_first(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pairs.iter().any(|(n, _)| n == name)
    }
}
