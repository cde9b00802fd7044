//! Factory construction options.
//!
//! Mirrors `h2::server::Builder`: a small, cloneable settings bag consumed
//! once at `StreamFactory` construction.

/// Default `event:` type used for injected challenge events.
pub const DEFAULT_CHALLENGE_EVENT_TYPE: &str = "challenge";

/// Options consumed when building a [`crate::factory::StreamFactory`].
#[derive(Clone, Debug)]
pub struct Config {
    initial_comment: Option<Vec<u8>>,
    challenge_event_type: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            initial_comment: None,
            challenge_event_type: DEFAULT_CHALLENGE_EVENT_TYPE.to_string(),
        }
    }
}

impl Config {
    pub fn builder() -> Builder {
        Builder::default()
    }

    pub fn initial_comment(&self) -> Option<&[u8]> {
        self.initial_comment.as_deref()
    }

    pub fn challenge_event_type(&self) -> &str {
        &self.challenge_event_type
    }
}

/// Builds a [`Config`].
#[derive(Clone, Debug, Default)]
pub struct Builder {
    settings: Config,
}

impl Builder {
    /// Sets the comment emitted as the first SSE frame after the first
    /// network WINDOW arrives. `None` (the default) skips the comment
    /// entirely.
    pub fn initial_comment(&mut self, comment: impl Into<Vec<u8>>) -> &mut Self {
        self.settings.initial_comment = Some(comment.into());
        self
    }

    /// Sets the SSE `event:` type used for injected challenge events.
    /// Defaults to `"challenge"`.
    pub fn challenge_event_type(&mut self, event_type: impl Into<String>) -> &mut Self {
        self.settings.challenge_event_type = event_type.into();
        self
    }

    pub fn build(&self) -> Config {
        self.settings.clone()
    }
}
