//! Errors raised while running an episode.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum Error {
    /// The agent asked for an action that is not part of the action set.
    #[error("Invalid Robot action: {0}")]
    InvalidAction(String),

    /// An agent hook failed. The turn that triggered it aborts the run.
    #[error("Agent hook `{hook}` failed: {source}")]
    AgentHook {
        hook: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// An explicitly given room layout cannot be used.
    #[error("Invalid room layout: {0}")]
    InvalidLayout(String),

    /// No agent is registered under this name.
    #[error("Unknown agent: {0}")]
    UnknownAgent(String),
}

impl Error {
    /// Wraps an error coming out of an agent hook.
    ///
    /// An [`Error::InvalidAction`] raised inside the hook is surfaced as is, so callers
    /// see the protocol violation instead of a generic hook failure.
    pub(crate) fn from_hook(hook: &'static str, source: anyhow::Error) -> Self {
        match source.downcast::<Error>() {
            Ok(Error::InvalidAction(name)) => Error::InvalidAction(name),
            Ok(other) => Error::AgentHook {
                hook,
                source: other.into(),
            },
            Err(source) => Error::AgentHook { hook, source },
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
