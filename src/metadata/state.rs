use super::SourceMetadata;
use std::sync::Arc;

/// Explicit per-node metadata fetch state. Transitions are driven by
/// [`FetchCommand`]s, so guards are testable without any rendering layer.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FetchState {
    #[default]
    Idle,
    Loading,
    Loaded(Arc<SourceMetadata>),
    Error(String),
}

/// Commands driving the fetch state machine.
#[derive(Debug, Clone)]
pub enum FetchCommand {
    /// Begin a fetch. A no-op while one is already in flight.
    Request,
    /// A fetch completed. Ignored unless a fetch is in flight.
    Resolve(Arc<SourceMetadata>),
    /// A fetch failed. Ignored unless a fetch is in flight.
    Fail(String),
    /// Drop whatever is held and return to idle.
    Invalidate,
}

impl FetchState {
    /// Applies a command, returning the next state. Illegal transitions
    /// leave the state unchanged.
    pub fn apply(self, command: FetchCommand) -> Self {
        match (self, command) {
            (_, FetchCommand::Request) => Self::Loading,
            (Self::Loading, FetchCommand::Resolve(value)) => Self::Loaded(value),
            (Self::Loading, FetchCommand::Fail(reason)) => Self::Error(reason),
            (_, FetchCommand::Invalidate) => Self::Idle,
            (state, _) => state,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn loaded(&self) -> Option<&Arc<SourceMetadata>> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }
}
