use crate::graph::NodeKind;
use thiserror::Error;

/// Errors raised by structural graph mutations. A rejected mutation leaves
/// the graph untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("A node cannot feed into itself")]
    SelfEdge,

    #[error("A {from} node cannot feed into a {to} node; {from} output may connect to: {allowed}")]
    IncompatibleKinds {
        from: NodeKind,
        to: NodeKind,
        allowed: String,
    },

    #[error("Node '{0}' was not found in the graph")]
    NodeNotFound(String),

    #[error(
        "Node '{node_id}' already has an inbound connection; only union nodes accept more than one input"
    )]
    InputOccupied { node_id: String },

    #[error("Union node '{node_id}' already has two inbound connections")]
    UnionFull { node_id: String },

    #[error("Connecting '{from}' to '{to}' would create a cycle")]
    WouldCycle { from: String, to: String },
}

/// Errors raised while resolving the upstream flow of a node. Every variant
/// is detected before any request leaves the process.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Node '{0}' was not found in the graph")]
    NodeNotFound(String),

    #[error("Node '{0}' is not connected to a data source; connect a source and a filter upstream")]
    Disconnected(String),

    #[error("Source node '{0}' has no data source selected")]
    SourceMissingConnection(String),

    #[error("Source node '{0}' must feed into a filter before any transformation")]
    MissingFilter(String),

    #[error("Filter node '{0}' has no table selected")]
    FilterMissingTable(String),

    #[error("Join node '{0}' has no primary table or connection configured")]
    JoinMissingPrimary(String),

    #[error("Join node '{node_id}': the join with '{table}' is missing its column pairing")]
    JoinMissingPairing { node_id: String, table: String },

    #[error(
        "Union node '{node_id}' requires two inbound branches, each reaching a source through a filter: {reason}"
    )]
    UnionIncomplete { node_id: String, reason: String },
}

/// Errors raised at the execution-service boundary (preview, run, metadata).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("Node '{0}' is not a sink; committing runs dispatch from sink nodes")]
    NotASink(String),

    #[error("Sink node '{0}' has no target table configured")]
    SinkMissingTarget(String),

    #[error("Metadata request for '{key}' timed out after {seconds} seconds")]
    MetadataTimeout { key: String, seconds: u64 },

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("The execution service rejected the request: {0}")]
    Rejected(String),
}

/// Errors raised while persisting or restoring the metadata cache snapshot.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Could not access snapshot file '{path}': {message}")]
    Io { path: String, message: String },

    #[error("Snapshot encoding failed: {0}")]
    Encode(String),

    #[error("Snapshot decoding failed: {0}")]
    Decode(String),
}
