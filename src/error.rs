use thiserror::Error;

/// Errors that can occur while indexing or compiling a flow.
///
/// Every variant describes an invalid authored graph. None of them is
/// transient, so callers should surface them as authoring-time validation
/// failures rather than retrying.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("Flow graph is malformed: {0}")]
    GraphMalformed(String),

    #[error("Flow must have exactly one entry node, found {}: [{}]", .candidates.len(), .candidates.join(", "))]
    NoEntryNode { candidates: Vec<String> },

    #[error("Node '{node_id}' has a shape the compiler cannot classify: {reason}")]
    UnsupportedShape { node_id: String, reason: String },

    #[error("Flow nesting exceeds the maximum compilation depth of {max_depth} at node '{node_id}'")]
    GraphTooDeep { node_id: String, max_depth: usize },

    #[error("Compiled plan exceeds {limit} elements at node '{node_id}'; merge pairing duplicates too much of the flow")]
    PlanTooLarge { node_id: String, limit: usize },
}

/// Errors that can occur when converting a custom authoring format into a `FlowDefinition`.
#[derive(Error, Debug, Clone)]
pub enum FlowConversionError {
    #[error("Invalid custom data: {0}")]
    ValidationError(String),
}

/// Errors raised while persisting or loading a compiled flow artifact.
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Artifact serialization failed: {0}")]
    Encode(String),

    #[error("Artifact deserialization failed: {0}")]
    Decode(String),

    #[error("Artifact I/O failed for '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
