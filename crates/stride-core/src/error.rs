use crate::NodeId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StrideError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("IK chain needs at least 2 joints, got {joints}")]
    ChainTooShort { joints: usize },

    #[error("Segment {index} of the chain has zero length")]
    DegenerateSegment { index: usize },

    #[error("Node not found: {0}")]
    UnknownNode(NodeId),

    #[error("Config parse error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StrideError>;
