use gt_tensor::{DType, Shape, TensorError};
use thiserror::Error;

use crate::node::NodeId;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("node {0} does not belong to this graph")]
    UnknownNode(NodeId),
    #[error("no value fed for placeholder '{0}'")]
    MissingFeed(String),
    #[error("node {0} is not a placeholder and cannot be fed")]
    NotAPlaceholder(NodeId),
    #[error("placeholder '{name}' declared with shape {expected}, fed {got}")]
    FeedShapeMismatch {
        name: String,
        expected: Shape,
        got: Shape,
    },
    #[error("placeholder '{name}' declared as {expected}, fed {got}")]
    FeedDTypeMismatch {
        name: String,
        expected: DType,
        got: DType,
    },
    #[error("compute backend '{0}' is not available")]
    BackendUnavailable(String),
    #[error(transparent)]
    Tensor(#[from] TensorError),
}

pub type Result<T> = std::result::Result<T, GraphError>;
