use std::fmt;

use gt_tensor::{DType, Shape, Tensor};

/// Handle to a node inside the [`Graph`](crate::Graph) that created it.
///
/// Carries the owning graph's id, so a handle is only accepted by that graph
/// (or a clone of it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) graph: usize,
    pub(crate) index: usize,
}

impl NodeId {
    /// Position of the node in its graph.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}#{}", self.graph, self.index)
    }
}

/// The operation a node performs. Inputs always refer to earlier nodes.
#[derive(Debug, Clone)]
pub enum Op {
    Constant(Tensor),
    Placeholder { name: String },
    MatMul(NodeId, NodeId),
    Mul(NodeId, NodeId),
    Add(NodeId, NodeId),
}

impl Op {
    pub fn inputs(&self) -> Vec<NodeId> {
        match self {
            Op::Constant(_) | Op::Placeholder { .. } => vec![],
            Op::MatMul(a, b) | Op::Mul(a, b) | Op::Add(a, b) => vec![*a, *b],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Op::Constant(_) => "constant",
            Op::Placeholder { .. } => "placeholder",
            Op::MatMul(..) => "matmul",
            Op::Mul(..) => "mul",
            Op::Add(..) => "add",
        }
    }
}

/// A graph node: its op plus the statically inferred output type.
#[derive(Debug, Clone)]
pub struct Node {
    pub op: Op,
    pub dtype: DType,
    pub shape: Shape,
}
