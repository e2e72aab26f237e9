use std::sync::atomic::{AtomicUsize, Ordering};

use gt_tensor::{DType, Shape, Tensor, TensorError};
use log::trace;

use crate::error::{GraphError, Result};
use crate::node::{Node, NodeId, Op};

/// An append-only computation graph.
///
/// Nodes can only reference nodes that already exist, so insertion order is
/// a topological order. Shapes and dtypes are inferred when a node is added;
/// an ill-typed expression is rejected before any session sees it.
///
/// Every graph gets a process-unique id that is stamped into its handles.
/// A clone keeps the id: its nodes are a superset of the original's prefix.
#[derive(Debug, Clone)]
pub struct Graph {
    id: usize,
    nodes: Vec<Node>,
}

static NEXT_GRAPH_ID: AtomicUsize = AtomicUsize::new(0);

impl Default for Graph {
    fn default() -> Self {
        Graph {
            id: NEXT_GRAPH_ID.fetch_add(1, Ordering::Relaxed),
            nodes: Vec::new(),
        }
    }
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node behind `id`.
    ///
    /// # Errors
    /// `UnknownNode` if `id` was issued by another graph or is out of range.
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        if id.graph != self.id {
            return Err(GraphError::UnknownNode(id));
        }
        self.nodes.get(id.index).ok_or(GraphError::UnknownNode(id))
    }

    /// Returns the inferred output shape of `id`.
    pub fn shape_of(&self, id: NodeId) -> Result<&Shape> {
        Ok(&self.node(id)?.shape)
    }

    /// Iterates over all placeholders as `(id, name)` pairs in creation order.
    pub fn placeholders(&self) -> impl Iterator<Item = (NodeId, &str)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| match &n.op {
                Op::Placeholder { name } => Some((self.id_at(i), name.as_str())),
                _ => None,
            })
    }

    /// Embed a concrete tensor in the graph.
    pub fn constant(&mut self, value: Tensor) -> NodeId {
        let dtype = value.dtype();
        let shape = value.shape().clone();
        self.push(Op::Constant(value), dtype, shape)
    }

    /// Declare a symbolic input that must be fed at evaluation time.
    pub fn placeholder(&mut self, name: impl Into<String>, dtype: DType, shape: Shape) -> NodeId {
        self.push(Op::Placeholder { name: name.into() }, dtype, shape)
    }

    /// Matrix product of two 2-D nodes.
    pub fn matmul(&mut self, a: NodeId, b: NodeId) -> Result<NodeId> {
        let (sa, sb) = self.float_operands(a, b)?;
        if sa.ndim() != 2 || sb.ndim() != 2 {
            return Err(TensorError::Other(format!(
                "matmul requires 2D operands, got {} and {}",
                sa, sb
            ))
            .into());
        }
        let (m, k, k2, n) = (sa.dim(0), sa.dim(1), sb.dim(0), sb.dim(1));
        if k != k2 {
            return Err(TensorError::MatmulMismatch { m, k, k2, n }.into());
        }
        Ok(self.push(Op::MatMul(a, b), DType::F32, Shape::matrix(m, n)))
    }

    /// Elementwise product with broadcasting.
    pub fn mul(&mut self, a: NodeId, b: NodeId) -> Result<NodeId> {
        let (sa, sb) = self.float_operands(a, b)?;
        let shape = Shape::broadcast_shape(&sa, &sb)?;
        Ok(self.push(Op::Mul(a, b), DType::F32, shape))
    }

    /// Elementwise sum with broadcasting.
    pub fn add(&mut self, a: NodeId, b: NodeId) -> Result<NodeId> {
        let (sa, sb) = self.float_operands(a, b)?;
        let shape = Shape::broadcast_shape(&sa, &sb)?;
        Ok(self.push(Op::Add(a, b), DType::F32, shape))
    }

    /// Marks every node `fetch` depends on, including itself.
    pub(crate) fn reachable(&self, fetch: NodeId) -> Result<Vec<bool>> {
        self.node(fetch)?;
        let mut needed = vec![false; self.nodes.len()];
        needed[fetch.index] = true;
        // Inputs always precede their users, so one reverse sweep suffices.
        for i in (0..=fetch.index).rev() {
            if needed[i] {
                for input in self.nodes[i].op.inputs() {
                    needed[input.index] = true;
                }
            }
        }
        Ok(needed)
    }

    /// The handle for the node at position `index` of this graph.
    pub(crate) fn id_at(&self, index: usize) -> NodeId {
        NodeId {
            graph: self.id,
            index,
        }
    }

    pub(crate) fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    fn float_operands(&self, a: NodeId, b: NodeId) -> Result<(Shape, Shape)> {
        let na = self.node(a)?;
        let nb = self.node(b)?;
        for n in [na, nb] {
            if !n.dtype.is_float() {
                return Err(TensorError::DTypeMismatch {
                    expected: DType::F32.to_string(),
                    got: n.dtype.to_string(),
                }
                .into());
            }
        }
        Ok((na.shape.clone(), nb.shape.clone()))
    }

    fn push(&mut self, op: Op, dtype: DType, shape: Shape) -> NodeId {
        let id = self.id_at(self.nodes.len());
        trace!("graph: {} {} -> {} {}", id, op.name(), dtype, shape);
        self.nodes.push(Node { op, dtype, shape });
        id
    }
}
