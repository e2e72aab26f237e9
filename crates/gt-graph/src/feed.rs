use std::collections::HashMap;

use gt_tensor::Tensor;

use crate::node::NodeId;

/// Concrete values for placeholders, keyed by node handle.
#[derive(Debug, Clone, Default)]
pub struct FeedDict {
    values: HashMap<NodeId, Tensor>,
}

impl FeedDict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `value` to `node`. Returns self for builder-style usage.
    pub fn with(mut self, node: NodeId, value: Tensor) -> Self {
        self.insert(node, value);
        self
    }

    /// Bind `value` to `node`, replacing any earlier binding.
    pub fn insert(&mut self, node: NodeId, value: Tensor) -> Option<Tensor> {
        self.values.insert(node, value)
    }

    pub fn get(&self, node: NodeId) -> Option<&Tensor> {
        self.values.get(&node)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Tensor)> {
        self.values.iter().map(|(id, t)| (*id, t))
    }
}
