use std::sync::Arc;

use gt_tensor::{ComputeBackend, CpuBackend, Tensor};
use log::{debug, trace};

use crate::error::{GraphError, Result};
use crate::feed::FeedDict;
use crate::graph::Graph;
use crate::node::{NodeId, Op};

/// Scoped execution context that evaluates graphs on a compute backend.
///
/// The backend is held for the lifetime of the session and released in
/// `Drop`, so every exit path (including `?` propagation) tears it down.
/// [`Session::run`] borrows the session immutably and keeps no state
/// between calls.
#[derive(Debug)]
pub struct Session {
    backend: Arc<dyn ComputeBackend>,
}

impl Session {
    /// Open a session on `backend`.
    ///
    /// # Errors
    /// Returns `BackendUnavailable` if the backend reports it cannot run.
    pub fn new(backend: Arc<dyn ComputeBackend>) -> Result<Self> {
        if !backend.is_available() {
            return Err(GraphError::BackendUnavailable(backend.name().to_string()));
        }
        debug!("session opened on backend '{}'", backend.name());
        Ok(Session { backend })
    }

    /// Open a session on the reference CPU backend.
    pub fn cpu() -> Result<Self> {
        Self::new(Arc::new(CpuBackend::new()))
    }

    pub fn backend(&self) -> &dyn ComputeBackend {
        self.backend.as_ref()
    }

    /// Evaluate `fetch` with placeholders bound from `feeds`.
    ///
    /// Every placeholder `fetch` depends on must be fed with a tensor of the
    /// declared dtype and shape. Feeding a node that is not a placeholder is
    /// an error; feeds for placeholders `fetch` does not depend on are
    /// ignored.
    pub fn run(&self, graph: &Graph, fetch: NodeId, feeds: &FeedDict) -> Result<Tensor> {
        for (id, _) in feeds.iter() {
            if !matches!(graph.node(id)?.op, Op::Placeholder { .. }) {
                return Err(GraphError::NotAPlaceholder(id));
            }
        }

        let needed = graph.reachable(fetch)?;
        let nodes = graph.nodes();
        let backend = self.backend();
        let mut values: Vec<Option<Tensor>> = vec![None; fetch.index() + 1];

        for i in 0..=fetch.index() {
            if !needed[i] {
                continue;
            }
            let node = &nodes[i];
            trace!("session: evaluating #{} {}", i, node.op.name());
            let value = match &node.op {
                Op::Constant(t) => t.clone(),
                Op::Placeholder { name } => {
                    let fed = feeds
                        .get(graph.id_at(i))
                        .ok_or_else(|| GraphError::MissingFeed(name.clone()))?;
                    if fed.dtype() != node.dtype {
                        return Err(GraphError::FeedDTypeMismatch {
                            name: name.clone(),
                            expected: node.dtype,
                            got: fed.dtype(),
                        });
                    }
                    if *fed.shape() != node.shape {
                        return Err(GraphError::FeedShapeMismatch {
                            name: name.clone(),
                            expected: node.shape.clone(),
                            got: fed.shape().clone(),
                        });
                    }
                    fed.clone()
                }
                Op::MatMul(a, b) => operand(&values, *a)?.matmul(operand(&values, *b)?, backend)?,
                Op::Mul(a, b) => operand(&values, *a)?.mul(operand(&values, *b)?, backend)?,
                Op::Add(a, b) => operand(&values, *a)?.add(operand(&values, *b)?, backend)?,
            };
            values[i] = Some(value);
        }

        values[fetch.index()]
            .take()
            .ok_or(GraphError::UnknownNode(fetch))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        debug!("session on backend '{}' closed", self.backend.name());
    }
}

fn operand(values: &[Option<Tensor>], id: NodeId) -> Result<&Tensor> {
    values
        .get(id.index())
        .and_then(Option::as_ref)
        .ok_or(GraphError::UnknownNode(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use gt_tensor::{DType, Shape, TensorError};

    #[derive(Debug)]
    struct OfflineBackend;

    impl ComputeBackend for OfflineBackend {
        fn name(&self) -> &str {
            "offline"
        }
        fn is_available(&self) -> bool {
            false
        }
        fn matmul(
            &self,
            _: &[f32],
            _: &[f32],
            _: usize,
            _: usize,
            _: usize,
        ) -> gt_tensor::Result<Vec<f32>> {
            Err(TensorError::Other("offline".to_string()))
        }
        fn add(&self, _: &[f32], _: &[f32]) -> gt_tensor::Result<Vec<f32>> {
            Err(TensorError::Other("offline".to_string()))
        }
        fn mul(&self, _: &[f32], _: &[f32]) -> gt_tensor::Result<Vec<f32>> {
            Err(TensorError::Other("offline".to_string()))
        }
        fn scale(&self, _: &[f32], _: f32) -> gt_tensor::Result<Vec<f32>> {
            Err(TensorError::Other("offline".to_string()))
        }
    }

    /// `matmul(a, b) * c + d` over 2x2 inputs.
    fn affine_graph(a: Tensor) -> (Graph, NodeId, NodeId, NodeId, NodeId) {
        let mut g = Graph::new();
        let a = g.constant(a);
        let b = g.placeholder("b", DType::F32, Shape::matrix(2, 2));
        let c = g.placeholder("c", DType::F32, Shape::scalar());
        let d = g.placeholder("d", DType::F32, Shape::matrix(2, 2));
        let ab = g.matmul(a, b).unwrap();
        let abc = g.mul(ab, c).unwrap();
        let f = g.add(abc, d).unwrap();
        (g, b, c, d, f)
    }

    fn matrix(data: [f32; 4]) -> Tensor {
        Tensor::new(data.to_vec(), Shape::matrix(2, 2))
    }

    #[test]
    fn test_identity_scenario() {
        let (g, b, c, d, f) = affine_graph(matrix([1.0, 2.0, 3.0, 4.0]));
        let feeds = FeedDict::new()
            .with(b, matrix([1.0, 0.0, 0.0, 1.0]))
            .with(c, Tensor::scalar(3.0))
            .with(d, Tensor::zeros(Shape::matrix(2, 2)));

        let session = Session::cpu().unwrap();
        let out = session.run(&g, f, &feeds).unwrap();
        assert_eq!(out.shape().dims(), &[2, 2]);
        assert_eq!(out.data_f32().unwrap(), &[3.0, 6.0, 9.0, 12.0]);
    }

    #[test]
    fn test_affine_with_offset() {
        let (g, b, c, d, f) = affine_graph(matrix([1.0, 2.0, 3.0, 4.0]));
        let feeds = FeedDict::new()
            .with(b, matrix([5.0, 6.0, 7.0, 8.0]))
            .with(c, Tensor::scalar(0.5))
            .with(d, matrix([1.0, 1.0, 1.0, 1.0]));

        let out = Session::cpu().unwrap().run(&g, f, &feeds).unwrap();
        let want = [10.5, 12.0, 22.5, 26.0];
        for (got, want) in out.data_f32().unwrap().iter().zip(want) {
            assert_relative_eq!(*got, want, max_relative = 1e-6);
        }
    }

    #[test]
    fn test_run_is_repeatable() {
        let (g, b, c, d, f) = affine_graph(matrix([1.0, -2.0, 3.0, 0.5]));
        let feeds = FeedDict::new()
            .with(b, matrix([2.0, 1.0, -1.0, 4.0]))
            .with(c, Tensor::scalar(3.0))
            .with(d, matrix([0.25, 0.0, -3.0, 2.0]));

        let session = Session::cpu().unwrap();
        let first = session.run(&g, f, &feeds).unwrap();
        let second = session.run(&g, f, &feeds).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_intermediate_fetch_needs_only_its_inputs() {
        let mut g = Graph::new();
        let a = g.constant(matrix([1.0, 2.0, 3.0, 4.0]));
        let b = g.placeholder("b", DType::F32, Shape::matrix(2, 2));
        let ab = g.matmul(a, b).unwrap();
        let c = g.placeholder("c", DType::F32, Shape::scalar());
        g.mul(ab, c).unwrap();

        let feeds = FeedDict::new().with(b, matrix([1.0, 0.0, 0.0, 1.0]));
        let out = Session::cpu().unwrap().run(&g, ab, &feeds).unwrap();
        assert_eq!(out.data_f32().unwrap(), &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_missing_feed() {
        let (g, b, c, _d, f) = affine_graph(matrix([1.0, 2.0, 3.0, 4.0]));
        let feeds = FeedDict::new()
            .with(b, matrix([1.0, 0.0, 0.0, 1.0]))
            .with(c, Tensor::scalar(3.0));
        let err = Session::cpu().unwrap().run(&g, f, &feeds).unwrap_err();
        assert!(matches!(err, GraphError::MissingFeed(name) if name == "d"));
    }

    #[test]
    fn test_feed_shape_mismatch() {
        let (g, b, c, d, f) = affine_graph(matrix([1.0, 2.0, 3.0, 4.0]));
        let feeds = FeedDict::new()
            .with(b, Tensor::ones(Shape::matrix(3, 3)))
            .with(c, Tensor::scalar(3.0))
            .with(d, Tensor::zeros(Shape::matrix(2, 2)));
        let err = Session::cpu().unwrap().run(&g, f, &feeds).unwrap_err();
        assert!(matches!(err, GraphError::FeedShapeMismatch { name, .. } if name == "b"));
    }

    #[test]
    fn test_feed_dtype_mismatch() {
        let (g, b, c, d, f) = affine_graph(matrix([1.0, 2.0, 3.0, 4.0]));
        let ints = Tensor::from_i32(vec![1, 0, 0, 1], Shape::matrix(2, 2)).unwrap();
        let feeds = FeedDict::new()
            .with(b, ints)
            .with(c, Tensor::scalar(3.0))
            .with(d, Tensor::zeros(Shape::matrix(2, 2)));
        let err = Session::cpu().unwrap().run(&g, f, &feeds).unwrap_err();
        assert!(matches!(err, GraphError::FeedDTypeMismatch { .. }));
    }

    #[test]
    fn test_feeding_a_non_placeholder() {
        let (g, b, c, d, f) = affine_graph(matrix([1.0, 2.0, 3.0, 4.0]));
        let feeds = FeedDict::new()
            .with(b, matrix([1.0, 0.0, 0.0, 1.0]))
            .with(c, Tensor::scalar(3.0))
            .with(d, Tensor::zeros(Shape::matrix(2, 2)))
            .with(f, Tensor::zeros(Shape::matrix(2, 2)));
        let err = Session::cpu().unwrap().run(&g, f, &feeds).unwrap_err();
        assert!(matches!(err, GraphError::NotAPlaceholder(id) if id == f));
    }

    #[test]
    fn test_handles_from_another_graph_rejected() {
        let (g, b, c, d, f) = affine_graph(matrix([1.0, 2.0, 3.0, 4.0]));
        // Same layout, so every foreign index is in range for `g`.
        let (_other, other_b, _, _, other_f) = affine_graph(matrix([0.0; 4]));
        let feeds = FeedDict::new()
            .with(b, matrix([1.0, 0.0, 0.0, 1.0]))
            .with(c, Tensor::scalar(3.0))
            .with(d, Tensor::zeros(Shape::matrix(2, 2)));
        let session = Session::cpu().unwrap();

        let err = session.run(&g, other_f, &feeds).unwrap_err();
        assert!(matches!(err, GraphError::UnknownNode(id) if id == other_f));

        let mixed = feeds.clone().with(other_b, matrix([1.0; 4]));
        let err = session.run(&g, f, &mixed).unwrap_err();
        assert!(matches!(err, GraphError::UnknownNode(id) if id == other_b));
    }

    #[test]
    fn test_unavailable_backend_refused() {
        let err = Session::new(Arc::new(OfflineBackend)).unwrap_err();
        assert!(matches!(err, GraphError::BackendUnavailable(name) if name == "offline"));
    }
}
