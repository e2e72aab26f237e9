use std::io::{self, Write};
use std::time::{Duration, Instant};

use gt_graph::{FeedDict, Graph, NodeId, Result, Session};
use gt_tensor::{DType, Shape, Tensor};
use log::debug;
use rand::Rng;

use crate::config::BenchConfig;

/// The graph for `F = matmul(A, B) * C + D` and handles to its inputs.
#[derive(Debug, Clone)]
pub struct AffineExpr {
    pub graph: Graph,
    pub b: NodeId,
    pub c: NodeId,
    pub d: NodeId,
    pub f: NodeId,
}

impl AffineExpr {
    /// Bind concrete values to B, C and D.
    pub fn feeds(&self, b: Tensor, c: f32, d: Tensor) -> FeedDict {
        FeedDict::new()
            .with(self.b, b)
            .with(self.c, Tensor::scalar(c))
            .with(self.d, d)
    }
}

/// Build `matmul(a, B) * C + D` with `a` embedded as a constant and B, C, D
/// as placeholders. B and D are `n x n`; C is a scalar.
pub fn build_expression(n: usize, a: Tensor) -> Result<AffineExpr> {
    let mut graph = Graph::new();
    let a = graph.constant(a);
    let b = graph.placeholder("b", DType::F32, Shape::matrix(n, n));
    let c = graph.placeholder("c", DType::F32, Shape::scalar());
    let d = graph.placeholder("d", DType::F32, Shape::matrix(n, n));

    let ab = graph.matmul(a, b)?;
    let abc = graph.mul(ab, c)?;
    let f = graph.add(abc, d)?;
    Ok(AffineExpr { graph, b, c, d, f })
}

/// Sample an `n x n` matrix of integers in `[low, high)` and widen it to f32.
pub fn sample_matrix<R: Rng + ?Sized>(config: &BenchConfig, rng: &mut R) -> Result<Tensor> {
    let ints = Tensor::randint(config.low, config.high, Shape::matrix(config.n, config.n), rng)?;
    Ok(ints.cast(DType::F32)?)
}

/// Sampled operands plus the graph that combines them.
#[derive(Debug, Clone)]
pub struct GemmRun {
    pub a: Tensor,
    pub b: Tensor,
    pub d: Tensor,
    pub scalar: f32,
    pub expr: AffineExpr,
}

impl GemmRun {
    /// Sample A, B and D, then build the expression graph.
    pub fn prepare<R: Rng + ?Sized>(config: &BenchConfig, rng: &mut R) -> Result<Self> {
        let a = sample_matrix(config, rng)?;
        let b = sample_matrix(config, rng)?;
        let d = sample_matrix(config, rng)?;
        let expr = build_expression(config.n, a.clone())?;
        debug!(
            "prepared {n}x{n} affine graph with {} nodes",
            expr.graph.len(),
            n = config.n
        );
        Ok(GemmRun {
            a,
            b,
            d,
            scalar: config.scalar,
            expr,
        })
    }

    /// Evaluate the graph once in `session`, timing only the `run` call.
    pub fn time(&self, session: &Session) -> Result<GemmReport> {
        let feeds = self.expr.feeds(self.b.clone(), self.scalar, self.d.clone());
        let t0 = Instant::now();
        let result = session.run(&self.expr.graph, self.expr.f, &feeds)?;
        let elapsed = t0.elapsed();
        debug!(
            "evaluated on '{}' in {:?}",
            session.backend().name(),
            elapsed
        );
        Ok(GemmReport { result, elapsed })
    }
}

/// Outcome of one timed evaluation.
#[derive(Debug, Clone)]
pub struct GemmReport {
    pub result: Tensor,
    pub elapsed: Duration,
}

impl GemmReport {
    /// Elapsed wall-clock time in seconds. Never negative.
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

/// Print the result matrix and the elapsed seconds, one line each.
pub fn write_report<W: Write>(out: &mut W, report: &GemmReport) -> io::Result<()> {
    writeln!(out, "Result:  {}", report.result)?;
    writeln!(out, "time =  {}", report.elapsed_secs())
}
