//! `gt-bench` - times a single `matmul(A, B) * C + D` evaluation.
//!
//! [`GemmRun::prepare`] samples the operands and builds the graph;
//! [`GemmRun::time`] evaluates it once inside a caller-owned session and
//! measures only that call.

pub mod config;
pub mod gemm;

pub use config::BenchConfig;
pub use gemm::{
    build_expression, sample_matrix, write_report, AffineExpr, GemmReport, GemmRun,
};
