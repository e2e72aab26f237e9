//! gemm-timing: evaluate `matmul(A, B) * C + D` once and print how long it took.

use std::io::Write;

use anyhow::{Context, Result};
use gt_bench::{write_report, BenchConfig, GemmRun};
use gt_graph::Session;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = BenchConfig::default();
    let run = GemmRun::prepare(&config, &mut rand::thread_rng())
        .context("failed to build the expression graph")?;

    let session = Session::cpu().context("failed to open execution session")?;
    let mut out = std::io::stdout().lock();
    writeln!(out, "start")?;
    let report = run.time(&session).context("evaluation failed")?;
    write_report(&mut out, &report).context("failed to write the report")?;
    Ok(())
}
