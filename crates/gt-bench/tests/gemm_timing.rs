use approx::assert_relative_eq;
use gt_bench::{build_expression, BenchConfig, GemmRun};
use gt_graph::Session;
use gt_tensor::{Shape, Tensor};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Naive `a @ b * c + d` for square row-major matrices.
fn reference(a: &[f32], b: &[f32], c: f32, d: &[f32], n: usize) -> Vec<f32> {
    let mut out = vec![0.0f32; n * n];
    for i in 0..n {
        for j in 0..n {
            let mut sum = 0.0f32;
            for p in 0..n {
                sum += a[i * n + p] * b[p * n + j];
            }
            out[i * n + j] = sum * c + d[i * n + j];
        }
    }
    out
}

#[test]
fn test_default_run_matches_reference() {
    let config = BenchConfig::default();
    let mut rng = StdRng::seed_from_u64(42);
    let run = GemmRun::prepare(&config, &mut rng).unwrap();
    let session = Session::cpu().unwrap();
    let report = run.time(&session).unwrap();

    assert_eq!(report.result.shape().dims(), &[config.n, config.n]);
    let want = reference(
        run.a.data_f32().unwrap(),
        run.b.data_f32().unwrap(),
        config.scalar,
        run.d.data_f32().unwrap(),
        config.n,
    );
    for (got, want) in report.result.data_f32().unwrap().iter().zip(&want) {
        assert_relative_eq!(got, want, max_relative = 1e-5);
    }
}

#[test]
fn test_sampled_entries_in_range() {
    let config = BenchConfig::default();
    let mut rng = StdRng::seed_from_u64(3);
    let run = GemmRun::prepare(&config, &mut rng).unwrap();
    for m in [&run.a, &run.b, &run.d] {
        assert!(m
            .data_f32()
            .unwrap()
            .iter()
            .all(|v| v.fract() == 0.0 && *v >= -5.0 && *v < 5.0));
    }
}

#[test]
fn test_many_sizes_match_reference() {
    let session = Session::cpu().unwrap();
    let mut rng = StdRng::seed_from_u64(9);
    for n in [1, 2, 7, 20, 65] {
        let config = BenchConfig {
            n,
            ..BenchConfig::default()
        };
        let run = GemmRun::prepare(&config, &mut rng).unwrap();
        let report = run.time(&session).unwrap();
        assert_eq!(report.result.shape().dims(), &[n, n]);
        let want = reference(
            run.a.data_f32().unwrap(),
            run.b.data_f32().unwrap(),
            config.scalar,
            run.d.data_f32().unwrap(),
            n,
        );
        for (got, want) in report.result.data_f32().unwrap().iter().zip(&want) {
            assert_relative_eq!(got, want, max_relative = 1e-5);
        }
    }
}

#[test]
fn test_one_by_one_is_scalar_arithmetic() {
    let expr = build_expression(1, Tensor::new(vec![-4.0], Shape::matrix(1, 1))).unwrap();
    let feeds = expr.feeds(
        Tensor::new(vec![2.0], Shape::matrix(1, 1)),
        3.0,
        Tensor::new(vec![1.0], Shape::matrix(1, 1)),
    );
    let out = Session::cpu()
        .unwrap()
        .run(&expr.graph, expr.f, &feeds)
        .unwrap();
    assert_eq!(out.data_f32().unwrap(), &[-4.0 * 2.0 * 3.0 + 1.0]);
}

#[test]
fn test_identity_scenario_prints_like_numpy() {
    let a = Tensor::new(vec![1.0, 2.0, 3.0, 4.0], Shape::matrix(2, 2));
    let expr = build_expression(2, a).unwrap();
    let feeds = expr.feeds(
        Tensor::new(vec![1.0, 0.0, 0.0, 1.0], Shape::matrix(2, 2)),
        3.0,
        Tensor::zeros(Shape::matrix(2, 2)),
    );
    let out = Session::cpu()
        .unwrap()
        .run(&expr.graph, expr.f, &feeds)
        .unwrap();
    assert_eq!(out.data_f32().unwrap(), &[3.0, 6.0, 9.0, 12.0]);
    assert_eq!(out.to_string(), "[[ 3.  6.]\n [ 9. 12.]]");
}

#[test]
fn test_repeated_timing_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(5);
    let run = GemmRun::prepare(&BenchConfig::default(), &mut rng).unwrap();
    let session = Session::cpu().unwrap();
    let first = run.time(&session).unwrap();
    let second = run.time(&session).unwrap();
    assert_eq!(first.result, second.result);
}

#[test]
fn test_elapsed_is_finite_and_non_negative() {
    let mut rng = StdRng::seed_from_u64(8);
    let run = GemmRun::prepare(&BenchConfig::default(), &mut rng).unwrap();
    let report = run.time(&Session::cpu().unwrap()).unwrap();
    let secs = report.elapsed_secs();
    assert!(secs.is_finite());
    assert!(secs >= 0.0);
}
