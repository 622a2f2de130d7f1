//! Aggregation tests over fixture checkpoint roots
//!
//! Each test lays out run directories in a temp dir the way training
//! writes them, then checks what the aggregator selects and averages.

use std::fs;
use std::path::{Path, PathBuf};

use factorvae_report::aggregate::{compare_methods, Aggregator, RunFilter};
use factorvae_report::metrics::LossComponent;
use factorvae_report::Error;
use serde_json::{json, Value};
use tempfile::{tempdir, TempDir};

// =============================================================================
// Fixtures
// =============================================================================

fn write_run(root: &Path, name: &str, log: &Value) {
    let dir = root.join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("metrics.json"), serde_json::to_string(log).unwrap()).unwrap();
}

/// One training step per window, so each point equals `value / 10`.
fn training_log(values: &[f64]) -> Value {
    let mut records = Vec::new();
    for (i, value) in values.iter().enumerate() {
        let base = i as u64 * 1000;
        records.push(json!({
            "its": base + 500,
            "vae_loss": value, "D_loss": value, "recon_loss": value, "tc_loss": value / 100.0
        }));
        records.push(json!({
            "its": base + 1000,
            "vae_loss": 0.0, "D_loss": 0.0, "recon_loss": 0.0, "tc_loss": 0.0
        }));
    }
    Value::Array(records)
}

/// A reconstruction checkpoint before each scored evaluation.
fn eval_log(scores: &[f64], recon: f64) -> Value {
    let mut records = Vec::new();
    for (i, score) in scores.iter().enumerate() {
        let its = (i as u64 + 1) * 1000;
        records.push(json!({"its": its - 1, "recon_loss": recon}));
        records.push(json!({"its": its, "metric_score": score}));
    }
    Value::Array(records)
}

fn ad_root() -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let root = dir.path().join("ad_factorvae");
    fs::create_dir(&root).unwrap();
    (dir, root)
}

fn assert_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-9, "{actual:?} vs {expected:?}");
    }
}

fn two_seeds(gammas: &[&str], lambdas: &[&str]) -> RunFilter {
    RunFilter::new(
        ["seed1", "seed2"],
        gammas.iter().copied(),
        lambdas.iter().copied(),
    )
    .unwrap()
}

// =============================================================================
// Averaging
// =============================================================================

#[test]
fn test_training_curves_average_seeds() {
    let (_dir, root) = ad_root();
    write_run(&root, "fv_ga_4_la_10_iters5000_seed1", &training_log(&[10.0, 20.0, 30.0]));
    write_run(&root, "fv_ga_4_la_10_iters5000_seed2", &training_log(&[30.0, 40.0, 50.0]));

    let aggregator = Aggregator::new(&root, two_seeds(&["4"], &["10"]), 100_000);
    let curves = aggregator.training_curves().unwrap();

    assert_eq!(curves.len(), 1);
    let curve = &curves[0];
    assert_eq!(curve.label(), "ga_4_la_10");
    assert_eq!(curve.seeds(), 2);
    assert_eq!(curve.series().iters(), &[1000, 2000, 3000]);
    assert_close(curve.series().recon_loss(), &[2.0, 3.0, 4.0]);
    assert_close(curve.series().tc_loss(), &[0.02, 0.03, 0.04]);
    assert_close(
        curve.series().component(LossComponent::Discriminator),
        &[2.0, 3.0, 4.0],
    );
}

#[test]
fn test_training_curves_respect_cutoff() {
    let (_dir, root) = ad_root();
    write_run(&root, "fv_ga_4_la_10_iters5000_seed1", &training_log(&[10.0, 20.0, 30.0]));
    write_run(&root, "fv_ga_4_la_10_iters5000_seed2", &training_log(&[30.0, 40.0, 50.0]));

    let aggregator = Aggregator::new(&root, two_seeds(&["4"], &["10"]), 2000);
    let curves = aggregator.training_curves().unwrap();

    assert_eq!(curves[0].series().iters(), &[1000, 2000]);
}

#[test]
fn test_seed_before_iters_names_are_grouped() {
    let (_dir, root) = ad_root();
    write_run(&root, "m_ga_4.0_la_10_seed123_iters500", &eval_log(&[0.5], 40.0));
    write_run(&root, "m_ga_4.0_la_10_seed7_iters500", &eval_log(&[0.7], 60.0));

    let filter = RunFilter::new(["seed123", "seed7"], ["4.0"], ["10"]).unwrap();
    let aggregator = Aggregator::new(&root, filter, 100_000);

    let anchors = aggregator.discover().unwrap();
    assert_eq!(anchors.len(), 1);
    assert_eq!(anchors[0].seed(), "seed123");

    let curves = aggregator.disentanglement_curves().unwrap();
    assert_eq!(curves.len(), 1);
    assert_eq!(curves[0].label(), "ga_4.0_la_10");
    assert_close(curves[0].series().scores(), &[0.0, 0.6]);
    assert!((curves[0].series().final_recon_loss() - 50.0).abs() < 1e-9);
}

#[test]
fn test_disentanglement_curves_average_seeds() {
    let (_dir, root) = ad_root();
    write_run(&root, "fv_ga_4_la_10_iters5000_seed1", &eval_log(&[0.5, 0.7], 40.0));
    write_run(&root, "fv_ga_4_la_10_iters5000_seed2", &eval_log(&[0.7, 0.9], 60.0));

    let aggregator = Aggregator::new(&root, two_seeds(&["4"], &["10"]), 100_000);
    let curves = aggregator.disentanglement_curves().unwrap();

    assert_eq!(curves.len(), 1);
    let series = curves[0].series();
    assert_eq!(series.iters(), &[0, 1000, 2000]);
    assert_close(series.scores(), &[0.0, 0.6, 0.8]);
    assert!((series.final_recon_loss() - 50.0).abs() < 1e-9);
}

#[test]
fn test_summary_reports_gamma_value() {
    let (_dir, root) = ad_root();
    for (gamma, score) in [("4", 0.6), ("16", 0.8)] {
        for seed in ["seed1", "seed2"] {
            let name = format!("fv_ga_{gamma}_la_10_iters5000_{seed}");
            write_run(&root, &name, &eval_log(&[score], 25.0));
        }
    }

    let summary = Aggregator::new(&root, two_seeds(&["4", "16"], &["10"]), 100_000)
        .summary()
        .unwrap();

    assert!(!summary.vanilla);
    assert_eq!(summary.points.len(), 2);
    // Name order: "ga_16" sorts before "ga_4".
    assert!((summary.points[0].value - 16.0).abs() < f64::EPSILON);
    assert!((summary.points[0].final_score - 0.8).abs() < 1e-9);
    assert!((summary.points[1].value - 4.0).abs() < f64::EPSILON);
    assert!((summary.points[1].final_recon_loss - 25.0).abs() < 1e-9);
}

// =============================================================================
// Selection
// =============================================================================

#[test]
fn test_gamma_filter_excludes_unrequested() {
    let (_dir, root) = ad_root();
    write_run(&root, "fv_ga_4_la_10_iters5000_seed1", &eval_log(&[0.5], 1.0));
    write_run(&root, "fv_ga_4_la_10_iters5000_seed2", &eval_log(&[0.5], 1.0));
    // Same seed and lambda, other gamma; its seed2 sibling is missing, so
    // selecting it would fail the aggregation.
    write_run(&root, "fv_ga_8_la_10_iters5000_seed1", &eval_log(&[0.9], 1.0));

    let aggregator = Aggregator::new(&root, two_seeds(&["4"], &["10"]), 100_000);
    let anchors = aggregator.discover().unwrap();

    assert_eq!(anchors.len(), 1);
    assert_eq!(anchors[0].gamma(), "4");
    assert_eq!(aggregator.disentanglement_curves().unwrap().len(), 1);
}

#[test]
fn test_lambda_filter_applies_outside_vanilla() {
    let (_dir, root) = ad_root();
    write_run(&root, "fv_ga_4_la_10_iters5000_seed1", &eval_log(&[0.5], 1.0));
    write_run(&root, "fv_ga_4_la_20_iters5000_seed1", &eval_log(&[0.5], 1.0));

    let aggregator = Aggregator::new(&root, two_seeds(&["4"], &["20"]), 100_000);
    let anchors = aggregator.discover().unwrap();

    assert_eq!(anchors.len(), 1);
    assert_eq!(anchors[0].lambda(), Some("20"));
}

#[test]
fn test_vanilla_root_skips_lambda_filter() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("vanilla_factorvae");
    write_run(&root, "fv_ga_4_iters5000_seed1", &eval_log(&[0.4], 30.0));
    write_run(&root, "fv_ga_4_iters5000_seed2", &eval_log(&[0.6], 50.0));

    let aggregator = Aggregator::new(&root, two_seeds(&["4"], &[]), 100_000);
    assert!(aggregator.is_vanilla());

    let curves = aggregator.disentanglement_curves().unwrap();
    assert_eq!(curves.len(), 1);
    assert_eq!(curves[0].label(), "ga_4");
    assert!((curves[0].series().final_score() - 0.5).abs() < 1e-9);
}

#[test]
fn test_vanilla_override_restores_lambda_filter() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("vanilla_factorvae");
    write_run(&root, "fv_ga_4_iters5000_seed1", &eval_log(&[0.4], 30.0));

    let aggregator = Aggregator::new(&root, two_seeds(&["4"], &[]), 100_000).vanilla(false);
    assert!(aggregator.discover().unwrap().is_empty());
}

#[test]
fn test_unparseable_entries_ignored() {
    let (_dir, root) = ad_root();
    fs::create_dir(root.join("tensorboard")).unwrap();
    fs::write(root.join("fv_ga_4_la_10_iters5000_seed1.txt"), "not a dir").unwrap();
    write_run(&root, "fv_ga_4_la_10_iters5000_seed1", &eval_log(&[0.5], 1.0));

    let aggregator = Aggregator::new(&root, RunFilter::new(["seed1"], ["4"], ["10"]).unwrap(), 10);
    let anchors = aggregator.discover().unwrap();

    assert_eq!(anchors.len(), 1);
    assert_eq!(anchors[0].name(), "fv_ga_4_la_10_iters5000_seed1");
}

#[test]
fn test_compare_methods_keeps_order() {
    let dir = tempdir().unwrap();
    let vanilla = dir.path().join("vanilla_factorvae");
    let ad = dir.path().join("ad_factorvae");
    write_run(&vanilla, "fv_ga_6_iters5000_seed1", &eval_log(&[0.7], 45.0));
    write_run(&ad, "ad_ga_6_la_10_iters5000_seed1", &eval_log(&[0.8], 35.0));

    let methods = [
        Aggregator::new(&vanilla, RunFilter::new(["seed1"], ["6"], Vec::<String>::new()).unwrap(), 10_000),
        Aggregator::new(&ad, RunFilter::new(["seed1"], ["6"], ["10"]).unwrap(), 10_000),
    ];
    let summaries = compare_methods(&methods).unwrap();

    assert_eq!(summaries.len(), 2);
    assert!(summaries[0].vanilla);
    assert!((summaries[0].points[0].final_recon_loss - 45.0).abs() < 1e-9);
    assert!(!summaries[1].vanilla);
    assert!((summaries[1].points[0].final_score - 0.8).abs() < 1e-9);
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_seed_length_mismatch_is_error() {
    let (_dir, root) = ad_root();
    write_run(&root, "fv_ga_4_la_10_iters5000_seed1", &training_log(&[10.0, 20.0]));
    write_run(&root, "fv_ga_4_la_10_iters5000_seed2", &training_log(&[10.0, 20.0, 30.0]));

    let err = Aggregator::new(&root, two_seeds(&["4"], &["10"]), 100_000)
        .training_curves()
        .unwrap_err();

    match err {
        Error::SeriesLengthMismatch {
            run,
            seed,
            expected,
            actual,
        } => {
            assert_eq!(run, "ga_4_la_10");
            assert_eq!(seed, "seed2");
            assert_eq!(expected, 2);
            assert_eq!(actual, 3);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_seed_iteration_mismatch_is_error() {
    let (_dir, root) = ad_root();
    write_run(&root, "fv_ga_4_la_10_iters5000_seed1", &eval_log(&[0.5, 0.7], 40.0));
    write_run(
        &root,
        "fv_ga_4_la_10_iters5000_seed2",
        &json!([
            {"its": 999, "recon_loss": 60.0},
            {"its": 1000, "metric_score": 0.6},
            {"its": 2500, "metric_score": 0.8}
        ]),
    );

    let err = Aggregator::new(&root, two_seeds(&["4"], &["10"]), 100_000)
        .disentanglement_curves()
        .unwrap_err();

    match err {
        Error::IterationMismatch {
            run,
            seed,
            position,
            expected,
            actual,
        } => {
            assert_eq!(run, "ga_4_la_10");
            assert_eq!(seed, "seed2");
            assert_eq!(position, 2);
            assert_eq!(expected, 2000);
            assert_eq!(actual, 2500);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_training_iteration_mismatch_is_error() {
    let (_dir, root) = ad_root();
    write_run(&root, "fv_ga_4_la_10_iters5000_seed1", &training_log(&[10.0, 20.0]));
    // Same number of windows, but the second closes at 3000.
    let shifted = json!([
        {"its": 500, "vae_loss": 1.0, "D_loss": 1.0, "recon_loss": 1.0, "tc_loss": 0.1},
        {"its": 1000, "vae_loss": 0.0, "D_loss": 0.0, "recon_loss": 0.0, "tc_loss": 0.0},
        {"its": 2500, "vae_loss": 1.0, "D_loss": 1.0, "recon_loss": 1.0, "tc_loss": 0.1},
        {"its": 3000, "vae_loss": 0.0, "D_loss": 0.0, "recon_loss": 0.0, "tc_loss": 0.0}
    ]);
    write_run(&root, "fv_ga_4_la_10_iters5000_seed2", &shifted);

    let err = Aggregator::new(&root, two_seeds(&["4"], &["10"]), 100_000)
        .training_curves()
        .unwrap_err();

    assert!(matches!(
        err,
        Error::IterationMismatch {
            position: 1,
            expected: 2000,
            actual: 3000,
            ..
        }
    ));
}

#[test]
fn test_missing_seed_sibling_is_error() {
    let (_dir, root) = ad_root();
    write_run(&root, "fv_ga_4_la_10_iters5000_seed1", &eval_log(&[0.5], 1.0));

    let err = Aggregator::new(&root, two_seeds(&["4"], &["10"]), 100_000)
        .disentanglement_curves()
        .unwrap_err();

    match err {
        Error::Read { path, .. } => {
            assert!(path.ends_with("fv_ga_4_la_10_iters5000_seed2/metrics.json"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_malformed_log_aborts_aggregation() {
    let (_dir, root) = ad_root();
    write_run(&root, "fv_ga_4_la_10_iters5000_seed1", &json!([{"its": 0}, 42]));

    let err = Aggregator::new(&root, RunFilter::new(["seed1"], ["4"], ["10"]).unwrap(), 100)
        .disentanglement_curves()
        .unwrap_err();

    assert!(matches!(err, Error::UnexpectedRecordType { index: 1, .. }));
}

#[test]
fn test_missing_root_is_error() {
    let dir = tempdir().unwrap();
    let aggregator = Aggregator::new(
        dir.path().join("absent"),
        RunFilter::new(["seed1"], ["4"], ["10"]).unwrap(),
        100,
    );
    assert!(matches!(aggregator.discover(), Err(Error::Read { .. })));
}
