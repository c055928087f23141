use std::fs;
use std::path::Path;

use approx::assert_relative_eq;

use chasegen::config::{AppConfig, FileErrorPolicy, RenderMode};
use chasegen::export::ExportError;
use chasegen::export::naming::TrialFile;
use chasegen::export::trajectory_csv::{read_coordinates, write_coordinates};
use chasegen::speed::NormalizeError;
use chasegen::speed::factors::{FACTORS_FILE, ScalingFactors};
use chasegen::speed::normalizer::{SpeedNormalizer, summary_file_name};
use chasegen::stimulus::condition::{ConditionGroup, ConditionType};
use chasegen::stimulus::sample::{Coordinates, Disc};

fn normalizer(cfg: &AppConfig) -> SpeedNormalizer {
    SpeedNormalizer::new(&cfg.normalize, cfg.render.frame_period())
}

/// Straight-line track moving `step` per frame on both discs.
fn write_track(dir: &Path, index: usize, code: u8, step: f64) {
    let mut coords = Coordinates::default();
    for i in 0..20 {
        let v = i as f64 * step;
        coords.push([v, 0.0, 0.0, v]);
    }
    let name = TrialFile {
        index,
        condition: ConditionType::new(code).expect("code"),
        seed: 0,
    }
    .raw_csv();
    write_coordinates(&dir.join(name), &coords).expect("write track");
}

#[test]
fn generate_then_normalize_equalizes_group_means() {
    let work = tempfile::tempdir().expect("tempdir");
    let mut cfg = AppConfig::default();
    cfg.simulation.n_steps = 256;
    cfg.design.repetitions = 2;
    cfg.design.seed = 17;
    cfg.render.mode = RenderMode::None;
    cfg.generate.out_dir = work.path().join("out").display().to_string();
    cfg.generate.workers = 3;

    let report = chasegen::generate::run(&cfg).expect("generate");
    assert_eq!(report.trials.len(), 8);

    let speed_dir = work.path().join("speed");
    let n = normalizer(&cfg);
    let norm = n.run(&report.raw_dir(), &speed_dir).expect("normalize");
    assert_eq!(norm.files, 8);
    assert!(norm.skipped.is_empty());
    for code in [1, 4, 5, 8] {
        let summary = speed_dir.join(summary_file_name(ConditionType::new(code).expect("code")));
        let text = fs::read_to_string(&summary).expect("summary");
        assert!(text.starts_with("File,Mean Speed Disc 1,Mean Speed Disc 2"));
        assert_eq!(text.lines().count(), 3, "{}", summary.display());
    }

    let factors = ScalingFactors::read_csv(&speed_dir.join(FACTORS_FILE)).expect("factors");

    // Apply the factors to the raw tables and re-measure pooled means.
    let (profiles, _) = n.collect(&report.raw_dir()).expect("collect");
    for disc in Disc::BOTH {
        let mut means = Vec::new();
        for group in ConditionGroup::ALL {
            let f = factors.get(group, disc);
            let (mut sum, mut frames) = (0.0, 0usize);
            for p in profiles.iter().filter(|p| p.condition.group() == group) {
                for s in p.speeds(disc).iter().filter(|s| s.is_finite()) {
                    sum += s * f;
                    frames += 1;
                }
            }
            means.push(sum / frames as f64);
        }
        assert_relative_eq!(means[0], means[1], max_relative = 1e-6);
    }
}

#[test]
fn normalized_generate_scales_final_tables() {
    let work = tempfile::tempdir().expect("tempdir");
    let factors_path = work.path().join(FACTORS_FILE);
    let mut factors = ScalingFactors::identity();
    factors.set(ConditionGroup::Low, Disc::One, 2.0);
    factors.write_csv(&factors_path).expect("factors");

    let mut cfg = AppConfig::default();
    cfg.simulation.n_steps = 32;
    cfg.design.repetitions = 1;
    cfg.render.mode = RenderMode::None;
    cfg.render.scaling_factors = Some(factors_path.display().to_string());
    cfg.generate.out_dir = work.path().join("out").display().to_string();

    let report = chasegen::generate::run(&cfg).expect("generate");
    assert!(report.normalized);
    let px = cfg.simulation.pixel_scale;
    let t1 = &report.trials[0];
    assert_eq!(t1.trial.condition.code(), 1);
    let raw = read_coordinates(&t1.raw_csv).expect("raw");
    let fin = read_coordinates(&t1.final_csv).expect("final");
    for i in 0..raw.len() {
        assert_relative_eq!(fin.x1[i], raw.x1[i] * px * 2.0, max_relative = 1e-12);
        assert_relative_eq!(fin.y2[i], raw.y2[i] * px, max_relative = 1e-12);
    }
}

#[test]
fn constant_group_is_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_track(dir.path(), 0, 1, 0.0);
    write_track(dir.path(), 1, 4, 1.0);
    write_track(dir.path(), 2, 5, 0.0);
    write_track(dir.path(), 3, 8, 1.0);

    let cfg = AppConfig::default();
    let out = dir.path().join("speed");
    let err = normalizer(&cfg).run(dir.path(), &out).expect_err("static low group");
    assert!(matches!(
        err,
        NormalizeError::ZeroSpeed {
            group: ConditionGroup::Low,
            ..
        }
    ));
    assert!(!out.join(FACTORS_FILE).exists());
}

fn write_four_tracks(dir: &Path) {
    write_track(dir, 0, 1, 1.0);
    write_track(dir, 1, 4, 2.0);
    write_track(dir, 2, 5, 1.0);
    write_track(dir, 3, 8, 2.0);
}

#[test]
fn bad_file_aborts_or_is_skipped() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_four_tracks(dir.path());
    fs::write(
        dir.path().join("trial004_type1_seed0_raw.csv"),
        "X1,Y1,X2,Y2\n1,2,3,4\n1,2,oops,4\n",
    )
    .expect("bad file");

    let mut cfg = AppConfig::default();
    let err = normalizer(&cfg)
        .run(dir.path(), &dir.path().join("abort"))
        .expect_err("abort policy");
    assert!(matches!(err, NormalizeError::File { .. }));

    cfg.normalize.on_file_error = FileErrorPolicy::Skip;
    let report = normalizer(&cfg)
        .run(dir.path(), &dir.path().join("skip"))
        .expect("skip policy");
    assert_eq!(report.files, 4);
    assert_eq!(report.skipped.len(), 1);
    let low = report
        .factors
        .iter()
        .find(|r| r.group == ConditionGroup::Low && r.disc == Disc::One)
        .expect("low factor");
    assert_relative_eq!(low.factor, 1.5);
}

#[test]
fn missing_columns_abort_even_when_skipping() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_four_tracks(dir.path());
    fs::write(dir.path().join("trial004_type1_seed0_raw.csv"), "A,B\n1,2\n").expect("bad file");

    let mut cfg = AppConfig::default();
    cfg.normalize.on_file_error = FileErrorPolicy::Skip;
    let out = dir.path().join("skip");
    let err = normalizer(&cfg)
        .run(dir.path(), &out)
        .expect_err("missing columns are fatal");
    assert!(matches!(
        err,
        NormalizeError::File {
            source: ExportError::MissingColumn { .. },
            ..
        }
    ));
    assert!(!out.join(FACTORS_FILE).exists());
}

#[test]
fn non_finite_cell_aborts_or_is_skipped() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_four_tracks(dir.path());
    fs::write(
        dir.path().join("trial004_type1_seed0_raw.csv"),
        "X1,Y1,X2,Y2\n0,0,0,0\nNaN,1,1,1\n",
    )
    .expect("nan file");

    let mut cfg = AppConfig::default();
    let err = normalizer(&cfg)
        .run(dir.path(), &dir.path().join("abort"))
        .expect_err("NaN aborts by default");
    assert!(matches!(
        err,
        NormalizeError::File {
            source: ExportError::Malformed { row: 2, .. },
            ..
        }
    ));

    cfg.normalize.on_file_error = FileErrorPolicy::Skip;
    let report = normalizer(&cfg)
        .run(dir.path(), &dir.path().join("skip"))
        .expect("NaN file skipped");
    assert_eq!(report.files, 4);
    assert_eq!(report.skipped.len(), 1);
    for r in &report.factors {
        assert!(r.factor.is_finite(), "{r:?}");
    }
}

#[test]
fn empty_directory_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cfg = AppConfig::default();
    assert!(matches!(
        normalizer(&cfg).run(dir.path(), &dir.path().join("out")),
        Err(NormalizeError::NoFiles { .. })
    ));
}
