//! Two-pass speed normalization.
//!
//! Pass 1 profiles every raw trajectory file. Pass 2 starts only after all
//! profiles exist: it pools condition types by synchrony group, derives one
//! factor per (group, disc) that moves each group's mean speed onto the
//! cross-group target, and verifies the result before anything is written.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::{FileErrorPolicy, NormalizeConfig};
use crate::export::ExportError;
use crate::export::naming::TrialFile;
use crate::export::trajectory_csv::read_coordinates;
use crate::speed::NormalizeError;
use crate::speed::factors::{FACTORS_FILE, ScalingFactors};
use crate::speed::profile::{SpeedProfile, SpeedSum};
use crate::stimulus::condition::{ConditionGroup, ConditionType};
use crate::stimulus::sample::Disc;

pub const SUMMARY_HEADER: [&str; 3] = ["File", "Mean Speed Disc 1", "Mean Speed Disc 2"];

pub fn summary_file_name(condition: ConditionType) -> String {
    format!("speed_summary_type{}.csv", condition.code())
}

/// Frame-weighted speed sums per (condition type, disc).
#[derive(Clone, Debug, Default)]
pub struct GroupStats {
    sums: BTreeMap<(ConditionType, Disc), SpeedSum>,
}

impl GroupStats {
    pub fn from_profiles(profiles: &[SpeedProfile]) -> Self {
        let mut sums: BTreeMap<(ConditionType, Disc), SpeedSum> = BTreeMap::new();
        for p in profiles {
            for disc in Disc::BOTH {
                sums.entry((p.condition, disc)).or_default().merge(p.sum(disc));
            }
        }
        Self { sums }
    }

    pub fn by_type(&self, condition: ConditionType, disc: Disc) -> SpeedSum {
        self.sums.get(&(condition, disc)).copied().unwrap_or_default()
    }

    pub fn pooled(&self, group: ConditionGroup, disc: Disc) -> SpeedSum {
        let mut total = SpeedSum::default();
        for member in group.members() {
            total.merge(self.by_type(member, disc));
        }
        total
    }
}

/// How one (group, disc) pair was normalized.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FactorReport {
    pub group: ConditionGroup,
    pub disc: Disc,
    pub mean_speed: f64,
    pub target_speed: f64,
    pub factor: f64,
}

/// Mean speed gap between the two types pooled into one group.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConsistencyReport {
    pub group: ConditionGroup,
    pub disc: Disc,
    pub mean_a: f64,
    pub mean_b: f64,
    pub relative_gap: f64,
}

#[derive(Clone, Debug)]
pub struct NormalizeReport {
    pub files: usize,
    pub skipped: Vec<PathBuf>,
    pub factors: Vec<FactorReport>,
    pub consistency: Vec<ConsistencyReport>,
    pub factors_path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct SpeedNormalizer {
    pub frame_period: f64,
    pub on_file_error: FileErrorPolicy,
    pub consistency_tolerance: f64,
    pub strict_consistency: bool,
    pub acceptance_tolerance: f64,
}

impl SpeedNormalizer {
    pub fn new(cfg: &NormalizeConfig, frame_period: f64) -> Self {
        Self {
            frame_period,
            on_file_error: cfg.on_file_error,
            consistency_tolerance: cfg.consistency_tolerance,
            strict_consistency: cfg.strict_consistency,
            acceptance_tolerance: cfg.acceptance_tolerance,
        }
    }

    /// Raw trajectory files under `raw_dir`, sorted by path.
    pub fn discover(&self, raw_dir: &Path) -> Result<Vec<(PathBuf, TrialFile)>, NormalizeError> {
        let mut found = Vec::new();
        for entry in WalkDir::new(raw_dir).sort_by_file_name() {
            let entry = entry.map_err(|source| NormalizeError::Scan {
                path: raw_dir.display().to_string(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if let Some(trial_file) = TrialFile::parse_raw_csv(name) {
                found.push((entry.path().to_path_buf(), trial_file));
            }
        }
        if found.is_empty() {
            return Err(NormalizeError::NoFiles {
                path: raw_dir.display().to_string(),
            });
        }
        Ok(found)
    }

    pub fn profile_file(&self, path: &Path, condition: ConditionType) -> Result<SpeedProfile, ExportError> {
        let coords = read_coordinates(path)?;
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(SpeedProfile::from_coordinates(
            file,
            condition,
            &coords,
            self.frame_period,
        ))
    }

    /// Pass 1. Unreadable or malformed files follow `on_file_error`; a file
    /// without the `X1,Y1,X2,Y2` columns always aborts.
    pub fn collect(&self, raw_dir: &Path) -> Result<(Vec<SpeedProfile>, Vec<PathBuf>), NormalizeError> {
        let files = self.discover(raw_dir)?;
        let mut profiles = Vec::with_capacity(files.len());
        let mut skipped = Vec::new();
        for (path, trial_file) in files {
            match self.profile_file(&path, trial_file.condition) {
                Ok(profile) => {
                    debug!(
                        target: "speed",
                        "{}: disc1 {:.4}, disc2 {:.4}",
                        profile.file,
                        profile.mean(Disc::One),
                        profile.mean(Disc::Two)
                    );
                    profiles.push(profile);
                }
                Err(source @ ExportError::MissingColumn { .. }) => {
                    return Err(NormalizeError::File {
                        path: path.display().to_string(),
                        source,
                    });
                }
                Err(source) => match self.on_file_error {
                    FileErrorPolicy::Abort => {
                        return Err(NormalizeError::File {
                            path: path.display().to_string(),
                            source,
                        });
                    }
                    FileErrorPolicy::Skip => {
                        warn!(target: "speed", "skipping {}: {source}", path.display());
                        skipped.push(path);
                    }
                },
            }
        }
        info!(
            target: "speed",
            "profiled {} files ({} skipped)",
            profiles.len(),
            skipped.len()
        );
        Ok((profiles, skipped))
    }

    /// Compare the two member types of each pool.
    pub fn check_consistency(&self, stats: &GroupStats) -> Result<Vec<ConsistencyReport>, NormalizeError> {
        let mut reports = Vec::new();
        for group in ConditionGroup::ALL {
            let [a, b] = group.members();
            for disc in Disc::BOTH {
                let (Some(mean_a), Some(mean_b)) =
                    (stats.by_type(a, disc).mean(), stats.by_type(b, disc).mean())
                else {
                    warn!(
                        target: "speed",
                        "group {group}: cannot compare types {a} and {b} for disc {}, one has no frames",
                        disc.number()
                    );
                    continue;
                };
                let scale = mean_a.abs().max(mean_b.abs());
                let relative_gap = if scale > 0.0 {
                    (mean_a - mean_b).abs() / scale
                } else {
                    0.0
                };
                let report = ConsistencyReport {
                    group,
                    disc,
                    mean_a,
                    mean_b,
                    relative_gap,
                };
                if relative_gap > self.consistency_tolerance {
                    if self.strict_consistency {
                        return Err(NormalizeError::Inconsistent {
                            group,
                            disc: disc.number(),
                            type_a: a.code(),
                            type_b: b.code(),
                            relative_gap,
                        });
                    }
                    warn!(
                        target: "speed",
                        "group {group} disc {}: types {a} and {b} differ by {:.1}% ({mean_a:.4} vs {mean_b:.4})",
                        disc.number(),
                        relative_gap * 100.0
                    );
                }
                reports.push(report);
            }
        }
        Ok(reports)
    }

    /// Pass 2. Fails before producing any factor if a pool is empty or static.
    pub fn compute_factors(&self, stats: &GroupStats) -> Result<Vec<FactorReport>, NormalizeError> {
        let mut reports = Vec::new();
        for disc in Disc::BOTH {
            let mut means = Vec::with_capacity(ConditionGroup::ALL.len());
            for group in ConditionGroup::ALL {
                let pooled = stats.pooled(group, disc);
                let mean = pooled.mean().ok_or(NormalizeError::EmptyGroup {
                    group,
                    disc: disc.number(),
                })?;
                if !(mean.is_finite() && mean > 0.0) {
                    return Err(NormalizeError::ZeroSpeed {
                        group,
                        disc: disc.number(),
                        mean,
                    });
                }
                means.push((group, mean));
            }
            let target = means.iter().map(|(_, m)| m).sum::<f64>() / means.len() as f64;
            for (group, mean) in means {
                reports.push(FactorReport {
                    group,
                    disc,
                    mean_speed: mean,
                    target_speed: target,
                    factor: target / mean,
                });
            }
        }
        Ok(reports)
    }

    /// Acceptance check: rescaled pooled means must hit the target.
    pub fn verify(&self, profiles: &[SpeedProfile], reports: &[FactorReport]) -> Result<(), NormalizeError> {
        for r in reports {
            let mut scaled = SpeedSum::default();
            for p in profiles.iter().filter(|p| p.condition.group() == r.group) {
                scaled.add_scaled(p.speeds(r.disc), r.factor);
            }
            let achieved = scaled.mean().unwrap_or(f64::NAN);
            let rel = (achieved - r.target_speed).abs() / r.target_speed.abs();
            if !(rel <= self.acceptance_tolerance) {
                return Err(NormalizeError::AcceptanceFailed {
                    group: r.group,
                    disc: r.disc.number(),
                    achieved,
                    target: r.target_speed,
                });
            }
        }
        Ok(())
    }

    /// Full run: profile, pool, derive, verify, then write summaries and factors.
    pub fn run(&self, raw_dir: &Path, out_dir: &Path) -> Result<NormalizeReport, NormalizeError> {
        let (profiles, skipped) = self.collect(raw_dir)?;
        let stats = GroupStats::from_profiles(&profiles);
        let consistency = self.check_consistency(&stats)?;
        let factor_reports = self.compute_factors(&stats)?;
        self.verify(&profiles, &factor_reports)?;

        std::fs::create_dir_all(out_dir).map_err(|source| {
            NormalizeError::Export(ExportError::Io {
                path: out_dir.display().to_string(),
                source,
            })
        })?;
        for condition in ConditionType::ALL {
            write_summary(
                &out_dir.join(summary_file_name(condition)),
                profiles.iter().filter(|p| p.condition == condition),
            )?;
        }

        let mut factors = ScalingFactors::identity();
        for r in &factor_reports {
            factors.set(r.group, r.disc, r.factor);
            info!(
                target: "speed",
                "group {} disc {}: mean {:.4} -> target {:.4}, factor {:.6}",
                r.group,
                r.disc.number(),
                r.mean_speed,
                r.target_speed,
                r.factor
            );
        }
        let factors_path = out_dir.join(FACTORS_FILE);
        factors.write_csv(&factors_path)?;

        Ok(NormalizeReport {
            files: profiles.len(),
            skipped,
            factors: factor_reports,
            consistency,
            factors_path,
        })
    }
}

/// `File,Mean Speed Disc 1,Mean Speed Disc 2`, one row per profile.
pub fn write_summary<'a>(
    path: &Path,
    profiles: impl Iterator<Item = &'a SpeedProfile>,
) -> Result<(), ExportError> {
    let csv_err = |source| ExportError::Csv {
        path: path.display().to_string(),
        source,
    };
    let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;
    wtr.write_record(SUMMARY_HEADER).map_err(csv_err)?;
    for p in profiles {
        wtr.write_record([
            p.file.clone(),
            p.mean(Disc::One).to_string(),
            p.mean(Disc::Two).to_string(),
        ])
        .map_err(csv_err)?;
    }
    wtr.flush().map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })
}
