//! `generate`: design the trial list, then synthesize and export every trial on
//! the worker pool.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info};

use crate::config::{AppConfig, RenderMode, VideoBackend};
use crate::error::{Error, Result};
use crate::export::ExportError;
use crate::export::frames::FrameRenderer;
use crate::export::manifest::{RUN_FILE, TRIALS_FILE, write_run_record, write_trials};
use crate::export::naming::TrialFile;
use crate::export::trace::render_trace;
use crate::export::trajectory_csv::write_coordinates;
use crate::export::video::{FfmpegSink, FrameSink, PngSequenceSink, write_video};
use crate::speed::factors::ScalingFactors;
use crate::stimulus::downsample::{scale, scale_disc};
use crate::stimulus::params::SimulationParams;
use crate::stimulus::sample::{Coordinates, Disc, Sample};
use crate::stimulus::trial::{Trial, design_trials};
use crate::worker::run_ordered;

pub const RAW_DIR: &str = "raw";
pub const FINAL_DIR: &str = "final";
pub const VIDEO_DIR: &str = "video";
pub const IMAGE_DIR: &str = "images";

/// Files written for one trial.
#[derive(Clone, Debug, PartialEq)]
pub struct TrialOutput {
    pub trial: Trial,
    pub raw_csv: PathBuf,
    pub final_csv: PathBuf,
    /// Video, frame directory or trace image; `None` in `none` mode.
    pub media: Option<PathBuf>,
}

#[derive(Clone, Debug)]
pub struct GenerateReport {
    pub out_dir: PathBuf,
    pub trials: Vec<TrialOutput>,
    pub normalized: bool,
}

impl GenerateReport {
    pub fn raw_dir(&self) -> PathBuf {
        self.out_dir.join(RAW_DIR)
    }
}

struct Layout {
    root: PathBuf,
    raw: PathBuf,
    final_: PathBuf,
    media: Option<PathBuf>,
}

impl Layout {
    fn create(root: &Path, mode: RenderMode) -> Result<Self> {
        let media = match mode {
            RenderMode::Video => Some(root.join(VIDEO_DIR)),
            RenderMode::Image => Some(root.join(IMAGE_DIR)),
            RenderMode::None => None,
        };
        let layout = Self {
            root: root.to_path_buf(),
            raw: root.join(RAW_DIR),
            final_: root.join(FINAL_DIR),
            media,
        };
        for dir in [Some(&layout.raw), Some(&layout.final_), layout.media.as_ref()]
            .into_iter()
            .flatten()
        {
            fs::create_dir_all(dir).map_err(|source| ExportError::Io {
                path: dir.display().to_string(),
                source,
            })?;
        }
        Ok(layout)
    }
}

/// Everything a worker needs to turn one trial into files.
pub struct TrialExporter<'a> {
    cfg: &'a AppConfig,
    params: SimulationParams,
    factors: ScalingFactors,
    renderer: FrameRenderer,
    layout: Layout,
}

impl<'a> TrialExporter<'a> {
    /// Pixel coordinates: amplitude scale times the group's per-disc speed factor.
    pub fn finalize(&self, sample: &Sample) -> Coordinates {
        let group = sample.trial.condition.group();
        let mut coords = sample.coords.clone();
        scale(&mut coords, self.params.pixel_scale);
        for disc in Disc::BOTH {
            scale_disc(&mut coords, disc, self.factors.get(group, disc));
        }
        coords
    }

    fn export(&self, trial: &Trial) -> Result<TrialOutput> {
        let seed = self.cfg.design.seed;
        let sample = crate::stimulus::pipeline::synthesize(trial, &self.params, seed)?;
        let names = TrialFile::for_trial(trial, seed);

        let raw_csv = self.layout.raw.join(names.raw_csv());
        write_coordinates(&raw_csv, &sample.coords)?;

        let coords = self.finalize(&sample);
        let final_csv = self.layout.final_.join(names.final_csv());
        write_coordinates(&final_csv, &coords)?;

        let media = match (&self.layout.media, self.cfg.render.mode) {
            (Some(dir), RenderMode::Video) => Some(self.write_video(dir, &names, &coords)?),
            (Some(dir), RenderMode::Image) => {
                let path = dir.join(names.trace());
                render_trace(&path, &coords, &self.cfg.render)?;
                Some(path)
            }
            _ => None,
        };

        info!(
            target: "generate",
            "trial {:03} type {} ({}, {}) done",
            trial.index,
            trial.condition,
            trial.condition.group(),
            trial.condition.motion().label()
        );
        Ok(TrialOutput {
            trial: *trial,
            raw_csv,
            final_csv,
            media,
        })
    }

    fn write_video(&self, dir: &Path, names: &TrialFile, coords: &Coordinates) -> Result<PathBuf> {
        let r = &self.cfg.render;
        let sink: Box<dyn FrameSink> = match r.video_backend {
            VideoBackend::Ffmpeg => Box::new(FfmpegSink::spawn(
                &r.ffmpeg_path,
                &dir.join(names.video()),
                r.width,
                r.height,
                r.fps,
            )?),
            VideoBackend::PngSequence => Box::new(PngSequenceSink::create(
                &dir.join(names.frames_dir()),
                r.width,
                r.height,
            )?),
        };
        Ok(write_video(&self.renderer, coords, sink)?)
    }
}

fn load_factors(cfg: &AppConfig) -> Result<(ScalingFactors, bool)> {
    match cfg.render.scaling_factors.as_deref() {
        Some(path) => {
            let factors = ScalingFactors::read_csv(Path::new(path))?;
            for (group, disc, f) in factors.iter() {
                debug!(target: "generate", "factor {group}/disc {}: {f}", disc.number());
            }
            info!(target: "generate", "using scaling factors from {path}");
            Ok((factors, true))
        }
        None => {
            info!(
                target: "generate",
                "no scaling factors given; output is unnormalized (all factors 1.0)"
            );
            Ok((ScalingFactors::identity(), false))
        }
    }
}

/// Run a full batch. Output is a pure function of the configuration: the worker
/// count only changes wall time.
pub fn run(cfg: &AppConfig) -> Result<GenerateReport> {
    cfg.validate()?;
    let started = Instant::now();
    let params = cfg.simulation.params()?;
    let trials = design_trials(cfg.design.repetitions, cfg.design.seed)?;
    let (factors, normalized) = load_factors(cfg)?;

    let layout = Layout::create(Path::new(&cfg.generate.out_dir), cfg.render.mode)?;
    write_trials(&layout.root.join(TRIALS_FILE), &trials)?;
    write_run_record(&layout.root.join(RUN_FILE), cfg, trials.len())?;

    let workers = cfg.generate.resolved_workers();
    let timebase = params.timebase(cfg.render.fps);
    info!(
        target: "generate",
        "{} trials, seed {}, {} workers, mode {:?}",
        trials.len(),
        cfg.design.seed,
        workers,
        cfg.render.mode
    );
    info!(
        target: "generate",
        "{} steps ({:.1} simulated s) -> {} frames per trial ({:.2} s at {} fps)",
        params.n_steps,
        timebase.simulated_duration(params.n_steps),
        timebase.frame_count(params.n_steps),
        timebase.display_duration(params.n_steps),
        cfg.render.fps
    );

    let exporter = TrialExporter {
        cfg,
        params,
        factors,
        renderer: FrameRenderer::new(&cfg.render),
        layout,
    };
    let outputs = run_ordered(&trials, workers, |trial| {
        exporter.export(trial).map_err(|e| Error::Trial {
            index: trial.index,
            source: Box::new(e),
        })
    })?;

    info!(
        target: "generate",
        "wrote {} trials to {} in {:.2?}",
        outputs.len(),
        exporter.layout.root.display(),
        started.elapsed()
    );
    Ok(GenerateReport {
        out_dir: exporter.layout.root,
        trials: outputs,
        normalized,
    })
}
