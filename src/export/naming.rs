//! Output file names. Every artifact of a trial shares the stem
//! `trial{index:03}_type{type}_seed{seed}`.

use crate::stimulus::condition::ConditionType;
use crate::stimulus::trial::Trial;

pub const RAW_CSV_SUFFIX: &str = "_raw.csv";
pub const FINAL_CSV_SUFFIX: &str = "_final.csv";
pub const VIDEO_SUFFIX: &str = ".mp4";
pub const FRAMES_SUFFIX: &str = "_frames";
pub const TRACE_SUFFIX: &str = "_trace.png";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrialFile {
    pub index: usize,
    pub condition: ConditionType,
    pub seed: u64,
}

impl TrialFile {
    pub fn for_trial(trial: &Trial, seed: u64) -> Self {
        Self {
            index: trial.index,
            condition: trial.condition,
            seed,
        }
    }

    pub fn stem(&self) -> String {
        format!(
            "trial{:03}_type{}_seed{}",
            self.index,
            self.condition.code(),
            self.seed
        )
    }

    pub fn raw_csv(&self) -> String {
        format!("{}{RAW_CSV_SUFFIX}", self.stem())
    }

    pub fn final_csv(&self) -> String {
        format!("{}{FINAL_CSV_SUFFIX}", self.stem())
    }

    pub fn video(&self) -> String {
        format!("{}{VIDEO_SUFFIX}", self.stem())
    }

    pub fn frames_dir(&self) -> String {
        format!("{}{FRAMES_SUFFIX}", self.stem())
    }

    pub fn trace(&self) -> String {
        format!("{}{TRACE_SUFFIX}", self.stem())
    }

    /// Parse a raw trajectory file name; `None` for anything else.
    pub fn parse_raw_csv(file_name: &str) -> Option<Self> {
        Self::parse_stem(file_name.strip_suffix(RAW_CSV_SUFFIX)?)
    }

    pub fn parse_stem(stem: &str) -> Option<Self> {
        let mut parts = stem.split('_');
        let index = parts.next()?.strip_prefix("trial")?.parse().ok()?;
        let code: u8 = parts.next()?.strip_prefix("type")?.parse().ok()?;
        let seed = parts.next()?.strip_prefix("seed")?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        let condition = ConditionType::new(code).ok()?;
        Some(Self {
            index,
            condition,
            seed,
        })
    }
}
