use std::collections::BTreeMap;
use std::path::Path;

use crate::export::ExportError;
use crate::speed::NormalizeError;
use crate::stimulus::condition::ConditionGroup;
use crate::stimulus::sample::Disc;

pub const FACTORS_FILE: &str = "scaling_factors.csv";
pub const HEADER: [&str; 3] = ["Group", "Disc", "Scaling Factor"];

/// One multiplicative factor per (pooled group, disc).
#[derive(Clone, Debug, PartialEq)]
pub struct ScalingFactors {
    factors: BTreeMap<(ConditionGroup, Disc), f64>,
}

impl ScalingFactors {
    /// Every factor 1.0: the state before any normalization run.
    pub fn identity() -> Self {
        let mut factors = BTreeMap::new();
        for group in ConditionGroup::ALL {
            for disc in Disc::BOTH {
                factors.insert((group, disc), 1.0);
            }
        }
        Self { factors }
    }

    pub fn get(&self, group: ConditionGroup, disc: Disc) -> f64 {
        self.factors.get(&(group, disc)).copied().unwrap_or(1.0)
    }

    pub fn set(&mut self, group: ConditionGroup, disc: Disc, factor: f64) {
        self.factors.insert((group, disc), factor);
    }

    pub fn iter(&self) -> impl Iterator<Item = (ConditionGroup, Disc, f64)> + '_ {
        self.factors.iter().map(|(&(g, d), &f)| (g, d, f))
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), ExportError> {
        let csv_err = |source| ExportError::Csv {
            path: path.display().to_string(),
            source,
        };
        let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;
        wtr.write_record(HEADER).map_err(csv_err)?;
        for (group, disc, factor) in self.iter() {
            wtr.write_record([
                group.name().to_string(),
                disc.number().to_string(),
                factor.to_string(),
            ])
            .map_err(csv_err)?;
        }
        wtr.flush().map_err(|source| ExportError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Strict reader: every (group, disc) pair must be present exactly once with a
    /// finite positive factor.
    pub fn read_csv(path: &Path) -> Result<Self, NormalizeError> {
        let path_str = path.display().to_string();
        let invalid = |reason: String| NormalizeError::InvalidFactors {
            path: path_str.clone(),
            reason,
        };
        let csv_err = |source| {
            NormalizeError::Export(ExportError::Csv {
                path: path_str.clone(),
                source,
            })
        };

        let mut rdr = csv::Reader::from_path(path).map_err(csv_err)?;
        let headers = rdr.headers().map_err(csv_err)?.clone();
        let mut cols = [0usize; 3];
        for (slot, name) in cols.iter_mut().zip(HEADER) {
            *slot = headers.iter().position(|h| h.trim() == name).ok_or_else(|| {
                NormalizeError::Export(ExportError::MissingColumn {
                    path: path_str.clone(),
                    column: name,
                })
            })?;
        }

        let mut factors = BTreeMap::new();
        for (row_idx, record) in rdr.records().enumerate() {
            let record = record.map_err(csv_err)?;
            let row = row_idx + 1;
            let field = |i: usize| record.get(cols[i]).unwrap_or("").trim();

            let group = ConditionGroup::parse(field(0))
                .ok_or_else(|| invalid(format!("row {row}: unknown group `{}`", field(0))))?;
            let disc = field(1)
                .parse::<u8>()
                .ok()
                .and_then(Disc::from_number)
                .ok_or_else(|| invalid(format!("row {row}: unknown disc `{}`", field(1))))?;
            let factor: f64 = field(2)
                .parse()
                .map_err(|_| invalid(format!("row {row}: `{}` is not a number", field(2))))?;
            if !(factor.is_finite() && factor > 0.0) {
                return Err(invalid(format!("row {row}: factor {factor} must be finite and positive")));
            }
            if factors.insert((group, disc), factor).is_some() {
                return Err(invalid(format!("row {row}: duplicate entry for {group}/disc {}", disc.number())));
            }
        }

        for group in ConditionGroup::ALL {
            for disc in Disc::BOTH {
                if !factors.contains_key(&(group, disc)) {
                    return Err(invalid(format!("no factor for {group}/disc {}", disc.number())));
                }
            }
        }
        Ok(Self { factors })
    }
}
