use std::fmt;

use nalgebra::Matrix2;
use serde::{Deserialize, Serialize};

use crate::stimulus::StimulusError;

/// Codes above this threshold mean "directed motion absent".
pub const ABSENT_THRESHOLD: u8 = 4;

/// Validated condition label; only 1, 4, 5 and 8 exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ConditionType(u8);

impl ConditionType {
    pub const ALL: [ConditionType; 4] = [
        ConditionType(1),
        ConditionType(4),
        ConditionType(5),
        ConditionType(8),
    ];

    pub fn new(code: u8) -> Result<Self, StimulusError> {
        match code {
            1 | 4 | 5 | 8 => Ok(Self(code)),
            other => Err(StimulusError::UnexpectedConditionCode { code: other }),
        }
    }

    pub fn code(self) -> u8 {
        self.0
    }

    pub fn motion(self) -> Motion {
        if self.0 > ABSENT_THRESHOLD {
            Motion::Absent
        } else {
            Motion::Present
        }
    }

    /// Rotation magnitude feeding the coupling matrix; absent codes reuse the
    /// present code they were shifted from.
    pub fn rotation_magnitude(self) -> u8 {
        match self.motion() {
            Motion::Present => self.0,
            Motion::Absent => self.0 - ABSENT_THRESHOLD,
        }
    }

    pub fn group(self) -> ConditionGroup {
        match self.rotation_magnitude() {
            1 => ConditionGroup::Low,
            _ => ConditionGroup::High,
        }
    }

    pub fn kind(self) -> TrialKind {
        let coupling = CouplingMatrix::from_magnitude(self.rotation_magnitude() as f64);
        match self.motion() {
            Motion::Present => TrialKind::DirectedPresent(coupling),
            Motion::Absent => TrialKind::DirectedAbsent(coupling),
        }
    }
}

impl TryFrom<u8> for ConditionType {
    type Error = StimulusError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::new(code)
    }
}

impl From<ConditionType> for u8 {
    fn from(c: ConditionType) -> u8 {
        c.0
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Motion {
    Present,
    Absent,
}

impl Motion {
    pub fn label(self) -> &'static str {
        match self {
            Motion::Present => "present",
            Motion::Absent => "absent",
        }
    }
}

/// Trials sharing one synchrony coupling strength, pooled for speed matching.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionGroup {
    /// Types 1 and 5.
    Low,
    /// Types 4 and 8.
    High,
}

impl ConditionGroup {
    pub const ALL: [ConditionGroup; 2] = [ConditionGroup::Low, ConditionGroup::High];

    pub fn name(self) -> &'static str {
        match self {
            ConditionGroup::Low => "low",
            ConditionGroup::High => "high",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "low" => Some(ConditionGroup::Low),
            "high" => Some(ConditionGroup::High),
            _ => None,
        }
    }

    pub fn members(self) -> [ConditionType; 2] {
        match self {
            ConditionGroup::Low => [ConditionType(1), ConditionType(5)],
            ConditionGroup::High => [ConditionType(4), ConditionType(8)],
        }
    }
}

impl fmt::Display for ConditionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 2×2 disc coupling `C(m) = [[1, -m], [m, 1]]`: unit self-decay plus a rotation
/// generator of magnitude `m` mixing the two discs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CouplingMatrix(pub Matrix2<f64>);

impl CouplingMatrix {
    pub fn from_magnitude(m: f64) -> Self {
        Self(Matrix2::new(1.0, -m, m, 1.0))
    }

    pub fn matrix(&self) -> &Matrix2<f64> {
        &self.0
    }
}

/// What the condition transform does with a trial's trajectory.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TrialKind {
    DirectedPresent(CouplingMatrix),
    /// Carries the already-reduced coupling.
    DirectedAbsent(CouplingMatrix),
}

impl TrialKind {
    pub fn coupling(&self) -> &CouplingMatrix {
        match self {
            TrialKind::DirectedPresent(c) | TrialKind::DirectedAbsent(c) => c,
        }
    }
}
