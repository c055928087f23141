use crate::stimulus::trial::Trial;

/// Column-major coordinates of both discs, one row per time step.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Coordinates {
    pub x1: Vec<f64>,
    pub y1: Vec<f64>,
    pub x2: Vec<f64>,
    pub y2: Vec<f64>,
}

/// Disc selector; discs are numbered from 1 in every output table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Disc {
    One,
    Two,
}

impl Disc {
    pub const BOTH: [Disc; 2] = [Disc::One, Disc::Two];

    pub fn number(self) -> u8 {
        match self {
            Disc::One => 1,
            Disc::Two => 2,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Disc::One),
            2 => Some(Disc::Two),
            _ => None,
        }
    }
}

impl Coordinates {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            x1: Vec::with_capacity(n),
            y1: Vec::with_capacity(n),
            x2: Vec::with_capacity(n),
            y2: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, row: [f64; 4]) {
        self.x1.push(row[0]);
        self.y1.push(row[1]);
        self.x2.push(row[2]);
        self.y2.push(row[3]);
    }

    pub fn row(&self, i: usize) -> [f64; 4] {
        [self.x1[i], self.y1[i], self.x2[i], self.y2[i]]
    }

    pub fn len(&self) -> usize {
        self.x1.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x1.is_empty()
    }

    /// All four columns have the same length.
    pub fn is_rectangular(&self) -> bool {
        let n = self.x1.len();
        self.y1.len() == n && self.x2.len() == n && self.y2.len() == n
    }

    pub fn disc(&self, disc: Disc) -> (&[f64], &[f64]) {
        match disc {
            Disc::One => (&self.x1, &self.y1),
            Disc::Two => (&self.x2, &self.y2),
        }
    }

    pub fn disc_mut(&mut self, disc: Disc) -> (&mut Vec<f64>, &mut Vec<f64>) {
        match disc {
            Disc::One => (&mut self.x1, &mut self.y1),
            Disc::Two => (&mut self.x2, &mut self.y2),
        }
    }

    pub fn all_finite(&self) -> bool {
        [&self.x1, &self.y1, &self.x2, &self.y2]
            .iter()
            .all(|col| col.iter().all(|v| v.is_finite()))
    }
}

/// One trial's downsampled coordinates in state-space units.
#[derive(Clone, Debug)]
pub struct Sample {
    pub trial: Trial,
    pub coords: Coordinates,
}
