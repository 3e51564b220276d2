//! Assembled birth/death source terms
//!
//! [`GroupSources`] is what the orchestrator hands to the transport-equation
//! assembler after one assembly pass. All matrices are indexed
//! `[cell, group]`, in the units of the number density per second.
//!
//! Two equivalent views are offered:
//!
//! - explicit: `source = birth - death`
//! - linearized: `source = Su + Sp · n` with `Su = birth` and `Sp = -rate`,
//!   so that an implicit assembler can put `Sp` on the matrix diagonal

use nalgebra::{DMatrix, DVector};

/// Per-cell, per-group sources of one step
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSources {
    birth: DMatrix<f64>,
    death: DMatrix<f64>,
    death_rate: DMatrix<f64>,
}

impl GroupSources {
    /// Zero sources
    pub fn zeros(n_cells: usize, n_groups: usize) -> Self {
        Self {
            birth: DMatrix::zeros(n_cells, n_groups),
            death: DMatrix::zeros(n_cells, n_groups),
            death_rate: DMatrix::zeros(n_cells, n_groups),
        }
    }

    pub(crate) fn from_parts(birth: DMatrix<f64>, death: DMatrix<f64>, death_rate: DMatrix<f64>) -> Self {
        debug_assert_eq!(birth.shape(), death.shape());
        debug_assert_eq!(birth.shape(), death_rate.shape());
        Self {
            birth,
            death,
            death_rate,
        }
    }

    pub fn n_cells(&self) -> usize {
        self.birth.nrows()
    }

    pub fn n_groups(&self) -> usize {
        self.birth.ncols()
    }

    /// Gain of every group \[1/(m³·s)\]
    pub fn birth(&self) -> &DMatrix<f64> {
        &self.birth
    }

    /// Loss of every group \[1/(m³·s)\]
    pub fn death(&self) -> &DMatrix<f64> {
        &self.death
    }

    /// Specific loss rate `death / n` \[1/s\]
    pub fn death_rate(&self) -> &DMatrix<f64> {
        &self.death_rate
    }

    /// Explicit net source `birth - death`
    pub fn net(&self) -> DMatrix<f64> {
        &self.birth - &self.death
    }

    /// Net source of one group in one cell
    #[inline]
    pub fn net_at(&self, cell: usize, group: usize) -> f64 {
        self.birth[(cell, group)] - self.death[(cell, group)]
    }

    /// Implicit split of one group: (`Su`, `Sp`) fields
    pub fn implicit_split(&self, group: usize) -> (DVector<f64>, DVector<f64>) {
        let su = self.birth.column(group).into_owned();
        let sp = -self.death_rate.column(group).into_owned();
        (su, sp)
    }

    /// Net volume source `Σ_i source_i v_i` per cell
    ///
    /// Zero for a closed set of breakup and coalescence events.
    pub fn volume_source(&self, volumes: &[f64]) -> DVector<f64> {
        DVector::from_fn(self.n_cells(), |cell, _| {
            volumes
                .iter()
                .enumerate()
                .map(|(group, v)| self.net_at(cell, group) * v)
                .sum()
        })
    }

    /// Net number source `Σ_i source_i` per cell
    pub fn number_source(&self) -> DVector<f64> {
        DVector::from_fn(self.n_cells(), |cell, _| {
            (0..self.n_groups()).map(|group| self.net_at(cell, group)).sum()
        })
    }
}

impl std::ops::Add for GroupSources {
    type Output = GroupSources;

    fn add(self, rhs: Self) -> Self::Output {
        assert_eq!(
            self.birth.shape(),
            rhs.birth.shape(),
            "Source dimensions must match"
        );
        Self {
            birth: self.birth + rhs.birth,
            death: self.death + rhs.death,
            death_rate: self.death_rate + rhs.death_rate,
        }
    }
}
