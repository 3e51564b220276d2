//! Size groups and the number-density arena
//!
//! A [`GroupSet`] is the discretization of the dispersed-phase size
//! distribution: `N` groups with strictly increasing representative volumes.
//! It owns the number density of every group in every cell, stored as a
//! `cells × groups` matrix.
//!
//! The set also owns the apportioning rule ([`GroupSet::apportion`]) shared by
//! every redistribution law of the crate: breakup fragments and coalescence
//! products are placed on the grid with it.

use nalgebra::{DMatrix, DVector, DVectorView};

use crate::error::{PbeError, PbeResult};

/// Relative tolerance under which a particle volume is considered to sit
/// exactly on a group volume
const EXACT_HIT_TOLERANCE: f64 = 1e-12;

// =================================================================================================
// Group
// =================================================================================================

/// One size group
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Group {
    /// Position in the set (0 = smallest)
    pub index: usize,

    /// Representative particle volume \[m³\]
    pub volume: f64,
}

// =================================================================================================
// Placement of a particle volume on the grid
// =================================================================================================

/// Where a particle of arbitrary volume lands on the group grid
///
/// Produced by [`GroupSet::apportion`]. The weights are numbers of group
/// particles per placed particle; in every case `Σ weight · v_group` equals
/// the placed volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Volume matches a group volume
    Exact { group: usize },

    /// Lever rule between two neighbouring groups
    ///
    /// Conserves both number (`lower_weight + upper_weight = 1`) and volume.
    Split {
        lower: usize,
        upper: usize,
        lower_weight: f64,
        upper_weight: f64,
    },

    /// No bracketing pair: the volume is lumped into an edge group with
    /// weight `x / v_group`. Volume is conserved, number is not.
    Lumped { group: usize, weight: f64 },
}

impl Placement {
    /// Visit every (group, weight) share
    #[inline]
    pub fn for_each_share<F: FnMut(usize, f64)>(&self, mut f: F) {
        match *self {
            Placement::Exact { group } => f(group, 1.0),
            Placement::Split {
                lower,
                upper,
                lower_weight,
                upper_weight,
            } => {
                f(lower, lower_weight);
                f(upper, upper_weight);
            }
            Placement::Lumped { group, weight } => f(group, weight),
        }
    }

    /// Weight received by `group`
    pub fn weight_of(&self, group: usize) -> f64 {
        let mut total = 0.0;
        self.for_each_share(|g, w| {
            if g == group {
                total += w;
            }
        });
        total
    }

    /// Total number weight (1 unless lumped)
    pub fn number_weight(&self) -> f64 {
        let mut total = 0.0;
        self.for_each_share(|_, w| total += w);
        total
    }

    /// True when the placement could not use the lever rule
    pub fn is_lumped(&self) -> bool {
        matches!(self, Placement::Lumped { .. })
    }
}

// =================================================================================================
// Group set
// =================================================================================================

/// Ordered set of size groups plus the number-density arena
///
/// # Example
///
/// ```rust
/// use popbal_rs::models::GroupSet;
///
/// let mut groups = GroupSet::new(&[1.0, 2.0, 4.0], 5).unwrap();
/// groups.set_uniform(&[0.0, 0.0, 10.0]).unwrap();
///
/// assert_eq!(groups.len(), 3);
/// assert_eq!(groups.volume_fraction(2)[0], 40.0);
/// assert!(GroupSet::new(&[1.0, 1.0, 2.0], 5).is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSet {
    groups: Vec<Group>,
    volumes: Vec<f64>,

    /// n[cell, group] \[1/m³\]
    number_density: DMatrix<f64>,
}

impl GroupSet {
    /// Build a group set with zero number density in `n_cells` cells
    ///
    /// # Errors
    ///
    /// - [`PbeError::EmptyGroupSet`] without volumes
    /// - [`PbeError::NonPositiveVolume`] for a volume `<= 0` or non-finite
    /// - [`PbeError::NonIncreasingVolumes`] when `v[i] <= v[i-1]`
    pub fn new(volumes: &[f64], n_cells: usize) -> PbeResult<Self> {
        if volumes.is_empty() {
            return Err(PbeError::EmptyGroupSet);
        }

        for (index, &volume) in volumes.iter().enumerate() {
            if !(volume > 0.0 && volume.is_finite()) {
                return Err(PbeError::NonPositiveVolume { index, volume });
            }
            if index > 0 && volume <= volumes[index - 1] {
                return Err(PbeError::NonIncreasingVolumes {
                    index,
                    previous: volumes[index - 1],
                    current: volume,
                });
            }
        }

        let groups = volumes
            .iter()
            .enumerate()
            .map(|(index, &volume)| Group { index, volume })
            .collect();

        Ok(Self {
            groups,
            volumes: volumes.to_vec(),
            number_density: DMatrix::zeros(n_cells, volumes.len()),
        })
    }

    // ========================================== Queries ==========================================

    /// Number of groups `N`
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Always false: construction rejects empty sets
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of mesh cells in the arena
    pub fn n_cells(&self) -> usize {
        self.number_density.nrows()
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, index: usize) -> &Group {
        &self.groups[index]
    }

    pub fn volume(&self, index: usize) -> f64 {
        self.volumes[index]
    }

    pub fn volumes(&self) -> &[f64] {
        &self.volumes
    }

    // ====================================== Number density =======================================

    /// Whole arena, indexed `[cell, group]`
    pub fn number_density(&self) -> &DMatrix<f64> {
        &self.number_density
    }

    /// Per-cell field of one group
    pub fn group_number_density(&self, group: usize) -> DVectorView<'_, f64> {
        self.number_density.column(group)
    }

    /// Replace the whole arena
    pub fn set_number_density(&mut self, number_density: DMatrix<f64>) -> PbeResult<()> {
        if number_density.ncols() != self.len() {
            return Err(PbeError::SizeMismatch {
                what: "number density groups".to_string(),
                expected: self.len(),
                found: number_density.ncols(),
            });
        }
        if number_density.nrows() != self.n_cells() {
            return Err(PbeError::SizeMismatch {
                what: "number density cells".to_string(),
                expected: self.n_cells(),
                found: number_density.nrows(),
            });
        }
        if let Some((group, cell, value)) = first_inadmissible(&number_density) {
            return Err(inadmissible(group, cell, value));
        }
        self.number_density = number_density;
        Ok(())
    }

    /// Replace the field of one group
    pub fn set_group_number_density(&mut self, group: usize, field: &DVector<f64>) -> PbeResult<()> {
        if group >= self.len() {
            return Err(PbeError::SizeMismatch {
                what: format!("group index {}", group),
                expected: self.len(),
                found: group + 1,
            });
        }
        if field.len() != self.n_cells() {
            return Err(PbeError::SizeMismatch {
                what: format!("number density of group {}", group),
                expected: self.n_cells(),
                found: field.len(),
            });
        }
        if let Some(cell) = field.iter().position(|n| !admissible(*n)) {
            return Err(inadmissible(group, cell, field[cell]));
        }
        self.number_density.set_column(group, field);
        Ok(())
    }

    /// Same distribution in every cell
    pub fn set_uniform(&mut self, per_group: &[f64]) -> PbeResult<()> {
        if per_group.len() != self.len() {
            return Err(PbeError::SizeMismatch {
                what: "uniform number density".to_string(),
                expected: self.len(),
                found: per_group.len(),
            });
        }
        if let Some(group) = per_group.iter().position(|n| !admissible(*n)) {
            return Err(PbeError::InvalidConfiguration(format!(
                "number density of group {} must be finite and non-negative, got {}",
                group, per_group[group]
            )));
        }
        for (group, &n) in per_group.iter().enumerate() {
            self.number_density.column_mut(group).fill(n);
        }
        Ok(())
    }

    // ===================================== Derived fields ========================================

    /// Volume fraction field `α_i = n_i · v_i`
    pub fn volume_fraction(&self, group: usize) -> DVector<f64> {
        self.number_density.column(group) * self.volumes[group]
    }

    /// Volume fraction of every group, indexed `[cell, group]`
    pub fn volume_fractions(&self) -> DMatrix<f64> {
        let mut alpha = self.number_density.clone();
        for (group, mut column) in alpha.column_iter_mut().enumerate() {
            column *= self.volumes[group];
        }
        alpha
    }

    /// Dispersed volume fraction `Σ_i n_i v_i` in one cell
    pub fn total_volume_fraction(&self, cell: usize) -> f64 {
        self.number_density
            .row(cell)
            .iter()
            .zip(&self.volumes)
            .map(|(n, v)| n * v)
            .sum()
    }

    /// Total number density `Σ_i n_i` in one cell
    pub fn total_number_density(&self, cell: usize) -> f64 {
        self.number_density.row(cell).sum()
    }

    // ======================================== Apportion ==========================================

    /// Place a particle of volume `x` on groups `0..limit`
    ///
    /// Rule:
    /// - `x` within 1e-12 (relative) of `v_j`: all of it goes to `j`
    /// - `v_j < x < v_{j+1}`: lever rule with weights
    ///   `(v_{j+1} - x) / (v_{j+1} - v_j)` and `(x - v_j) / (v_{j+1} - v_j)`
    /// - `x < v_0`: lumped into group 0 with weight `x / v_0`
    /// - `x > v_{limit-1}`: lumped into group `limit - 1` with weight `x / v_{limit-1}`
    ///
    /// Breakup uses `limit = k` (fragments of parent `k` must land strictly
    /// below it); coalescence uses `limit = N`.
    ///
    /// # Panics
    ///
    /// When `limit` is 0 or larger than `N`, or when `x` is not a positive
    /// finite volume.
    pub fn apportion(&self, x: f64, limit: usize) -> Placement {
        assert!(
            limit >= 1 && limit <= self.len(),
            "apportion limit {} outside 1..={}",
            limit,
            self.len()
        );
        assert!(
            x > 0.0 && x.is_finite(),
            "cannot apportion particle volume {}",
            x
        );

        let volumes = &self.volumes[..limit];

        // First group whose volume is >= x
        let j = volumes.partition_point(|&v| v < x);

        if j < limit && is_exact_hit(x, volumes[j]) {
            return Placement::Exact { group: j };
        }
        if j > 0 && is_exact_hit(x, volumes[j - 1]) {
            return Placement::Exact { group: j - 1 };
        }

        if j == 0 {
            return Placement::Lumped {
                group: 0,
                weight: x / volumes[0],
            };
        }
        if j == limit {
            return Placement::Lumped {
                group: limit - 1,
                weight: x / volumes[limit - 1],
            };
        }

        let (lower, upper) = (j - 1, j);
        let width = volumes[upper] - volumes[lower];
        Placement::Split {
            lower,
            upper,
            lower_weight: (volumes[upper] - x) / width,
            upper_weight: (x - volumes[lower]) / width,
        }
    }
}

#[inline]
fn admissible(n: f64) -> bool {
    n.is_finite() && n >= 0.0
}

/// First negative or non-finite entry of a `cells × groups` arena, as `(group, cell, value)`
pub(crate) fn first_inadmissible(number_density: &DMatrix<f64>) -> Option<(usize, usize, f64)> {
    number_density
        .column_iter()
        .enumerate()
        .find_map(|(group, column)| {
            column
                .iter()
                .position(|n| !admissible(*n))
                .map(|cell| (group, cell, column[cell]))
        })
}

fn inadmissible(group: usize, cell: usize, value: f64) -> PbeError {
    PbeError::InvalidConfiguration(format!(
        "number density of group {} must be finite and non-negative, got {} in cell {}",
        group, value, cell
    ))
}

#[inline]
fn is_exact_hit(x: f64, volume: f64) -> bool {
    (x - volume).abs() <= EXACT_HIT_TOLERANCE * volume
}

// =================================================================================================
// Tests
// =================================================================================================
