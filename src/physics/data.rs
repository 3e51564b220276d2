//! Physical data types
//!
//! This module provides a container for physical quantities that are
//! either per-cell vectors or (cell, group) matrices.

use nalgebra::{DMatrix, DVector};
use std::fmt;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::solver::parallel_threshold;

/// Physical data container
///
/// # Storage Types
///
/// - **Vector**: one value per cell (a single field)
/// - **Matrix**: one value per (cell, group) pair, the population arena
///
/// # Memory Layout
///
/// nalgebra matrices are column-major, so a `Matrix[cells × groups]` keeps
/// each group's per-cell field contiguous.
///
/// # Examples
///
/// ```rust
/// use popbal_rs::physics::PhysicalData;
///
/// // 500 cells, 12 size groups
/// let arena = PhysicalData::uniform_matrix(500, 12, 0.0);
/// assert_eq!(arena.shape(), vec![500, 12]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicalData {
    /// Vector (1D), one entry per cell
    Vector(DVector<f64>),

    /// Matrix (2D) indexed A[cell, group]
    Matrix(DMatrix<f64>),
}

impl PhysicalData {
    // ======================================= constructors =======================================

    /// Create from vector
    pub fn from_vec(vector: Vec<f64>) -> Self {
        Self::Vector(DVector::from_vec(vector))
    }

    /// Create from DMatrix
    pub fn from_matrix(matrix: DMatrix<f64>) -> Self {
        Self::Matrix(matrix)
    }

    /// Create uniform vector
    pub fn uniform_vector(size: usize, value: f64) -> Self {
        Self::Vector(DVector::from_element(size, value))
    }

    /// Create uniform matrix
    pub fn uniform_matrix(rows: usize, columns: usize, value: f64) -> Self {
        Self::Matrix(DMatrix::from_element(rows, columns, value))
    }

    // ========================================== Queries ==========================================

    /// Check data is a vector
    pub fn is_vector(&self) -> bool {
        matches!(self, Self::Vector(_))
    }

    /// Check data is a matrix
    pub fn is_matrix(&self) -> bool {
        matches!(self, Self::Matrix(_))
    }

    /// Get data dimension
    ///
    /// Returns: 1 (vector), 2 (matrix)
    pub fn ndim(&self) -> usize {
        match self {
            PhysicalData::Vector(_) => 1,
            PhysicalData::Matrix(_) => 2,
        }
    }

    /// Get shape as a vector
    pub fn shape(&self) -> Vec<usize> {
        match self {
            PhysicalData::Vector(v) => vec![v.len()],
            PhysicalData::Matrix(m) => vec![m.nrows(), m.ncols()],
        }
    }

    /// Get length
    pub fn len(&self) -> usize {
        match self {
            PhysicalData::Vector(v) => v.len(),
            PhysicalData::Matrix(m) => m.len(),
        }
    }

    /// Check emptiness
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over every stored value
    pub fn values(&self) -> Box<dyn Iterator<Item = f64> + '_> {
        match self {
            PhysicalData::Vector(v) => Box::new(v.iter().copied()),
            PhysicalData::Matrix(m) => Box::new(m.iter().copied()),
        }
    }

    // ======================================== Extractions ========================================

    /// Extract as a DVector (panic if not)
    pub fn as_vector(&self) -> &DVector<f64> {
        match self {
            PhysicalData::Vector(value) => value,
            _ => panic!("Not a vector value"),
        }
    }

    /// Extract as a DMatrix (panic if not)
    pub fn as_matrix(&self) -> &DMatrix<f64> {
        match self {
            PhysicalData::Matrix(value) => value,
            _ => panic!("Not a matrix value"),
        }
    }

    /// Try to extract as a DMatrix
    pub fn try_as_matrix(&self) -> Option<&DMatrix<f64>> {
        match self {
            PhysicalData::Matrix(value) => Some(value),
            _ => None,
        }
    }

    // ====================================== Apply functions ======================================

    /// Apply a function f to data
    ///
    /// Large containers are processed with rayon when the crate is built
    /// with the `parallel` feature and the element count reaches
    /// [`parallel_threshold()`].
    pub fn apply<F>(&mut self, f: F)
    where
        F: Fn(f64) -> f64 + Sync + Send,
    {
        let threshold = parallel_threshold();

        match self {
            PhysicalData::Vector(value) => {
                apply_slice(value.as_mut_slice(), &f, threshold);
            }

            PhysicalData::Matrix(value) => {
                apply_slice(value.as_mut_slice(), &f, threshold);
            }
        }
    }
}

fn apply_slice<F>(values: &mut [f64], f: &F, threshold: usize)
where
    F: Fn(f64) -> f64 + Sync + Send,
{
    if values.len() >= threshold {
        #[cfg(feature = "parallel")]
        values.par_iter_mut().for_each(|x| *x = f(*x));
        #[cfg(not(feature = "parallel"))]
        values.iter_mut().for_each(|x| *x = f(*x));
    } else {
        values.iter_mut().for_each(|x| *x = f(*x));
    }
}

// ================================== Simple arithmetic functions ==================================

impl std::ops::Add for PhysicalData {
    type Output = PhysicalData;
    fn add(self, rhs: Self) -> Self::Output {
        use PhysicalData::*;
        match (self, rhs) {
            // Addition with vectors
            (Vector(x), Vector(y)) => {
                assert_eq!(x.len(), y.len(), "Vector length must match");
                Vector(x + y)
            }

            // Addition with matrices
            (Matrix(x), Matrix(y)) => {
                assert_eq!(x.shape(), y.shape(), "Matrices dimensions must match");
                Matrix(x + y)
            }

            _ => panic!("Cannot add a vector to a matrix"),
        }
    }
}

impl std::ops::Mul<f64> for PhysicalData {
    type Output = PhysicalData;
    fn mul(self, scalar: f64) -> Self::Output {
        match self {
            PhysicalData::Vector(x) => PhysicalData::Vector(x * scalar),
            PhysicalData::Matrix(x) => PhysicalData::Matrix(x * scalar),
        }
    }
}

impl std::ops::Mul<PhysicalData> for f64 {
    type Output = PhysicalData;
    fn mul(self, rhs: PhysicalData) -> Self::Output {
        rhs * self
    }
}

// ======================== Display ============================

impl fmt::Display for PhysicalData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicalData::Vector(value) => write!(f, "Vector [{}]", value.len()),
            PhysicalData::Matrix(value) => {
                write!(f, "Matrix [{} * {}]", value.nrows(), value.ncols())
            }
        }
    }
}

// ==================== Tests ====================
