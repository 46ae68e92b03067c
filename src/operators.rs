//! Finite volume operators and their coefficients.
pub mod gauss_green_div;

pub use gauss_green_div::{compute_div, compute_div_exp, compute_div_imp, GaussGreenDiv};

/// Per-cell scaling of an operator, e.g. a density or a time step factor.
///
/// The coefficient of cell `i` is `factor * values[i]` if per-cell values are given, and
/// `factor` otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coeff<'a> {
    factor: f64,
    values: Option<&'a [f64]>,
}

impl<'a> Coeff<'a> {
    pub fn uniform(value: f64) -> Self {
        Self {
            factor: value,
            values: None,
        }
    }

    pub fn per_cell(values: &'a [f64]) -> Self {
        Self {
            factor: 1.0,
            values: Some(values),
        }
    }

    /// The same coefficient, multiplied by `c` in every cell.
    pub fn scaled(self, c: f64) -> Self {
        Self {
            factor: self.factor * c,
            ..self
        }
    }

    #[inline]
    pub fn get(&self, cell: usize) -> f64 {
        match self.values {
            Some(values) => self.factor * values[cell],
            None => self.factor,
        }
    }
}

impl Default for Coeff<'_> {
    fn default() -> Self {
        Self::uniform(1.0)
    }
}

/// The upwind weight of the owner cell for a face with the given flux.
///
/// The weight is 1 if the flow goes from the owner to the neighbour, and 0 otherwise. A flux
/// of exactly zero (of either sign) takes the value from the neighbour.
#[inline]
pub fn upwind_weight(flux: f64) -> f64 {
    if flux > 0.0 {
        1.0
    } else {
        0.0
    }
}
