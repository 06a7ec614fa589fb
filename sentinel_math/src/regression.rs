//! Ordinary least-squares polynomial regression
//!
//! Fits `y = c0 + c1*x + ... + cd*x^d` by solving the normal equations with
//! Gaussian elimination. The abscissa is divided by its largest magnitude
//! before the system is assembled so that the Gram matrix stays well
//! conditioned for day offsets in the hundreds; the solved coefficients are
//! mapped back to raw units afterwards.

use crate::{distinct_count, MathError, Result};
use serde::{Deserialize, Serialize};

/// Pivots smaller than this are treated as a singular system
const PIVOT_EPSILON: f64 = 1e-12;

/// A fitted polynomial, coefficients stored in ascending powers of `x`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolynomialFit {
    coefficients: Vec<f64>,
    n_observations: usize,
}

impl PolynomialFit {
    /// Fit a polynomial of the given degree to the `(x, y)` pairs.
    ///
    /// Requires at least `degree + 1` distinct `x` values. No regularisation
    /// is applied.
    pub fn fit(x: &[f64], y: &[f64], degree: usize) -> Result<Self> {
        if degree == 0 {
            return Err(MathError::InvalidInput(
                "Polynomial degree must be at least 1".to_string(),
            ));
        }

        if x.len() != y.len() {
            return Err(MathError::InvalidInput(format!(
                "x length ({}) doesn't match y length ({})",
                x.len(),
                y.len()
            )));
        }

        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(MathError::InvalidInput(
                "Regression inputs must be finite".to_string(),
            ));
        }

        let required = degree + 1;
        let distinct = distinct_count(x);
        if distinct < required {
            return Err(MathError::InsufficientData(format!(
                "Degree {} fit needs {} distinct x values, got {}",
                degree, required, distinct
            )));
        }

        // At least two distinct values, so at least one is non-zero
        let scale = x.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));

        let size = degree + 1;
        let mut gram = vec![vec![0.0; size]; size];
        let mut rhs = vec![0.0; size];

        for (&xi, &yi) in x.iter().zip(y.iter()) {
            let u = xi / scale;
            let powers: Vec<f64> = (0..=2 * degree)
                .scan(1.0, |acc, _| {
                    let current = *acc;
                    *acc *= u;
                    Some(current)
                })
                .collect();

            for row in 0..size {
                rhs[row] += powers[row] * yi;
                for col in 0..size {
                    gram[row][col] += powers[row + col];
                }
            }
        }

        let scaled = solve_linear_system(gram, rhs)?;
        let coefficients = scaled
            .iter()
            .enumerate()
            .map(|(power, c)| c / scale.powi(power as i32))
            .collect();

        Ok(Self {
            coefficients,
            n_observations: x.len(),
        })
    }

    /// Build a polynomial directly from ascending-power coefficients
    pub fn from_coefficients(coefficients: Vec<f64>) -> Result<Self> {
        if coefficients.is_empty() {
            return Err(MathError::InvalidInput(
                "At least one coefficient is required".to_string(),
            ));
        }

        Ok(Self {
            coefficients,
            n_observations: 0,
        })
    }

    /// Coefficients in ascending powers (`[intercept, linear, quadratic, ...]`)
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Degree of the polynomial
    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// Number of observations the polynomial was fitted on
    pub fn n_observations(&self) -> usize {
        self.n_observations
    }

    /// Evaluate the polynomial at `x` (Horner's scheme)
    pub fn evaluate(&self, x: f64) -> f64 {
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, c| acc * x + c)
    }

    /// Evaluate the polynomial at every point of `xs`
    pub fn evaluate_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.evaluate(x)).collect()
    }
}

/// Solve `a * x = b` by Gaussian elimination with partial pivoting
fn solve_linear_system(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);

        if a[pivot][col].abs() < PIVOT_EPSILON {
            return Err(MathError::CalculationError(
                "Normal equations are singular".to_string(),
            ));
        }

        a.swap(col, pivot);
        b.swap(col, pivot);

        let pivot_row = a[col].clone();
        let pivot_rhs = b[col];
        for row in col + 1..n {
            let factor = a[row][col] / pivot_row[col];
            for k in col..n {
                a[row][k] -= factor * pivot_row[k];
            }
            b[row] -= factor * pivot_rhs;
        }
    }

    let mut solution = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * solution[k]).sum();
        solution[row] = (b[row] - tail) / a[row][row];
    }

    Ok(solution)
}
