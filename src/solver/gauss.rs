//! Gaussian elimination over complex phasors.

use num_complex::Complex64;

use crate::error::SolveError;

/// Solve an augmented system in place.
///
/// `matrix` is row-major with `rows` equations and `unknowns + 1` columns,
/// the last column holding the constants. Rows are equilibrated to unit
/// max-norm first, then reduced with partial pivoting on complex magnitude.
/// Redundant equations are allowed as long as they reduce to `0 = 0`.
pub fn solve(
    matrix: &mut [Complex64],
    rows: usize,
    unknowns: usize,
    tolerance: f64,
) -> Result<Vec<Complex64>, SolveError> {
    if unknowns == 0 {
        return Err(SolveError::Indeterminate { column: 0 });
    }
    let cols = unknowns + 1;
    debug_assert_eq!(matrix.len(), rows * cols);

    // Equilibrate
    for r in 0..rows {
        let row = &mut matrix[r * cols..(r + 1) * cols];
        let scale = row[..unknowns].iter().map(|z| z.norm()).fold(0.0, f64::max);
        if scale > 0.0 {
            for z in row.iter_mut() {
                *z /= scale;
            }
        }
    }

    // Original index of each row, for reporting
    let mut order: Vec<usize> = (0..rows).collect();
    let mut pivot_of = vec![None; unknowns];
    let mut first_free = None;
    let mut rank = 0usize;

    for col in 0..unknowns {
        // Find pivot
        let mut best = rank;
        let mut best_val = 0.0;
        for r in rank..rows {
            let val = matrix[r * cols + col].norm();
            if val > best_val {
                best_val = val;
                best = r;
            }
        }
        if best_val < tolerance {
            first_free.get_or_insert(col);
            continue;
        }

        // Swap rows if needed
        if best != rank {
            for c in 0..cols {
                matrix.swap(rank * cols + c, best * cols + c);
            }
            order.swap(rank, best);
        }

        // Normalize and eliminate everywhere else
        let pivot = matrix[rank * cols + col];
        for c in col..cols {
            matrix[rank * cols + c] /= pivot;
        }
        for r in 0..rows {
            if r == rank {
                continue;
            }
            let factor = matrix[r * cols + col];
            if factor == Complex64::default() {
                continue;
            }
            for c in col..cols {
                let delta = factor * matrix[rank * cols + c];
                matrix[r * cols + c] -= delta;
            }
        }

        pivot_of[col] = Some(rank);
        rank += 1;
    }

    // Leftover equations must read 0 = 0
    for r in rank..rows {
        if matrix[r * cols + unknowns].norm() > tolerance {
            return Err(SolveError::NoSolution { row: order[r] });
        }
    }
    if let Some(column) = first_free {
        return Err(SolveError::Indeterminate { column });
    }

    Ok(pivot_of
        .iter()
        .map(|p| p.map_or(Complex64::default(), |r| matrix[r * cols + unknowns]))
        .collect())
}
