/*
    STARMAP, relative motion propagation and single impulse targeting
    Copyright (C) 2024-onwards The STARMAP developers

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use crate::linalg::{DMatrix, DVector};
use snafu::prelude::*;

/// Errors raised when packing or unpacking an integration vector.
#[derive(Clone, Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StateError {
    #[snafu(display(
        "cannot split {len} items into {physical} physical items and a {side}x{side} matrix"
    ))]
    DimensionMismatch {
        len: usize,
        physical: usize,
        side: usize,
    },
}

/// Splits a flat integration vector into its physical prefix and the trailing `side x side` matrix.
///
/// The trailing block is read in row-major order, i.e. item `physical + i * side + j` lands in `(i, j)`.
pub fn decompose(
    flat: &[f64],
    physical_len: usize,
    side: usize,
) -> Result<(DVector<f64>, DMatrix<f64>), StateError> {
    ensure!(
        physical_len + side * side == flat.len(),
        DimensionMismatchSnafu {
            len: flat.len(),
            physical: physical_len,
            side
        }
    );

    let physical = DVector::from_column_slice(&flat[..physical_len]);
    let matrix = DMatrix::from_row_slice(side, side, &flat[physical_len..]);

    Ok((physical, matrix))
}

/// Inverse of [`decompose`]: concatenates the physical items and the row-major flattening of `matrix`.
pub fn recompose(physical: &[f64], matrix: &DMatrix<f64>) -> Result<DVector<f64>, StateError> {
    ensure!(
        matrix.is_square(),
        DimensionMismatchSnafu {
            len: physical.len() + matrix.len(),
            physical: physical.len(),
            side: matrix.nrows()
        }
    );

    let transposed = matrix.transpose();
    let flat = physical.iter().copied().chain(transposed.iter().copied());

    Ok(DVector::from_iterator(physical.len() + matrix.len(), flat))
}

/// Returns the physical prefix length of a flat vector holding a `side x side` matrix, if any.
pub fn physical_len(len: usize, side: usize) -> Result<usize, StateError> {
    len.checked_sub(side * side).context(DimensionMismatchSnafu {
        len,
        physical: 0_usize,
        side,
    })
}

#[cfg(test)]
mod ut_packing {
    use super::*;

    #[test]
    fn decompose_is_row_major() {
        let flat: Vec<f64> = (0..13).map(f64::from).collect();
        let (phys, mat) = decompose(&flat, 4, 3).unwrap();
        assert_eq!(phys.as_slice(), &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(mat[(0, 0)], 4.0);
        assert_eq!(mat[(0, 2)], 6.0);
        assert_eq!(mat[(1, 0)], 7.0);
        assert_eq!(mat[(2, 2)], 12.0);

        let back = recompose(phys.as_slice(), &mat).unwrap();
        assert_eq!(back.as_slice(), flat.as_slice());
    }

    #[test]
    fn decompose_rejects_bad_sizes() {
        let flat = vec![0.0; 46];
        assert_eq!(
            decompose(&flat, 11, 6),
            Err(StateError::DimensionMismatch {
                len: 46,
                physical: 11,
                side: 6
            })
        );
        assert!(physical_len(30, 6).is_err());
        assert_eq!(physical_len(47, 6), Ok(11));
    }

    #[test]
    fn recompose_rejects_non_square() {
        let mat = DMatrix::<f64>::zeros(2, 3);
        assert!(recompose(&[1.0], &mat).is_err());
    }
}
