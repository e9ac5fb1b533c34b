//! Derived field computations
//!
//! Pure numeric transforms over [`MaskedArray`]s. None of these touch a NetCDF
//! handle; the mapper feeds them and writes what they return.

use crate::masked::MaskedArray;
use ndarray::{Axis, ShapeError};

/// Change in cross-sectional area from water surface elevation and width.
///
/// Both inputs are indexed `[time step, cross-section]`:
///
/// ```text
/// dH     = h - median(h)
/// result = (median(w) - w) * (dH / 2)
/// ```
///
/// The medians run once over every unmasked element of the whole array. A
/// position missing in `h` or `w` is missing in the result, and when either
/// input has nothing unmasked the result is fully masked.
///
/// # Errors
///
/// Returns a [`ShapeError`] when `h` and `w` differ in shape.
pub fn calculate(h: &MaskedArray, w: &MaskedArray) -> Result<MaskedArray, ShapeError> {
    let (median_h, median_w) = match (h.median(), w.median()) {
        (Some(mh), Some(mw)) => (mh, mw),
        _ => {
            // Still reject mismatched shapes before giving up on the values.
            h.zip_with(w, |a, _| a)?;
            return Ok(MaskedArray::fully_masked(h.shape()));
        }
    };

    let d_h = h.map(|v| v - median_h);
    d_h.zip_with(w, |dh, wv| (median_w - wv) * (dh / 2.0))
}

/// Masked mean of a field, either over every element or along one axis.
///
/// With `axis == None` the result is a 0-dimensional array holding the mean
/// (masked when nothing is valid). With `Some(axis)` the axis is removed and
/// each lane is averaged on its own.
///
/// # Panics
///
/// Panics if `axis` is out of bounds; schemas are validated against the
/// source rank before this is called.
pub fn mean(field: &MaskedArray, axis: Option<usize>) -> MaskedArray {
    match axis {
        Some(axis) => field.mean_axis(Axis(axis)),
        None => match field.mean() {
            Some(value) => MaskedArray::from_values(ndarray::arr0(value).into_dyn()),
            None => MaskedArray::fully_masked(&[]),
        },
    }
}
