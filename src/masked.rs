//! Masked numeric arrays
//!
//! A [`MaskedArray`] pairs an `f64` array with a boolean mask of the same
//! shape. `true` in the mask marks a missing element. Reductions skip missing
//! elements and elementwise arithmetic masks any position that is missing in
//! either operand.

use ndarray::{ArrayD, Axis, ErrorKind, IxDyn, ShapeError, Slice, Zip};

/// N-dimensional `f64` array with a missing-value mask
#[derive(Debug, Clone, PartialEq)]
pub struct MaskedArray {
    values: ArrayD<f64>,
    mask: ArrayD<bool>,
}

impl MaskedArray {
    /// Build from values and an explicit mask of the same shape.
    pub fn new(values: ArrayD<f64>, mask: ArrayD<bool>) -> Result<Self, ShapeError> {
        if values.shape() != mask.shape() {
            return Err(ShapeError::from_kind(ErrorKind::IncompatibleShape));
        }
        Ok(Self { values, mask })
    }

    /// Mask NaN elements only.
    pub fn from_values(values: ArrayD<f64>) -> Self {
        let mask = values.mapv(f64::is_nan);
        Self { values, mask }
    }

    /// Mask NaN elements and elements equal to `fill`.
    pub fn with_fill(values: ArrayD<f64>, fill: Option<f64>) -> Self {
        let mut array = Self::from_values(values);
        if let Some(fill) = fill {
            array = array.mask_where(|v| v == fill);
        }
        array
    }

    /// Array with every element missing.
    pub fn fully_masked(shape: &[usize]) -> Self {
        Self {
            values: ArrayD::from_elem(IxDyn(shape), f64::NAN),
            mask: ArrayD::from_elem(IxDyn(shape), true),
        }
    }

    /// Additionally mask every element for which `predicate` holds.
    #[must_use]
    pub fn mask_where<F>(mut self, predicate: F) -> Self
    where
        F: Fn(f64) -> bool,
    {
        Zip::from(&mut self.mask)
            .and(&self.values)
            .for_each(|m, &v| *m = *m || predicate(v));
        self
    }

    /// Additionally mask elements below `min` or above `max`.
    #[must_use]
    pub fn mask_outside(self, min: Option<f64>, max: Option<f64>) -> Self {
        if min.is_none() && max.is_none() {
            return self;
        }
        self.mask_where(|v| min.is_some_and(|lo| v < lo) || max.is_some_and(|hi| v > hi))
    }

    pub fn shape(&self) -> &[usize] {
        self.values.shape()
    }

    pub fn ndim(&self) -> usize {
        self.values.ndim()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Raw values, including whatever sits under masked positions.
    pub fn values(&self) -> &ArrayD<f64> {
        &self.values
    }

    pub fn mask(&self) -> &ArrayD<bool> {
        &self.mask
    }

    /// Value at `index`, or `None` when masked or out of bounds.
    pub fn get(&self, index: &[usize]) -> Option<f64> {
        match self.mask.get(index) {
            Some(false) => self.values.get(index).copied(),
            _ => None,
        }
    }

    pub fn is_masked(&self, index: &[usize]) -> bool {
        self.mask.get(index).copied().unwrap_or(true)
    }

    /// Number of unmasked elements.
    pub fn count(&self) -> usize {
        self.mask.iter().filter(|&&m| !m).count()
    }

    pub fn is_fully_masked(&self) -> bool {
        self.mask.iter().all(|&m| m)
    }

    /// Unmasked values in logical order.
    pub fn compressed(&self) -> Vec<f64> {
        self.values
            .iter()
            .zip(self.mask.iter())
            .filter(|(_, &m)| !m)
            .map(|(&v, _)| v)
            .collect()
    }

    /// Median of all unmasked elements; even counts average the middle pair.
    pub fn median(&self) -> Option<f64> {
        let mut valid = self.compressed();
        if valid.is_empty() {
            return None;
        }
        valid.sort_by(f64::total_cmp);
        let mid = valid.len() / 2;
        if valid.len() % 2 == 0 {
            Some((valid[mid - 1] + valid[mid]) / 2.0)
        } else {
            Some(valid[mid])
        }
    }

    /// Mean of all unmasked elements.
    pub fn mean(&self) -> Option<f64> {
        let valid = self.compressed();
        if valid.is_empty() {
            return None;
        }
        Some(valid.iter().sum::<f64>() / valid.len() as f64)
    }

    /// Mean along `axis`; lanes with no unmasked element come out masked.
    ///
    /// # Panics
    ///
    /// Panics if `axis` is out of bounds, like the `ndarray` axis methods.
    pub fn mean_axis(&self, axis: Axis) -> MaskedArray {
        let reduced = Zip::from(self.values.lanes(axis))
            .and(self.mask.lanes(axis))
            .map_collect(|values, mask| {
                let mut sum = 0.0_f64;
                let mut count = 0_usize;
                for (&v, &m) in values.iter().zip(mask.iter()) {
                    if !m {
                        sum += v;
                        count += 1;
                    }
                }
                if count > 0 {
                    sum / count as f64
                } else {
                    f64::NAN
                }
            });
        MaskedArray::from_values(reduced)
    }

    /// Apply `f` to every element; masked positions stay masked.
    #[must_use]
    pub fn map<F>(&self, f: F) -> MaskedArray
    where
        F: Fn(f64) -> f64,
    {
        Self {
            values: self.values.mapv(f),
            mask: self.mask.clone(),
        }
    }

    /// Combine two equally shaped arrays elementwise, masking the union.
    pub fn zip_with<F>(&self, other: &MaskedArray, f: F) -> Result<MaskedArray, ShapeError>
    where
        F: Fn(f64, f64) -> f64,
    {
        if self.shape() != other.shape() {
            return Err(ShapeError::from_kind(ErrorKind::IncompatibleShape));
        }
        let values = Zip::from(&self.values)
            .and(&other.values)
            .map_collect(|&a, &b| f(a, b));
        let mask = Zip::from(&self.mask)
            .and(&other.mask)
            .map_collect(|&a, &b| a || b);
        Ok(Self { values, mask })
    }

    /// Drop length-1 axes, last first, until `rank` axes remain.
    ///
    /// Returns `None` when there are not enough length-1 axes to drop.
    pub fn squeeze_to(&self, rank: usize) -> Option<MaskedArray> {
        let mut values = self.values.clone();
        let mut mask = self.mask.clone();
        while values.ndim() > rank {
            let axis = (0..values.ndim())
                .rev()
                .map(Axis)
                .find(|&axis| values.len_of(axis) == 1)?;
            values = values.index_axis_move(axis, 0);
            mask = mask.index_axis_move(axis, 0);
        }
        Some(Self { values, mask })
    }

    /// Leading `[0, len)` block on every axis.
    pub fn leading_block(&self, lens: &[usize]) -> Result<MaskedArray, ShapeError> {
        if lens.len() != self.ndim() || lens.iter().zip(self.shape()).any(|(l, s)| l > s) {
            return Err(ShapeError::from_kind(ErrorKind::IncompatibleShape));
        }
        let values = self
            .values
            .slice_each_axis(|ax| Slice::from(0..lens[ax.axis.index()]))
            .to_owned();
        let mask = self
            .mask
            .slice_each_axis(|ax| Slice::from(0..lens[ax.axis.index()]))
            .to_owned();
        Ok(Self { values, mask })
    }

    /// Plain array with masked positions replaced by `fill`.
    pub fn filled(&self, fill: f64) -> ArrayD<f64> {
        Zip::from(&self.values)
            .and(&self.mask)
            .map_collect(|&v, &m| if m { fill } else { v })
    }
}
