//! Shared fixtures: small hydrology simulation files shaped like the real
//! model output (root dimensions, `XS_Timseries` and `Reach_Timeseries`
//! groups).

#![allow(dead_code)]

use ndarray::{Array1, Array2};
use netcdf::{create, AttributeValue};
use std::path::Path;
use swot_relabel::errors::Result;
use swot_relabel::netcdf_io::NC_FILL_DOUBLE;

pub const TITLE: &str = "Test river";

/// Fill value used by fixture fields that carry missing data
pub const SOURCE_FILL: f64 = -9999.0;

/// Shape and content switches for a fixture file
#[derive(Debug, Clone)]
pub struct SourceSpec {
    pub nt: usize,
    pub nx: usize,
    pub include_reach: bool,
    /// `(t, x)` positions of `XS_Timseries/W` replaced by the fill value
    pub missing_width: Vec<(usize, usize)>,
    /// `(t, x)` positions of `XS_Timseries/H_1km` holding the NetCDF default
    /// fill; the variable has no `_FillValue` attribute
    pub unwritten_height: Vec<(usize, usize)>,
}

impl SourceSpec {
    pub fn new(nt: usize, nx: usize) -> Self {
        Self {
            nt,
            nx,
            include_reach: true,
            missing_width: Vec::new(),
            unwritten_height: Vec::new(),
        }
    }

    pub fn without_reach(mut self) -> Self {
        self.include_reach = false;
        self
    }

    pub fn with_missing_width(mut self, t: usize, x: usize) -> Self {
        self.missing_width.push((t, x));
        self
    }

    pub fn with_unwritten_height(mut self, t: usize, x: usize) -> Self {
        self.unwritten_height.push((t, x));
        self
    }
}

pub fn width(nt: usize, nx: usize) -> Array2<f64> {
    Array2::from_shape_fn((nt, nx), |(t, x)| 10.0 * (t * nx + x + 1) as f64)
}

pub fn height_90m(nt: usize, nx: usize) -> Array2<f64> {
    Array2::from_shape_fn((nt, nx), |(t, x)| t as f64 + 0.1 * x as f64)
}

pub fn height_1km(nt: usize, nx: usize) -> Array2<f64> {
    height_90m(nt, nx).mapv(|h| h + 0.5)
}

pub fn discharge(nt: usize, nx: usize) -> Array2<f64> {
    Array2::from_shape_fn((nt, nx), |(t, x)| 100.0 * (t * nx + x + 1) as f64)
}

pub fn slope_90m(nt: usize) -> Array2<f64> {
    Array2::from_shape_fn((nt, 1), |(t, _)| 0.01 * (t + 1) as f64)
}

pub fn slope_1km(nt: usize) -> Array2<f64> {
    Array2::from_shape_fn((nt, 1), |(t, _)| 0.011 + 0.001 * t as f64)
}

/// Write a fixture source file at `path`.
pub fn write_source(path: &Path, spec: &SourceSpec) -> Result<()> {
    let (nt, nx) = (spec.nt, spec.nx);
    let mut file = create(path)?;
    file.add_attribute("title", TITLE)?;

    file.add_dimension("Time steps", nt)?;
    file.add_dimension("XS_90m", nx)?;
    if spec.include_reach {
        file.add_dimension("Reach", 1)?;
    }

    {
        let mut var = file.add_variable::<i32>("Time steps", &["Time steps"])?;
        let steps: Vec<i32> = (0..nt as i32).collect();
        var.put(Array1::from(steps).view(), ..)?;
    }
    {
        let mut var = file.add_variable::<i32>("XS_90m", &["XS_90m"])?;
        let sections: Vec<i32> = (0..nx as i32).map(|x| x * 90).collect();
        var.put(Array1::from(sections).view(), ..)?;
    }

    {
        let mut xs = file.add_group("XS_Timseries")?;
        let dims = ["Time steps", "XS_90m"];

        let mut w = width(nt, nx);
        for &(t, x) in &spec.missing_width {
            w[[t, x]] = SOURCE_FILL;
        }
        let mut var = xs.add_variable::<f64>("W", &dims)?;
        var.set_fill_value(SOURCE_FILL)?;
        var.put_attribute("units", "m")?;
        var.put(w.view(), ..)?;

        let mut var = xs.add_variable::<f64>("H_90m", &dims)?;
        var.put(height_90m(nt, nx).view(), ..)?;

        let mut h = height_1km(nt, nx);
        for &(t, x) in &spec.unwritten_height {
            h[[t, x]] = NC_FILL_DOUBLE;
        }
        let mut var = xs.add_variable::<f64>("H_1km", &dims)?;
        var.put(h.view(), ..)?;

        let mut var = xs.add_variable::<f64>("Q", &dims)?;
        var.put(discharge(nt, nx).view(), ..)?;
    }

    {
        let mut reach = file.add_group("Reach_Timeseries")?;
        if spec.include_reach {
            let dims = ["Time steps", "Reach"];
            let mut var = reach.add_variable::<f64>("S_90m", &dims)?;
            var.put(slope_90m(nt).view(), ..)?;
            let mut var = reach.add_variable::<f64>("S_1km", &dims)?;
            var.put(slope_1km(nt).view(), ..)?;
        }
    }

    Ok(())
}

/// Read the variable at `path` (`group/name` or `name`) from `file` as `f64`.
pub fn read_values(file: &Path, path: &str) -> Result<Vec<f64>> {
    let file = netcdf::open(file)?;
    let values = match path.rsplit_once('/') {
        Some((group, name)) => {
            let group = file.group(group)?.expect("group should exist");
            let var = group.variable(name).expect("variable should exist");
            var.get_values::<f64, _>(..)?
        }
        None => {
            let var = file.variable(path).expect("variable should exist");
            var.get_values::<f64, _>(..)?
        }
    };
    Ok(values)
}

/// String or `f64` attribute of the variable at `path`.
pub fn read_attribute(file: &Path, path: &str, attribute: &str) -> Result<Option<AttributeValue>> {
    let file = netcdf::open(file)?;
    let value = match path.rsplit_once('/') {
        Some((group, name)) => {
            let group = file.group(group)?.expect("group should exist");
            let var = group.variable(name).expect("variable should exist");
            var.attribute(attribute).map(|a| a.value()).transpose()?
        }
        None => {
            let var = file.variable(path).expect("variable should exist");
            var.attribute(attribute).map(|a| a.value()).transpose()?
        }
    };
    Ok(value)
}

pub fn assert_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "length mismatch");
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            (a - e).abs() <= 1e-9 * e.abs().max(1.0),
            "element {i}: got {a}, expected {e}"
        );
    }
}
