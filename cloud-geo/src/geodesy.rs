//! WGS84 geodetic origin and the local East-North-Up frame anchored at it.

use crate::error::{Error, Result};
use log::{debug, info};
use nalgebra::{Matrix3, Matrix3xX, Vector3};

/// WGS84 semi-major axis in meters.
pub const WGS84_A: f64 = 6_378_137.0;

/// WGS84 first eccentricity squared.
pub const WGS84_E2: f64 = 6.694_379_990_14e-3;

/// A point on the WGS84 ellipsoid, in degrees and meters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeodeticOrigin {
    pub lon: f64,
    pub lat: f64,
    pub height: f64,
}

impl GeodeticOrigin {
    pub fn new(lon: f64, lat: f64, height: f64) -> Result<Self> {
        if !(lon.is_finite() && lat.is_finite() && height.is_finite()) {
            return Err(Error::invalid(format!(
                "origin must be finite, got lon={lon}, lat={lat}, height={height}"
            )));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(Error::invalid(format!(
                "latitude {lat} is outside [-90, 90]"
            )));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(Error::invalid(format!(
                "longitude {lon} is outside [-180, 180]"
            )));
        }

        Ok(Self { lon, lat, height })
    }

    pub fn to_ecef(&self) -> [f64; 3] {
        geodetic_to_ecef(self.lon, self.lat, self.height)
    }
}

/// Converts geodetic coordinates (degrees, meters) to ECEF meters.
pub fn geodetic_to_ecef(lon_deg: f64, lat_deg: f64, height: f64) -> [f64; 3] {
    let (sin_lat, cos_lat) = lat_deg.to_radians().sin_cos();
    let (sin_lon, cos_lon) = lon_deg.to_radians().sin_cos();

    // radius of curvature in the prime vertical
    let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();

    [
        (n + height) * cos_lat * cos_lon,
        (n + height) * cos_lat * sin_lon,
        (n * (1.0 - WGS84_E2) + height) * sin_lat,
    ]
}

/// Local tangent-plane frame at a geodetic origin.
///
/// The rows of [EnuFrame::axes] are the East, North and Up unit vectors
/// expressed in the ECEF basis. ENU offsets map to ECEF as `origin + R · enu`
/// and back through the transpose.
#[derive(Debug, Clone, PartialEq)]
pub struct EnuFrame {
    origin_ecef: Vector3<f64>,
    axes: Matrix3<f64>,
}

impl EnuFrame {
    pub fn new(origin: GeodeticOrigin) -> Self {
        let (sin_lat, cos_lat) = origin.lat.to_radians().sin_cos();
        let (sin_lon, cos_lon) = origin.lon.to_radians().sin_cos();

        #[rustfmt::skip]
        let axes = Matrix3::new(
            -sin_lon,            cos_lon,            0.0,
            -sin_lat * cos_lon, -sin_lat * sin_lon,  cos_lat,
             cos_lat * cos_lon,  cos_lat * sin_lon,  sin_lat,
        );

        let origin_ecef = Vector3::from(origin.to_ecef());
        info!(
            "origin {:.6}°E {:.6}°N {:.3}m is ECEF ({:.3}, {:.3}, {:.3})",
            origin.lon, origin.lat, origin.height, origin_ecef.x, origin_ecef.y, origin_ecef.z
        );

        Self {
            origin_ecef,
            axes,
        }
    }

    pub fn axes(&self) -> &Matrix3<f64> {
        &self.axes
    }

    /// Maps ENU offsets (meters) to absolute ECEF coordinates.
    pub fn enu_to_ecef(&self, points: &[[f64; 3]]) -> Result<Vec<[f64; 3]>> {
        let local = stack_columns(points)?;
        let mut ecef = self.axes * local;
        for mut column in ecef.column_iter_mut() {
            column += self.origin_ecef;
        }

        let out = unstack_columns(&ecef);
        if let Some((min, max)) = axis_range(&out, 0) {
            debug!("ECEF x range [{min:.3}, {max:.3}]");
        }
        Ok(out)
    }

    /// Maps absolute ECEF coordinates back to ENU offsets.
    pub fn ecef_to_enu(&self, points: &[[f64; 3]]) -> Result<Vec<[f64; 3]>> {
        let mut relative = stack_columns(points)?;
        for mut column in relative.column_iter_mut() {
            column -= self.origin_ecef;
        }
        Ok(unstack_columns(&self.axes.tr_mul(&relative)))
    }
}

/// Converts ENU offsets around `origin` into ECEF coordinates.
pub fn convert(origin: GeodeticOrigin, points_enu: &[[f64; 3]]) -> Result<Vec<[f64; 3]>> {
    EnuFrame::new(origin).enu_to_ecef(points_enu)
}

/// Splits a row-major buffer of `columns`-wide rows into `[x, y, z]` triples.
pub fn points_from_flat(values: &[f64], columns: usize) -> Result<Vec<[f64; 3]>> {
    if columns != 3 {
        return Err(Error::invalid(format!(
            "points must have exactly 3 columns, got {columns}"
        )));
    }
    if values.len() % columns != 0 {
        return Err(Error::invalid(format!(
            "{} values do not form whole rows of {columns}",
            values.len()
        )));
    }
    if values.is_empty() {
        return Err(Error::EmptyInput);
    }

    Ok(values
        .chunks_exact(columns)
        .map(|row| [row[0], row[1], row[2]])
        .collect())
}

fn stack_columns(points: &[[f64; 3]]) -> Result<Matrix3xX<f64>> {
    if points.is_empty() {
        return Err(Error::EmptyInput);
    }
    Ok(Matrix3xX::from_fn(points.len(), |row, col| points[col][row]))
}

fn unstack_columns(matrix: &Matrix3xX<f64>) -> Vec<[f64; 3]> {
    matrix
        .column_iter()
        .map(|column| [column[0], column[1], column[2]])
        .collect()
}

fn axis_range(points: &[[f64; 3]], axis: usize) -> Option<(f64, f64)> {
    points.iter().map(|point| point[axis]).fold(None, |range, v| {
        Some(match range {
            None => (v, v),
            Some((min, max)) => (f64::min(min, v), f64::max(max, v)),
        })
    })
}
