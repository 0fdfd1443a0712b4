//! Global shift selection.
//!
//! Large global coordinates lose precision once stored as `f32`. A shift is
//! subtracted from every point so that the stored coordinates stay small,
//! and `global = local + shift` recovers the original position.

use crate::{
    error::{Error, Result},
    point_set::{Column, Field, PointSet, COORDINATE_FIELDS},
};
use log::info;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

pub const DEFAULT_AUTO_BASE: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftMode {
    /// Per-axis mean rounded down to a multiple of the auto base.
    Auto,
    /// Caller-supplied shift.
    Manual,
    /// Coordinates of the first point. Depends on point order.
    FirstPoint,
}

impl ShiftMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Manual => "manual",
            Self::FirstPoint => "first_point",
        }
    }
}

impl FromStr for ShiftMode {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        let mode = match text {
            "auto" => Self::Auto,
            "manual" => Self::Manual,
            "first_point" => Self::FirstPoint,
            _ => {
                return Err(Error::invalid(format!(
                    "unsupported shift mode '{text}', expect 'auto', 'manual' or 'first_point'"
                )))
            }
        };
        Ok(mode)
    }
}

impl fmt::Display for ShiftMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated shift mode together with its parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShiftPolicy {
    Auto { base: f64 },
    Manual([f64; 3]),
    FirstPoint,
}

impl ShiftPolicy {
    pub fn auto(base: f64) -> Result<Self> {
        if !(base.is_finite() && base > 0.0) {
            return Err(Error::invalid(format!(
                "auto base must be positive, got {base}"
            )));
        }
        Ok(Self::Auto { base })
    }

    pub fn manual(values: &[f64]) -> Result<Self> {
        let shift: [f64; 3] = values.try_into().map_err(|_| {
            Error::invalid(format!(
                "manual shift must contain 3 values, got {}",
                values.len()
            ))
        })?;
        if shift.iter().any(|v| !v.is_finite()) {
            return Err(Error::invalid(format!(
                "manual shift must be finite, got {shift:?}"
            )));
        }
        Ok(Self::Manual(shift))
    }

    /// Builds the policy for `mode`. Only the parameters the mode uses are
    /// validated.
    pub fn from_mode(mode: ShiftMode, manual_shift: Option<&[f64]>, auto_base: f64) -> Result<Self> {
        match mode {
            ShiftMode::Auto => Self::auto(auto_base),
            ShiftMode::Manual => {
                let values = manual_shift.ok_or_else(|| {
                    Error::invalid("manual shift must contain 3 values, got none")
                })?;
                Self::manual(values)
            }
            ShiftMode::FirstPoint => Ok(Self::FirstPoint),
        }
    }

    pub fn mode(&self) -> ShiftMode {
        match self {
            Self::Auto { .. } => ShiftMode::Auto,
            Self::Manual(_) => ShiftMode::Manual,
            Self::FirstPoint => ShiftMode::FirstPoint,
        }
    }
}

/// Computes the shift for `points` under `policy`.
pub fn select_shift(points: &[[f64; 3]], policy: &ShiftPolicy) -> Result<[f64; 3]> {
    let first = points.first().ok_or(Error::EmptyInput)?;

    let shift = match *policy {
        ShiftPolicy::Auto { base } => {
            let shift = mean(points).map(|m| (m / base).floor() * base);
            info!(
                "automatic shift (base={base}): X={}, Y={}, Z={}",
                shift[0], shift[1], shift[2]
            );
            shift
        }
        ShiftPolicy::Manual(shift) => {
            info!("manual shift: X={}, Y={}, Z={}", shift[0], shift[1], shift[2]);
            shift
        }
        ShiftPolicy::FirstPoint => {
            info!(
                "first point as origin: X={:.6}, Y={:.6}, Z={:.6}",
                first[0], first[1], first[2]
            );
            *first
        }
    };

    Ok(shift)
}

/// Points in local coordinates together with the shift that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct Localized {
    pub points: PointSet,
    pub shift: [f64; 3],
}

/// Subtracts the selected shift from every point.
///
/// Coordinates are computed in `f64` and stored as `f32`. Other fields keep
/// their element type and position.
pub fn localize(points: &PointSet, policy: &ShiftPolicy) -> Result<Localized> {
    let global = points.coordinates()?;
    let shift = select_shift(&global, policy)?;

    let mut local: [Vec<f32>; 3] = Default::default();
    for axis in &mut local {
        axis.reserve_exact(global.len());
    }
    for point in &global {
        for (axis, values) in local.iter_mut().enumerate() {
            values.push((point[axis] - shift[axis]) as f32);
        }
    }

    let [mut x, mut y, mut z] = local.map(Some);
    let fields = points.fields().iter().map(|field| {
        let coords = match field.name.as_str() {
            "x" => x.take(),
            "y" => y.take(),
            "z" => z.take(),
            _ => None,
        };
        match coords {
            Some(values) => Field::new(field.name.clone(), Column::F32(values)),
            None => field.clone(),
        }
    });
    let points = PointSet::from_fields(fields)?;

    if points.fields().len() == COORDINATE_FIELDS.len() {
        info!("point set has no attributes besides coordinates");
    }

    Ok(Localized { points, shift })
}

/// Inverse of [localize] for coordinate triples.
pub fn restore(local: &[[f64; 3]], shift: [f64; 3]) -> Vec<[f64; 3]> {
    local
        .iter()
        .map(|point| [point[0] + shift[0], point[1] + shift[1], point[2] + shift[2]])
        .collect()
}

fn mean(points: &[[f64; 3]]) -> [f64; 3] {
    let count = points.len() as f64;
    let sum = points.iter().fold([0.0; 3], |acc, point| {
        [acc[0] + point[0], acc[1] + point[1], acc[2] + point[2]]
    });
    sum.map(|s| s / count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point_set::Value;
    use approx::assert_abs_diff_eq;

    fn global_cloud() -> PointSet {
        PointSet::from_fields([
            Field::new("x", vec![407_123.456f64, 407_987.001, 408_210.5]),
            Field::new("y", vec![4_427_456.789f64, 4_427_001.25, 4_426_999.0]),
            Field::new("z", vec![12.5f64, 48.25, -3.75]),
            Field::new("intensity", vec![100u16, 200, 300]),
            Field::new("red", vec![0.25f32, 0.5, 1.0]),
        ])
        .unwrap()
    }

    #[test]
    fn mode_parses_known_names() {
        assert_eq!("auto".parse::<ShiftMode>().unwrap(), ShiftMode::Auto);
        assert_eq!("manual".parse::<ShiftMode>().unwrap(), ShiftMode::Manual);
        assert_eq!(
            "first_point".parse::<ShiftMode>().unwrap(),
            ShiftMode::FirstPoint
        );
        assert!(matches!(
            "centroid".parse::<ShiftMode>(),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn auto_base_must_be_positive() {
        for base in [0.0, -10.0, f64::NAN] {
            assert!(matches!(
                ShiftPolicy::from_mode(ShiftMode::Auto, None, base),
                Err(Error::InvalidParameter(_))
            ));
        }
        // manual mode ignores the base
        assert!(ShiftPolicy::from_mode(ShiftMode::Manual, Some(&[1.0, 2.0, 3.0]), 0.0).is_ok());
    }

    #[test]
    fn manual_shift_needs_three_values() {
        assert!(matches!(
            ShiftPolicy::from_mode(ShiftMode::Manual, None, DEFAULT_AUTO_BASE),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            ShiftPolicy::from_mode(ShiftMode::Manual, Some(&[1.0, 2.0]), DEFAULT_AUTO_BASE),
            Err(Error::InvalidParameter(_))
        ));
        assert_eq!(
            ShiftPolicy::manual(&[-407_000.0, -427_000.0, 0.0]).unwrap(),
            ShiftPolicy::Manual([-407_000.0, -427_000.0, 0.0])
        );
    }

    #[test]
    fn auto_shift_is_floored_mean() {
        let points = [[1500.0, -1500.0, 999.0], [2500.0, -500.0, 1001.0]];
        let shift = select_shift(&points, &ShiftPolicy::auto(1000.0).unwrap()).unwrap();
        assert_eq!(shift, [2000.0, -1000.0, 1000.0]);
    }

    #[test]
    fn auto_shift_brackets_the_mean() {
        let points = global_cloud().coordinates().unwrap();
        for base in [1.0, 10.0, 1000.0, 2500.0] {
            let shift = select_shift(&points, &ShiftPolicy::auto(base).unwrap()).unwrap();
            let centroid = mean(&points);
            for axis in 0..3 {
                assert_eq!(shift[axis] % base, 0.0);
                assert!(shift[axis] <= centroid[axis]);
                assert!(centroid[axis] < shift[axis] + base);
            }
        }
    }

    #[test]
    fn first_point_shift_is_exact() {
        let cloud = global_cloud();
        let Localized { points, shift } = localize(&cloud, &ShiftPolicy::FirstPoint).unwrap();

        assert_eq!(shift, [407_123.456, 4_427_456.789, 12.5]);
        assert_eq!(points.coordinates().unwrap()[0], [0.0, 0.0, 0.0]);
    }

    #[test]
    fn local_plus_shift_restores_global() {
        let cloud = global_cloud();
        let global = cloud.coordinates().unwrap();
        let policies = [
            ShiftPolicy::auto(DEFAULT_AUTO_BASE).unwrap(),
            ShiftPolicy::manual(&[407_000.0, 4_427_000.0, 0.0]).unwrap(),
            ShiftPolicy::FirstPoint,
        ];

        for policy in policies {
            let Localized { points, shift } = localize(&cloud, &policy).unwrap();
            let restored = restore(&points.coordinates().unwrap(), shift);
            for (a, b) in global.iter().zip(&restored) {
                for axis in 0..3 {
                    assert_abs_diff_eq!(a[axis], b[axis], epsilon = 1e-2);
                }
            }
        }
    }

    #[test]
    fn coordinates_become_f32_and_attributes_pass_through() {
        let cloud = global_cloud();
        let Localized { points, .. } = localize(&cloud, &ShiftPolicy::FirstPoint).unwrap();

        let names: Vec<_> = points.field_names().collect();
        assert_eq!(names, ["x", "y", "z", "intensity", "red"]);
        for name in COORDINATE_FIELDS {
            assert!(matches!(points.column(name), Some(Column::F32(_))));
        }
        assert_eq!(points.column("intensity"), cloud.column("intensity"));
        assert_eq!(points.record(2).unwrap()[4].1, Value::F32(1.0));
    }

    #[test]
    fn empty_and_incomplete_inputs_fail() {
        let empty = PointSet::from_fields([
            Field::new("x", Vec::<f64>::new()),
            Field::new("y", Vec::<f64>::new()),
            Field::new("z", Vec::<f64>::new()),
        ])
        .unwrap();
        assert!(matches!(
            localize(&empty, &ShiftPolicy::FirstPoint),
            Err(Error::EmptyInput)
        ));

        let flat = PointSet::from_fields([
            Field::new("x", vec![1.0f64]),
            Field::new("y", vec![2.0f64]),
        ])
        .unwrap();
        match localize(&flat, &ShiftPolicy::FirstPoint) {
            Err(Error::MissingField(names)) => assert_eq!(names, ["z"]),
            other => panic!("unexpected result {other:?}"),
        }

        assert!(matches!(
            select_shift(&[], &ShiftPolicy::FirstPoint),
            Err(Error::EmptyInput)
        ));
    }
}
