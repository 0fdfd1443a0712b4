//! Color channel normalization to 8-bit.
//!
//! Floating-point channels are either normalized to `[0, 1]` or already on a
//! `[0, 255]` scale, and files do not say which. The normalizer guesses from
//! the channel maximum: at or below [DEFAULT_THRESHOLD] the channel is taken
//! as normalized. This is a heuristic. A dark 0-255 channel whose brightest
//! value is 1.0 is misread as normalized.

use crate::{
    error::{Error, Result},
    point_set::{Column, PointSet},
};
use log::info;
use num_traits::ToPrimitive;

pub const DEFAULT_THRESHOLD: f64 = 1.01;

/// Channel names looked up by [RgbNormalizer::normalize_rgb].
pub const RGB_FIELDS: [&str; 3] = ["red", "green", "blue"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RgbNormalizer {
    threshold: f64,
}

impl Default for RgbNormalizer {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl RgbNormalizer {
    pub fn new(threshold: f64) -> Result<Self> {
        if !(threshold.is_finite() && threshold > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "RGB threshold must be positive, got {threshold}"
            )));
        }
        Ok(Self { threshold })
    }

    /// Converts one channel to clamped `u8` values.
    pub fn normalize(&self, column: &Column) -> Vec<u8> {
        match column {
            Column::F32(values) => self.normalize_float(values.iter().map(|&v| v as f64)),
            Column::F64(values) => self.normalize_float(values.iter().copied()),
            Column::U8(values) => values.clone(),
            Column::I8(values) => clamp_integers(values),
            Column::I16(values) => clamp_integers(values),
            Column::U16(values) => clamp_integers(values),
            Column::I32(values) => clamp_integers(values),
            Column::U32(values) => clamp_integers(values),
        }
    }

    /// Normalizes the `red`, `green` and `blue` fields of `points`.
    ///
    /// Returns `None` when none of them exist. A missing channel reads as 0.
    pub fn normalize_rgb(&self, points: &PointSet) -> Option<Vec<[u8; 3]>> {
        let channels = RGB_FIELDS.map(|name| {
            let values = points.column(name).map(|column| self.normalize(column));
            if values.is_some() {
                info!("RGB channel '{name}' normalized");
            }
            values
        });
        if channels.iter().all(Option::is_none) {
            return None;
        }

        let rgb = (0..points.len())
            .map(|index| {
                channels.each_ref().map(|channel| {
                    channel
                        .as_ref()
                        .and_then(|values| values.get(index).copied())
                        .unwrap_or(0)
                })
            })
            .collect();
        Some(rgb)
    }

    fn normalize_float<I>(&self, values: I) -> Vec<u8>
    where
        I: Iterator<Item = f64> + Clone,
    {
        let max = values.clone().fold(f64::NEG_INFINITY, f64::max);
        let scale = if max <= self.threshold { 255.0 } else { 1.0 };

        // `as u8` truncates and maps NaN to 0
        values.map(|v| (v * scale).clamp(0.0, 255.0) as u8).collect()
    }
}

/// Normalizes a channel with the default threshold.
pub fn normalize_channel(column: &Column) -> Vec<u8> {
    RgbNormalizer::default().normalize(column)
}

fn clamp_integers<T>(values: &[T]) -> Vec<u8>
where
    T: ToPrimitive,
{
    values
        .iter()
        .map(|v| v.to_i64().unwrap_or(0).clamp(0, 255) as u8)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point_set::Field;

    #[test]
    fn normalized_floats_are_scaled() {
        let out = normalize_channel(&Column::F32(vec![0.0, 0.5, 1.0]));
        assert_eq!(out[0], 0);
        assert!(out[1] == 127 || out[1] == 128);
        assert_eq!(out[2], 255);
    }

    #[test]
    fn wide_floats_are_clamped_not_scaled() {
        let out = normalize_channel(&Column::F64(vec![-4.0, 12.7, 254.9, 300.0]));
        assert_eq!(out, [0, 12, 254, 255]);
    }

    #[test]
    fn threshold_is_inclusive() {
        let out = normalize_channel(&Column::F64(vec![1.01, 0.5]));
        assert_eq!(out, [255, 127]);
    }

    #[test]
    fn integers_are_clamped() {
        let out = normalize_channel(&Column::I32(vec![0, 128, 255, 300]));
        assert_eq!(out, [0, 128, 255, 255]);

        let out = normalize_channel(&Column::I16(vec![-5, 17]));
        assert_eq!(out, [0, 17]);
    }

    #[test]
    fn custom_threshold_changes_classification() {
        let column = Column::F32(vec![0.0, 1.0, 2.0]);
        assert_eq!(normalize_channel(&column), [0, 1, 2]);

        let normalizer = RgbNormalizer::new(2.0).unwrap();
        assert_eq!(normalizer.normalize(&column), [0, 255, 255]);
        assert!(RgbNormalizer::new(0.0).is_err());
    }

    #[test]
    fn nan_becomes_zero() {
        let out = normalize_channel(&Column::F32(vec![f32::NAN, 0.5]));
        assert_eq!(out[0], 0);
        assert_eq!(out[1], 127);
    }

    #[test]
    fn rgb_fills_missing_channels() {
        let points = PointSet::from_fields([
            Field::new("x", vec![0.0f64, 1.0]),
            Field::new("red", vec![1.0f32, 0.0]),
            Field::new("blue", vec![10u8, 20]),
        ])
        .unwrap();

        let rgb = RgbNormalizer::default().normalize_rgb(&points).unwrap();
        assert_eq!(rgb, vec![[255, 0, 10], [0, 0, 20]]);
    }

    #[test]
    fn rgb_absent_yields_none() {
        let points = PointSet::from_fields([Field::new("x", vec![0.0f64])]).unwrap();
        assert!(RgbNormalizer::default().normalize_rgb(&points).is_none());
    }
}
