//! Numeric core for moving point clouds between coordinate frames.
//!
//! - [geodesy]: ENU offsets around a WGS84 origin to ECEF and back.
//! - [shift]: global shift selection and localization of global coordinates.
//! - [rgb]: color channel normalization to 8-bit.
//! - [sidecar]: the JSON record that makes a shift reversible.
//!
//! Nothing here touches point-cloud file formats. Readers and writers build
//! and consume [PointSet] values.
//!
//! ```
//! use cloud_geo::{geodesy::{convert, GeodeticOrigin}, shift::{select_shift, ShiftPolicy}};
//!
//! let origin = GeodeticOrigin::new(116.4075, 39.9040, 1.0)?;
//! let ecef = convert(origin, &[[0.0, 0.0, 0.0]])?;
//! assert_eq!(ecef[0], origin.to_ecef());
//!
//! let shift = select_shift(&[[407_123.0, 4_427_456.0, 12.0]], &ShiftPolicy::auto(1000.0)?)?;
//! assert_eq!(shift, [407_000.0, 4_427_000.0, 0.0]);
//! # Ok::<(), cloud_geo::Error>(())
//! ```

pub mod error;
pub mod geodesy;
pub mod point_set;
pub mod rgb;
pub mod shift;
pub mod sidecar;

pub use error::{Error, Result};
pub use geodesy::{EnuFrame, GeodeticOrigin};
pub use point_set::{Column, Field, PointSet, ScalarKind, Value};
pub use rgb::RgbNormalizer;
pub use shift::{localize, select_shift, Localized, ShiftMode, ShiftPolicy};
pub use sidecar::{sidecar_path, ShiftRecord};
