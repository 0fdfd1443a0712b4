//! Side-car record of an applied global shift.
//!
//! The record is written next to the localized output as
//! `<output stem>_origin.json` so that a later process can recover
//! `global = local + shift_global`.

use crate::{
    error::Result,
    shift::{ShiftMode, ShiftPolicy},
};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

pub const RESTORATION_NOTE: &str = "Restoration formula: global = local + shift_global";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShiftVector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<[f64; 3]> for ShiftVector {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<ShiftVector> for [f64; 3] {
    fn from(ShiftVector { x, y, z }: ShiftVector) -> Self {
        [x, y, z]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftRecord {
    pub shift_global: ShiftVector,
    pub shift_mode: ShiftMode,
    /// Present only for manual shifts.
    pub manual_shift: Option<[f64; 3]>,
    pub auto_base: f64,
    #[serde(rename = "input_ply")]
    pub input: PathBuf,
    #[serde(rename = "output_ply")]
    pub output: PathBuf,
    #[serde(default)]
    pub note: String,
}

impl ShiftRecord {
    /// `input` and `output` are stored as given; callers pass absolute paths.
    pub fn new(
        shift: [f64; 3],
        policy: &ShiftPolicy,
        auto_base: f64,
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        let manual_shift = match *policy {
            ShiftPolicy::Manual(values) => Some(values),
            _ => None,
        };

        Self {
            shift_global: shift.into(),
            shift_mode: policy.mode(),
            manual_shift,
            auto_base,
            input: input.into(),
            output: output.into(),
            note: RESTORATION_NOTE.to_string(),
        }
    }

    pub fn shift(&self) -> [f64; 3] {
        self.shift_global.into()
    }

    /// Maps a local coordinate back to the global frame.
    pub fn restore(&self, local: [f64; 3]) -> [f64; 3] {
        let [sx, sy, sz] = self.shift();
        [local[0] + sx, local[1] + sy, local[2] + sz]
    }

    pub fn save<P>(&self, path: P) -> Result<()>
    where
        P: AsRef<Path>,
    {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    pub fn load<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

/// `scene/out.ply` becomes `scene/out_origin.json`.
pub fn sidecar_path<P>(output: P) -> PathBuf
where
    P: AsRef<Path>,
{
    let output = output.as_ref();
    let stem = output
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    output.with_file_name(format!("{stem}_origin.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shift::DEFAULT_AUTO_BASE;
    use serde_json::json;

    #[test]
    fn sidecar_sits_next_to_output() {
        assert_eq!(
            sidecar_path("output/scene_local.ply"),
            PathBuf::from("output/scene_local_origin.json")
        );
        assert_eq!(sidecar_path("scene"), PathBuf::from("scene_origin.json"));
    }

    #[test]
    fn manual_record_serializes_all_keys() {
        let policy = ShiftPolicy::manual(&[-407_000.0, -427_000.0, 0.0]).unwrap();
        let record = ShiftRecord::new(
            [-407_000.0, -427_000.0, 0.0],
            &policy,
            DEFAULT_AUTO_BASE,
            "/data/in.ply",
            "/data/out.ply",
        );

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "shift_global": {"x": -407000.0, "y": -427000.0, "z": 0.0},
                "shift_mode": "manual",
                "manual_shift": [-407000.0, -427000.0, 0.0],
                "auto_base": 1000.0,
                "input_ply": "/data/in.ply",
                "output_ply": "/data/out.ply",
                "note": RESTORATION_NOTE,
            })
        );
    }

    #[test]
    fn non_manual_record_has_null_manual_shift() {
        let record = ShiftRecord::new(
            [1.0, 2.0, 3.0],
            &ShiftPolicy::FirstPoint,
            DEFAULT_AUTO_BASE,
            "in.ply",
            "out.ply",
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["shift_mode"], "first_point");
        assert!(value["manual_shift"].is_null());
    }

    #[test]
    fn saved_record_loads_and_restores() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cloud_origin.json");
        let record = ShiftRecord::new(
            [407_000.0, 4_427_000.0, 0.0],
            &ShiftPolicy::auto(DEFAULT_AUTO_BASE).unwrap(),
            DEFAULT_AUTO_BASE,
            dir.path().join("cloud.ply"),
            dir.path().join("cloud_local.ply"),
        );

        record.save(&path).unwrap();
        let loaded = ShiftRecord::load(&path).unwrap();

        assert_eq!(loaded, record);
        assert_eq!(
            loaded.restore([123.5, 456.25, 7.0]),
            [407_123.5, 4_427_456.25, 7.0]
        );
    }
}
