use clap::Parser;
use cloud_geo::shift::{ShiftMode, DEFAULT_AUTO_BASE};
use cloud_geo::rgb::DEFAULT_THRESHOLD;
use std::path::PathBuf;

use crate::types::FileFormat;

#[derive(Debug, Clone, Parser)]
#[clap(version, about = "Point cloud coordinate frame tools")]
pub enum Opts {
    Info(Info),
    Dump(Dump),
    ToLocal(ToLocal),
    ToEcef(ToEcef),
}

/// Print the header of a PLY, PCD or LAS file.
#[derive(Debug, Clone, Parser)]
pub struct Info {
    pub file: PathBuf,

    #[clap(long)]
    pub format: Option<FileFormat>,
}

/// Print the first records of a point cloud file.
#[derive(Debug, Clone, Parser)]
pub struct Dump {
    pub input: PathBuf,

    #[clap(short = 'n', long, default_value_t = 5)]
    pub limit: usize,

    #[clap(long)]
    pub format: Option<FileFormat>,
}

/// Subtract a global shift so coordinates fit in 32-bit floats.
#[derive(Debug, Clone, Parser)]
pub struct ToLocal {
    pub input: PathBuf,

    /// Defaults to `<stem>_local.<ext>` next to the input.
    #[clap(short, long)]
    pub output: Option<PathBuf>,

    #[clap(short, long, default_value = "auto")]
    pub mode: ShiftMode,

    /// Shift for `--mode manual`.
    #[clap(short = 's', long, num_args = 3, value_names = ["SX", "SY", "SZ"], allow_negative_numbers = true)]
    pub manual_shift: Option<Vec<f64>>,

    /// Grid the auto shift is rounded down to.
    #[clap(long, default_value_t = DEFAULT_AUTO_BASE)]
    pub auto_base: f64,

    /// Skip writing the `<stem>_origin.json` side-car.
    #[clap(long)]
    pub no_json: bool,

    #[clap(short, long)]
    pub force: bool,
}

/// Convert ENU coordinates around a WGS84 origin to ECEF LAS.
#[derive(Debug, Clone, Parser)]
pub struct ToEcef {
    #[clap(short, long)]
    pub input: PathBuf,

    /// A `.las`/`.laz` file, or a directory receiving `output_ecef.las`.
    #[clap(short, long)]
    pub output: PathBuf,

    #[clap(long, allow_negative_numbers = true)]
    pub lon: f64,

    #[clap(long, allow_negative_numbers = true)]
    pub lat: f64,

    #[clap(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub height: f64,

    #[clap(long)]
    pub preserve_rgb: bool,

    /// Float channels whose maximum is at most this are scaled by 255.
    #[clap(long, default_value_t = DEFAULT_THRESHOLD)]
    pub rgb_threshold: f64,

    #[clap(short, long)]
    pub force: bool,
}
