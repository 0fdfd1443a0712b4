use clap::ValueEnum;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum FileFormat {
    Ply,
    Pcd,
    Las,
}

impl FileFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Ply => "ply",
            FileFormat::Pcd => "pcd",
            FileFormat::Las => "las",
        }
    }

    /// Formats that carry arbitrary named per-point fields.
    pub fn has_named_fields(&self) -> bool {
        matches!(self, FileFormat::Ply | FileFormat::Pcd)
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
