pub mod las;
pub mod pcd;
pub mod ply;

use crate::types::FileFormat;
use cloud_geo::PointSet;
use eyre::{bail, Result, WrapErr};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;

/// An output file that only appears at its final path once committed.
///
/// Data is written to a temporary file in the destination directory, which
/// is removed if the value is dropped before [StagedOutput::commit].
pub struct StagedOutput {
    temp: NamedTempFile,
    target: PathBuf,
}

impl StagedOutput {
    pub fn new<P>(target: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let target = target.as_ref();
        let dir = match target.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)
            .wrap_err_with(|| format!("unable to create directory {}", dir.display()))?;

        // keep the extension, writers pick compression from it
        let suffix = target
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let temp = tempfile::Builder::new()
            .prefix(".cloud-tool-")
            .suffix(&suffix)
            .tempfile_in(dir)
            .wrap_err_with(|| format!("unable to create a temporary file in {}", dir.display()))?;

        Ok(Self {
            temp,
            target: target.to_path_buf(),
        })
    }

    /// Where writers should put the data.
    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub fn commit(self) -> Result<PathBuf> {
        let Self { temp, target } = self;
        temp.persist(&target)
            .map_err(|err| err.error)
            .wrap_err_with(|| format!("unable to write {}", target.display()))?;
        Ok(target)
    }
}

pub fn read_point_set<P>(path: P, format: FileFormat) -> Result<PointSet>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let points = match format {
        FileFormat::Ply => ply::read_point_set(path)?,
        FileFormat::Pcd => pcd::read_point_set(path)?,
        FileFormat::Las => bail!(
            "'{}' is a LAS file; a point cloud with named fields (ply, pcd) is expected",
            path.display()
        ),
    };
    log::info!("loaded {} points from {}", points.len(), path.display());
    Ok(points)
}

pub fn write_point_set<P>(path: P, points: &PointSet, format: FileFormat) -> Result<()>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    match format {
        FileFormat::Ply => ply::write_point_set(path, points),
        FileFormat::Pcd => pcd::write_point_set(path, points),
        FileFormat::Las => bail!("writing named point fields to LAS is not supported"),
    }
}
