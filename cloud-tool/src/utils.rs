use crate::types::FileFormat;
use eyre::{eyre, Result};
use std::path::{Path, PathBuf};

/// File name used when the ECEF output is given as a directory.
pub const ECEF_FILE_NAME: &str = "output_ecef.las";

pub fn guess_file_format<P>(file: P) -> Option<FileFormat>
where
    P: AsRef<Path>,
{
    let file = file.as_ref();
    let ext = file.extension()?.to_str()?.to_ascii_lowercase();

    let format = match ext.as_str() {
        "ply" => FileFormat::Ply,
        "pcd" => FileFormat::Pcd,
        "las" | "laz" => FileFormat::Las,
        _ => return None,
    };

    Some(format)
}

/// Uses the explicit format if given, otherwise guesses from the file name.
pub fn resolve_format<P>(file: P, format: Option<FileFormat>) -> Result<FileFormat>
where
    P: AsRef<Path>,
{
    let file = file.as_ref();
    match format {
        Some(format) => Ok(format),
        None => guess_file_format(file)
            .ok_or_else(|| eyre!("unable to guess file format of '{}'", file.display())),
    }
}

/// `dir/scene.ply` becomes `dir/scene_local.ply`.
pub fn default_local_output<P>(input: P) -> PathBuf
where
    P: AsRef<Path>,
{
    let input = input.as_ref();
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match input.extension() {
        Some(ext) => format!("{stem}_local.{}", ext.to_string_lossy()),
        None => format!("{stem}_local"),
    };
    input.with_file_name(name)
}

/// A LAS/LAZ path is used as is. Anything else is treated as a directory.
pub fn resolve_ecef_output<P>(output: P) -> PathBuf
where
    P: AsRef<Path>,
{
    let output = output.as_ref();
    if !output.is_dir() && guess_file_format(output) == Some(FileFormat::Las) {
        output.to_path_buf()
    } else {
        output.join(ECEF_FILE_NAME)
    }
}

/// Fails with [cloud_geo::Error::OutputExists] unless `force` is set.
pub fn ensure_absent<P>(output: P, force: bool) -> cloud_geo::Result<()>
where
    P: AsRef<Path>,
{
    let output = output.as_ref();
    if !force && output.exists() {
        return Err(cloud_geo::Error::OutputExists(output.to_path_buf()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_are_guessed_from_extension() {
        assert_eq!(guess_file_format("a/b.ply"), Some(FileFormat::Ply));
        assert_eq!(guess_file_format("b.PCD"), Some(FileFormat::Pcd));
        assert_eq!(guess_file_format("b.las"), Some(FileFormat::Las));
        assert_eq!(guess_file_format("b.laz"), Some(FileFormat::Las));
        assert_eq!(guess_file_format("b.xyz"), None);
        assert_eq!(guess_file_format("b"), None);
    }

    #[test]
    fn explicit_format_wins() {
        assert_eq!(
            resolve_format("cloud.bin", Some(FileFormat::Ply)).unwrap(),
            FileFormat::Ply
        );
        assert!(resolve_format("cloud.bin", None).is_err());
    }

    #[test]
    fn local_output_defaults_next_to_input() {
        assert_eq!(
            default_local_output("scans/site.ply"),
            PathBuf::from("scans/site_local.ply")
        );
        assert_eq!(
            default_local_output("site.pcd"),
            PathBuf::from("site_local.pcd")
        );
    }

    #[test]
    fn ecef_output_accepts_file_or_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            resolve_ecef_output(dir.path()),
            dir.path().join(ECEF_FILE_NAME)
        );
        assert_eq!(
            resolve_ecef_output(dir.path().join("site.las")),
            dir.path().join("site.las")
        );
        assert_eq!(
            resolve_ecef_output(dir.path().join("fresh")),
            dir.path().join("fresh").join(ECEF_FILE_NAME)
        );
    }

    #[test]
    fn existing_output_needs_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taken.ply");
        std::fs::write(&path, b"ply").unwrap();

        assert!(matches!(
            ensure_absent(&path, false),
            Err(cloud_geo::Error::OutputExists(_))
        ));
        assert!(ensure_absent(&path, true).is_ok());
        assert!(ensure_absent(dir.path().join("free.ply"), false).is_ok());
    }
}
