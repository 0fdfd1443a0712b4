use crate::{
    io::{self, StagedOutput},
    opts::ToEcef,
    utils::{ensure_absent, resolve_ecef_output, resolve_format},
};
use cloud_geo::{EnuFrame, GeodeticOrigin, RgbNormalizer};
use console::style;
use eyre::{Result, WrapErr};
use log::warn;

pub fn to_ecef(args: ToEcef) -> Result<()> {
    let ToEcef {
        input,
        output,
        lon,
        lat,
        height,
        preserve_rgb,
        rgb_threshold,
        force,
    } = args;

    let output = resolve_ecef_output(&output);
    ensure_absent(&output, force)?;

    let origin = GeodeticOrigin::new(lon, lat, height)?;
    let normalizer = RgbNormalizer::new(rgb_threshold)?;

    let input_format = resolve_format(&input, None)?;
    let points = io::read_point_set(&input, input_format)?;
    let enu = points
        .coordinates()
        .wrap_err_with(|| format!("Failed to read coordinates from {}", input.display()))?;

    let frame = EnuFrame::new(origin);
    let ecef = frame.enu_to_ecef(&enu)?;

    let colors = if preserve_rgb {
        let colors = normalizer.normalize_rgb(&points);
        if colors.is_none() {
            warn!("{} has no red, green or blue field", input.display());
        }
        colors
    } else {
        None
    };

    let staged = StagedOutput::new(&output)?;
    io::las::write_ecef(staged.path(), &ecef, colors.as_deref())?;
    let output = staged.commit()?;

    println!(
        "{} {} ({} points)",
        style("wrote").green().bold(),
        output.display(),
        ecef.len()
    );
    println!("local origin: {lon:.6}°E, {lat:.6}°N, {height:.3} m");
    println!(
        "preserve RGB channels: {}",
        if colors.is_some() { "yes" } else { "no" }
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use crate::io::las::{read_points, SCALE};
    use std::{fs, path::Path};

    const LOCAL_PLY: &str = "ply
format ascii 1.0
element vertex 3
property float x
property float y
property float z
property float red
property float green
end_header
0 0 0 1.0 0.5
100 0 0 0.5 0.0
0 0 50 0.0 1.0
";

    fn args(input: &Path, output: &Path) -> ToEcef {
        ToEcef {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            lon: 116.4075,
            lat: 39.9040,
            height: 1.0,
            preserve_rgb: false,
            rgb_threshold: 1.01,
            force: false,
        }
    }

    fn write_local(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("local.ply");
        fs::write(&path, LOCAL_PLY).unwrap();
        path
    }

    #[test]
    fn origin_lands_on_origin_ecef() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_local(dir.path());

        to_ecef(ToEcef {
            preserve_rgb: true,
            ..args(&input, dir.path())
        })
        .unwrap();

        let output = dir.path().join(crate::utils::ECEF_FILE_NAME);
        let (_, points) = read_points(&output, usize::MAX).unwrap();
        assert_eq!(points.len(), 3);

        let origin = GeodeticOrigin::new(116.4075, 39.9040, 1.0).unwrap().to_ecef();
        assert_abs_diff_eq!(points[0].x, origin[0], epsilon = SCALE);
        assert_abs_diff_eq!(points[0].y, origin[1], epsilon = SCALE);
        assert_abs_diff_eq!(points[0].z, origin[2], epsilon = SCALE);

        // 100 m east and 50 m up stay 100 m and 50 m away
        let distance = |a: &las::Point| {
            ((a.x - origin[0]).powi(2) + (a.y - origin[1]).powi(2) + (a.z - origin[2]).powi(2))
                .sqrt()
        };
        assert_abs_diff_eq!(distance(&points[1]), 100.0, epsilon = 2.0 * SCALE);
        assert_abs_diff_eq!(distance(&points[2]), 50.0, epsilon = 2.0 * SCALE);

        let colors: Vec<_> = points
            .iter()
            .map(|point| point.color.map(|color| (color.red, color.green, color.blue)))
            .collect();
        assert_eq!(
            colors,
            [Some((255, 127, 0)), Some((127, 0, 0)), Some((0, 255, 0))]
        );
    }

    #[test]
    fn explicit_las_path_and_overwrite_protection() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_local(dir.path());
        let output = dir.path().join("site_ecef.las");

        to_ecef(args(&input, &output)).unwrap();
        let (_, points) = read_points(&output, usize::MAX).unwrap();
        assert!(points.iter().all(|point| point.color == Some(Default::default())));

        let err = to_ecef(args(&input, &output)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<cloud_geo::Error>(),
            Some(cloud_geo::Error::OutputExists(_))
        ));

        to_ecef(ToEcef {
            force: true,
            ..args(&input, &output)
        })
        .unwrap();
    }

    #[test]
    fn invalid_origin_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_local(dir.path());
        let output = dir.path().join("out");

        let err = to_ecef(ToEcef {
            lat: 91.0,
            ..args(&input, &output)
        })
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<cloud_geo::Error>(),
            Some(cloud_geo::Error::InvalidParameter(_))
        ));
        assert!(!output.exists());
    }
}
