use crate::{
    io::{self, StagedOutput},
    opts::ToLocal,
    utils::{default_local_output, ensure_absent, resolve_format},
};
use cloud_geo::{localize, sidecar_path, Localized, ShiftPolicy, ShiftRecord};
use console::style;
use eyre::{ensure, Result, WrapErr};
use log::warn;
use std::{
    fs,
    path::{self, PathBuf},
};

pub fn to_local(args: ToLocal) -> Result<()> {
    let ToLocal {
        input,
        output,
        mode,
        manual_shift,
        auto_base,
        no_json,
        force,
    } = args;

    let output = output.unwrap_or_else(|| default_local_output(&input));
    let input_format = resolve_format(&input, None)?;
    let output_format = resolve_format(&output, None)?;
    ensure!(
        input_format.has_named_fields(),
        "to-local reads ply or pcd files, but '{}' is {input_format}",
        input.display()
    );
    ensure!(
        output_format.has_named_fields(),
        "to-local writes ply or pcd files, but '{}' is {output_format}",
        output.display()
    );

    let json_path = (!no_json).then(|| sidecar_path(&output));
    ensure_absent(&output, force)?;
    if let Some(json_path) = &json_path {
        ensure_absent(json_path, force)?;
    }

    let policy = ShiftPolicy::from_mode(mode, manual_shift.as_deref(), auto_base)?;
    let points = io::read_point_set(&input, input_format)?;
    let Localized {
        points: local,
        shift,
    } = localize(&points, &policy)
        .wrap_err_with(|| format!("Failed to localize {}", input.display()))?;

    let staged_points = StagedOutput::new(&output)?;
    io::write_point_set(staged_points.path(), &local, output_format)?;

    let staged_json = match &json_path {
        Some(json_path) => {
            let record = ShiftRecord::new(
                shift,
                &policy,
                auto_base,
                absolute(&input)?,
                absolute(&output)?,
            );
            let staged = StagedOutput::new(json_path)?;
            record.save(staged.path())?;
            Some(staged)
        }
        None => None,
    };

    // side-car first, a points file never appears without its shift record
    let json_path = staged_json.map(StagedOutput::commit).transpose()?;
    let output = match staged_points.commit() {
        Ok(output) => output,
        Err(err) => {
            if let Some(json_path) = &json_path {
                if let Err(remove_err) = fs::remove_file(json_path) {
                    warn!("unable to remove {}: {remove_err}", json_path.display());
                }
            }
            return Err(err);
        }
    };

    let [sx, sy, sz] = shift;
    println!(
        "{} {} ({} points)",
        style("wrote").green().bold(),
        output.display(),
        local.len()
    );
    if let Some(json_path) = json_path {
        println!("{} {}", style("wrote").green().bold(), json_path.display());
    }
    println!("shift mode: {mode}");
    println!("local = global - ({sx:.6}, {sy:.6}, {sz:.6})");
    println!("local origin (0, 0, 0) is global ({sx:.6}, {sy:.6}, {sz:.6})");

    Ok(())
}

fn absolute(path: &path::Path) -> Result<PathBuf> {
    path::absolute(path).wrap_err_with(|| format!("Failed to resolve {}", path.display()))
}
