use crate::{
    io::{las, pcd, ply},
    opts::Dump,
    types::FileFormat,
    utils::resolve_format,
};
use eyre::{eyre, Result};
use itertools::Itertools;
use std::path::Path;

pub fn dump(args: Dump) -> Result<()> {
    let Dump {
        input,
        limit,
        format,
    } = args;
    let format = resolve_format(&input, format)?;

    let records = match format {
        FileFormat::Ply => dump_ply(&input, limit)?,
        FileFormat::Pcd => dump_pcd(&input, limit)?,
        FileFormat::Las => dump_las(&input, limit)?,
    };

    println!("first {} records:", records.len());
    for (index, record) in records.iter().enumerate() {
        println!("{}", format_record(index, record));
    }

    Ok(())
}

type Record = Vec<(String, String)>;

fn format_record(index: usize, record: &Record) -> String {
    let body = record
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .join(", ");
    format!("#{index}: {{{body}}}")
}

fn dump_ply(path: &Path, limit: usize) -> Result<Vec<Record>> {
    let ply = ply::load(path)?;
    let vertices = ply
        .payload
        .get(ply::VERTEX)
        .ok_or_else(|| eyre!("'{}' has no '{}' element", path.display(), ply::VERTEX))?;

    let records = vertices
        .iter()
        .take(limit)
        .map(|vertex| {
            vertex
                .iter()
                .map(|(name, property)| (name.clone(), ply::format_property(property)))
                .collect()
        })
        .collect();
    Ok(records)
}

fn dump_pcd(path: &Path, limit: usize) -> Result<Vec<Record>> {
    let reader = pcd::create_pcd_reader(path)?;
    let names: Vec<String> = reader
        .meta()
        .field_defs
        .iter()
        .map(|def| def.name.clone())
        .collect();

    reader
        .take(limit)
        .map(|record| -> Result<Record> {
            let pcd_rs::DynRecord(fields) = record?;
            let record = names
                .iter()
                .cloned()
                .zip(fields.iter().map(pcd::format_field))
                .collect();
            Ok(record)
        })
        .collect()
}

fn dump_las(path: &Path, limit: usize) -> Result<Vec<Record>> {
    let (format, points) = las::read_points(path, limit)?;

    points
        .iter()
        .map(|point| -> Result<Record> {
            let record = las::point_attributes(point, &format)?
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect();
            Ok(record)
        })
        .collect()
}
