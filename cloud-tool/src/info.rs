use crate::{
    io::{las, pcd, ply},
    opts::Info,
    types::FileFormat,
    utils::resolve_format,
};
use eyre::Result;
use itertools::Itertools;
use std::path::Path;

pub fn info(args: Info) -> Result<()> {
    let Info { file, format } = args;
    let format = resolve_format(&file, format)?;

    match format {
        FileFormat::Ply => info_ply(&file)?,
        FileFormat::Pcd => info_pcd(&file)?,
        FileFormat::Las => info_las(&file)?,
    }

    Ok(())
}

fn info_ply(file: &Path) -> Result<()> {
    let header = ply::read_header(file)?;

    println!(
        "format: ply {} {}.{}",
        ply::encoding_name(&header.encoding),
        header.version.major,
        header.version.minor
    );
    for comment in &header.comments {
        println!("comment: {comment}");
    }
    for element in header.elements.values() {
        println!("element {} ({})", element.name, element.count);
        if element.name != ply::VERTEX {
            continue;
        }
        println!("name\ttype");
        for (name, property) in &element.properties {
            println!("{}\t{}", name, ply::type_name(&property.data_type));
        }
    }

    Ok(())
}

fn info_pcd(file: &Path) -> Result<()> {
    let reader = pcd::create_pcd_reader(file)?;
    let meta = reader.meta();

    println!("version: {}", meta.version);
    println!("width: {}", meta.width);
    println!("height: {}", meta.height);
    println!("points: {}", meta.num_points);
    println!("data: {:?}", meta.data);
    println!("viewpoint: {:?}", meta.viewpoint);

    println!("name\ttype\tcount");
    meta.field_defs.iter().for_each(|field| {
        let pcd_rs::FieldDef {
            ref name,
            kind,
            count,
        } = *field;

        println!("{}\t{:?}\t{}", name, kind, count);
    });

    Ok(())
}

fn info_las(file: &Path) -> Result<()> {
    let summary = las::read_summary(file)?;
    let xyz = |values: [f64; 3]| values.iter().join(", ");

    println!("version: {}.{}", summary.version.0, summary.version.1);
    println!("point format: {}", summary.point_format);
    println!("points: {}", summary.number_of_points);
    println!(
        "dimensions ({}): {}",
        summary.dimensions.len(),
        summary.dimensions.iter().join(", ")
    );
    println!("scale: {}", xyz(summary.scale));
    println!("offset: {}", xyz(summary.offset));
    println!("min: {}", xyz(summary.min));
    println!("max: {}", xyz(summary.max));
    println!("system identifier: {}", summary.system_identifier);
    println!("generating software: {}", summary.generating_software);

    if let Some(crs) = &summary.crs {
        println!("CRS:");
        if let Some(epsg) = crs.epsg {
            println!("  EPSG: {epsg}");
        }
        if let Some(wkt) = &crs.wkt {
            println!("  WKT (truncated): {wkt}...");
        }
    }

    Ok(())
}
