use eyre::{bail, ensure, Result, WrapErr};
use las::{point::Format, Builder, Color, Point, Transform, Vector};
use std::path::Path;

/// LAS caps the system identifier at 32 bytes.
pub const SYSTEM_IDENTIFIER: &str = "ECEF Earth-Centered Earth-Fixed";
pub const SCALE: f64 = 0.001;
const OFFSET_GRID: f64 = 1000.0;
const POINT_FORMAT: u8 = 3;

const PROJECTION_USER_ID: &str = "LASF_Projection";
const GEO_KEY_DIRECTORY_RECORD: u16 = 34735;
const WKT_RECORD: u16 = 2112;
const WKT_PREVIEW_CHARS: usize = 200;

mod geo_keys {
    pub const GEOGRAPHIC_TYPE: u16 = 2048;
    pub const PROJECTED_CS_TYPE: u16 = 3072;
}

/// Header facts printed by `info`.
#[derive(Debug, Clone, PartialEq)]
pub struct LasSummary {
    pub version: (u8, u8),
    pub point_format: u8,
    pub number_of_points: u64,
    pub dimensions: Vec<&'static str>,
    pub scale: [f64; 3],
    pub offset: [f64; 3],
    pub min: [f64; 3],
    pub max: [f64; 3],
    pub system_identifier: String,
    pub generating_software: String,
    pub crs: Option<Crs>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crs {
    pub epsg: Option<u16>,
    pub wkt: Option<String>,
}

/// Writes ECEF points as LAS 1.4 point format 3 at millimeter resolution.
///
/// The offset is the bounding-box midpoint snapped down to a kilometer grid,
/// which keeps the scaled integers well inside `i32`.
pub fn write_ecef<P>(path: P, points: &[[f64; 3]], colors: Option<&[[u8; 3]]>) -> Result<()>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if points.is_empty() {
        return Err(cloud_geo::Error::EmptyInput.into());
    }
    if let Some(colors) = colors {
        ensure!(
            colors.len() == points.len(),
            "{} colors given for {} points",
            colors.len(),
            points.len()
        );
    }

    let offset = grid_offset(points);
    let mut builder = Builder::from((1, 4));
    builder.point_format = Format::new(POINT_FORMAT)?;
    builder.system_identifier = SYSTEM_IDENTIFIER.to_string();
    builder.generating_software = format!("cloud-tool {}", env!("CARGO_PKG_VERSION"));
    builder.transforms = Vector {
        x: Transform {
            scale: SCALE,
            offset: offset[0],
        },
        y: Transform {
            scale: SCALE,
            offset: offset[1],
        },
        z: Transform {
            scale: SCALE,
            offset: offset[2],
        },
    };
    let header = builder.into_header()?;

    let mut writer = las::Writer::from_path(path, header)
        .wrap_err_with(|| format!("Failed to create LAS file {}", path.display()))?;
    for (index, &[x, y, z]) in points.iter().enumerate() {
        let color = match colors {
            Some(colors) => {
                let [r, g, b] = colors[index];
                // 8-bit values in the 16-bit slots
                Color::new(r.into(), g.into(), b.into())
            }
            None => Color::default(),
        };
        let point = Point {
            x,
            y,
            z,
            gps_time: Some(0.0),
            color: Some(color),
            ..Default::default()
        };
        writer
            .write_point(point)
            .wrap_err_with(|| format!("Failed to write point #{index}"))?;
    }
    writer.close()?;

    log::debug!(
        "wrote {} points to {} with offset {:?}",
        points.len(),
        path.display(),
        offset
    );
    Ok(())
}

fn grid_offset(points: &[[f64; 3]]) -> [f64; 3] {
    let mut min = [f64::INFINITY; 3];
    let mut max = [f64::NEG_INFINITY; 3];
    for point in points {
        for axis in 0..3 {
            min[axis] = min[axis].min(point[axis]);
            max[axis] = max[axis].max(point[axis]);
        }
    }
    [0, 1, 2].map(|axis| ((min[axis] + max[axis]) / 2.0 / OFFSET_GRID).floor() * OFFSET_GRID)
}

pub fn read_summary<P>(path: P) -> Result<LasSummary>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let reader = las::Reader::from_path(path)
        .wrap_err_with(|| format!("Failed to open LAS file {}", path.display()))?;
    let header = reader.header();

    let version = header.version();
    let transforms = header.transforms();
    let bounds = header.bounds();
    let crs = header
        .vlrs()
        .iter()
        .chain(header.evlrs())
        .fold(None, |crs: Option<Crs>, vlr| {
            if vlr.user_id != PROJECTION_USER_ID {
                return crs;
            }
            let mut crs = crs.unwrap_or(Crs {
                epsg: None,
                wkt: None,
            });
            match vlr.record_id {
                GEO_KEY_DIRECTORY_RECORD => crs.epsg = crs.epsg.or(parse_epsg(&vlr.data)),
                WKT_RECORD => crs.wkt = crs.wkt.or(Some(wkt_preview(&vlr.data))),
                _ => {}
            }
            Some(crs)
        })
        .filter(|crs| crs.epsg.is_some() || crs.wkt.is_some());

    Ok(LasSummary {
        version: (version.major, version.minor),
        point_format: header.point_format().to_u8()?,
        number_of_points: header.number_of_points(),
        dimensions: dimension_names(header.point_format()),
        scale: [transforms.x.scale, transforms.y.scale, transforms.z.scale],
        offset: [transforms.x.offset, transforms.y.offset, transforms.z.offset],
        min: [bounds.min.x, bounds.min.y, bounds.min.z],
        max: [bounds.max.x, bounds.max.y, bounds.max.z],
        system_identifier: header.system_identifier().to_string(),
        generating_software: header.generating_software().to_string(),
        crs,
    })
}

/// Reads up to `limit` points together with the file's point format.
pub fn read_points<P>(path: P, limit: usize) -> Result<(Format, Vec<Point>)>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let mut reader = las::Reader::from_path(path)
        .wrap_err_with(|| format!("Failed to open LAS file {}", path.display()))?;
    let format = *reader.header().point_format();
    let points = reader
        .points()
        .take(limit)
        .collect::<Result<Vec<_>, _>>()
        .wrap_err_with(|| format!("Failed to read points from {}", path.display()))?;
    Ok((format, points))
}

/// Dimension names in record order for the given point format.
pub fn dimension_names(format: &Format) -> Vec<&'static str> {
    let mut names = vec![
        "x",
        "y",
        "z",
        "intensity",
        "return_number",
        "number_of_returns",
        "scan_direction",
        "edge_of_flight_line",
        "classification",
        "synthetic",
        "key_point",
        "withheld",
    ];
    if format.is_extended {
        names.extend(["overlap", "scanner_channel"]);
    }
    names.extend(["scan_angle", "user_data", "point_source_id"]);
    if format.has_gps_time {
        names.push("gps_time");
    }
    if format.has_color {
        names.extend(["red", "green", "blue"]);
    }
    if format.has_nir {
        names.push("nir");
    }
    if format.has_waveform {
        names.push("waveform");
    }
    if format.extra_bytes > 0 {
        names.push("extra_bytes");
    }
    names
}

/// Pairs every dimension of `format` with the point's value.
pub fn point_attributes(point: &Point, format: &Format) -> Result<Vec<(&'static str, String)>> {
    dimension_names(format)
        .into_iter()
        .map(|name| {
            let value = match name {
                "x" => point.x.to_string(),
                "y" => point.y.to_string(),
                "z" => point.z.to_string(),
                "intensity" => point.intensity.to_string(),
                "return_number" => point.return_number.to_string(),
                "number_of_returns" => point.number_of_returns.to_string(),
                "scan_direction" => format!("{:?}", point.scan_direction),
                "edge_of_flight_line" => point.is_edge_of_flight_line.to_string(),
                "classification" => format!("{:?}", point.classification),
                "synthetic" => point.is_synthetic.to_string(),
                "key_point" => point.is_key_point.to_string(),
                "withheld" => point.is_withheld.to_string(),
                "overlap" => point.is_overlap.to_string(),
                "scanner_channel" => point.scanner_channel.to_string(),
                "scan_angle" => point.scan_angle.to_string(),
                "user_data" => point.user_data.to_string(),
                "point_source_id" => point.point_source_id.to_string(),
                "gps_time" => optional(point.gps_time),
                "red" => optional(point.color.map(|color| color.red)),
                "green" => optional(point.color.map(|color| color.green)),
                "blue" => optional(point.color.map(|color| color.blue)),
                "nir" => optional(point.nir),
                "waveform" => match &point.waveform {
                    Some(waveform) => format!("{waveform:?}"),
                    None => "-".to_string(),
                },
                "extra_bytes" => format!("{:?}", point.extra_bytes),
                _ => bail!("unknown LAS dimension '{name}'"),
            };
            Ok((name, value))
        })
        .collect()
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |value| value.to_string())
}

/// EPSG code from a GeoKeyDirectory record, projected before geographic.
fn parse_epsg(data: &[u8]) -> Option<u16> {
    let keys: Vec<u16> = data
        .chunks_exact(2)
        .map(|bytes| u16::from_le_bytes([bytes[0], bytes[1]]))
        .collect();
    let num_keys = *keys.get(3)? as usize;

    let mut geographic = None;
    let mut projected = None;
    for entry in keys[4..].chunks_exact(4).take(num_keys) {
        let &[key_id, location, _count, value] = entry else {
            continue;
        };
        // location 0 means the value is stored inline
        if location != 0 {
            continue;
        }
        match key_id {
            geo_keys::GEOGRAPHIC_TYPE => geographic = Some(value),
            geo_keys::PROJECTED_CS_TYPE => projected = Some(value),
            _ => {}
        }
    }
    projected.or(geographic)
}

fn wkt_preview(data: &[u8]) -> String {
    let text = String::from_utf8_lossy(data);
    text.trim_end_matches('\0')
        .chars()
        .take(WKT_PREVIEW_CHARS)
        .collect()
}
