use cloud_geo::{Column, Field, PointSet, ScalarKind, Value};
use eyre::{bail, eyre, Result, WrapErr};
use itertools::Itertools;
use ply_rs::{
    parser::Parser,
    ply::{
        Addable, DefaultElement, ElementDef, Encoding, Header, Ply, Property, PropertyDef,
        PropertyType, ScalarType,
    },
    writer::Writer,
};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

pub const VERTEX: &str = "vertex";

pub fn load<P>(path: P) -> Result<Ply<DefaultElement>>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let mut reader = BufReader::new(
        File::open(path).wrap_err_with(|| format!("Failed to open file {}", path.display()))?,
    );
    Parser::<DefaultElement>::new()
        .read_ply(&mut reader)
        .wrap_err_with(|| format!("Failed to parse PLY file {}", path.display()))
}

pub fn read_header<P>(path: P) -> Result<Header>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let mut reader = BufReader::new(
        File::open(path).wrap_err_with(|| format!("Failed to open file {}", path.display()))?,
    );
    Parser::<DefaultElement>::new()
        .read_header(&mut reader)
        .wrap_err_with(|| format!("Failed to parse PLY header of {}", path.display()))
}

pub fn read_point_set<P>(path: P) -> Result<PointSet>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let ply = load(path)?;
    vertex_point_set(&ply).wrap_err_with(|| format!("Invalid vertex data in {}", path.display()))
}

/// Collects the scalar properties of the `vertex` element into columns.
pub fn vertex_point_set(ply: &Ply<DefaultElement>) -> Result<PointSet> {
    let element = ply
        .header
        .elements
        .get(VERTEX)
        .ok_or_else(|| eyre!("no '{VERTEX}' element"))?;
    let records = ply.payload.get(VERTEX).map(Vec::as_slice).unwrap_or(&[]);

    let mut points = PointSet::new();
    for (name, def) in &element.properties {
        let kind = match &def.data_type {
            PropertyType::Scalar(scalar) => scalar_kind(scalar),
            PropertyType::List(..) => bail!("list property '{name}' is not supported"),
        };

        let mut column = Column::with_capacity(kind, records.len());
        for (index, record) in records.iter().enumerate() {
            let value = record
                .get(name)
                .and_then(property_value)
                .ok_or_else(|| eyre!("vertex #{index} has no scalar '{name}'"))?;
            column.push(value)?;
        }
        points.push_field(Field::new(name.clone(), column))?;
    }

    Ok(points)
}

/// Writes the point set as the `vertex` element of a binary little-endian PLY.
pub fn write_point_set<P>(path: P, points: &PointSet) -> Result<()>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let mut writer = BufWriter::new(
        File::create(path).wrap_err_with(|| format!("Failed to create file {}", path.display()))?,
    );
    write_to(&mut writer, points)?;
    writer.flush()?;
    Ok(())
}

pub fn write_to<W>(writer: &mut W, points: &PointSet) -> Result<()>
where
    W: Write,
{
    let mut ply = Ply::<DefaultElement>::new();
    ply.header.encoding = Encoding::BinaryLittleEndian;
    ply.header
        .comments
        .push(format!("generated by cloud-tool {}", env!("CARGO_PKG_VERSION")));

    let mut element = ElementDef::new(VERTEX.to_string());
    for field in points.fields() {
        let data_type = PropertyType::Scalar(scalar_type(field.column.kind()));
        element
            .properties
            .add(PropertyDef::new(field.name.clone(), data_type));
    }
    ply.header.elements.add(element);

    let mut records = vec![DefaultElement::new(); points.len()];
    for field in points.fields() {
        for (record, value) in records.iter_mut().zip(field.column.values()) {
            record.insert(field.name.clone(), to_property(value));
        }
    }
    ply.payload.insert(VERTEX.to_string(), records);

    ply.make_consistent()
        .map_err(|err| eyre!("inconsistent PLY data: {err:?}"))?;
    Writer::new().write_ply(writer, &mut ply)?;
    Ok(())
}

pub fn scalar_kind(scalar: &ScalarType) -> ScalarKind {
    match scalar {
        ScalarType::Char => ScalarKind::I8,
        ScalarType::UChar => ScalarKind::U8,
        ScalarType::Short => ScalarKind::I16,
        ScalarType::UShort => ScalarKind::U16,
        ScalarType::Int => ScalarKind::I32,
        ScalarType::UInt => ScalarKind::U32,
        ScalarType::Float => ScalarKind::F32,
        ScalarType::Double => ScalarKind::F64,
    }
}

pub fn scalar_type(kind: ScalarKind) -> ScalarType {
    match kind {
        ScalarKind::I8 => ScalarType::Char,
        ScalarKind::U8 => ScalarType::UChar,
        ScalarKind::I16 => ScalarType::Short,
        ScalarKind::U16 => ScalarType::UShort,
        ScalarKind::I32 => ScalarType::Int,
        ScalarKind::U32 => ScalarType::UInt,
        ScalarKind::F32 => ScalarType::Float,
        ScalarKind::F64 => ScalarType::Double,
    }
}

pub fn scalar_name(scalar: &ScalarType) -> &'static str {
    match scalar {
        ScalarType::Char => "char",
        ScalarType::UChar => "uchar",
        ScalarType::Short => "short",
        ScalarType::UShort => "ushort",
        ScalarType::Int => "int",
        ScalarType::UInt => "uint",
        ScalarType::Float => "float",
        ScalarType::Double => "double",
    }
}

pub fn type_name(data_type: &PropertyType) -> String {
    match data_type {
        PropertyType::Scalar(scalar) => scalar_name(scalar).to_string(),
        PropertyType::List(index, item) => {
            format!("list {} {}", scalar_name(index), scalar_name(item))
        }
    }
}

pub fn encoding_name(encoding: &Encoding) -> &'static str {
    match encoding {
        Encoding::Ascii => "ascii",
        Encoding::BinaryBigEndian => "binary_big_endian",
        Encoding::BinaryLittleEndian => "binary_little_endian",
    }
}

pub fn format_property(property: &Property) -> String {
    match property {
        Property::Char(v) => v.to_string(),
        Property::UChar(v) => v.to_string(),
        Property::Short(v) => v.to_string(),
        Property::UShort(v) => v.to_string(),
        Property::Int(v) => v.to_string(),
        Property::UInt(v) => v.to_string(),
        Property::Float(v) => v.to_string(),
        Property::Double(v) => v.to_string(),
        Property::ListChar(v) => format!("[{}]", v.iter().join(", ")),
        Property::ListUChar(v) => format!("[{}]", v.iter().join(", ")),
        Property::ListShort(v) => format!("[{}]", v.iter().join(", ")),
        Property::ListUShort(v) => format!("[{}]", v.iter().join(", ")),
        Property::ListInt(v) => format!("[{}]", v.iter().join(", ")),
        Property::ListUInt(v) => format!("[{}]", v.iter().join(", ")),
        Property::ListFloat(v) => format!("[{}]", v.iter().join(", ")),
        Property::ListDouble(v) => format!("[{}]", v.iter().join(", ")),
    }
}

fn property_value(property: &Property) -> Option<Value> {
    let value = match *property {
        Property::Char(v) => Value::I8(v),
        Property::UChar(v) => Value::U8(v),
        Property::Short(v) => Value::I16(v),
        Property::UShort(v) => Value::U16(v),
        Property::Int(v) => Value::I32(v),
        Property::UInt(v) => Value::U32(v),
        Property::Float(v) => Value::F32(v),
        Property::Double(v) => Value::F64(v),
        _ => return None,
    };
    Some(value)
}

fn to_property(value: Value) -> Property {
    match value {
        Value::I8(v) => Property::Char(v),
        Value::U8(v) => Property::UChar(v),
        Value::I16(v) => Property::Short(v),
        Value::U16(v) => Property::UShort(v),
        Value::I32(v) => Property::Int(v),
        Value::U32(v) => Property::UInt(v),
        Value::F32(v) => Property::Float(v),
        Value::F64(v) => Property::Double(v),
    }
}
