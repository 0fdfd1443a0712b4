use cloud_geo::{Column, Field, PointSet, ScalarKind, Value};
use eyre::{bail, eyre, Result, WrapErr};
use itertools::Itertools;
use pcd_rs::{DataKind, DynRecord, ValueKind};
use std::{fs::File, io::BufReader, path::Path};

pub fn create_pcd_reader<P>(input_path: P) -> Result<pcd_rs::DynReader<BufReader<File>>>
where
    P: AsRef<Path>,
{
    let input_path = input_path.as_ref();
    pcd_rs::DynReader::open(input_path)
        .wrap_err_with(|| format!("Failed to open PCD file {}", input_path.display()))
}

pub fn read_point_set<P>(path: P) -> Result<PointSet>
where
    P: AsRef<Path>,
{
    let reader = create_pcd_reader(path)?;
    let num_points = reader.meta().num_points as usize;
    let defs: Vec<(String, ScalarKind)> = reader
        .meta()
        .field_defs
        .iter()
        .map(|def| {
            let pcd_rs::FieldDef {
                ref name,
                kind,
                count,
            } = *def;
            if count != 1 {
                bail!("field '{name}' has {count} elements, only scalar fields are supported");
            }
            Ok((name.clone(), scalar_kind(kind)))
        })
        .try_collect()?;

    let mut columns: Vec<Column> = defs
        .iter()
        .map(|(_, kind)| Column::with_capacity(*kind, num_points))
        .collect();

    for record in reader {
        let DynRecord(fields) = record?;
        for ((column, field), (name, _)) in columns.iter_mut().zip(&fields).zip(&defs) {
            let value = field_value(field).ok_or_else(|| eyre!("field '{name}' is empty"))?;
            column.push(value)?;
        }
    }

    let points = PointSet::from_fields(
        defs.into_iter()
            .zip(columns)
            .map(|((name, _), column)| Field::new(name, column)),
    )?;
    Ok(points)
}

/// Writes a binary PCD with one scalar field per point-set field.
pub fn write_point_set<P>(path: P, points: &PointSet) -> Result<()>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let schema = pcd_rs::Schema::from_iter(
        points
            .fields()
            .iter()
            .map(|field| (field.name.as_str(), value_kind(field.column.kind()), 1)),
    );

    let mut writer = pcd_rs::WriterInit {
        width: points.len() as u64,
        height: 1,
        viewpoint: Default::default(),
        data_kind: DataKind::Binary,
        schema: Some(schema),
    }
    .create(path)
    .wrap_err_with(|| format!("Failed to create PCD file {}", path.display()))?;

    for index in 0..points.len() {
        let record: Vec<pcd_rs::Field> = points
            .fields()
            .iter()
            .map(|field| {
                field
                    .column
                    .get(index)
                    .map(to_pcd_field)
                    .ok_or_else(|| eyre!("field '{}' ends before point #{index}", field.name))
            })
            .try_collect()?;
        writer.push(&DynRecord(record))?;
    }
    writer.finish()?;

    Ok(())
}

pub fn scalar_kind(kind: ValueKind) -> ScalarKind {
    match kind {
        ValueKind::U8 => ScalarKind::U8,
        ValueKind::U16 => ScalarKind::U16,
        ValueKind::U32 => ScalarKind::U32,
        ValueKind::I8 => ScalarKind::I8,
        ValueKind::I16 => ScalarKind::I16,
        ValueKind::I32 => ScalarKind::I32,
        ValueKind::F32 => ScalarKind::F32,
        ValueKind::F64 => ScalarKind::F64,
    }
}

pub fn value_kind(kind: ScalarKind) -> ValueKind {
    match kind {
        ScalarKind::U8 => ValueKind::U8,
        ScalarKind::U16 => ValueKind::U16,
        ScalarKind::U32 => ValueKind::U32,
        ScalarKind::I8 => ValueKind::I8,
        ScalarKind::I16 => ValueKind::I16,
        ScalarKind::I32 => ValueKind::I32,
        ScalarKind::F32 => ValueKind::F32,
        ScalarKind::F64 => ValueKind::F64,
    }
}

pub fn format_field(field: &pcd_rs::Field) -> String {
    macro_rules! join {
        ($values:expr) => {{
            match $values.as_slice() {
                [value] => value.to_string(),
                values => format!("[{}]", values.iter().join(", ")),
            }
        }};
    }

    use pcd_rs::Field as F;
    match field {
        F::I8(values) => join!(values),
        F::I16(values) => join!(values),
        F::I32(values) => join!(values),
        F::U8(values) => join!(values),
        F::U16(values) => join!(values),
        F::U32(values) => join!(values),
        F::F32(values) => join!(values),
        F::F64(values) => join!(values),
    }
}

fn field_value(field: &pcd_rs::Field) -> Option<Value> {
    use pcd_rs::Field as F;
    let value = match field {
        F::I8(values) => Value::I8(*values.first()?),
        F::I16(values) => Value::I16(*values.first()?),
        F::I32(values) => Value::I32(*values.first()?),
        F::U8(values) => Value::U8(*values.first()?),
        F::U16(values) => Value::U16(*values.first()?),
        F::U32(values) => Value::U32(*values.first()?),
        F::F32(values) => Value::F32(*values.first()?),
        F::F64(values) => Value::F64(*values.first()?),
    };
    Some(value)
}

fn to_pcd_field(value: Value) -> pcd_rs::Field {
    use pcd_rs::Field as F;
    match value {
        Value::I8(v) => F::I8(vec![v]),
        Value::I16(v) => F::I16(vec![v]),
        Value::I32(v) => F::I32(vec![v]),
        Value::U8(v) => F::U8(vec![v]),
        Value::U16(v) => F::U16(vec![v]),
        Value::U32(v) => F::U32(vec![v]),
        Value::F32(v) => F::F32(vec![v]),
        Value::F64(v) => F::F64(vec![v]),
    }
}
