//! Columnar point storage.
//!
//! A [PointSet] keeps one typed [Column] per named attribute, in the order
//! the attributes were declared by the source file. Coordinates live in the
//! `x`, `y` and `z` columns; everything else is carried along untouched.

use crate::error::{Error, Result};
use num_traits::ToPrimitive;
use std::fmt;

/// Names of the coordinate fields, in axis order.
pub const COORDINATE_FIELDS: [&str; 3] = ["x", "y", "z"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
}

impl ScalarKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::I8 => "i8",
            Self::U8 => "u8",
            Self::I16 => "i16",
            Self::U16 => "u16",
            Self::I32 => "i32",
            Self::U32 => "u32",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single scalar taken out of (or put into) a column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    F32(f32),
    F64(f64),
}

macro_rules! derive_from_trait_for_value {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Self::$variant(value)
            }
        }

        impl From<Vec<$ty>> for Column {
            fn from(values: Vec<$ty>) -> Self {
                Self::$variant(values)
            }
        }
    };
}

derive_from_trait_for_value!(I8, i8);
derive_from_trait_for_value!(U8, u8);
derive_from_trait_for_value!(I16, i16);
derive_from_trait_for_value!(U16, u16);
derive_from_trait_for_value!(I32, i32);
derive_from_trait_for_value!(U32, u32);
derive_from_trait_for_value!(F32, f32);
derive_from_trait_for_value!(F64, f64);

impl Value {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Self::I8(_) => ScalarKind::I8,
            Self::U8(_) => ScalarKind::U8,
            Self::I16(_) => ScalarKind::I16,
            Self::U16(_) => ScalarKind::U16,
            Self::I32(_) => ScalarKind::I32,
            Self::U32(_) => ScalarKind::U32,
            Self::F32(_) => ScalarKind::F32,
            Self::F64(_) => ScalarKind::F64,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::I8(v) => write!(f, "{v}"),
            Self::U8(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::U16(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
        }
    }
}

/// Values of one attribute for every point, in point order.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    I8(Vec<i8>),
    U8(Vec<u8>),
    I16(Vec<i16>),
    U16(Vec<u16>),
    I32(Vec<i32>),
    U32(Vec<u32>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

macro_rules! with_column {
    ($column:expr, $values:ident => $body:expr) => {
        match $column {
            Column::I8($values) => $body,
            Column::U8($values) => $body,
            Column::I16($values) => $body,
            Column::U16($values) => $body,
            Column::I32($values) => $body,
            Column::U32($values) => $body,
            Column::F32($values) => $body,
            Column::F64($values) => $body,
        }
    };
}

impl Column {
    pub fn with_capacity(kind: ScalarKind, capacity: usize) -> Self {
        match kind {
            ScalarKind::I8 => Self::I8(Vec::with_capacity(capacity)),
            ScalarKind::U8 => Self::U8(Vec::with_capacity(capacity)),
            ScalarKind::I16 => Self::I16(Vec::with_capacity(capacity)),
            ScalarKind::U16 => Self::U16(Vec::with_capacity(capacity)),
            ScalarKind::I32 => Self::I32(Vec::with_capacity(capacity)),
            ScalarKind::U32 => Self::U32(Vec::with_capacity(capacity)),
            ScalarKind::F32 => Self::F32(Vec::with_capacity(capacity)),
            ScalarKind::F64 => Self::F64(Vec::with_capacity(capacity)),
        }
    }

    pub fn kind(&self) -> ScalarKind {
        match self {
            Self::I8(_) => ScalarKind::I8,
            Self::U8(_) => ScalarKind::U8,
            Self::I16(_) => ScalarKind::I16,
            Self::U16(_) => ScalarKind::U16,
            Self::I32(_) => ScalarKind::I32,
            Self::U32(_) => ScalarKind::U32,
            Self::F32(_) => ScalarKind::F32,
            Self::F64(_) => ScalarKind::F64,
        }
    }

    pub fn len(&self) -> usize {
        with_column!(self, values => values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a value. The value must have the column's element type.
    pub fn push(&mut self, value: Value) -> Result<()> {
        match (self, value) {
            (Self::I8(values), Value::I8(v)) => values.push(v),
            (Self::U8(values), Value::U8(v)) => values.push(v),
            (Self::I16(values), Value::I16(v)) => values.push(v),
            (Self::U16(values), Value::U16(v)) => values.push(v),
            (Self::I32(values), Value::I32(v)) => values.push(v),
            (Self::U32(values), Value::U32(v)) => values.push(v),
            (Self::F32(values), Value::F32(v)) => values.push(v),
            (Self::F64(values), Value::F64(v)) => values.push(v),
            (column, value) => {
                return Err(Error::KindMismatch {
                    expected: column.kind(),
                    found: value.kind(),
                })
            }
        }
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        with_column!(self, values => values.get(index).copied().map(Value::from))
    }

    pub fn values(&self) -> impl Iterator<Item = Value> + '_ {
        (0..self.len()).filter_map(|index| self.get(index))
    }

    /// Widens every element to `f64`.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        with_column!(self, values => values
            .iter()
            .map(|v| v.to_f64().unwrap_or(f64::NAN))
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub column: Column,
}

impl Field {
    pub fn new(name: impl Into<String>, column: impl Into<Column>) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointSet {
    fields: Vec<Field>,
}

impl PointSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: impl IntoIterator<Item = Field>) -> Result<Self> {
        let mut set = Self::new();
        for field in fields {
            set.push_field(field)?;
        }
        Ok(set)
    }

    /// Appends a field. Its length must match the fields already present and
    /// its name must be new.
    pub fn push_field(&mut self, field: Field) -> Result<()> {
        if self.contains(&field.name) {
            return Err(Error::DuplicateField(field.name));
        }
        if let Some(first) = self.fields.first() {
            let expected = first.column.len();
            let found = field.column.len();
            if expected != found {
                return Err(Error::LengthMismatch {
                    name: field.name,
                    expected,
                    found,
                });
            }
        }
        self.fields.push(field);
        Ok(())
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.fields.first().map(|field| field.column.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(|field| field.name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.column)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Fails with [Error::MissingField] listing every absent name.
    pub fn require_fields(&self, names: &[&str]) -> Result<()> {
        let missing: Vec<String> = names
            .iter()
            .filter(|name| !self.contains(name))
            .map(|name| name.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::MissingField(missing))
        }
    }

    /// Reads `x`, `y`, `z` as `f64` triples.
    pub fn coordinates(&self) -> Result<Vec<[f64; 3]>> {
        self.require_fields(&COORDINATE_FIELDS)?;
        if self.is_empty() {
            return Err(Error::EmptyInput);
        }

        let [x, y, z] = COORDINATE_FIELDS.map(|name| {
            self.column(name)
                .map(Column::to_f64_vec)
                .unwrap_or_default()
        });

        Ok(x
            .into_iter()
            .zip(y)
            .zip(z)
            .map(|((x, y), z)| [x, y, z])
            .collect())
    }

    /// All attributes of point `index`, in field order.
    pub fn record(&self, index: usize) -> Option<Vec<(&str, Value)>> {
        self.fields
            .iter()
            .map(|field| Some((field.name.as_str(), field.column.get(index)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PointSet {
        PointSet::from_fields([
            Field::new("x", vec![1.0f64, 2.0]),
            Field::new("y", vec![3.0f32, 4.0]),
            Field::new("z", vec![5i32, 6]),
            Field::new("red", vec![10u8, 20]),
        ])
        .unwrap()
    }

    #[test]
    fn coordinates_widen_any_kind() {
        let points = sample();
        assert_eq!(points.len(), 2);
        assert_eq!(
            points.coordinates().unwrap(),
            vec![[1.0, 3.0, 5.0], [2.0, 4.0, 6.0]]
        );
    }

    #[test]
    fn missing_z_is_reported_by_name() {
        let points = PointSet::from_fields([
            Field::new("x", vec![1.0f64]),
            Field::new("y", vec![1.0f64]),
        ])
        .unwrap();

        match points.coordinates() {
            Err(Error::MissingField(names)) => assert_eq!(names, vec!["z".to_string()]),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn empty_coordinates_are_rejected() {
        let points = PointSet::from_fields([
            Field::new("x", Vec::<f32>::new()),
            Field::new("y", Vec::<f32>::new()),
            Field::new("z", Vec::<f32>::new()),
        ])
        .unwrap();

        assert!(matches!(points.coordinates(), Err(Error::EmptyInput)));
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let result = PointSet::from_fields([
            Field::new("x", vec![1.0f64, 2.0]),
            Field::new("y", vec![1.0f64]),
        ]);
        assert!(matches!(result, Err(Error::LengthMismatch { .. })));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let result = PointSet::from_fields([
            Field::new("x", vec![1.0f64]),
            Field::new("x", vec![2.0f64]),
        ]);
        assert!(matches!(result, Err(Error::DuplicateField(name)) if name == "x"));
    }

    #[test]
    fn push_checks_element_type() {
        let mut column = Column::with_capacity(ScalarKind::U8, 2);
        column.push(Value::U8(7)).unwrap();
        let err = column.push(Value::F32(1.0)).unwrap_err();
        assert!(matches!(
            err,
            Error::KindMismatch {
                expected: ScalarKind::U8,
                found: ScalarKind::F32
            }
        ));
        assert_eq!(column, Column::U8(vec![7]));
    }

    #[test]
    fn record_lists_fields_in_order() {
        let points = sample();
        let record = points.record(1).unwrap();
        let names: Vec<_> = record.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, ["x", "y", "z", "red"]);
        assert_eq!(record[3].1, Value::U8(20));
        assert!(points.record(2).is_none());
    }
}
