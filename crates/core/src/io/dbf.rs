//! dBASE attribute tables
//!
//! Record values go through the `dbase` crate. Field descriptors are read
//! straight from the table header so that widths and decimal counts survive
//! a rewrite unchanged.

use crate::error::{Error, Result};
use crate::vector::{AttributeValue, Attributes, FieldDef, FieldKind, Schema};
use byteorder::{LittleEndian, ReadBytesExt};
use dbase::{FieldName, FieldValue, Record, TableWriterBuilder};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

const HEADER_LEN: usize = 32;
const DESCRIPTOR_LEN: usize = 32;
const HEADER_TERMINATOR: u8 = 0x0D;

/// Read the field descriptors of a `.dbf` file
pub fn read_fields(path: &Path) -> Result<Schema> {
    let file = File::open(path)?;
    read_fields_from(BufReader::new(file))
}

/// Parse field descriptors from the start of a dBASE stream
pub fn read_fields_from<R: Read>(mut reader: R) -> Result<Schema> {
    let mut header = [0u8; HEADER_LEN];
    reader.read_exact(&mut header)?;
    let header_len = (&header[8..10]).read_u16::<LittleEndian>()? as usize;
    let max_fields = header_len.saturating_sub(HEADER_LEN + 1) / DESCRIPTOR_LEN;

    let mut fields = Vec::new();
    for _ in 0..max_fields {
        let mut desc = [0u8; DESCRIPTOR_LEN];
        reader.read_exact(&mut desc[..1])?;
        if desc[0] == HEADER_TERMINATOR {
            break;
        }
        reader.read_exact(&mut desc[1..])?;

        let name_end = desc[..11].iter().position(|&b| b == 0).unwrap_or(11);
        let name = String::from_utf8_lossy(&desc[..name_end]).trim().to_string();
        let length = desc[16];
        let decimals = desc[17];

        let kind = match desc[11] {
            b'C' => FieldKind::Character { length },
            b'N' => FieldKind::Numeric { length, decimals },
            b'F' => FieldKind::Float { length, decimals },
            b'I' => FieldKind::Integer,
            b'O' | b'B' => FieldKind::Double,
            b'L' => FieldKind::Logical,
            b'D' => FieldKind::Date,
            other => {
                return Err(Error::invalid_input(format!(
                    "field {} has unsupported dBASE type '{}'",
                    name, other as char
                )))
            }
        };
        fields.push(FieldDef::new(name, kind));
    }

    Schema::from_fields(fields)
}

/// Read the schema and every record of a `.dbf` file
pub fn read_table(path: &Path) -> Result<(Schema, Vec<Attributes>)> {
    let schema = read_fields(path)?;
    let mut reader = dbase::Reader::from_path(path)?;
    let records = reader.read()?;

    let rows = records
        .iter()
        .map(|record| {
            schema
                .fields()
                .iter()
                .map(|field| {
                    let value = record
                        .get(&field.name)
                        .map(|v| from_field_value(field.kind, v))
                        .unwrap_or(AttributeValue::Null);
                    (field.name.clone(), value)
                })
                .collect()
        })
        .collect::<Vec<Attributes>>();

    debug!("Read {} records from {}", rows.len(), path.display());
    Ok((schema, rows))
}

/// Replace a `.dbf` file with a new table.
///
/// The table is written to a temporary file in the same directory and then
/// renamed over the original, so readers never see a half-written table.
pub fn write_table(path: &Path, schema: &Schema, rows: &[Attributes]) -> Result<()> {
    let dir = path.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let tmp = tempfile::Builder::new()
        .prefix(".transectaz-")
        .suffix(".dbf")
        .tempfile_in(dir)?;

    let records = rows
        .iter()
        .map(|row| to_record(schema, row))
        .collect::<Result<Vec<_>>>()?;

    let writer = table_builder(schema)?.build_with_file_dest(tmp.path())?;
    writer.write_records(&records)?;

    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    debug!("Wrote {} records to {}", rows.len(), path.display());
    Ok(())
}

/// Table writer builder with one column per schema field
pub(crate) fn table_builder(schema: &Schema) -> Result<TableWriterBuilder> {
    let mut builder = TableWriterBuilder::new();
    for field in schema.fields() {
        let name = FieldName::try_from(field.name.as_str()).map_err(|_| Error::InvalidParameter {
            name: "field name",
            value: field.name.clone(),
            reason: "not a valid dBASE field name".to_string(),
        })?;
        builder = match field.kind {
            FieldKind::Character { length } => builder.add_character_field(name, length),
            FieldKind::Numeric { length, decimals } => {
                builder.add_numeric_field(name, length, decimals)
            }
            FieldKind::Float { length, decimals } => builder.add_float_field(name, length, decimals),
            FieldKind::Integer => builder.add_integer_field(name),
            FieldKind::Double => builder.add_double_field(name),
            FieldKind::Logical => builder.add_logical_field(name),
            FieldKind::Date => builder.add_date_field(name),
        };
    }
    Ok(builder)
}

/// Convert one attribute row into a `dbase` record following `schema`
pub(crate) fn to_record(schema: &Schema, row: &Attributes) -> Result<Record> {
    let mut record = Record::default();
    for field in schema.fields() {
        let value = row.get(&field.name).unwrap_or(&AttributeValue::Null);
        record.insert(field.name.clone(), to_field_value(field, value)?);
    }
    Ok(record)
}

fn from_field_value(kind: FieldKind, value: &FieldValue) -> AttributeValue {
    match value {
        FieldValue::Character(Some(s)) => AttributeValue::String(s.clone()),
        FieldValue::Numeric(Some(v)) if kind.is_integral() && v.fract() == 0.0 => {
            AttributeValue::Int(*v as i64)
        }
        FieldValue::Numeric(Some(v)) => AttributeValue::Float(*v),
        FieldValue::Float(Some(v)) => AttributeValue::Float(*v as f64),
        FieldValue::Integer(v) => AttributeValue::Int(*v as i64),
        FieldValue::Double(v) => AttributeValue::Float(*v),
        FieldValue::Logical(Some(b)) => AttributeValue::Bool(*b),
        FieldValue::Date(Some(d)) => AttributeValue::Date {
            year: d.year(),
            month: d.month(),
            day: d.day(),
        },
        _ => AttributeValue::Null,
    }
}

fn to_field_value(field: &FieldDef, value: &AttributeValue) -> Result<FieldValue> {
    let mismatch = || {
        Error::invalid_input(format!(
            "value {:?} does not fit field {} of type {}",
            value, field.name, field.kind
        ))
    };

    let converted = match (field.kind, value) {
        (FieldKind::Character { .. }, AttributeValue::Null) => FieldValue::Character(None),
        (FieldKind::Character { .. }, AttributeValue::String(s)) => {
            FieldValue::Character(Some(s.clone()))
        }
        (FieldKind::Character { .. }, AttributeValue::Int(v)) => {
            FieldValue::Character(Some(v.to_string()))
        }
        (FieldKind::Character { .. }, AttributeValue::Float(v)) => {
            FieldValue::Character(Some(v.to_string()))
        }
        (FieldKind::Numeric { .. }, AttributeValue::Null) => FieldValue::Numeric(None),
        (FieldKind::Numeric { length, decimals }, v) => {
            let n = v.as_f64().ok_or_else(mismatch)?;
            FieldValue::Numeric(Some(fit_to_width(n, length, decimals)))
        }
        (FieldKind::Float { .. }, AttributeValue::Null) => FieldValue::Float(None),
        (FieldKind::Float { length, decimals }, v) => {
            let n = v.as_f64().ok_or_else(mismatch)?;
            FieldValue::Float(Some(fit_to_width(n, length, decimals) as f32))
        }
        (FieldKind::Integer, AttributeValue::Null) => FieldValue::Integer(0),
        (FieldKind::Integer, v) => {
            let n = v.as_i64().ok_or_else(mismatch)?;
            FieldValue::Integer(i32::try_from(n).map_err(|_| mismatch())?)
        }
        (FieldKind::Double, AttributeValue::Null) => FieldValue::Double(0.0),
        (FieldKind::Double, v) => FieldValue::Double(v.as_f64().ok_or_else(mismatch)?),
        (FieldKind::Logical, AttributeValue::Null) => FieldValue::Logical(None),
        (FieldKind::Logical, AttributeValue::Bool(b)) => FieldValue::Logical(Some(*b)),
        (FieldKind::Date, AttributeValue::Null) => FieldValue::Date(None),
        (FieldKind::Date, AttributeValue::Date { year, month, day }) => {
            FieldValue::Date(Some(dbase::Date::new(*day, *month, *year)))
        }
        _ => return Err(mismatch()),
    };
    Ok(converted)
}

/// Round `value` so its text form fits a field of `length` characters
/// with at most `decimals` fractional digits.
pub(crate) fn fit_to_width(value: f64, length: u8, decimals: u8) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let int_digits = (value.abs().trunc().max(1.0).log10().floor() as i32) + 1;
    let sign = i32::from(value < 0.0);
    let room = length as i32 - int_digits - sign - 1;
    let places = room.clamp(0, decimals as i32);
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}
