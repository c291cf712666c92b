//! Conversions between [`SqlValue`] and the PostgreSQL wire formats.

use std::borrow::Cow;
use std::error::Error;
use std::net::IpAddr;

use bytes::BytesMut;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use tokio_postgres::types::{Format, FromSql, IsNull, Kind, ToSql, Type};
use uuid::Uuid;

use crate::core::value::{SqlNullType, SqlValue};

type BoxError = Box<dyn Error + Sync + Send>;

/// Scalar types decoded by [`PgValue`] besides the text-like ones.
const DECODED_TYPES: &[&str] = &[
    "bool",
    "int2",
    "int4",
    "int8",
    "float4",
    "float8",
    "oid",
    "char",
    "numeric",
    "uuid",
    "timestamp",
    "timestamptz",
    "date",
    "time",
    "bytea",
    "json",
    "jsonb",
    "inet",
    "interval",
    "xml",
];

/// A statement parameter encoded for the type the server inferred.
///
/// A value whose Rust type matches the parameter type is sent in binary.
/// Anything else goes out in text form and is parsed by the server, the way
/// an untyped literal would be. A text filter value therefore compares
/// against date, uuid or enum columns.
#[derive(Debug)]
pub(crate) struct BoundParam<'v>(pub(crate) &'v SqlValue<'static>);

impl BoundParam<'_> {
    fn is_native(&self, ty: &Type) -> bool {
        match self.0 {
            SqlValue::Null(_) => true,
            SqlValue::Bool(_) => <bool as ToSql>::accepts(ty),
            SqlValue::I16(_) => <i16 as ToSql>::accepts(ty),
            SqlValue::I32(_) => <i32 as ToSql>::accepts(ty),
            SqlValue::I64(_) => <i64 as ToSql>::accepts(ty),
            SqlValue::F32(_) => <f32 as ToSql>::accepts(ty),
            SqlValue::F64(_) => <f64 as ToSql>::accepts(ty),
            SqlValue::Text(_) => <&str as ToSql>::accepts(ty),
            SqlValue::Bytes(_) => <&[u8] as ToSql>::accepts(ty),
            SqlValue::Uuid(_) => <Uuid as ToSql>::accepts(ty),
            SqlValue::Decimal(_) => <Decimal as ToSql>::accepts(ty),
            SqlValue::DateTime(_) => <NaiveDateTime as ToSql>::accepts(ty),
            SqlValue::DateTimeOffset(_) => <DateTime<FixedOffset> as ToSql>::accepts(ty),
            SqlValue::Date(_) => <NaiveDate as ToSql>::accepts(ty),
            SqlValue::Time(_) => <NaiveTime as ToSql>::accepts(ty),
        }
    }
}

impl ToSql for BoundParam<'_> {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        if !self.is_native(ty) {
            out.extend_from_slice(self.0.to_string().as_bytes());
            return Ok(IsNull::No);
        }

        match self.0 {
            SqlValue::Null(_) => Ok(IsNull::Yes),
            SqlValue::Bool(v) => v.to_sql(ty, out),
            SqlValue::I16(v) => v.to_sql(ty, out),
            SqlValue::I32(v) => v.to_sql(ty, out),
            SqlValue::I64(v) => v.to_sql(ty, out),
            SqlValue::F32(v) => v.to_sql(ty, out),
            SqlValue::F64(v) => v.to_sql(ty, out),
            SqlValue::Text(v) => {
                let text: &str = v;
                <&str as ToSql>::to_sql(&text, ty, out)
            }
            SqlValue::Bytes(v) => {
                let bytes: &[u8] = v;
                <&[u8] as ToSql>::to_sql(&bytes, ty, out)
            }
            SqlValue::Uuid(v) => v.to_sql(ty, out),
            SqlValue::Decimal(v) => v.to_sql(ty, out),
            SqlValue::DateTime(v) => v.to_sql(ty, out),
            SqlValue::DateTimeOffset(v) => v.to_sql(ty, out),
            SqlValue::Date(v) => v.to_sql(ty, out),
            SqlValue::Time(v) => v.to_sql(ty, out),
        }
    }

    fn accepts(_: &Type) -> bool {
        true
    }

    fn encode_format(&self, ty: &Type) -> Format {
        if self.is_native(ty) {
            Format::Binary
        } else {
            Format::Text
        }
    }

    tokio_postgres::types::to_sql_checked!();
}

/// A column value decoded from the binary result format.
///
/// Enums, domains and one-dimensional arrays are supported on top of the
/// scalar types; arrays become their PostgreSQL text literal. Types outside
/// that set are rejected by `accepts`, so reading them fails instead of
/// yielding NULL.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PgValue(pub(crate) SqlValue<'static>);

impl<'a> FromSql<'a> for PgValue {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        let value = match ty.kind() {
            Kind::Enum(_) => SqlValue::Text(Cow::Owned(std::str::from_utf8(raw)?.to_owned())),
            Kind::Domain(base) => return Self::from_sql(base, raw),
            Kind::Array(_) => {
                let items = Vec::<Option<PgValue>>::from_sql(ty, raw)?;
                SqlValue::Text(Cow::Owned(array_literal(&items)))
            }
            _ => decode_scalar(ty, raw)?,
        };
        Ok(PgValue(value))
    }

    fn from_sql_null(ty: &Type) -> Result<Self, BoxError> {
        Ok(PgValue(SqlValue::Null(null_type(ty))))
    }

    fn accepts(ty: &Type) -> bool {
        match ty.kind() {
            Kind::Enum(_) => true,
            Kind::Domain(base) | Kind::Array(base) => Self::accepts(base),
            _ => <&str as FromSql>::accepts(ty) || DECODED_TYPES.contains(&ty.name()),
        }
    }
}

fn decode_scalar(ty: &Type, raw: &[u8]) -> Result<SqlValue<'static>, BoxError> {
    if <&str as FromSql>::accepts(ty) || ty.name() == "xml" {
        let text = <&str as FromSql>::from_sql(ty, raw)?;
        return Ok(SqlValue::Text(Cow::Owned(text.to_owned())));
    }

    let value = match ty.name() {
        "bool" => SqlValue::Bool(bool::from_sql(ty, raw)?),
        "int2" => SqlValue::I16(i16::from_sql(ty, raw)?),
        "int4" => SqlValue::I32(i32::from_sql(ty, raw)?),
        "int8" => SqlValue::I64(i64::from_sql(ty, raw)?),
        "float4" => SqlValue::F32(f32::from_sql(ty, raw)?),
        "float8" => SqlValue::F64(f64::from_sql(ty, raw)?),
        "oid" => SqlValue::I64(i64::from(u32::from_sql(ty, raw)?)),
        "char" => SqlValue::Text(Cow::Owned(
            char::from(i8::from_sql(ty, raw)? as u8).to_string(),
        )),
        "numeric" => SqlValue::Decimal(Decimal::from_sql(ty, raw)?),
        "uuid" => SqlValue::Uuid(Uuid::from_sql(ty, raw)?),
        "timestamp" => SqlValue::DateTime(NaiveDateTime::from_sql(ty, raw)?),
        "timestamptz" => SqlValue::DateTimeOffset(DateTime::<FixedOffset>::from_sql(ty, raw)?),
        "date" => SqlValue::Date(NaiveDate::from_sql(ty, raw)?),
        "time" => SqlValue::Time(NaiveTime::from_sql(ty, raw)?),
        "bytea" => SqlValue::Bytes(Cow::Owned(Vec::<u8>::from_sql(ty, raw)?)),
        "json" | "jsonb" => {
            SqlValue::Text(Cow::Owned(serde_json::Value::from_sql(ty, raw)?.to_string()))
        }
        "inet" => SqlValue::Text(Cow::Owned(IpAddr::from_sql(ty, raw)?.to_string())),
        "interval" => SqlValue::Text(Cow::Owned(interval_text(raw)?)),
        other => return Err(format!("unsupported PostgreSQL type {}", other).into()),
    };
    Ok(value)
}

fn null_type(ty: &Type) -> SqlNullType {
    if let Kind::Domain(base) = ty.kind() {
        return null_type(base);
    }
    match ty.name() {
        "bool" => SqlNullType::Bool,
        "int2" => SqlNullType::I16,
        "int4" => SqlNullType::I32,
        "int8" | "oid" => SqlNullType::I64,
        "float4" => SqlNullType::F32,
        "float8" => SqlNullType::F64,
        "numeric" => SqlNullType::Decimal,
        "uuid" => SqlNullType::Uuid,
        "timestamp" => SqlNullType::DateTime,
        "timestamptz" => SqlNullType::DateTimeOffset,
        "date" => SqlNullType::Date,
        "time" => SqlNullType::Time,
        "bytea" => SqlNullType::Bytes,
        _ => SqlNullType::String,
    }
}

/// Render an array as `{a,"b c",NULL}`.
fn array_literal(items: &[Option<PgValue>]) -> String {
    let elements: Vec<String> = items
        .iter()
        .map(|item| match item {
            Some(PgValue(value)) if !value.is_null() => quote_array_element(&value.to_string()),
            _ => "NULL".to_string(),
        })
        .collect();
    format!("{{{}}}", elements.join(","))
}

fn quote_array_element(text: &str) -> String {
    let plain = !text.is_empty()
        && !text.eq_ignore_ascii_case("null")
        && !text
            .chars()
            .any(|c| matches!(c, '{' | '}' | ',' | '"' | '\\') || c.is_whitespace());
    if plain {
        return text.to_string();
    }

    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Render a binary interval (microseconds, days, months) in PostgreSQL's
/// default output style, e.g. `1 year 2 mons 3 days 04:05:06.5`.
fn interval_text(raw: &[u8]) -> Result<String, BoxError> {
    if raw.len() != 16 {
        return Err(format!("invalid interval length {}", raw.len()).into());
    }
    let mut micros = [0u8; 8];
    micros.copy_from_slice(&raw[..8]);
    let micros = i64::from_be_bytes(micros);
    let days = i32::from_be_bytes([raw[8], raw[9], raw[10], raw[11]]);
    let months = i32::from_be_bytes([raw[12], raw[13], raw[14], raw[15]]);

    let plural = |n: i32| if n.abs() == 1 { "" } else { "s" };
    let mut parts = Vec::new();
    let (years, months) = (months / 12, months % 12);
    if years != 0 {
        parts.push(format!("{} year{}", years, plural(years)));
    }
    if months != 0 {
        parts.push(format!("{} mon{}", months, plural(months)));
    }
    if days != 0 {
        parts.push(format!("{} day{}", days, plural(days)));
    }
    if micros != 0 || parts.is_empty() {
        let sign = if micros < 0 { "-" } else { "" };
        let total = micros.unsigned_abs();
        let (secs, frac) = (total / 1_000_000, total % 1_000_000);
        let mut time = format!(
            "{}{:02}:{:02}:{:02}",
            sign,
            secs / 3600,
            secs / 60 % 60,
            secs % 60
        );
        if frac != 0 {
            time.push_str(format!(".{:06}", frac).trim_end_matches('0'));
        }
        parts.push(time);
    }
    Ok(parts.join(" "))
}
