//! Built-in converters for anonymizing dumps.
//!
//! | Identifier    | Parameters                                   |
//! |---------------|----------------------------------------------|
//! | `null`        |                                              |
//! | `static`      | `value`                                      |
//! | `replace`     | `search`, `replace`                          |
//! | `prepend`     | `value`                                      |
//! | `append`      | `value`                                      |
//! | `uppercase`   |                                              |
//! | `lowercase`   |                                              |
//! | `truncate`    | `length`                                     |
//! | `hash`        | `salt` (optional), `length` (optional)       |
//! | `conditional` | `column`, `equals`, `if_true`, `if_false`    |
//!
//! Text based converters leave NULL untouched and render other non-text
//! values through their text form.

use sha2::{Digest, Sha256};

use crate::core::value::SqlValue;
use crate::error::{DumpError, Result};

use super::registry::{ConverterRegistry, Parameters};
use super::{ConvertContext, Converter};

pub(crate) fn register_builtins(registry: &mut ConverterRegistry) {
    registry
        .register("null", |_: &Parameters| Ok(boxed(NullConverter)))
        .register("static", |p: &Parameters| {
            Ok(boxed(StaticConverter {
                value: SqlValue::from_json(required(p, "static", "value")?),
            }))
        })
        .register("replace", |p: &Parameters| {
            Ok(boxed(ReplaceConverter {
                search: required_str(p, "replace", "search")?,
                replace: required_str(p, "replace", "replace")?,
            }))
        })
        .register("prepend", |p: &Parameters| {
            Ok(boxed(AffixConverter {
                prefix: required_str(p, "prepend", "value")?,
                suffix: String::new(),
            }))
        })
        .register("append", |p: &Parameters| {
            Ok(boxed(AffixConverter {
                prefix: String::new(),
                suffix: required_str(p, "append", "value")?,
            }))
        })
        .register("uppercase", |_: &Parameters| {
            Ok(boxed(CaseConverter { upper: true }))
        })
        .register("lowercase", |_: &Parameters| {
            Ok(boxed(CaseConverter { upper: false }))
        })
        .register("truncate", |p: &Parameters| {
            let length = optional_usize(p, "truncate", "length")?.ok_or_else(|| {
                DumpError::resolution("truncate", "missing required parameter 'length'")
            })?;
            Ok(boxed(TruncateConverter { length }))
        })
        .register("hash", |p: &Parameters| {
            Ok(boxed(HashConverter {
                salt: optional_str(p, "hash", "salt")?.unwrap_or_default(),
                length: optional_usize(p, "hash", "length")?,
            }))
        })
        .register("conditional", |p: &Parameters| {
            Ok(boxed(ConditionalConverter {
                column: required_str(p, "conditional", "column")?,
                equals: p.get("equals").cloned().unwrap_or(serde_json::Value::Null),
                if_true: p.get("if_true").map(SqlValue::from_json),
                if_false: p.get("if_false").map(SqlValue::from_json),
            }))
        });
}

fn boxed(converter: impl Converter + 'static) -> Box<dyn Converter> {
    Box::new(converter)
}

// =============================================================================
// Parameter helpers
// =============================================================================

fn required<'p>(params: &'p Parameters, id: &str, key: &str) -> Result<&'p serde_json::Value> {
    params
        .get(key)
        .ok_or_else(|| DumpError::resolution(id, format!("missing required parameter '{}'", key)))
}

fn required_str(params: &Parameters, id: &str, key: &str) -> Result<String> {
    optional_str(params, id, key)?
        .ok_or_else(|| DumpError::resolution(id, format!("missing required parameter '{}'", key)))
}

/// Strings are taken as-is; numbers and booleans use their JSON text.
fn optional_str(params: &Parameters, id: &str, key: &str) -> Result<Option<String>> {
    match params.get(key) {
        None => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s.clone())),
        Some(v @ (serde_json::Value::Number(_) | serde_json::Value::Bool(_))) => {
            Ok(Some(v.to_string()))
        }
        Some(other) => Err(DumpError::resolution(
            id,
            format!("parameter '{}' must be a string, got {}", key, other),
        )),
    }
}

fn optional_usize(params: &Parameters, id: &str, key: &str) -> Result<Option<usize>> {
    match params.get(key) {
        None => Ok(None),
        Some(v) => v
            .as_u64()
            .map(|n| Some(n as usize))
            .ok_or_else(|| {
                DumpError::resolution(
                    id,
                    format!("parameter '{}' must be a non-negative integer, got {}", key, v),
                )
            }),
    }
}

/// Text form of a non-NULL value.
fn text_of(value: &SqlValue<'static>) -> Option<String> {
    match value {
        SqlValue::Null(_) => None,
        SqlValue::Text(s) => Some(s.to_string()),
        other => Some(other.to_string()),
    }
}

// =============================================================================
// Converters
// =============================================================================

/// Replaces every value with NULL of the same type.
#[derive(Debug)]
pub struct NullConverter;

impl Converter for NullConverter {
    fn convert(&self, value: SqlValue<'static>, _: &ConvertContext<'_>) -> Result<SqlValue<'static>> {
        Ok(SqlValue::Null(value.null_type()))
    }
}

/// Replaces every value with a fixed one.
#[derive(Debug)]
pub struct StaticConverter {
    value: SqlValue<'static>,
}

impl Converter for StaticConverter {
    fn convert(&self, _: SqlValue<'static>, _: &ConvertContext<'_>) -> Result<SqlValue<'static>> {
        Ok(self.value.clone())
    }
}

#[derive(Debug)]
pub struct ReplaceConverter {
    search: String,
    replace: String,
}

impl Converter for ReplaceConverter {
    fn convert(&self, value: SqlValue<'static>, _: &ConvertContext<'_>) -> Result<SqlValue<'static>> {
        Ok(match text_of(&value) {
            Some(text) => SqlValue::text_owned(text.replace(&self.search, &self.replace)),
            None => value,
        })
    }
}

/// Prepends and/or appends fixed text.
#[derive(Debug)]
pub struct AffixConverter {
    prefix: String,
    suffix: String,
}

impl Converter for AffixConverter {
    fn convert(&self, value: SqlValue<'static>, _: &ConvertContext<'_>) -> Result<SqlValue<'static>> {
        Ok(match text_of(&value) {
            Some(text) => SqlValue::text_owned(format!("{}{}{}", self.prefix, text, self.suffix)),
            None => value,
        })
    }
}

#[derive(Debug)]
pub struct CaseConverter {
    upper: bool,
}

impl Converter for CaseConverter {
    fn convert(&self, value: SqlValue<'static>, _: &ConvertContext<'_>) -> Result<SqlValue<'static>> {
        Ok(match text_of(&value) {
            Some(text) if self.upper => SqlValue::text_owned(text.to_uppercase()),
            Some(text) => SqlValue::text_owned(text.to_lowercase()),
            None => value,
        })
    }
}

/// Keeps at most `length` characters.
#[derive(Debug)]
pub struct TruncateConverter {
    length: usize,
}

impl Converter for TruncateConverter {
    fn convert(&self, value: SqlValue<'static>, _: &ConvertContext<'_>) -> Result<SqlValue<'static>> {
        Ok(match text_of(&value) {
            Some(text) => SqlValue::text_owned(text.chars().take(self.length).collect::<String>()),
            None => value,
        })
    }
}

/// SHA-256 hex digest of the salted value, optionally shortened.
///
/// Equal inputs hash to equal outputs, so joins on hashed keys keep working.
#[derive(Debug)]
pub struct HashConverter {
    salt: String,
    length: Option<usize>,
}

impl Converter for HashConverter {
    fn convert(&self, value: SqlValue<'static>, _: &ConvertContext<'_>) -> Result<SqlValue<'static>> {
        let Some(text) = text_of(&value) else {
            return Ok(value);
        };

        let mut hasher = Sha256::new();
        hasher.update(self.salt.as_bytes());
        hasher.update(text.as_bytes());
        let mut digest = format!("{:x}", hasher.finalize());
        if let Some(length) = self.length {
            digest.truncate(length);
        }
        Ok(SqlValue::text_owned(digest))
    }
}

/// Picks a replacement based on another column of the same row.
///
/// A missing branch keeps the current value.
#[derive(Debug)]
pub struct ConditionalConverter {
    column: String,
    equals: serde_json::Value,
    if_true: Option<SqlValue<'static>>,
    if_false: Option<SqlValue<'static>>,
}

impl ConditionalConverter {
    fn matches(&self, other: &SqlValue<'static>) -> bool {
        if self.equals.is_null() {
            return other.is_null();
        }
        !other.is_null() && SqlValue::from_json(&self.equals).to_string() == other.to_string()
    }
}

impl Converter for ConditionalConverter {
    fn convert(&self, value: SqlValue<'static>, ctx: &ConvertContext<'_>) -> Result<SqlValue<'static>> {
        let row = ctx
            .row
            .ok_or_else(|| DumpError::converter(ctx.key(), "conditional converter needs the row"))?;
        let other = row.get(&self.column).ok_or_else(|| {
            DumpError::converter(
                ctx.key(),
                format!("column '{}' is not part of the row", self.column),
            )
        })?;

        let branch = if self.matches(other) {
            &self.if_true
        } else {
            &self.if_false
        };
        Ok(branch.clone().unwrap_or(value))
    }
}
