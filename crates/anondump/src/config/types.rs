//! Configuration type definitions.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source database configuration.
    pub database: DatabaseConfig,

    /// Per-table extraction policies.
    #[serde(default)]
    pub tables: Vec<TableConfiguration>,
}

impl Config {
    /// Get the policy for a table, if one is configured.
    pub fn table(&self, name: &str) -> Option<&TableConfiguration> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Columns of `table` that other tables' dependent filters refer to.
    ///
    /// The orchestrator collects exactly these columns while dumping `table`,
    /// so later tables can resolve their dependent filters.
    pub fn harvest_columns(&self, table: &str) -> Vec<String> {
        let mut columns: Vec<String> = self
            .tables
            .iter()
            .flat_map(|t| t.filters.iter())
            .filter_map(|f| f.referenced_column())
            .filter(|r| r.table == table)
            .map(|r| r.column.clone())
            .collect();
        columns.sort();
        columns.dedup();
        columns
    }
}

/// Source database connection configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database type: postgres, mssql or mysql (default: "postgres").
    #[serde(default = "default_postgres")]
    pub r#type: String,

    /// Database host.
    pub host: String,

    /// Database port (default: 5432).
    #[serde(default = "default_pg_port")]
    pub port: u16,

    /// Database name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password (never serialized).
    #[serde(default, skip_serializing)]
    pub password: String,

    /// Schema that unqualified table names belong to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("type", &self.r#type)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("schema", &self.schema)
            .finish()
    }
}

/// Extraction policy for a single table.
///
/// A raw `query` replaces filters, limit and ordering entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableConfiguration {
    /// Table name.
    pub name: String,

    /// Filters, AND-combined in order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<Filter>,

    /// Maximum number of rows to extract.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,

    /// Raw ORDER BY fragment (e.g. "created_at DESC").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,

    /// Raw query override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    /// Converters per column, applied in order.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub converters: BTreeMap<String, Vec<ConverterConfiguration>>,
}

impl TableConfiguration {
    /// Create an empty policy for a table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Append a filter.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Set the row limit.
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the ORDER BY fragment.
    pub fn with_order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    /// Set the raw query override.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Append a converter for a column.
    pub fn with_converter(mut self, column: impl Into<String>, conf: ConverterConfiguration) -> Self {
        self.converters.entry(column.into()).or_default().push(conf);
        self
    }

    /// Whether a raw query override is set.
    pub fn has_query(&self) -> bool {
        self.query.is_some()
    }

    /// Tables whose collected values this table's filters depend on, in
    /// first-reference order.
    pub fn referenced_tables(&self) -> Vec<&str> {
        let mut tables: Vec<&str> = Vec::new();
        for reference in self.filters.iter().filter_map(|f| f.referenced_column()) {
            if !tables.contains(&reference.table.as_str()) {
                tables.push(&reference.table);
            }
        }
        tables
    }
}

/// Comparison operator of a filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    #[default]
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    Like,
    #[serde(alias = "not_like")]
    NotLike,
    In,
    #[serde(alias = "not_in")]
    NotIn,
    #[serde(alias = "is_null")]
    IsNull,
    #[serde(alias = "is_not_null")]
    IsNotNull,
}

impl Operator {
    /// SQL spelling of the operator.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Neq => "<>",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
        }
    }

    /// Whether the operator takes a list of values.
    pub fn is_list(&self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }

    /// Whether the operator compares against a value. `isNull` and
    /// `isNotNull` bind nothing.
    pub fn takes_value(&self) -> bool {
        !matches!(self, Operator::IsNull | Operator::IsNotNull)
    }
}

/// Reference to a column of another table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

/// Where a filter's value comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// A literal scalar or sequence from configuration.
    Literal(serde_json::Value),

    /// The values collected for another table's column, known only after that
    /// table has been dumped.
    Deferred(ColumnRef),
}

/// A single predicate of a table policy.
///
/// In YAML either `value` or `depends_on` is given, except for `isNull` and
/// `isNotNull` which take neither:
///
/// ```yaml
/// - column: status
///   operator: neq
///   value: deleted
/// - column: customer_id
///   depends_on: { table: customers, column: id }
/// - column: deleted_at
///   operator: isNull
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFilter", into = "RawFilter")]
pub struct Filter {
    pub column: String,
    pub operator: Operator,
    pub value: FilterValue,
}

impl Filter {
    /// Create a filter with a literal value.
    pub fn new(
        column: impl Into<String>,
        operator: Operator,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        Self {
            column: column.into(),
            operator,
            value: FilterValue::Literal(value.into()),
        }
    }

    /// Create a data dependent filter on another table's collected values.
    pub fn depends_on(
        column: impl Into<String>,
        table: impl Into<String>,
        referenced_column: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            operator: Operator::In,
            value: FilterValue::Deferred(ColumnRef {
                table: table.into(),
                column: referenced_column.into(),
            }),
        }
    }

    /// Override the declared operator.
    pub fn with_operator(mut self, operator: Operator) -> Self {
        self.operator = operator;
        self
    }

    /// The referenced column if this is a data dependent filter.
    pub fn referenced_column(&self) -> Option<&ColumnRef> {
        match &self.value {
            FilterValue::Deferred(reference) => Some(reference),
            FilterValue::Literal(_) => None,
        }
    }
}

/// Serialized shape of a [`Filter`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawFilter {
    column: String,
    #[serde(default)]
    operator: Operator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    depends_on: Option<ColumnRef>,
}

impl TryFrom<RawFilter> for Filter {
    type Error = String;

    fn try_from(raw: RawFilter) -> std::result::Result<Self, Self::Error> {
        let value = match (raw.value, raw.depends_on) {
            (Some(_), Some(_)) => {
                return Err(format!(
                    "filter on '{}' cannot have both 'value' and 'depends_on'",
                    raw.column
                ))
            }
            (Some(_), None) if !raw.operator.takes_value() => {
                return Err(format!(
                    "filter on '{}' uses {} and cannot have a 'value'",
                    raw.column,
                    raw.operator.as_sql()
                ))
            }
            (Some(value), None) => FilterValue::Literal(value),
            (None, Some(reference)) => FilterValue::Deferred(reference),
            (None, None) if !raw.operator.takes_value() => {
                FilterValue::Literal(serde_json::Value::Null)
            }
            (None, None) => {
                return Err(format!(
                    "filter on '{}' needs either 'value' or 'depends_on'",
                    raw.column
                ))
            }
        };

        Ok(Filter {
            column: raw.column,
            operator: raw.operator,
            value,
        })
    }
}

impl From<Filter> for RawFilter {
    fn from(filter: Filter) -> Self {
        let (value, depends_on) = match filter.value {
            FilterValue::Literal(_) if !filter.operator.takes_value() => (None, None),
            FilterValue::Literal(value) => (Some(value), None),
            FilterValue::Deferred(reference) => (None, Some(reference)),
        };
        RawFilter {
            column: filter.column,
            operator: filter.operator,
            value,
            depends_on,
        }
    }
}

/// Which converter to instantiate and with what parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConverterConfiguration {
    /// Registered converter identifier (e.g. "hash", "static").
    pub converter: String,

    /// Construction parameters, passed to the converter factory as-is.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, serde_json::Value>,
}

impl ConverterConfiguration {
    /// Create a configuration without parameters.
    pub fn new(converter: impl Into<String>) -> Self {
        Self {
            converter: converter.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// Add a construction parameter.
    pub fn with_parameter(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}

// Default value functions for serde
fn default_postgres() -> String {
    "postgres".to_string()
}

fn default_pg_port() -> u16 {
    5432
}
