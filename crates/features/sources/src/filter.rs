//! Query-string filter language for polygon tables.
//!
//! Every parameter other than the paging ones has the form `column=<op>.<value>`,
//! optionally prefixed with `not.`; all filters are ANDed:
//!
//! ```text
//! ?omit=is.false&t_interval=in.(12,13)&name=ilike.*granite*&orig_id=not.eq.4
//! ```
//!
//! Parsing is pure; [`push_where`] renders parsed filters into a [`QueryBuilder`],
//! binding every value as text cast to the reflected column type.

use ingest_database::{TableSchema, quote_ident};
use ingest_domain::constants::{GEOMETRY_COLUMN, PAGE_PARAM, PAGE_SIZE_PARAM};
use sqlx::{Postgres, QueryBuilder};
use std::str::FromStr;
use strum_macros::{Display, EnumString};

const NOT_PREFIX: &str = "not.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParserError {
    #[error("Filter for '{column}' must look like '<operator>.<value>', got '{raw}'")]
    Malformed { column: String, raw: String },

    #[error("Unknown filter operator '{operator}' for '{column}'")]
    UnknownOperator { column: String, operator: String },

    #[error("Filter 'in' for '{column}' needs at least one value")]
    EmptyList { column: String },

    #[error("Filter 'is' for '{column}' expects null, notnull, true or false, got '{value}'")]
    InvalidIs { column: String, value: String },

    #[error("Column '{column}' does not exist in {table}")]
    UnknownColumn { column: String, table: String },

    #[error("Column '{column}' cannot be filtered or written")]
    ReservedColumn { column: String },
}

/// Comparison operators of the filter language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Operator {
    Eq,
    #[strum(serialize = "ne", serialize = "neq")]
    Ne,
    Lt,
    #[strum(serialize = "le", serialize = "lte")]
    Le,
    Gt,
    #[strum(serialize = "ge", serialize = "gte")]
    Ge,
    Like,
    #[strum(serialize = "ilike")]
    ILike,
    In,
    Is,
}

impl Operator {
    const fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Like => "LIKE",
            Self::ILike => "ILIKE",
            Self::In => "IN",
            Self::Is => "IS",
        }
    }
}

/// Operand of the `is` operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum IsValue {
    Null,
    NotNull,
    True,
    False,
}

impl IsValue {
    const fn sql(self) -> &'static str {
        match self {
            Self::Null => "IS NULL",
            Self::NotNull => "IS NOT NULL",
            Self::True => "IS TRUE",
            Self::False => "IS FALSE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Single(String),
    List(Vec<String>),
    Is(IsValue),
}

/// One parsed `column=<op>.<value>` parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub negated: bool,
    pub operator: Operator,
    pub operand: Operand,
}

/// `true` for parameters consumed by pagination.
#[must_use]
pub fn is_paging_param(name: &str) -> bool {
    name == PAGE_PARAM || name == PAGE_SIZE_PARAM
}

/// Parses every non-paging parameter into a [`Filter`].
///
/// # Errors
/// Returns the first [`ParserError`] encountered.
pub fn parse_filters<K, V>(params: &[(K, V)]) -> Result<Vec<Filter>, ParserError>
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    params
        .iter()
        .filter(|(name, _)| !is_paging_param(name.as_ref()))
        .map(|(name, raw)| parse_filter(name.as_ref(), raw.as_ref()))
        .collect()
}

/// Parses a single filter expression.
///
/// # Errors
/// See [`ParserError`].
pub fn parse_filter(column: &str, raw: &str) -> Result<Filter, ParserError> {
    if column == GEOMETRY_COLUMN {
        return Err(ParserError::ReservedColumn { column: column.to_owned() });
    }

    let (negated, expression) =
        raw.strip_prefix(NOT_PREFIX).map_or((false, raw), |rest| (true, rest));

    let (operator, value) = expression.split_once('.').ok_or_else(|| ParserError::Malformed {
        column: column.to_owned(),
        raw: raw.to_owned(),
    })?;

    let operator = Operator::from_str(operator).map_err(|_| ParserError::UnknownOperator {
        column: column.to_owned(),
        operator: operator.to_owned(),
    })?;

    let operand = match operator {
        Operator::In => Operand::List(parse_list(column, value)?),
        Operator::Is => Operand::Is(IsValue::from_str(&value.to_ascii_lowercase()).map_err(
            |_| ParserError::InvalidIs { column: column.to_owned(), value: value.to_owned() },
        )?),
        Operator::Like | Operator::ILike => Operand::Single(value.replace('*', "%")),
        _ => Operand::Single(value.to_owned()),
    };

    Ok(Filter { column: column.to_owned(), negated, operator, operand })
}

fn parse_list(column: &str, value: &str) -> Result<Vec<String>, ParserError> {
    let inner = value
        .strip_prefix('(')
        .and_then(|v| v.strip_suffix(')'))
        .unwrap_or(value);

    let items: Vec<String> = inner
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_owned)
        .collect();

    if items.is_empty() {
        return Err(ParserError::EmptyList { column: column.to_owned() });
    }
    Ok(items)
}

/// Checks that `column` exists in `table` and may be targeted by a query.
///
/// # Errors
/// [`ParserError::UnknownColumn`] or [`ParserError::ReservedColumn`].
pub fn ensure_column<'t>(
    table: &'t TableSchema,
    column: &str,
) -> Result<&'t ingest_database::Column, ParserError> {
    if column == GEOMETRY_COLUMN {
        return Err(ParserError::ReservedColumn { column: column.to_owned() });
    }
    table.column(column).ok_or_else(|| ParserError::UnknownColumn {
        column: column.to_owned(),
        table: table.qualified_name(),
    })
}

/// Appends ` WHERE ...` for `filters` (nothing when empty).
///
/// # Errors
/// Fails when a filter names a column missing from `table`.
pub fn push_where(
    builder: &mut QueryBuilder<'_, Postgres>,
    table: &TableSchema,
    filters: &[Filter],
) -> Result<(), ParserError> {
    // Validate everything before touching the builder.
    let columns = filters
        .iter()
        .map(|filter| ensure_column(table, &filter.column))
        .collect::<Result<Vec<_>, _>>()?;

    for (index, (filter, column)) in filters.iter().zip(columns).enumerate() {
        builder.push(if index == 0 { " WHERE " } else { " AND " });
        if filter.negated {
            builder.push("NOT (");
        }

        let name = quote_ident(&column.name);
        let sql_type = column.sql_type();

        match &filter.operand {
            Operand::Is(value) => {
                builder.push(format!("{name} {}", value.sql()));
            }
            Operand::List(values) => {
                builder.push(format!("{name} IN ("));
                let mut separated = builder.separated(", ");
                for value in values {
                    separated.push_bind(value.clone());
                    separated.push_unseparated(format!("::{sql_type}"));
                }
                builder.push(")");
            }
            Operand::Single(value) if matches!(filter.operator, Operator::Like | Operator::ILike) => {
                builder.push(format!("{name}::text {} ", filter.operator.sql()));
                builder.push_bind(value.clone());
            }
            Operand::Single(value) => {
                builder.push(format!("{name} {} ", filter.operator.sql()));
                builder.push_bind(value.clone());
                builder.push(format!("::{sql_type}"));
            }
        }

        if filter.negated {
            builder.push(")");
        }
    }

    Ok(())
}
