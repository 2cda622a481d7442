//! Runtime reflection of table shapes.
//!
//! Polygon staging tables are created per source and have no fixed column set,
//! so queries against them are assembled from what the catalog reports.

use crate::error::{DatabaseError, DatabaseErrorExt};
use sqlx::PgPool;
use tracing::instrument;

/// A column as reported by `information_schema.columns`.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Column {
    pub name: String,
    pub udt_schema: String,
    pub udt_name: String,
}

impl Column {
    /// Quoted SQL type suitable for `$n::<type>` casts.
    ///
    /// Array types are reported with a leading underscore (`_text`) and are rendered as `elem[]`.
    #[must_use]
    pub fn sql_type(&self) -> String {
        self.udt_name.strip_prefix('_').map_or_else(
            || format!("{}.{}", quote_ident(&self.udt_schema), quote_ident(&self.udt_name)),
            |element| format!("{}.{}[]", quote_ident(&self.udt_schema), quote_ident(element)),
        )
    }
}

/// The reflected shape of a single table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub schema: String,
    pub name: String,
    pub columns: Vec<Column>,
}

impl TableSchema {
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// `"schema"."table"`, safe to splice into SQL.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.name))
    }

    /// Column names in ordinal order, skipping the ones listed in `excluded`.
    pub fn column_names<'a>(&'a self, excluded: &'a [&str]) -> impl Iterator<Item = &'a str> {
        self.columns.iter().map(|c| c.name.as_str()).filter(move |name| !excluded.contains(name))
    }
}

/// Quotes an identifier for `PostgreSQL`, doubling embedded quotes.
#[must_use]
pub fn quote_ident(ident: &str) -> String {
    let mut quoted = String::with_capacity(ident.len() + 2);
    quoted.push('"');
    for ch in ident.chars() {
        if ch == '"' {
            quoted.push('"');
        }
        quoted.push(ch);
    }
    quoted.push('"');
    quoted
}

/// Loads the columns of `schema.table` from the catalog.
///
/// # Errors
/// * [`DatabaseError::NoSuchTable`] when the table has no visible columns.
/// * [`DatabaseError::Sqlx`] when the catalog query fails.
#[instrument(skip(pool))]
pub async fn reflect_table(
    pool: &PgPool,
    schema: &str,
    table: &str,
) -> Result<TableSchema, DatabaseError> {
    let columns = sqlx::query_as::<_, Column>(
        "SELECT column_name::text AS name, udt_schema::text AS udt_schema, udt_name::text AS udt_name \
         FROM information_schema.columns \
         WHERE table_schema = $1 AND table_name = $2 \
         ORDER BY ordinal_position",
    )
    .bind(schema)
    .bind(table)
    .fetch_all(pool)
    .await
    .context(format!("Reflecting {schema}.{table}"))?;

    if columns.is_empty() {
        return Err(DatabaseError::NoSuchTable {
            message: format!("{schema}.{table}").into(),
            context: None,
        });
    }

    Ok(TableSchema { schema: schema.to_owned(), name: table.to_owned(), columns })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, udt: &str) -> Column {
        Column { name: name.to_owned(), udt_schema: "pg_catalog".to_owned(), udt_name: udt.to_owned() }
    }

    #[test]
    fn quotes_identifiers() {
        assert_eq!(quote_ident("name"), "\"name\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(quote_ident(""), "\"\"");
    }

    #[test]
    fn renders_cast_types() {
        assert_eq!(column("a", "int4").sql_type(), "\"pg_catalog\".\"int4\"");
        assert_eq!(column("b", "_text").sql_type(), "\"pg_catalog\".\"text\"[]");
    }

    #[test]
    fn table_lookups() {
        let table = TableSchema {
            schema: "sources".to_owned(),
            name: "test_map_polygons".to_owned(),
            columns: vec![column("_pkid", "int4"), column("geom", "geometry"), column("name", "text")],
        };

        assert_eq!(table.qualified_name(), "\"sources\".\"test_map_polygons\"");
        assert!(table.column("name").is_some());
        assert!(table.column("missing").is_none());
        assert_eq!(table.column_names(&["geom"]).collect::<Vec<_>>(), vec!["_pkid", "name"]);
    }

    #[tokio::test]
    async fn reflects_live_tables() {
        let Some(db) = crate::testing::TestDatabase::create().await.expect("test database") else {
            return;
        };
        db.execute(
            "CREATE SCHEMA sources;
             CREATE TABLE sources.demo_polygons (_pkid serial PRIMARY KEY, name text, tags text[]);",
        )
        .await
        .expect("fixture");

        let table = reflect_table(db.database().pool(), "sources", "demo_polygons").await.expect("reflect");
        let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["_pkid", "name", "tags"]);
        assert_eq!(table.column("tags").map(Column::sql_type).as_deref(), Some("\"pg_catalog\".\"text\"[]"));

        let err = reflect_table(db.database().pool(), "sources", "absent_polygons").await.unwrap_err();
        assert!(matches!(err, DatabaseError::NoSuchTable { .. }));

        db.drop_database().await.expect("drop");
    }
}
