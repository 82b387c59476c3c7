//! DuckDB-backed document store
//!
//! Each collection is a table whose columns are created on demand from the
//! document keys. A column takes its DuckDB type from the first value seen
//! for it: strings become VARCHAR, integers BIGINT, so the loaded tables can
//! be queried with plain SQL.

use super::types::{DocumentStore, IndexSpec};
use crate::error::{Error, Result, ResultExt};
use crate::types::{Collection, Document, JsonValue};
use duckdb::types::Value;
use duckdb::Connection;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

struct Inner {
    conn: Connection,
    /// Known columns per collection, in table order
    columns: HashMap<Collection, Vec<String>>,
    /// Index name and creation statement per collection
    indexes: HashMap<Collection, Vec<(String, String)>>,
}

/// Document store on top of a DuckDB database
pub struct DuckDbStore {
    inner: Mutex<Inner>,
    location: String,
}

impl DuckDbStore {
    /// Open a database file, or an in-memory database for `:memory:`
    pub fn open(location: &str) -> Result<Self> {
        let conn = if location == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(location)
        }
        .map_err(|e| Error::store(format!("Failed to open DuckDB at {location}: {e}")))?;

        let mut inner = Inner {
            conn,
            columns: HashMap::new(),
            indexes: HashMap::new(),
        };
        inner
            .load_catalog()
            .with_context(|| format!("Failed to read catalog of {location}"))?;

        debug!("Opened document store at {}", location);

        Ok(Self {
            inner: Mutex::new(inner),
            location: location.to_string(),
        })
    }

    /// Open a fresh in-memory database
    pub fn in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    /// Where the database lives
    pub fn location(&self) -> &str {
        &self.location
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| Error::store("DuckDB store lock poisoned"))
    }
}

impl std::fmt::Debug for DuckDbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDbStore")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl Inner {
    /// Read existing tables and indexes of a persistent database
    fn load_catalog(&mut self) -> Result<()> {
        let mut stmt = self.conn.prepare(
            "SELECT table_name, column_name FROM information_schema.columns
             WHERE table_schema = 'main'
             ORDER BY table_name, ordinal_position",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (table, column) = row?;
            if let Some(collection) = Collection::from_name(&table) {
                self.columns.entry(collection).or_default().push(column);
            }
        }

        let mut stmt = self
            .conn
            .prepare("SELECT table_name, index_name, sql FROM duckdb_indexes()")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?;
        for row in rows {
            let (table, name, sql) = row?;
            if let (Some(collection), Some(sql)) = (Collection::from_name(&table), sql) {
                self.indexes.entry(collection).or_default().push((name, sql));
            }
        }
        Ok(())
    }

    /// Make sure the collection's table has every column in `wanted`
    fn ensure_columns(
        &mut self,
        collection: Collection,
        wanted: &[(String, &'static str)],
    ) -> Result<()> {
        let table = quote_ident(collection.name());

        if !self.columns.contains_key(&collection) {
            let defs = wanted
                .iter()
                .map(|(c, sql_type)| format!("{} {sql_type}", quote_ident(c)))
                .collect::<Vec<_>>()
                .join(", ");
            self.conn
                .execute_batch(&format!("CREATE TABLE IF NOT EXISTS {table} ({defs});"))?;
            self.columns
                .insert(collection, wanted.iter().map(|(c, _)| c.clone()).collect());
            return Ok(());
        }

        let known = &self.columns[&collection];
        let missing: Vec<(String, &'static str)> = wanted
            .iter()
            .filter(|(c, _)| !known.contains(c))
            .cloned()
            .collect();
        if missing.is_empty() {
            return Ok(());
        }

        // DuckDB refuses to alter a table that has indexes on it
        let indexes = self.indexes.get(&collection).cloned().unwrap_or_default();
        for (name, _) in &indexes {
            self.conn
                .execute_batch(&format!("DROP INDEX IF EXISTS {};", quote_ident(name)))?;
        }
        for (column, sql_type) in &missing {
            self.conn.execute_batch(&format!(
                "ALTER TABLE {table} ADD COLUMN {} {sql_type};",
                quote_ident(column)
            ))?;
        }
        for (_, sql) in &indexes {
            self.conn.execute_batch(&format!("{};", sql.trim_end_matches(';')))?;
        }

        debug!(
            "Added {} column(s) to {}",
            missing.len(),
            collection.name()
        );
        self.columns
            .entry(collection)
            .or_default()
            .extend(missing.into_iter().map(|(c, _)| c));
        Ok(())
    }
}

/// Quote a SQL identifier
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Column type for a document value
fn sql_type(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Bool(_) => "BOOLEAN",
        JsonValue::Number(n) if n.is_i64() => "BIGINT",
        JsonValue::Number(n) if n.is_u64() => "UBIGINT",
        JsonValue::Number(_) => "DOUBLE",
        _ => "VARCHAR",
    }
}

/// Convert a document value to a bindable DuckDB value
fn json_to_duckdb_value(value: &JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Boolean(*b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::BigInt(i)
            } else if let Some(u) = n.as_u64() {
                Value::UBigInt(u)
            } else {
                n.as_f64().map_or(Value::Null, Value::Double)
            }
        }
        JsonValue::String(s) => Value::Text(s.clone()),
        // Nested values are kept as JSON text
        other => Value::Text(other.to_string()),
    }
}

/// Convert a DuckDB value back to a document value
fn duckdb_value_to_json(value: Value) -> JsonValue {
    match value {
        Value::Null => JsonValue::Null,
        Value::Boolean(b) => JsonValue::Bool(b),
        Value::TinyInt(i) => JsonValue::Number(i.into()),
        Value::SmallInt(i) => JsonValue::Number(i.into()),
        Value::Int(i) => JsonValue::Number(i.into()),
        Value::BigInt(i) => JsonValue::Number(i.into()),
        Value::UTinyInt(i) => JsonValue::Number(i.into()),
        Value::USmallInt(i) => JsonValue::Number(i.into()),
        Value::UInt(i) => JsonValue::Number(i.into()),
        Value::UBigInt(i) => JsonValue::Number(i.into()),
        Value::Float(f) => {
            serde_json::Number::from_f64(f64::from(f)).map_or(JsonValue::Null, JsonValue::Number)
        }
        Value::Double(f) => {
            serde_json::Number::from_f64(f).map_or(JsonValue::Null, JsonValue::Number)
        }
        Value::Text(s) => JsonValue::String(s),
        other => JsonValue::String(format!("{other:?}")),
    }
}

impl DocumentStore for DuckDbStore {
    fn insert_many(&self, collection: Collection, documents: &[Document]) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }

        // Union of keys, in order of first appearance, typed by the first non-null value
        let mut seen: Vec<(String, Option<&'static str>)> = Vec::new();
        for doc in documents {
            for (key, value) in doc {
                let typed = (!value.is_null()).then(|| sql_type(value));
                match seen.iter_mut().find(|column| column.0 == *key) {
                    Some(column) => {
                        if column.1.is_none() {
                            column.1 = typed;
                        }
                    }
                    None => seen.push((key.clone(), typed)),
                }
            }
        }
        let columns: Vec<(String, &'static str)> = seen
            .into_iter()
            .map(|(c, typed)| (c, typed.unwrap_or("VARCHAR")))
            .collect();

        let mut inner = self.lock()?;
        inner.ensure_columns(collection, &columns)?;

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(collection.name()),
            columns
                .iter()
                .map(|(c, _)| quote_ident(c))
                .collect::<Vec<_>>()
                .join(", "),
            vec!["?"; columns.len()].join(", ")
        );

        let tx = inner.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&sql)?;
            for doc in documents {
                let values: Vec<Value> = columns
                    .iter()
                    .map(|(c, _)| doc.get(c).map_or(Value::Null, json_to_duckdb_value))
                    .collect();
                stmt.execute(duckdb::params_from_iter(values.iter()))?;
            }
        }
        tx.commit()?;

        Ok(())
    }

    fn ensure_index(&self, collection: Collection, index: &IndexSpec) -> Result<()> {
        let mut inner = self.lock()?;

        let fields: Vec<String> = index.field_names().map(String::from).collect();
        let typed: Vec<(String, &'static str)> =
            fields.iter().map(|f| (f.clone(), "VARCHAR")).collect();
        inner.ensure_columns(collection, &typed)?;

        let name = format!("{}_{}", collection.name(), index.name());
        if inner
            .indexes
            .get(&collection)
            .is_some_and(|idx| idx.iter().any(|(n, _)| *n == name))
        {
            return Ok(());
        }

        // ART indexes serve both scan directions, so the key order is not spelled out
        let sql = format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
            quote_ident(&name),
            quote_ident(collection.name()),
            fields
                .iter()
                .map(|f| quote_ident(f))
                .collect::<Vec<_>>()
                .join(", ")
        );
        inner
            .conn
            .execute_batch(&format!("{sql};"))
            .with_context(|| format!("Failed to create index {name}"))?;
        inner
            .indexes
            .entry(collection)
            .or_default()
            .push((name, sql));
        Ok(())
    }

    fn find_one(
        &self,
        collection: Collection,
        field: &str,
        value: &str,
    ) -> Result<Option<Document>> {
        let inner = self.lock()?;
        let Some(columns) = inner.columns.get(&collection) else {
            return Ok(None);
        };
        if !columns.iter().any(|c| c == field) {
            return Ok(None);
        }

        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ? LIMIT 1",
            columns
                .iter()
                .map(|c| quote_ident(c))
                .collect::<Vec<_>>()
                .join(", "),
            quote_ident(collection.name()),
            quote_ident(field)
        );

        let mut stmt = inner.conn.prepare_cached(&sql)?;
        let mut rows = stmt.query(duckdb::params![value])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        let mut document = Document::new();
        for (i, column) in columns.iter().enumerate() {
            let value: Value = row.get(i)?;
            if !matches!(value, Value::Null) {
                document.insert(column.clone(), duckdb_value_to_json(value));
            }
        }
        Ok(Some(document))
    }

    fn count(&self, collection: Collection) -> Result<usize> {
        let inner = self.lock()?;
        if !inner.columns.contains_key(&collection) {
            return Ok(0);
        }
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(collection.name()));
        let count: i64 = inner.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn count_where(&self, collection: Collection, field: &str, value: &str) -> Result<usize> {
        let inner = self.lock()?;
        let Some(columns) = inner.columns.get(&collection) else {
            return Ok(0);
        };
        if !columns.iter().any(|c| c == field) {
            return Ok(0);
        }
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {} = ?",
            quote_ident(collection.name()),
            quote_ident(field)
        );
        let mut stmt = inner.conn.prepare_cached(&sql)?;
        let count: i64 = stmt.query_row(duckdb::params![value], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn index_names(&self, collection: Collection) -> Result<Vec<String>> {
        let inner = self.lock()?;
        let prefix = format!("{}_", collection.name());
        Ok(inner
            .indexes
            .get(&collection)
            .map(|idx| {
                idx.iter()
                    .map(|(name, _)| name.strip_prefix(&prefix).unwrap_or(name).to_string())
                    .collect()
            })
            .unwrap_or_default())
    }
}
