use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use log::debug;
use rusqlite::functions::{Context, FunctionFlags};
use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, Connection};
use serde_json::Value;

use super::query::{Query, Row};
use super::sql::{self, Statement, CASEFOLD_FN, EMBED_KEY_PREFIX, SEARCH_WORDS_FN};
use super::store::{Store, StoreError};
use crate::config::StoreConfig;

/// [`Store`] backed by a single SQLite connection. Access is serialised
/// through a mutex, so one handle can be shared by concurrent callers.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open the database named by `config.url`. The path is not validated: an
    /// empty url yields a private temporary database without any tables, and
    /// the mistake shows up on the first query.
    pub fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let conn = Connection::open(&config.url)?;
        Self::from_connection(conn)
    }

    /// Private in-memory database, mostly for tests and demos.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        register_text_functions(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    fn execute(&self, statement: Statement) -> Result<usize, StoreError> {
        debug!("sql={}", statement.sql);
        let conn = self.lock()?;
        Ok(conn.execute(&statement.sql, params_from_iter(statement.params.iter()))?)
    }
}

impl Store for SqliteStore {
    fn select(&self, query: &Query) -> Result<Vec<Row>, StoreError> {
        let statement = sql::select(query)?;
        debug!("sql={}", statement.sql);

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&statement.sql)?;
        let names: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        let mut rows = stmt.query(params_from_iter(statement.params.iter()))?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(assemble_row(&names, row)?);
        }
        Ok(records)
    }

    fn count(&self, query: &Query) -> Result<u64, StoreError> {
        let statement = sql::count(query)?;
        debug!("sql={}", statement.sql);

        let conn = self.lock()?;
        let total: i64 = conn.query_row(
            &statement.sql,
            params_from_iter(statement.params.iter()),
            |row| row.get(0),
        )?;
        Ok(u64::try_from(total).unwrap_or_default())
    }

    fn insert(&self, table: &str, values: Row) -> Result<(), StoreError> {
        self.execute(sql::insert(table, &values)?)?;
        Ok(())
    }

    fn update(&self, query: &Query, values: Row) -> Result<usize, StoreError> {
        self.execute(sql::update(query, &values)?)
    }

    fn delete(&self, query: &Query) -> Result<usize, StoreError> {
        self.execute(sql::delete(query)?)
    }
}

/// Case-insensitive matching needs Unicode folding, which SQLite's LIKE only
/// does for ASCII. The filters compiled in `sql` call these by name.
fn register_text_functions(conn: &Connection) -> Result<(), StoreError> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;
    conn.create_scalar_function(CASEFOLD_FN, 1, flags, |ctx| {
        Ok(text_argument(ctx).map(|text| sql::fold_case(&text)))
    })?;
    conn.create_scalar_function(SEARCH_WORDS_FN, 1, flags, |ctx| {
        Ok(text_argument(ctx).map(|text| sql::search_words(&text)))
    })?;
    Ok(())
}

// NULL stays NULL; numbers are matched on their text form.
fn text_argument(ctx: &Context<'_>) -> Option<String> {
    match ctx.get_raw(0) {
        ValueRef::Text(text) => Some(String::from_utf8_lossy(text).into_owned()),
        ValueRef::Integer(integer) => Some(integer.to_string()),
        ValueRef::Real(real) => Some(real.to_string()),
        ValueRef::Null | ValueRef::Blob(_) => None,
    }
}

/// Turn a flat result row into a record, nesting `table.column` values under
/// their embedded table. An embed whose join found nothing becomes `null`.
fn assemble_row(names: &[String], row: &rusqlite::Row<'_>) -> Result<Row, StoreError> {
    let mut record = Row::new();
    let mut found: BTreeMap<&str, bool> = BTreeMap::new();
    let mut nested: BTreeMap<&str, Row> = BTreeMap::new();

    for (index, name) in names.iter().enumerate() {
        let value = json_value(row.get_ref(index)?);
        if let Some(table) = name.strip_prefix(EMBED_KEY_PREFIX) {
            found.insert(table, !value.is_null());
        } else if let Some((table, column)) = name.split_once('.') {
            nested
                .entry(table)
                .or_default()
                .insert(column.to_string(), value);
        } else {
            record.insert(name.clone(), value);
        }
    }

    for (table, fields) in nested {
        let value = if found.get(table).copied().unwrap_or(true) {
            Value::Object(fields)
        } else {
            Value::Null
        };
        record.insert(table.to_string(), value);
    }

    Ok(record)
}

fn json_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(integer) => Value::from(integer),
        ValueRef::Real(real) => serde_json::Number::from_f64(real)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(text) => Value::String(String::from_utf8_lossy(text).into_owned()),
        ValueRef::Blob(bytes) => Value::Array(bytes.iter().map(|byte| Value::from(*byte)).collect()),
    }
}
