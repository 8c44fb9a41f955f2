use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::query::{Query, Row};

/// Failures reported by a store. These carry backend detail and are only ever
/// logged; callers of the query and mutation layers see fixed messages.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The SQLite driver rejected a statement or connection.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A table, column or alias name that is not a plain identifier.
    #[error("invalid identifier `{0}`")]
    InvalidIdentifier(String),
    /// A qualified column whose table was never embedded.
    #[error("`{0}` is not an embedded table of this query")]
    UnknownEmbed(String),
    /// A query shape this store cannot express.
    #[error("{0} is not supported")]
    Unsupported(&'static str),
    /// A thread panicked while holding the connection.
    #[error("store connection lock poisoned")]
    Poisoned,
    /// A row did not fit the requested type.
    #[error("failed to decode row: {0}")]
    Decode(#[from] serde_json::Error),
    /// A single-row request matched zero or several rows.
    #[error("expected exactly one row, found {0}")]
    NotSingle(usize),
    /// Any other failure reported by a backend.
    #[error("{0}")]
    Backend(String),
}

/// The capability set the dashboard needs from a relational store.
///
/// Implementations must be shareable across threads: card data issues two
/// counts concurrently against the same handle.
pub trait Store: Send + Sync {
    /// Run `query` and return every matching row.
    fn select(&self, query: &Query) -> Result<Vec<Row>, StoreError>;

    /// Count the rows matched by `query`'s table, embeds and filters. Select
    /// list, grouping, ordering and limit are ignored.
    fn count(&self, query: &Query) -> Result<u64, StoreError>;

    /// Insert one row. Columns missing from `values` take the table defaults.
    fn insert(&self, table: &str, values: Row) -> Result<(), StoreError>;

    /// Apply `values` to every row matched by `query`, returning how many
    /// rows changed.
    fn update(&self, query: &Query, values: Row) -> Result<usize, StoreError>;

    /// Remove every row matched by `query`, returning how many rows went away.
    fn delete(&self, query: &Query) -> Result<usize, StoreError>;
}

/// Require exactly one row.
pub fn single(mut rows: Vec<Row>) -> Result<Row, StoreError> {
    if rows.len() == 1 {
        Ok(rows.remove(0))
    } else {
        Err(StoreError::NotSingle(rows.len()))
    }
}

/// Deserialize rows into typed records.
pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Row>) -> Result<Vec<T>, StoreError> {
    rows.into_iter().map(decode_row).collect()
}

pub fn decode_row<T: DeserializeOwned>(row: Row) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

/// Serialize a record into the column map expected by `insert`/`update`.
pub fn to_row<T: Serialize>(record: &T) -> Result<Row, StoreError> {
    match serde_json::to_value(record)? {
        Value::Object(row) => Ok(row),
        _ => Err(StoreError::Unsupported("writing a non-object record")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, Serialize, PartialEq)]
    struct Pair {
        id: String,
        amount: i64,
    }

    fn row(value: Value) -> Row {
        match value {
            Value::Object(row) => row,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn single_rejects_empty_and_multiple_results() {
        assert!(matches!(single(vec![]), Err(StoreError::NotSingle(0))));
        let two = vec![row(json!({"id": "a"})), row(json!({"id": "b"}))];
        assert!(matches!(single(two), Err(StoreError::NotSingle(2))));
        let one = single(vec![row(json!({"id": "a"}))]).unwrap();
        assert_eq!(one["id"], "a");
    }

    #[test]
    fn decode_reports_missing_columns() {
        let err = decode_rows::<Pair>(vec![row(json!({"id": "a"}))]).unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
    }

    #[test]
    fn to_row_keeps_field_names() {
        let values = to_row(&Pair {
            id: "i1".into(),
            amount: 1250,
        })
        .unwrap();
        assert_eq!(values["id"], "i1");
        assert_eq!(values["amount"], 1250);
        assert!(matches!(to_row(&5), Err(StoreError::Unsupported(_))));
    }
}
