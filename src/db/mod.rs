//! Persistence module split across logical submodules: the request model, the
//! store abstraction, and the SQLite backend that implements it.

mod connection;
mod query;
mod sql;
mod sqlite;
mod store;

pub use connection::{ensure_schema, seed_demo};
pub use query::{Aggregate, Embed, Filter, Order, Query, Row, Selection};
pub use sqlite::SqliteStore;
pub use store::{decode_row, decode_rows, single, to_row, Store, StoreError};
