#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use invoice_dashboard::db::{Query, Row};
use invoice_dashboard::{ensure_schema, SqliteStore, Store, StoreError, ViewHooks};
use serde_json::{json, Value};

pub fn row(value: Value) -> Row {
    match value {
        Value::Object(row) => row,
        other => panic!("expected an object, got {other}"),
    }
}

/// Schema plus three customers, one of which has no invoices.
pub fn store_with_customers() -> SqliteStore {
    let store = SqliteStore::open_in_memory().unwrap();
    ensure_schema(&store).unwrap();
    for customer in [
        json!({"id": "c3", "name": "Zed Quinn", "email": "zed@quinn.example", "image_url": "/z.png"}),
        json!({"id": "c1", "name": "Anna", "email": "x@y.com", "image_url": "/a.png"}),
        json!({"id": "c2", "name": "Lee Robinson", "email": "lee@robinson.example", "image_url": "/l.png"}),
    ] {
        store.insert("customers", row(customer)).unwrap();
    }
    store
}

/// `store_with_customers` plus seven invoices and a few revenue months.
pub fn seeded_store() -> SqliteStore {
    let store = store_with_customers();
    for (id, customer, amount, status, date) in [
        ("i1", "c1", 1250, "pending", "2024-01-03"),
        ("i2", "c2", 20000, "paid", "2024-02-10"),
        ("i3", "c1", 500, "paid", "2023-12-01"),
        ("i4", "c2", 7500, "pending", "2024-03-15"),
        ("i5", "c2", 300, "paid", "2023-11-20"),
        ("i6", "c1", 9900, "pending", "2024-04-01"),
        ("i7", "c2", 4200, "pending", "2023-10-05"),
    ] {
        store
            .insert(
                "invoices",
                row(json!({
                    "id": id,
                    "customer_id": customer,
                    "amount": amount,
                    "status": status,
                    "date": date,
                })),
            )
            .unwrap();
    }
    for (month, revenue) in [("Jan", 2000), ("Feb", 1800), ("Mar", 2200)] {
        store
            .insert("revenue", row(json!({"month": month, "revenue": revenue})))
            .unwrap();
    }
    store
}

/// Collects every hook invocation.
#[derive(Default)]
pub struct RecordingHooks {
    pub revalidated: Mutex<Vec<String>>,
    pub redirected: Mutex<Vec<String>>,
}

impl RecordingHooks {
    pub fn revalidated(&self) -> Vec<String> {
        self.revalidated.lock().unwrap().clone()
    }

    pub fn redirected(&self) -> Vec<String> {
        self.redirected.lock().unwrap().clone()
    }
}

impl ViewHooks for RecordingHooks {
    fn revalidate_path(&self, path: &str) {
        self.revalidated.lock().unwrap().push(path.to_string());
    }

    fn redirect(&self, path: &str) {
        self.redirected.lock().unwrap().push(path.to_string());
    }
}

/// A store whose every operation errors, counting how often it was asked.
#[derive(Default)]
pub struct FailingStore {
    calls: AtomicUsize,
}

impl FailingStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> Result<T, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Backend("connection reset by peer".to_string()))
    }
}

impl Store for FailingStore {
    fn select(&self, _query: &Query) -> Result<Vec<Row>, StoreError> {
        self.fail()
    }

    fn count(&self, _query: &Query) -> Result<u64, StoreError> {
        self.fail()
    }

    fn insert(&self, _table: &str, _values: Row) -> Result<(), StoreError> {
        self.fail()
    }

    fn update(&self, _query: &Query, _values: Row) -> Result<usize, StoreError> {
        self.fail()
    }

    fn delete(&self, _query: &Query) -> Result<usize, StoreError> {
        self.fail()
    }
}

/// Remembers the queries it receives and answers with nothing.
#[derive(Default)]
pub struct CapturingStore {
    pub queries: Mutex<Vec<Query>>,
}

impl CapturingStore {
    pub fn last_query(&self) -> Query {
        self.queries.lock().unwrap().last().cloned().expect("no query captured")
    }
}

impl Store for CapturingStore {
    fn select(&self, query: &Query) -> Result<Vec<Row>, StoreError> {
        self.queries.lock().unwrap().push(query.clone());
        Ok(Vec::new())
    }

    fn count(&self, query: &Query) -> Result<u64, StoreError> {
        self.queries.lock().unwrap().push(query.clone());
        Ok(0)
    }

    fn insert(&self, _table: &str, _values: Row) -> Result<(), StoreError> {
        Ok(())
    }

    fn update(&self, query: &Query, _values: Row) -> Result<usize, StoreError> {
        self.queries.lock().unwrap().push(query.clone());
        Ok(0)
    }

    fn delete(&self, query: &Query) -> Result<usize, StoreError> {
        self.queries.lock().unwrap().push(query.clone());
        Ok(0)
    }
}
