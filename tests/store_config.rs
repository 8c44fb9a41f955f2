use invoice_dashboard::{
    ensure_schema, fetch_card_data, fetch_customers, seed_demo, SqliteStore, StoreConfig,
};
use tempfile::tempdir;

#[test]
fn file_backed_store_keeps_data_between_connections() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dashboard.sqlite");
    let config = StoreConfig::new(path.to_string_lossy(), "unused-key");

    {
        let store = SqliteStore::connect(&config).unwrap();
        ensure_schema(&store).unwrap();
        seed_demo(&store).unwrap();
        // Seeding an already populated store is a no-op.
        seed_demo(&store).unwrap();
    }

    let store = SqliteStore::connect(&config).unwrap();
    let cards = fetch_card_data(&store).unwrap();
    assert_eq!(cards.number_of_customers, 4);
    assert_eq!(cards.number_of_invoices, 6);
}

#[test]
fn empty_url_connects_but_first_query_fails() {
    let store = SqliteStore::connect(&StoreConfig::from_lookup(|_| None)).unwrap();
    let err = fetch_customers(&store).unwrap_err();
    assert_eq!(err.to_string(), "Failed to fetch all customers.");
}
