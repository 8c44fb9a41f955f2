//! Data access for a small invoicing dashboard.
//!
//! The query layer ([`data`]) reads customers, invoices, revenue and card
//! totals; the mutation layer ([`actions`]) validates invoice forms and writes
//! them. Both take the store handle as an argument, so the same functions run
//! against SQLite or any other [`Store`] implementation.
pub mod actions;
pub mod config;
pub mod data;
pub mod db;
pub mod error;
pub mod format;
pub mod forms;
pub mod logging;
pub mod models;

pub use actions::{create_invoice, delete_invoice, update_invoice, ViewHooks, INVOICES_PATH};
pub use config::StoreConfig;
pub use data::{
    fetch_card_data, fetch_customers, fetch_filtered_customers, fetch_filtered_invoices,
    fetch_invoice_by_id, fetch_invoices_pages, fetch_latest_invoices, fetch_revenue,
    ITEMS_PER_PAGE,
};
pub use db::{ensure_schema, seed_demo, SqliteStore, Store, StoreError};
pub use error::DashboardError;
pub use format::format_currency;
pub use forms::{validate_invoice, FormData, ValidInvoice, ValidationErrors};
pub use models::{
    CardData, CustomerField, FormattedCustomersTable, InvoiceCustomer, InvoiceForm, InvoiceStatus,
    InvoicesTable, LatestInvoice, Revenue,
};
