//! Read side of the dashboard. Every function issues one request against the
//! injected store (card data issues two at once) and maps the rows into the
//! shapes the pages render.
//!
//! Failures are logged with the underlying store error and replaced by a
//! fixed message naming the operation, so pages never leak backend detail.

use std::thread;
use std::time::Duration;

use log::{error, info};
use serde::de::DeserializeOwned;

use crate::db::{decode_row, decode_rows, single, Filter, Query, Store, StoreError};
use crate::error::DashboardError;
use crate::format::format_currency;
use crate::models::{
    CardData, CustomerField, CustomerTotals, FormattedCustomersTable, InvoiceForm, InvoiceRecord,
    InvoicesTable, LatestInvoice, Revenue,
};

/// Rows per page of the invoices table.
pub const ITEMS_PER_PAGE: u64 = 6;

/// Simulated latency applied before every revenue fetch.
pub const REVENUE_DELAY: Duration = Duration::from_secs(3);

const LATEST_INVOICES_LIMIT: usize = 5;

/// All customers (id and name), ordered by name.
pub fn fetch_customers<S: Store + ?Sized>(store: &S) -> Result<Vec<CustomerField>, DashboardError> {
    let query = Query::from("customers")
        .select(&["id", "name"])
        .order("name", true);

    select_as(store, &query).map_err(|err| fetch_failed("Failed to fetch all customers.", err))
}

/// Every revenue row. Sleeps for [`REVENUE_DELAY`] first, unconditionally.
pub fn fetch_revenue<S: Store + ?Sized>(store: &S) -> Result<Vec<Revenue>, DashboardError> {
    info!("Fetching revenue data...");
    thread::sleep(REVENUE_DELAY);

    select_as(store, &Query::from("revenue"))
        .map_err(|err| fetch_failed("Failed to fetch revenue data.", err))
}

/// The five most recent invoices with their customer's name, image and email.
///
/// Amounts are returned as stored, in cents; formatting is left to the
/// caller.
pub fn fetch_latest_invoices<S: Store + ?Sized>(
    store: &S,
) -> Result<Vec<LatestInvoice>, DashboardError> {
    let query = Query::from("invoices")
        .select(&["amount"])
        .embed("customers", "customer_id", "id", &["name", "image_url", "email"])
        .order("date", false)
        .limit(LATEST_INVOICES_LIMIT);

    select_as(store, &query)
        .map_err(|err| fetch_failed("Failed to fetch the latest invoices.", err))
}

/// Invoice and customer totals for the summary cards. The two counts run on
/// separate threads and both must succeed.
pub fn fetch_card_data<S: Store + ?Sized>(store: &S) -> Result<CardData, DashboardError> {
    let invoices = Query::from("invoices");
    let customers = Query::from("customers");

    let (invoice_count, customer_count) = thread::scope(|scope| {
        let invoice_count = scope.spawn(|| store.count(&invoices));
        let customer_count = scope.spawn(|| store.count(&customers));
        (join_count(invoice_count), join_count(customer_count))
    });

    let counts = invoice_count
        .and_then(|invoice_total| customer_count.map(|customer_total| (invoice_total, customer_total)));
    let (number_of_invoices, number_of_customers) =
        counts.map_err(|err| fetch_failed("Failed to fetch card data.", err))?;

    Ok(CardData {
        number_of_customers,
        number_of_invoices,
    })
}

/// Invoices whose customer name contains `query`, ignoring case, newest first.
/// Invoices without a matching customer are left out.
pub fn fetch_filtered_invoices<S: Store + ?Sized>(
    store: &S,
    query: &str,
) -> Result<Vec<InvoicesTable>, DashboardError> {
    let request = Query::from("invoices")
        .select(&["id", "amount", "date", "status"])
        .embed("customers", "customer_id", "id", &["name", "email", "image_url"])
        .ilike("customers.name", format!("%{query}%"))
        .not_null("customers")
        .order("date", false);

    select_as(store, &request).map_err(|err| fetch_failed("Failed to fetch invoices.", err))
}

/// Number of invoice pages for the customers whose name matches `query` by
/// word search.
pub fn fetch_invoices_pages<S: Store + ?Sized>(
    store: &S,
    query: &str,
) -> Result<u64, DashboardError> {
    let request = Query::from("invoices")
        .embed("customers", "customer_id", "id", &[])
        .text_search("customers.name", query)
        .not_null("customers");

    let total = store
        .count(&request)
        .map_err(|err| fetch_failed("Failed to fetch total number of invoices.", err))?;

    Ok(total.div_ceil(ITEMS_PER_PAGE))
}

/// One invoice prepared for the edit form, amount converted back to currency
/// units. Zero or several matches are both failures.
pub fn fetch_invoice_by_id<S: Store + ?Sized>(
    store: &S,
    id: &str,
) -> Result<InvoiceForm, DashboardError> {
    let request = Query::from("invoices")
        .select(&["id", "customer_id", "amount", "status"])
        .eq("id", id);

    store
        .select(&request)
        .and_then(single)
        .and_then(decode_row::<InvoiceRecord>)
        .map(InvoiceForm::from)
        .map_err(|err| fetch_failed("Failed to fetch invoice.", err))
}

/// Customers whose name matches `query` by word search or whose email
/// contains it, with invoice totals aggregated by the store and formatted for
/// display.
pub fn fetch_filtered_customers<S: Store + ?Sized>(
    store: &S,
    query: &str,
) -> Result<Vec<FormattedCustomersTable>, DashboardError> {
    let request = Query::from("customers")
        .select(&["id", "name", "email", "image_url"])
        .embed("invoices", "id", "customer_id", &[])
        .count_as("invoices.id", "total_invoices")
        .sum_where("invoices.amount", "invoices.status", "pending", "total_pending")
        .sum_where("invoices.amount", "invoices.status", "paid", "total_paid")
        .or(vec![
            Filter::text_search("name", query),
            Filter::ilike("email", format!("%{query}%")),
        ])
        .group_by(&["id", "name", "email", "image_url"])
        .order("name", true);

    let customers: Vec<CustomerTotals> = select_as(store, &request)
        .map_err(|err| fetch_failed("Failed to fetch customer table.", err))?;

    Ok(customers
        .into_iter()
        .map(|customer| FormattedCustomersTable {
            id: customer.id,
            name: customer.name,
            email: customer.email,
            image_url: customer.image_url,
            total_invoices: customer.total_invoices,
            total_pending: format_currency(customer.total_pending),
            total_paid: format_currency(customer.total_paid),
        })
        .collect())
}

fn select_as<S, T>(store: &S, query: &Query) -> Result<Vec<T>, StoreError>
where
    S: Store + ?Sized,
    T: DeserializeOwned,
{
    store.select(query).and_then(decode_rows::<T>)
}

fn join_count(
    handle: thread::ScopedJoinHandle<'_, Result<u64, StoreError>>,
) -> Result<u64, StoreError> {
    handle
        .join()
        .unwrap_or_else(|_| Err(StoreError::Backend("count worker panicked".to_string())))
}

fn fetch_failed(message: &'static str, err: StoreError) -> DashboardError {
    error!("Database Error: {message} {err}");
    DashboardError::Fetch(message)
}
