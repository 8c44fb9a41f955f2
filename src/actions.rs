//! Write side of the dashboard: create, update and delete invoices from form
//! submissions.
//!
//! Forms are validated before the store is touched. After a successful write
//! the invoices listing is invalidated through [`ViewHooks`]; create and update
//! also navigate back to it. A failed write never reaches the hooks.

use chrono::Utc;
use log::{error, info, warn};
use serde::Serialize;

use crate::db::{to_row, Query, Store, StoreError};
use crate::error::DashboardError;
use crate::forms::{validate_invoice, FormData};
use crate::models::InvoiceStatus;

/// The invoices listing page.
pub const INVOICES_PATH: &str = "/dashboard/invoices";

/// Callbacks into whatever renders the dashboard.
pub trait ViewHooks {
    /// Drop cached renderings of `path` so the next visit refetches.
    fn revalidate_path(&self, path: &str);

    /// Send the caller to `path`.
    fn redirect(&self, path: &str);
}

#[derive(Serialize)]
struct NewInvoice<'a> {
    customer_id: &'a str,
    amount: i64,
    status: InvoiceStatus,
    date: String,
}

#[derive(Serialize)]
struct InvoiceChanges<'a> {
    customer_id: &'a str,
    amount: i64,
    status: InvoiceStatus,
}

/// Validate the submission and insert it as a new invoice dated today (UTC).
/// The store assigns the identifier.
pub fn create_invoice<S: Store + ?Sized>(
    store: &S,
    hooks: &dyn ViewHooks,
    form: &FormData,
) -> Result<(), DashboardError> {
    let invoice = validate_invoice(form)?;

    let values = NewInvoice {
        customer_id: &invoice.customer_id,
        amount: invoice.amount_in_cents(),
        status: invoice.status,
        date: today(),
    };

    to_row(&values)
        .and_then(|row| store.insert("invoices", row))
        .map_err(|err| write_failed("Failed to create invoice.", err))?;

    info!(
        "event=invoice_created customer_id={} amount={}",
        values.customer_id, values.amount
    );
    hooks.revalidate_path(INVOICES_PATH);
    hooks.redirect(INVOICES_PATH);
    Ok(())
}

/// Validate the submission and overwrite customer, amount and status of the
/// invoice `id`. Any status may replace any other.
pub fn update_invoice<S: Store + ?Sized>(
    store: &S,
    hooks: &dyn ViewHooks,
    id: &str,
    form: &FormData,
) -> Result<(), DashboardError> {
    let invoice = validate_invoice(form)?;

    let changes = InvoiceChanges {
        customer_id: &invoice.customer_id,
        amount: invoice.amount_in_cents(),
        status: invoice.status,
    };

    let updated = to_row(&changes)
        .and_then(|row| store.update(&Query::from("invoices").eq("id", id), row))
        .map_err(|err| write_failed("Failed to update invoice.", err))?;

    if updated == 0 {
        warn!("event=invoice_update_missed id={id}");
    } else {
        info!("event=invoice_updated id={id} status={}", changes.status);
    }

    hooks.revalidate_path(INVOICES_PATH);
    hooks.redirect(INVOICES_PATH);
    Ok(())
}

/// Remove the invoice `id`. The listing is invalidated but the caller stays
/// where it is.
pub fn delete_invoice<S: Store + ?Sized>(
    store: &S,
    hooks: &dyn ViewHooks,
    id: &str,
) -> Result<(), DashboardError> {
    let deleted = store
        .delete(&Query::from("invoices").eq("id", id))
        .map_err(|err| write_failed("Failed to delete invoice.", err))?;

    if deleted == 0 {
        warn!("event=invoice_delete_missed id={id}");
    } else {
        info!("event=invoice_deleted id={id}");
    }

    hooks.revalidate_path(INVOICES_PATH);
    Ok(())
}

/// Today's calendar date in UTC, `YYYY-MM-DD`.
pub fn today() -> String {
    Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

fn write_failed(message: &'static str, err: StoreError) -> DashboardError {
    error!("Database Error: {message} {err}");
    DashboardError::Mutation(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn today_is_a_plain_calendar_date() {
        let date = today();
        assert_eq!(date.len(), 10);
        assert!(chrono::NaiveDate::parse_from_str(&date, "%Y-%m-%d").is_ok());
    }
}
