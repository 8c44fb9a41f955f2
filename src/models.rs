//! Records exchanged with the dashboard pages. Field names follow the column
//! names of the store so rows deserialize directly; embedded customers arrive
//! under the `customers` key.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The two states an invoice can be in. No transition between them is
/// guarded; any value can be replaced by the other at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Pending,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(InvoiceStatus::Pending),
            "paid" => Ok(InvoiceStatus::Paid),
            _ => Err(()),
        }
    }
}

/// Entry of the customer picker in the invoice forms.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CustomerField {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revenue {
    pub month: String,
    pub revenue: i64,
}

/// Customer columns embedded in invoice listings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InvoiceCustomer {
    pub name: String,
    pub email: String,
    pub image_url: String,
}

/// Row of the "latest invoices" card. `amount` is the stored value in cents.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LatestInvoice {
    pub amount: i64,
    #[serde(rename = "customers")]
    pub customer: Option<InvoiceCustomer>,
}

/// Row of the invoices table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InvoicesTable {
    pub id: String,
    pub amount: i64,
    pub date: String,
    pub status: InvoiceStatus,
    #[serde(rename = "customers")]
    pub customer: InvoiceCustomer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CardData {
    pub number_of_customers: u64,
    pub number_of_invoices: u64,
}

/// An invoice as the edit form shows it, with `amount` in currency units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceForm {
    pub id: String,
    pub customer_id: String,
    pub amount: f64,
    pub status: InvoiceStatus,
}

/// Stored shape of [`InvoiceForm`], amount still in cents.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct InvoiceRecord {
    pub id: String,
    pub customer_id: String,
    pub amount: i64,
    pub status: InvoiceStatus,
}

impl From<InvoiceRecord> for InvoiceForm {
    fn from(record: InvoiceRecord) -> Self {
        Self {
            id: record.id,
            customer_id: record.customer_id,
            amount: record.amount as f64 / 100.0,
            status: record.status,
        }
    }
}

/// Customer row as the store aggregates it, totals in cents.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct CustomerTotals {
    pub id: String,
    pub name: String,
    pub email: String,
    pub image_url: String,
    pub total_invoices: i64,
    pub total_pending: i64,
    pub total_paid: i64,
}

/// Row of the customers table, totals already formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedCustomersTable {
    pub id: String,
    pub name: String,
    pub email: String,
    pub image_url: String,
    pub total_invoices: i64,
    pub total_pending: String,
    pub total_paid: String,
}
