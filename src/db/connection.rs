use anyhow::{Context, Result};
use serde::Serialize;

use super::query::Query;
use super::sqlite::SqliteStore;
use super::store::{to_row, Store};
use crate::models::InvoiceStatus;

/// Create the dashboard tables if they are missing. Hosted stores are expected
/// to be provisioned already, so `connect` never calls this; local setups and
/// tests do.
///
/// Identifiers default to random hex strings so inserts that omit `id` get a
/// store-assigned key, and `status` is constrained to the two invoice states.
pub fn ensure_schema(store: &SqliteStore) -> Result<()> {
    let conn = store.lock().context("failed to lock store connection")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS customers (
            id TEXT PRIMARY KEY NOT NULL DEFAULT (lower(hex(randomblob(16)))),
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            image_url TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create customers table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS invoices (
            id TEXT PRIMARY KEY NOT NULL DEFAULT (lower(hex(randomblob(16)))),
            customer_id TEXT NOT NULL,
            amount INTEGER NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('pending', 'paid')),
            date TEXT NOT NULL,
            FOREIGN KEY(customer_id) REFERENCES customers(id) ON DELETE CASCADE
        )",
        [],
    )
    .context("failed to create invoices table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS revenue (
            month TEXT PRIMARY KEY NOT NULL,
            revenue INTEGER NOT NULL
        )",
        [],
    )
    .context("failed to create revenue table")?;

    Ok(())
}

#[derive(Serialize)]
struct SeedCustomer<'a> {
    id: &'a str,
    name: &'a str,
    email: &'a str,
    image_url: &'a str,
}

#[derive(Serialize)]
struct SeedInvoice<'a> {
    customer_id: &'a str,
    amount: i64,
    status: InvoiceStatus,
    date: &'a str,
}

#[derive(Serialize)]
struct SeedRevenue<'a> {
    month: &'a str,
    revenue: i64,
}

const SEED_CUSTOMERS: &[SeedCustomer<'static>] = &[
    SeedCustomer {
        id: "3958dc9e-712f-4377-85e9-fec4b6a6442a",
        name: "Maya Lindqvist",
        email: "maya@lindqvist.example",
        image_url: "/customers/maya-lindqvist.png",
    },
    SeedCustomer {
        id: "3958dc9e-742f-4377-85e9-fec4b6a6442a",
        name: "Oren Castillo",
        email: "oren@castillo.example",
        image_url: "/customers/oren-castillo.png",
    },
    SeedCustomer {
        id: "3958dc9e-737f-4377-85e9-fec4b6a6442a",
        name: "Priya Natarajan",
        email: "priya@natarajan.example",
        image_url: "/customers/priya-natarajan.png",
    },
    SeedCustomer {
        id: "50ca3e18-62cd-11ee-8c99-0242ac120002",
        name: "Tomasz Wrona",
        email: "tomasz@wrona.example",
        image_url: "/customers/tomasz-wrona.png",
    },
];

const SEED_INVOICES: &[SeedInvoice<'static>] = &[
    SeedInvoice {
        customer_id: "3958dc9e-712f-4377-85e9-fec4b6a6442a",
        amount: 15795,
        status: InvoiceStatus::Pending,
        date: "2022-12-06",
    },
    SeedInvoice {
        customer_id: "3958dc9e-742f-4377-85e9-fec4b6a6442a",
        amount: 20348,
        status: InvoiceStatus::Pending,
        date: "2022-11-14",
    },
    SeedInvoice {
        customer_id: "3958dc9e-737f-4377-85e9-fec4b6a6442a",
        amount: 3040,
        status: InvoiceStatus::Paid,
        date: "2022-10-29",
    },
    SeedInvoice {
        customer_id: "50ca3e18-62cd-11ee-8c99-0242ac120002",
        amount: 44800,
        status: InvoiceStatus::Paid,
        date: "2023-09-10",
    },
    SeedInvoice {
        customer_id: "3958dc9e-712f-4377-85e9-fec4b6a6442a",
        amount: 34577,
        status: InvoiceStatus::Pending,
        date: "2023-08-05",
    },
    SeedInvoice {
        customer_id: "3958dc9e-742f-4377-85e9-fec4b6a6442a",
        amount: 54246,
        status: InvoiceStatus::Pending,
        date: "2023-07-16",
    },
];

const SEED_REVENUE: &[SeedRevenue<'static>] = &[
    SeedRevenue { month: "Jan", revenue: 2000 },
    SeedRevenue { month: "Feb", revenue: 1800 },
    SeedRevenue { month: "Mar", revenue: 2200 },
    SeedRevenue { month: "Apr", revenue: 2500 },
    SeedRevenue { month: "May", revenue: 2300 },
    SeedRevenue { month: "Jun", revenue: 3200 },
    SeedRevenue { month: "Jul", revenue: 3500 },
    SeedRevenue { month: "Aug", revenue: 3700 },
    SeedRevenue { month: "Sep", revenue: 2500 },
    SeedRevenue { month: "Oct", revenue: 2800 },
    SeedRevenue { month: "Nov", revenue: 3000 },
    SeedRevenue { month: "Dec", revenue: 4800 },
];

/// Fill an empty store with a small demo data set. Goes through the regular
/// [`Store`] interface so it works for any backend with the same schema.
/// Does nothing when customers already exist.
pub fn seed_demo(store: &impl Store) -> Result<()> {
    let existing = store
        .count(&Query::from("customers"))
        .context("failed to count existing customers")?;
    if existing > 0 {
        return Ok(());
    }

    for customer in SEED_CUSTOMERS {
        store
            .insert("customers", to_row(customer)?)
            .with_context(|| format!("failed to seed customer {}", customer.name))?;
    }
    for invoice in SEED_INVOICES {
        store
            .insert("invoices", to_row(invoice)?)
            .context("failed to seed invoice")?;
    }
    for month in SEED_REVENUE {
        store
            .insert("revenue", to_row(month)?)
            .with_context(|| format!("failed to seed revenue for {}", month.month))?;
    }

    Ok(())
}
