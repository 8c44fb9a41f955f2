//! Command-line view of the dashboard overview: card totals, the latest
//! invoices and monthly revenue. Pass `--init` to create the schema and load
//! demo data into an empty store first.
use anyhow::{Context, Result};
use invoice_dashboard::logging::init_logging;
use invoice_dashboard::{
    ensure_schema, fetch_card_data, fetch_latest_invoices, fetch_revenue, format_currency,
    seed_demo, SqliteStore, StoreConfig,
};

fn main() -> Result<()> {
    let _logger = init_logging().context("failed to start logging")?;

    let config = StoreConfig::from_env();
    let store = SqliteStore::connect(&config).context("failed to open invoice store")?;

    if std::env::args().skip(1).any(|arg| arg == "--init") {
        ensure_schema(&store)?;
        seed_demo(&store)?;
    }

    let cards = fetch_card_data(&store)?;
    println!("Invoices:  {}", cards.number_of_invoices);
    println!("Customers: {}", cards.number_of_customers);

    println!();
    println!("Latest invoices");
    for invoice in fetch_latest_invoices(&store)? {
        let name = invoice
            .customer
            .as_ref()
            .map(|customer| customer.name.as_str())
            .unwrap_or("(unknown customer)");
        println!("  {name:<24} {:>12}", format_currency(invoice.amount));
    }

    println!();
    println!("Revenue");
    for month in fetch_revenue(&store)? {
        println!("  {:<4} {:>8}", month.month, month.revenue);
    }

    Ok(())
}
