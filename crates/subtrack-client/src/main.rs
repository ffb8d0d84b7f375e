use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use subtrack_client::{
    init_tracing, ClientConfig, EngineReceivers, FixedConsent, MemorySessionProvider, Notification,
    OfflineRemoteStore, ResetStep, Snapshot, SubscriptionCache, SyncEngine,
};
use subtrack_shared::catalog::{self, CatalogEntry, SERVICE_CATALOG};
use subtrack_shared::summary::{format_currency, monthly_cost};
use subtrack_shared::{Frequency, NewSubscription};

#[derive(Debug, Parser)]
#[command(name = "subtrack")]
#[command(about = "Track recurring subscriptions on this device")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show every subscription, most expensive first
    List,

    /// Add a subscription
    Add {
        name: String,

        /// Price per billing period. Optional with --from-catalog.
        amount: Option<f64>,

        /// Billed once a year instead of monthly
        #[arg(long)]
        yearly: bool,

        /// Next renewal date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        renews: Option<NaiveDate>,

        /// Take price and billing period from the built-in catalog
        #[arg(long)]
        from_catalog: bool,
    },

    /// Suggest known services matching a query
    Suggest { query: String },

    /// Delete every subscription on this device
    Reset {
        /// Skip the second confirmation step
        #[arg(long)]
        confirm: bool,
    },

    /// Print the built-in service catalog
    Catalog,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = ClientConfig::from_env();
    init_tracing(&config.log_filter);

    match &cli.command {
        Command::Suggest { query } => {
            catalog::suggest(query).into_iter().for_each(print_entry);
            return Ok(());
        }
        Command::Catalog => {
            SERVICE_CATALOG.iter().for_each(print_entry);
            return Ok(());
        }
        _ => {}
    }

    let db = config.open_database().context("failed to open local database")?;
    let (engine, EngineReceivers { mut notifications, .. }) = SyncEngine::new(
        SubscriptionCache::new(db),
        Arc::new(OfflineRemoteStore),
        Arc::new(MemorySessionProvider::new(None)),
        Arc::new(FixedConsent(false)),
        &config,
    );
    engine.resume()?;

    match cli.command {
        Command::List => print_snapshot(&engine.snapshot()),
        Command::Add {
            name,
            amount,
            yearly,
            renews,
            from_catalog,
        } => {
            let draft = build_draft(name, amount, yearly, renews, from_catalog)?;
            let handle = engine.save_subscription(draft);
            drain(&mut notifications);
            let handle = handle?;
            handle.outcome().await;
            print_snapshot(&engine.snapshot());
        }
        Command::Reset { confirm } => {
            let first = engine.request_reset(Instant::now()).await?;
            drain(&mut notifications);
            if confirm {
                let second = engine.request_reset(Instant::now()).await?;
                if let ResetStep::Completed { removed } = second {
                    println!("removed {removed} subscriptions");
                }
                drain(&mut notifications);
            } else if matches!(first, ResetStep::Armed { .. }) {
                println!("run again with --confirm to delete everything");
            }
        }
        Command::Suggest { .. } | Command::Catalog => {}
    }

    Ok(())
}

fn build_draft(
    name: String,
    amount: Option<f64>,
    yearly: bool,
    renews: Option<NaiveDate>,
    from_catalog: bool,
) -> anyhow::Result<NewSubscription> {
    let renewal_date = renews.unwrap_or_else(|| Utc::now().date_naive());

    if from_catalog {
        let Some(entry) = catalog::find(&name) else {
            bail!("\"{name}\" is not in the catalog");
        };
        return Ok(NewSubscription {
            name: entry.name.to_string(),
            amount: amount.unwrap_or(entry.price),
            frequency: entry.frequency,
            renewal_date,
        });
    }

    let Some(amount) = amount else {
        bail!("an amount is required unless --from-catalog is given");
    };

    Ok(NewSubscription {
        name,
        amount,
        frequency: if yearly { Frequency::Yearly } else { Frequency::Monthly },
        renewal_date,
    })
}

fn print_entry(entry: &CatalogEntry) {
    println!(
        "{:<24} {:>8} {}",
        entry.name,
        format_currency(entry.price),
        entry.frequency.suffix()
    );
}

fn print_snapshot(snapshot: &Snapshot) {
    if snapshot.is_empty() {
        println!("No subscriptions yet.");
        return;
    }

    for record in &snapshot.subscriptions {
        println!(
            "{:<24} {:>8} {:<4} {:>8}/mo  renews {}",
            record.name,
            format_currency(record.amount),
            record.frequency.suffix(),
            format_currency(monthly_cost(record)),
            record.renewal_date
        );
    }
    println!(
        "{} subscriptions, {} per month",
        snapshot.count,
        format_currency(snapshot.total_monthly)
    );
}

fn drain(notifications: &mut mpsc::UnboundedReceiver<Notification>) {
    while let Ok(notification) = notifications.try_recv() {
        println!("{}", notification.message());
    }
}
