//! `batches` subcommands: list, inspect and revert recorded bulk edits.
//!
//! Every command is scoped to one shop; the shop argument is normalized the
//! same way the server normalizes its tenant header.

use chrono::{DateTime, Utc};
use clap::Subcommand;
use uuid::Uuid;

use spector_bulk_edit::{clamp_limit, revert_batch, BatchStore, PgBatchStore};
use spector_core::{normalize_shop_domain, AppConfig, Batch, ChangeItem};
use spector_shopify::{ClientSettings, ShopifyAdminClient};

/// Sub-commands available under `batches`.
#[derive(Debug, Subcommand)]
pub enum BatchCommands {
    /// List the most recent bulk edits for a shop
    List {
        /// Shop domain (e.g., acme.myshopify.com)
        #[arg(long)]
        shop: String,
        /// Maximum number of batches to show (1-200)
        #[arg(long)]
        limit: Option<i64>,
    },
    /// Show one bulk edit with its change items
    Show {
        #[arg(long)]
        shop: String,
        #[arg(long)]
        id: Uuid,
    },
    /// Revert a bulk edit by replaying its inverse changes
    Revert {
        #[arg(long)]
        shop: String,
        #[arg(long)]
        id: Uuid,
        /// Admin API access token for the shop
        #[arg(long, env = "SHOPIFY_ACCESS_TOKEN", hide_env_values = true)]
        access_token: String,
    },
}

pub(crate) async fn run(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    command: BatchCommands,
) -> anyhow::Result<()> {
    let store = PgBatchStore::new(pool.clone());
    match command {
        BatchCommands::List { shop, limit } => {
            run_batches_list(&store, &normalize_shop_domain(&shop)?, limit).await
        }
        BatchCommands::Show { shop, id } => {
            run_batches_show(&store, &normalize_shop_domain(&shop)?, id).await
        }
        BatchCommands::Revert {
            shop,
            id,
            access_token,
        } => {
            let shop = normalize_shop_domain(&shop)?;
            let settings = ClientSettings::from_app_config(config);
            let client = ShopifyAdminClient::new(&settings, &shop, &access_token)?;
            run_batches_revert(&store, &client, &shop, id).await
        }
    }
}

fn fmt_time(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

pub(crate) fn status_label(batch: &Batch) -> &'static str {
    if batch.is_reverted {
        "reverted"
    } else if batch.can_revert {
        "active"
    } else {
        "locked"
    }
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() > max_chars {
        format!("{}...", value.chars().take(max_chars).collect::<String>())
    } else {
        value.to_owned()
    }
}

pub(crate) fn format_batch_row(batch: &Batch) -> String {
    format!(
        "{:<38}{:<18}{:<13}{:<10}{:<10}{}",
        batch.id,
        fmt_time(batch.created_at),
        batch.operation_type.to_string(),
        status_label(batch),
        batch.product_count,
        truncate(&batch.operation_name, 40)
    )
}

pub(crate) fn format_item_row(item: &ChangeItem) -> String {
    let value = |v: Option<&str>| v.map_or_else(|| "\u{2014}".to_owned(), |s| truncate(s, 24));
    format!(
        "{:<16}{:<16}{:<18}{:<8}{:<27}{}",
        truncate(&item.product_id, 14),
        truncate(item.variant_id.as_deref().unwrap_or("-"), 14),
        truncate(&item.field, 16),
        item.change_type.to_string(),
        value(item.old_value.as_deref()),
        value(item.new_value.as_deref()),
    )
}

/// Print the most recent batches for `shop`, newest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_batches_list(
    store: &dyn BatchStore,
    shop: &str,
    limit: Option<i64>,
) -> anyhow::Result<()> {
    let batches = store.list_recent(shop, clamp_limit(limit)).await?;

    if batches.is_empty() {
        println!("no bulk edits recorded for {shop}");
        return Ok(());
    }

    println!(
        "{:<38}{:<18}{:<13}{:<10}{:<10}NAME",
        "ID", "CREATED", "TYPE", "STATUS", "PRODUCTS"
    );
    for batch in &batches {
        println!("{}", format_batch_row(batch));
    }
    Ok(())
}

/// Print one batch and its items in recorded order.
///
/// # Errors
///
/// Returns an error if the batch does not exist for `shop` or the query fails.
pub(crate) async fn run_batches_show(
    store: &dyn BatchStore,
    shop: &str,
    id: Uuid,
) -> anyhow::Result<()> {
    let batch = store.get(shop, id).await.map_err(|e| match e {
        spector_db::DbError::NotFound => anyhow::anyhow!("bulk edit {id} not found for {shop}"),
        other => other.into(),
    })?;

    println!("{} ({})", batch.operation_name, batch.operation_type);
    if let Some(description) = &batch.description {
        println!("  {description}");
    }
    println!(
        "  created {}  status {}  products {}  variants {}",
        fmt_time(batch.created_at),
        status_label(&batch),
        batch.product_count,
        batch.variant_count
    );
    if let Some(reverted_at) = batch.reverted_at {
        println!("  reverted {}", fmt_time(reverted_at));
    }
    println!();
    println!(
        "{:<16}{:<16}{:<18}{:<8}{:<27}NEW",
        "PRODUCT", "VARIANT", "FIELD", "CHANGE", "OLD"
    );
    for item in &batch.items {
        println!("{}", format_item_row(item));
    }
    Ok(())
}

/// Revert one batch against the live Admin API and print the outcome.
///
/// Per-product failures are printed but do not fail the command; the batch
/// is marked reverted either way.
///
/// # Errors
///
/// Returns an error if the batch is missing, not revertable, of an
/// unsupported type, or the store fails.
pub(crate) async fn run_batches_revert(
    store: &dyn BatchStore,
    api: &dyn spector_shopify::AdminApi,
    shop: &str,
    id: Uuid,
) -> anyhow::Result<()> {
    let outcome = revert_batch(store, api, shop, id).await?;

    println!(
        "reverted {} resource group(s) of bulk edit {id}",
        outcome.reverted_count
    );
    if !outcome.is_complete() {
        println!("{} group(s) failed:", outcome.errors.len());
        for error in &outcome.errors {
            println!("  - {error}");
        }
    }
    Ok(())
}
