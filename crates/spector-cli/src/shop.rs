use clap::Subcommand;

use spector_bulk_edit::{BatchStore, PgBatchStore};
use spector_core::normalize_shop_domain;

/// Sub-commands available under `shop`.
#[derive(Debug, Subcommand)]
pub enum ShopCommands {
    /// Delete every recorded bulk edit for a shop (uninstall / shop redact)
    Erase {
        #[arg(long)]
        shop: String,
    },
}

pub(crate) async fn run(pool: &sqlx::PgPool, command: ShopCommands) -> anyhow::Result<()> {
    match command {
        ShopCommands::Erase { shop } => {
            let shop = normalize_shop_domain(&shop)?;
            let store = PgBatchStore::new(pool.clone());
            let erased = store.erase_shop(&shop).await?;
            tracing::info!(shop = %shop, erased, "erased shop bulk-edit history");
            println!("erased {erased} bulk edit(s) for {shop}");
            Ok(())
        }
    }
}
