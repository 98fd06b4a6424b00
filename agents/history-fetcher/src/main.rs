//! The history fetcher pages through the activity history of one account on
//! one configured chain, printing every page as a line of JSON.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::sync::Arc;

use activity_base::{
    db::{RocksIntervalStore, DB},
    settings::{load_settings, BackendConf},
    BaseHttpClient, HistoryMetrics, HistorySync,
};
use activity_core::{ActivitySource, CacheKey, CancellationToken};
use activity_evm::{BalancesSource, ExplorerSource};
use activity_tezos::LedgerSource;
use clap::Parser;
use eyre::{eyre, Result};
use prometheus::Registry;
use tracing::{info, warn};

use crate::args::Args;
use crate::fetcher::page_through;

mod args;
mod fetcher;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let settings = load_settings()?;
    settings.tracing.start_tracing()?;

    let chain = settings.chain(&args.chain)?;
    let account = args
        .account
        .clone()
        .or_else(|| chain.account.clone())
        .ok_or_else(|| eyre!("No account given for chain {}", args.chain))?;
    let mut key = CacheKey::new(args.chain.to_ascii_lowercase(), account);
    if let Some(asset) = args.asset.clone() {
        key = key.with_asset(asset);
    }

    let store = Arc::new(RocksIntervalStore::new(DB::from_path(&settings.db)?));
    let metrics = HistoryMetrics::new(Registry::new())?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received ctrl-c, cancelling");
            on_signal.cancel();
        }
    });

    info!(%key, backend = ?chain.backend, "Starting history fetcher");
    match &chain.backend {
        BackendConf::Ledger { url, page_size } => {
            let source = LedgerSource::new(BaseHttpClient::from_url(url)?, store.clone(), *page_size);
            run(source, store, metrics, &args, key, &cancel).await
        }
        BackendConf::BalancesApi {
            url,
            chain_name,
            page_size,
        } => {
            let source = BalancesSource::new(BaseHttpClient::from_url(url)?, chain_name, *page_size);
            run(source, store, metrics, &args, key, &cancel).await
        }
        BackendConf::Explorer { url } => {
            let source = ExplorerSource::new(BaseHttpClient::from_url(url)?);
            run(source, store, metrics, &args, key, &cancel).await
        }
    }
}

async fn run<S: ActivitySource>(
    source: S,
    store: Arc<RocksIntervalStore>,
    metrics: HistoryMetrics,
    args: &Args,
    key: CacheKey,
    cancel: &CancellationToken,
) -> Result<()> {
    let sync = HistorySync::new(source, store).with_metrics(metrics.clone());
    let pages = page_through(&sync, key, args.pages, cancel, &mut std::io::stdout()).await?;
    info!(pages, "Finished paging");

    if args.print_metrics {
        let report = metrics.gather()?;
        eprintln!("{}", String::from_utf8_lossy(&report));
    }
    Ok(())
}
