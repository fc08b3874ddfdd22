//! `storeprov report`: run the pipeline and print the result.

use std::fmt::Write as _;
use std::time::Duration;

use storeprov_core::{AppConfig, StoreConfig, StoreRegistry};
use storeprov_pipeline::{
    run_pipeline, store_totals, PipelineOptions, PipelineReport, RangeToken, ResultRow,
    StoreTotal, TimeSeries,
};
use storeprov_shopify::ShopifyOrdersClient;

use crate::OutputFormat;

#[derive(Debug)]
pub(crate) struct ReportArgs {
    pub range: RangeToken,
    pub format: OutputFormat,
    pub store: Option<String>,
    pub deadline_secs: Option<u64>,
}

pub(crate) fn build_orders_client(config: &AppConfig) -> anyhow::Result<ShopifyOrdersClient> {
    let client = ShopifyOrdersClient::new(
        config.request_timeout_secs,
        &config.user_agent,
        config.max_retries,
        config.retry_backoff_base_ms,
    )
    .map_err(|e| anyhow::anyhow!("failed to build Shopify client: {e}"))?;

    Ok(client
        .with_api_version(&config.shopify_api_version)
        .with_page_size(config.page_size)
        .with_inter_request_delay_ms(config.inter_request_delay_ms))
}

/// Picks the stores a report covers: one store when `filter` is set,
/// otherwise the whole registry.
pub(crate) fn select_stores(
    registry: &StoreRegistry,
    filter: Option<&str>,
) -> anyhow::Result<Vec<StoreConfig>> {
    match filter {
        Some(name) => registry
            .find(name)
            .map(|store| vec![store.clone()])
            .ok_or_else(|| anyhow::anyhow!("store '{name}' is not in the registry")),
        None => Ok(registry.stores.clone()),
    }
}

/// Runs one report and prints it to stdout in the requested format.
///
/// # Errors
///
/// Returns an error if the registry cannot be loaded, no store is selected,
/// or every selected store failed to fetch. Partial failures are reported
/// on stderr but do not fail the command.
pub(crate) async fn run_report(config: &AppConfig, args: &ReportArgs) -> anyhow::Result<()> {
    let registry = storeprov_core::load_stores(&config.stores_path)?;
    if !registry.rejected.is_empty() {
        tracing::warn!(
            rejected = registry.rejected.len(),
            "some registry entries were rejected; run `storeprov stores validate`"
        );
    }

    let stores = select_stores(&registry, args.store.as_deref())?;
    if stores.is_empty() {
        anyhow::bail!("no usable stores in {}", config.stores_path.display());
    }

    let client = build_orders_client(config)?;

    let mut options = PipelineOptions::new(config.timezone);
    options.max_concurrent_stores = config.max_concurrent_stores;
    options.deadline = args
        .deadline_secs
        .map(|secs| tokio::time::Instant::now() + Duration::from_secs(secs));

    let report = run_pipeline(&client, &stores, args.range, &options).await;

    let output = match args.format {
        OutputFormat::Table => render_table(&report.rows),
        OutputFormat::Json => serde_json::to_string_pretty(&report)?,
        OutputFormat::Series => {
            serde_json::to_string_pretty(&TimeSeries::from_rows(&report.rows))?
        }
        OutputFormat::Totals => render_totals(&store_totals(&stores, &report.rows)),
    };
    println!("{output}");

    print_failures(&report);

    if report.all_failed(stores.len()) {
        anyhow::bail!("all {} stores failed to fetch", stores.len());
    }

    Ok(())
}

fn print_failures(report: &PipelineReport) {
    for failure in &report.failures {
        eprintln!(
            "warning: {} ({} orders kept): {}",
            failure.store_name, failure.orders_kept, failure.error
        );
    }
}

pub(crate) fn render_table(rows: &[ResultRow]) -> String {
    if rows.is_empty() {
        return "no orders in the selected range".to_owned();
    }

    let mut out = format!(
        "{:<12}{:<24}{:>8}{:>14}{:>14}{:>14}",
        "DATE", "STORE", "ORDERS", "FULFILLMENT", "TRANSACTION", "TOTAL"
    );
    for row in rows {
        let _ = write!(
            out,
            "\n{:<12}{:<24}{:>8}{:>14.2}{:>14.2}{:>14.2}",
            row.day.to_string(),
            row.store_name,
            row.orders_count,
            row.fulfillment_provision,
            row.transaction_provision,
            row.total_provision,
        );
    }
    out
}

pub(crate) fn render_totals(totals: &[StoreTotal]) -> String {
    let mut out = format!(
        "{:<24}{:>8}{:>14}{:>14}{:>14}",
        "STORE", "ORDERS", "FULFILLMENT", "TRANSACTION", "TOTAL"
    );
    for total in totals {
        let _ = write!(
            out,
            "\n{:<24}{:>8}{:>14.2}{:>14.2}{:>14.2}",
            total.store_name,
            total.orders_count,
            total.fulfillment_provision,
            total.transaction_provision,
            total.total_provision,
        );
    }
    out
}
