//! `storeprov stores`: registry inspection.

use storeprov_core::AppConfig;

/// Prints one line per usable store. Credentials are never shown.
///
/// # Errors
///
/// Returns an error if the registry file cannot be read or parsed.
pub(crate) fn run_stores_list(config: &AppConfig) -> anyhow::Result<()> {
    let registry = storeprov_core::load_stores(&config.stores_path)?;

    if registry.stores.is_empty() {
        println!("no stores configured in {}", config.stores_path.display());
        return Ok(());
    }

    println!(
        "{:<24}{:<18}{:<20}{:>12}  SENTINEL",
        "STORE", "RULE", "RULE VALUE", "AVG SPEND"
    );
    for store in &registry.stores {
        println!(
            "{:<24}{:<18}{:<20}{:>12.2}  {}",
            store.store_name,
            store.rule_type.as_str(),
            store.rule_value,
            store.average_spend_per_order,
            store.first_order.as_deref().unwrap_or("-"),
        );
    }

    Ok(())
}

/// Loads the registry and lists every rejected entry.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded or any entry was rejected.
pub(crate) fn run_stores_validate(config: &AppConfig) -> anyhow::Result<()> {
    let registry = storeprov_core::load_stores(&config.stores_path)?;

    for rejected in &registry.rejected {
        println!(
            "rejected entry #{}{}: {}",
            rejected.index,
            rejected
                .store_name
                .as_deref()
                .map(|name| format!(" ({name})"))
                .unwrap_or_default(),
            rejected.reason
        );
    }

    println!(
        "{} stores usable, {} rejected ({})",
        registry.stores.len(),
        registry.rejected.len(),
        config.stores_path.display()
    );

    if !registry.rejected.is_empty() {
        anyhow::bail!("{} registry entries rejected", registry.rejected.len());
    }
    Ok(())
}
