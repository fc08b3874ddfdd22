//! Store registry: the read-only list of storefronts a run covers.
//!
//! The registry lives in a YAML file with a top-level `stores:` list. Entries
//! are deserialized and validated one at a time; a malformed entry rejects
//! only that store; every other store stays usable. Only an unreadable or
//! unparsable file is fatal.

use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::ConfigError;

/// How the fulfillment provision of an order is computed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RuleType {
    /// Sum the quantity of line items whose title contains `rule_value`.
    PerItemTitle,
    /// Look the order's total quantity up in a `qty:amount` tier list.
    QuantityBased,
    /// Any other value: flat provision of one per order.
    Other(String),
}

impl RuleType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            RuleType::PerItemTitle => "per_item_title",
            RuleType::QuantityBased => "quantity_based",
            RuleType::Other(raw) => raw,
        }
    }
}

impl From<String> for RuleType {
    fn from(raw: String) -> Self {
        match raw.trim() {
            "per_item_title" => RuleType::PerItemTitle,
            "quantity_based" => RuleType::QuantityBased,
            _ => RuleType::Other(raw),
        }
    }
}

impl From<&str> for RuleType {
    fn from(raw: &str) -> Self {
        RuleType::from(raw.to_owned())
    }
}

impl From<RuleType> for String {
    fn from(rule: RuleType) -> Self {
        rule.as_str().to_owned()
    }
}

impl std::fmt::Display for RuleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One storefront as configured in the registry.
#[derive(Clone, Deserialize)]
pub struct StoreConfig {
    /// Unique store handle; also the `{handle}.myshopify.com` subdomain.
    pub store_name: String,
    pub api_key: String,
    pub password: String,
    pub rule_type: RuleType,
    #[serde(default)]
    pub rule_value: String,
    pub average_spend_per_order: Decimal,
    /// Order number of a previously synced boundary. Pagination stops once
    /// this order shows up.
    #[serde(default, alias = "firstOrder", deserialize_with = "deserialize_opt_order_number")]
    pub first_order: Option<String>,
    /// Origin override, e.g. for a proxy. Defaults to the myshopify domain.
    #[serde(default)]
    pub shop_url: Option<String>,
}

impl StoreConfig {
    /// Scheme and host the Admin API is reached at.
    #[must_use]
    pub fn shop_origin(&self) -> String {
        match self.shop_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.trim_end_matches('/').to_owned(),
            _ => format!("https://{}.myshopify.com", self.store_name.trim()),
        }
    }

    /// Returns `true` if `order_number` is this store's sentinel order.
    #[must_use]
    pub fn is_sentinel(&self, order_number: &str) -> bool {
        self.first_order.as_deref().is_some_and(|sentinel| {
            let sentinel = normalize_order_number(sentinel);
            !sentinel.is_empty() && sentinel == normalize_order_number(order_number)
        })
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("store_name", &self.store_name)
            .field("api_key", &"[redacted]")
            .field("password", &"[redacted]")
            .field("rule_type", &self.rule_type)
            .field("rule_value", &self.rule_value)
            .field("average_spend_per_order", &self.average_spend_per_order)
            .field("first_order", &self.first_order)
            .field("shop_url", &self.shop_url)
            .finish()
    }
}

/// Canonical form used when comparing order numbers: surrounding whitespace
/// and a leading `#` are ignored.
#[must_use]
pub fn normalize_order_number(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed.strip_prefix('#').unwrap_or(trimmed).trim()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

impl From<StringOrNumber> for String {
    fn from(value: StringOrNumber) -> Self {
        match value {
            StringOrNumber::Text(s) => s,
            StringOrNumber::Signed(n) => n.to_string(),
            StringOrNumber::Unsigned(n) => n.to_string(),
        }
    }
}

/// Deserializes an order number given either as a string or an integer.
///
/// # Errors
///
/// Fails if the value is neither a string nor an integer.
pub fn deserialize_order_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    StringOrNumber::deserialize(deserializer).map(String::from)
}

fn deserialize_opt_order_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<StringOrNumber>::deserialize(deserializer).map(|v| v.map(String::from))
}

/// An entry that was dropped while loading the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedStore {
    /// Zero-based position in the `stores:` list.
    pub index: usize,
    pub store_name: Option<String>,
    pub reason: String,
}

/// Usable stores in file order, plus the entries that were rejected.
#[derive(Debug, Clone, Default)]
pub struct StoreRegistry {
    pub stores: Vec<StoreConfig>,
    pub rejected: Vec<RejectedStore>,
}

impl StoreRegistry {
    /// Looks a store up by name, case-insensitively.
    #[must_use]
    pub fn find(&self, store_name: &str) -> Option<&StoreConfig> {
        let wanted = store_name.trim().to_lowercase();
        self.stores
            .iter()
            .find(|s| s.store_name.trim().to_lowercase() == wanted)
    }
}

#[derive(Debug, Deserialize)]
struct StoresFile {
    #[serde(default)]
    stores: Vec<serde_yaml::Value>,
}

/// Load the store registry from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or is not valid YAML of
/// the expected top-level shape. Invalid individual entries are reported in
/// [`StoreRegistry::rejected`] instead.
pub fn load_stores(path: &Path) -> Result<StoreRegistry, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::StoresFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_stores(&content)
}

/// Parse the store registry from YAML text.
///
/// # Errors
///
/// Returns [`ConfigError::StoresFileParse`] if the document itself does not parse.
pub fn parse_stores(content: &str) -> Result<StoreRegistry, ConfigError> {
    let file: StoresFile = serde_yaml::from_str(content).map_err(ConfigError::StoresFileParse)?;

    let mut registry = StoreRegistry::default();
    let mut seen_names = HashSet::new();

    for (index, value) in file.stores.into_iter().enumerate() {
        let raw_name = value
            .get("store_name")
            .and_then(serde_yaml::Value::as_str)
            .map(str::to_owned);

        let outcome = serde_yaml::from_value::<StoreConfig>(value)
            .map_err(|e| ConfigError::StoresFileParse(e).to_string())
            .and_then(|store| {
                validate_store(&store, &seen_names)
                    .map(|()| store)
                    .map_err(|e| e.to_string())
            });

        match outcome {
            Ok(store) => {
                seen_names.insert(store.store_name.trim().to_lowercase());
                registry.stores.push(store);
            }
            Err(reason) => {
                tracing::warn!(
                    index,
                    store = raw_name.as_deref().unwrap_or("<unnamed>"),
                    reason = %reason,
                    "rejecting store registry entry"
                );
                registry.rejected.push(RejectedStore {
                    index,
                    store_name: raw_name,
                    reason,
                });
            }
        }
    }

    Ok(registry)
}

fn validate_store(store: &StoreConfig, seen_names: &HashSet<String>) -> Result<(), ConfigError> {
    let name = store.store_name.trim();
    if name.is_empty() {
        return Err(ConfigError::Validation(
            "store_name must be non-empty".to_string(),
        ));
    }

    if seen_names.contains(&name.to_lowercase()) {
        return Err(ConfigError::Validation(format!(
            "duplicate store_name: '{name}'"
        )));
    }

    if store.api_key.trim().is_empty() || store.password.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "store '{name}' is missing API credentials"
        )));
    }

    if store.average_spend_per_order.is_sign_negative() && !store.average_spend_per_order.is_zero()
    {
        return Err(ConfigError::Validation(format!(
            "store '{name}' has negative average_spend_per_order {}",
            store.average_spend_per_order
        )));
    }

    Ok(())
}

#[cfg(test)]
#[path = "stores_test.rs"]
mod tests;
