//! Fulfillment and transaction provision per order.

use std::collections::HashMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use storeprov_core::RuleType;
use storeprov_shopify::RawOrder;

/// A store's fulfillment rule, parsed once and evaluated per order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionRule {
    /// Quantity of line items whose title contains `keyword`.
    PerItemTitle { keyword: String },
    /// Amount keyed by the order's total quantity; unmatched quantities
    /// fall back to one.
    QuantityTiers { tiers: HashMap<u64, Decimal> },
    /// One per order.
    Flat,
}

impl ProvisionRule {
    /// Parses `rule_value` for `rule_type`. Never fails: malformed tier
    /// entries are logged and skipped.
    #[must_use]
    pub fn parse(rule_type: &RuleType, rule_value: &str) -> Self {
        match rule_type {
            RuleType::PerItemTitle => ProvisionRule::PerItemTitle {
                keyword: rule_value.to_owned(),
            },
            RuleType::QuantityBased => ProvisionRule::QuantityTiers {
                tiers: parse_tiers(rule_value),
            },
            RuleType::Other(_) => ProvisionRule::Flat,
        }
    }

    #[must_use]
    pub fn evaluate(&self, order: &RawOrder) -> Decimal {
        match self {
            ProvisionRule::PerItemTitle { keyword } => {
                let matching: u64 = order
                    .line_items
                    .iter()
                    .filter(|item| item.title.contains(keyword.as_str()))
                    .map(|item| u64::from(item.quantity))
                    .sum();
                Decimal::from(matching)
            }
            ProvisionRule::QuantityTiers { tiers } => tiers
                .get(&order.total_quantity())
                .copied()
                .unwrap_or(Decimal::ONE),
            ProvisionRule::Flat => Decimal::ONE,
        }
    }
}

/// Parses `"1:2.5, 2:5"` into a quantity → amount map. Later duplicates win.
fn parse_tiers(rule_value: &str) -> HashMap<u64, Decimal> {
    let mut tiers = HashMap::new();

    for segment in rule_value.split(',').map(str::trim) {
        if segment.is_empty() {
            continue;
        }

        let parsed = segment.split_once(':').and_then(|(qty, amount)| {
            let qty = qty.trim().parse::<u64>().ok()?;
            let amount = Decimal::from_str(amount.trim()).ok()?;
            (!amount.is_sign_negative()).then_some((qty, amount))
        });

        match parsed {
            Some((qty, amount)) => {
                tiers.insert(qty, amount);
            }
            None => tracing::warn!(rule_value, segment, "ignoring malformed quantity tier"),
        }
    }

    tiers
}

/// Fulfillment provision of `order` under the given rule.
///
/// Convenience for one-off evaluation; the pipeline parses the rule once per
/// store via [`ProvisionRule::parse`].
#[must_use]
pub fn provision(rule_type: &RuleType, rule_value: &str, order: &RawOrder) -> Decimal {
    ProvisionRule::parse(rule_type, rule_value).evaluate(order)
}

/// Per-order transaction provision: `spend - spend * 7.7 / 7.8`.
#[must_use]
pub fn transaction_provision(average_spend: Decimal) -> Decimal {
    let net_rate = Decimal::new(77, 1);
    let gross_rate = Decimal::new(78, 1);
    average_spend
        .checked_mul(net_rate)
        .and_then(|scaled| scaled.checked_div(gross_rate))
        .map_or(Decimal::ZERO, |net| average_spend - net)
}
