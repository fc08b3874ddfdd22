//! Per-day, per-store provision buckets.
//!
//! Orders are folded one at a time into `day → store → bucket`; once every
//! store has been folded, [`Aggregator::finish`] flattens the buckets into
//! rounded [`ResultRow`]s.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use chrono_tz::Tz;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use storeprov_core::{RuleType, StoreConfig};
use storeprov_shopify::RawOrder;

use crate::provision::{transaction_provision, ProvisionRule};

/// The slice of a store's configuration every one of its orders carries.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreContext {
    pub store_name: String,
    pub rule_type: RuleType,
    pub rule_value: String,
    pub average_spend_per_order: Decimal,
    pub rule: ProvisionRule,
    /// Transaction provision per order, derived from the average spend.
    pub transaction_provision: Decimal,
}

impl StoreContext {
    #[must_use]
    pub fn from_config(store: &StoreConfig) -> Self {
        Self {
            store_name: store.store_name.clone(),
            rule_type: store.rule_type.clone(),
            rule_value: store.rule_value.clone(),
            average_spend_per_order: store.average_spend_per_order,
            rule: ProvisionRule::parse(&store.rule_type, &store.rule_value),
            transaction_provision: transaction_provision(store.average_spend_per_order),
        }
    }
}

/// A raw order tagged with the store it came from.
#[derive(Debug, Clone)]
pub struct DecoratedOrder {
    pub context: Arc<StoreContext>,
    pub order: RawOrder,
}

impl DecoratedOrder {
    #[must_use]
    pub fn store_name(&self) -> &str {
        &self.context.store_name
    }
}

/// Attaches one shared [`StoreContext`] to each of a store's orders.
#[must_use]
pub fn decorate(store: &StoreConfig, orders: Vec<RawOrder>) -> Vec<DecoratedOrder> {
    let context = Arc::new(StoreContext::from_config(store));
    orders
        .into_iter()
        .map(|order| DecoratedOrder {
            context: Arc::clone(&context),
            order,
        })
        .collect()
}

/// Unrounded running totals for one store on one day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayStoreBucket {
    pub orders_count: u64,
    pub items_count: Decimal,
    pub transaction_provision: Decimal,
}

/// One output row. Money fields are rounded to two decimals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRow {
    /// Calendar day in the canonical timezone.
    pub day: NaiveDate,
    pub store_name: String,
    pub orders_count: u64,
    pub items_count: Decimal,
    pub fulfillment_provision: Decimal,
    pub transaction_provision: Decimal,
    pub total_provision: Decimal,
}

#[derive(Debug, Default)]
struct DayBuckets {
    /// Stores in first-seen order.
    stores: Vec<(String, DayStoreBucket)>,
    index: HashMap<String, usize>,
}

impl DayBuckets {
    fn bucket_mut(&mut self, store_name: &str) -> &mut DayStoreBucket {
        let idx = match self.index.get(store_name) {
            Some(&idx) => idx,
            None => {
                self.stores
                    .push((store_name.to_owned(), DayStoreBucket::default()));
                let idx = self.stores.len() - 1;
                self.index.insert(store_name.to_owned(), idx);
                idx
            }
        };
        &mut self.stores[idx].1
    }
}

/// Single-owner fold of decorated orders into day/store buckets.
#[derive(Debug)]
pub struct Aggregator {
    tz: Tz,
    days: BTreeMap<NaiveDate, DayBuckets>,
}

impl Aggregator {
    #[must_use]
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            days: BTreeMap::new(),
        }
    }

    pub fn fold(&mut self, order: &DecoratedOrder) {
        let day = order.order.created_at.with_timezone(&self.tz).date_naive();
        let fulfillment = order.context.rule.evaluate(&order.order);

        let bucket = self
            .days
            .entry(day)
            .or_default()
            .bucket_mut(order.store_name());
        bucket.orders_count += 1;
        bucket.items_count += fulfillment;
        bucket.transaction_provision += order.context.transaction_provision;
    }

    /// Current totals for `store_name` on `day`, if any order landed there.
    #[must_use]
    pub fn bucket(&self, day: NaiveDate, store_name: &str) -> Option<&DayStoreBucket> {
        let day = self.days.get(&day)?;
        day.index.get(store_name).map(|&idx| &day.stores[idx].1)
    }

    /// Flattens the buckets: days ascending, stores in first-seen order.
    #[must_use]
    pub fn finish(self) -> Vec<ResultRow> {
        self.days
            .into_iter()
            .flat_map(|(day, buckets)| {
                buckets
                    .stores
                    .into_iter()
                    .map(move |(store_name, bucket)| to_row(day, store_name, &bucket))
            })
            .collect()
    }
}

fn to_row(day: NaiveDate, store_name: String, bucket: &DayStoreBucket) -> ResultRow {
    let items = round_money(bucket.items_count);
    let transaction = round_money(bucket.transaction_provision);
    ResultRow {
        day,
        store_name,
        orders_count: bucket.orders_count,
        items_count: items,
        fulfillment_provision: items,
        transaction_provision: transaction,
        total_provision: items + transaction,
    }
}

fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Folds `orders` into a fresh [`Aggregator`] and flattens the result.
#[must_use]
pub fn aggregate<'a, I>(tz: Tz, orders: I) -> Vec<ResultRow>
where
    I: IntoIterator<Item = &'a DecoratedOrder>,
{
    let mut aggregator = Aggregator::new(tz);
    for order in orders {
        aggregator.fold(order);
    }
    aggregator.finish()
}

#[cfg(test)]
#[path = "aggregate_test.rs"]
mod tests;
