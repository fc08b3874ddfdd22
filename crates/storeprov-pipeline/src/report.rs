//! Presentation shapes derived from [`ResultRow`]s.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use storeprov_core::StoreConfig;

use crate::aggregate::ResultRow;

/// Column-oriented view of the rows, one entry per row in every column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TimeSeries {
    #[serde(rename = "Date")]
    pub date: Vec<NaiveDate>,
    #[serde(rename = "Store Name")]
    pub store_name: Vec<String>,
    #[serde(rename = "Total Orders")]
    pub total_orders: Vec<u64>,
    #[serde(rename = "Total Items")]
    pub total_items: Vec<Decimal>,
    #[serde(rename = "Fulfillment Provision (€)")]
    pub fulfillment_provision: Vec<Decimal>,
    #[serde(rename = "Transaction Provision (€)")]
    pub transaction_provision: Vec<Decimal>,
    #[serde(rename = "Total Provision (€)")]
    pub total_provision: Vec<Decimal>,
}

impl TimeSeries {
    #[must_use]
    pub fn from_rows(rows: &[ResultRow]) -> Self {
        let mut series = Self::default();
        for row in rows {
            series.date.push(row.day);
            series.store_name.push(row.store_name.clone());
            series.total_orders.push(row.orders_count);
            series.total_items.push(row.items_count);
            series.fulfillment_provision.push(row.fulfillment_provision);
            series.transaction_provision.push(row.transaction_provision);
            series.total_provision.push(row.total_provision);
        }
        series
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.date.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.date.is_empty()
    }
}

/// Window totals for one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreTotal {
    pub store_name: String,
    pub orders_count: u64,
    pub fulfillment_provision: Decimal,
    pub transaction_provision: Decimal,
    pub total_provision: Decimal,
}

/// Sums the rows per store, in registry order. Stores without rows get
/// zero totals.
#[must_use]
pub fn store_totals(stores: &[StoreConfig], rows: &[ResultRow]) -> Vec<StoreTotal> {
    stores
        .iter()
        .map(|store| {
            let mut total = StoreTotal {
                store_name: store.store_name.clone(),
                orders_count: 0,
                fulfillment_provision: Decimal::ZERO,
                transaction_provision: Decimal::ZERO,
                total_provision: Decimal::ZERO,
            };
            for row in rows.iter().filter(|r| r.store_name == store.store_name) {
                total.orders_count += row.orders_count;
                total.fulfillment_provision += row.fulfillment_provision;
                total.transaction_provision += row.transaction_provision;
                total.total_provision += row.total_provision;
            }
            total
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use storeprov_core::RuleType;

    use super::*;

    fn dec(raw: &str) -> Decimal {
        Decimal::from_str(raw).unwrap()
    }

    fn row(day: &str, store: &str, orders: u64, items: &str, transaction: &str) -> ResultRow {
        let items = dec(items);
        let transaction = dec(transaction);
        ResultRow {
            day: NaiveDate::from_str(day).unwrap(),
            store_name: store.to_owned(),
            orders_count: orders,
            items_count: items,
            fulfillment_provision: items,
            transaction_provision: transaction,
            total_provision: items + transaction,
        }
    }

    fn store(name: &str) -> StoreConfig {
        StoreConfig {
            store_name: name.to_owned(),
            api_key: "k".to_owned(),
            password: "p".to_owned(),
            rule_type: RuleType::from("per_order"),
            rule_value: String::new(),
            average_spend_per_order: Decimal::ZERO,
            first_order: None,
            shop_url: None,
        }
    }

    fn sample_rows() -> Vec<ResultRow> {
        vec![
            row("2024-05-06", "alpha", 2, "3.00", "2.00"),
            row("2024-05-06", "bravo", 1, "1.00", "0.54"),
            row("2024-05-07", "alpha", 1, "1.50", "1.00"),
        ]
    }

    #[test]
    fn time_series_columns_align_with_rows() {
        let series = TimeSeries::from_rows(&sample_rows());
        assert_eq!(series.len(), 3);
        assert_eq!(series.store_name, vec!["alpha", "bravo", "alpha"]);
        assert_eq!(series.total_orders, vec![2, 1, 1]);
        assert_eq!(series.total_provision[1], dec("1.54"));
        assert_eq!(series.transaction_provision.len(), 3);
    }

    #[test]
    fn time_series_serializes_with_display_column_names() {
        let json = serde_json::to_value(TimeSeries::from_rows(&sample_rows())).unwrap();
        let columns: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        for expected in [
            "Date",
            "Store Name",
            "Total Orders",
            "Total Items",
            "Fulfillment Provision (€)",
            "Transaction Provision (€)",
            "Total Provision (€)",
        ] {
            assert!(columns.contains(&expected), "missing column {expected}");
        }
        assert_eq!(json["Date"][2], "2024-05-07");
    }

    #[test]
    fn empty_rows_give_empty_series() {
        assert!(TimeSeries::from_rows(&[]).is_empty());
    }

    #[test]
    fn store_totals_follow_registry_order_and_include_idle_stores() {
        let stores = [store("bravo"), store("charlie"), store("alpha")];
        let totals = store_totals(&stores, &sample_rows());

        let names: Vec<&str> = totals.iter().map(|t| t.store_name.as_str()).collect();
        assert_eq!(names, vec!["bravo", "charlie", "alpha"]);

        assert_eq!(totals[1].orders_count, 0);
        assert_eq!(totals[1].total_provision, Decimal::ZERO);

        let alpha = &totals[2];
        assert_eq!(alpha.orders_count, 3);
        assert_eq!(alpha.fulfillment_provision, dec("4.50"));
        assert_eq!(alpha.transaction_provision, dec("3.00"));
        assert_eq!(alpha.total_provision, dec("7.50"));
    }
}
