use crate::types::{Record, YearMonth};
use std::collections::BTreeMap;
use tracing::debug;

/// Categorical columns a monthly report can group by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    ProductName,
    ProductId,
    Store,
    Sku,
}

impl GroupKey {
    pub fn label(self) -> &'static str {
        match self {
            GroupKey::ProductName => "品名",
            GroupKey::ProductId => "ASIN",
            GroupKey::Store => "店铺",
            GroupKey::Sku => "SKU",
        }
    }

    fn value(self, record: &Record) -> Option<&str> {
        let v = match self {
            GroupKey::ProductName => record.name.as_deref(),
            GroupKey::ProductId => record.product_id.as_deref(),
            GroupKey::Store => record.store.as_deref(),
            GroupKey::Sku => record.sku.as_deref(),
        };
        v.filter(|s| !s.trim().is_empty())
    }
}

/// Numeric columns that can be summed per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    Sessions,
    UnitsSold,
    Orders,
    Revenue,
    DiscountedRevenue,
    Clicks,
    AdOrders,
    AdRevenue,
    Refunds,
}

impl Measure {
    pub fn value(self, record: &Record) -> Option<f64> {
        match self {
            Measure::Sessions => record.sessions,
            Measure::UnitsSold => record.units_sold,
            Measure::Orders => record.orders,
            Measure::Revenue => record.revenue,
            Measure::DiscountedRevenue => record.discounted_revenue,
            Measure::Clicks => record.clicks,
            Measure::AdOrders => record.ad_orders,
            Measure::AdRevenue => record.ad_revenue,
            Measure::Refunds => record.refunds,
        }
    }
}

/// A measure and the header it is shown under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryColumn {
    pub measure: Measure,
    pub label: &'static str,
}

/// Grouping keys, summed measures and headings for one monthly table.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyLayout {
    pub title: &'static str,
    pub keys: Vec<GroupKey>,
    pub columns: Vec<SummaryColumn>,
}

impl MonthlyLayout {
    /// Monthly totals per product name.
    pub fn by_product() -> Self {
        MonthlyLayout {
            title: "每个产品的历史月销量（按品名 + 月份）",
            keys: vec![GroupKey::ProductName],
            columns: vec![
                SummaryColumn { measure: Measure::UnitsSold, label: "月销量" },
                SummaryColumn { measure: Measure::Orders, label: "月订单量" },
                SummaryColumn { measure: Measure::DiscountedRevenue, label: "月销售额(折后)" },
                SummaryColumn { measure: Measure::Refunds, label: "月退款量" },
            ],
        }
    }

    /// Monthly totals per product name and ASIN.
    pub fn by_product_and_asin() -> Self {
        MonthlyLayout {
            title: "每个产品下各 ASIN 的历史月销量（品名 + ASIN + 月份）",
            keys: vec![GroupKey::ProductName, GroupKey::ProductId],
            columns: vec![
                SummaryColumn { measure: Measure::UnitsSold, label: "月销量" },
                SummaryColumn { measure: Measure::Orders, label: "月订单量" },
                SummaryColumn { measure: Measure::DiscountedRevenue, label: "月销售额(折后)" },
            ],
        }
    }

    pub fn measures(&self) -> Vec<Measure> {
        self.columns.iter().map(|c| c.measure).collect()
    }
}

/// One `(keys..., month)` group with its sums, in the order of the
/// requested measures.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub keys: Vec<String>,
    pub period: YearMonth,
    pub sums: Vec<(Measure, f64)>,
}

impl AggregateRow {
    pub fn sum(&self, measure: Measure) -> Option<f64> {
        self.sums
            .iter()
            .find(|(m, _)| *m == measure)
            .map(|(_, v)| *v)
    }
}

/// Group records by `keys` plus calendar month and sum `measures`.
///
/// A record missing any key value is left out entirely rather than summed
/// into an "unknown" group. A missing measure value adds zero. Output is
/// sorted by key values, then month.
pub fn monthly_summary(
    records: &[&Record],
    keys: &[GroupKey],
    measures: &[Measure],
) -> Vec<AggregateRow> {
    let mut groups: BTreeMap<(Vec<String>, YearMonth), Vec<f64>> = BTreeMap::new();
    let mut skipped = 0usize;
    for r in records {
        let key_values: Option<Vec<String>> = keys
            .iter()
            .map(|k| k.value(r).map(str::to_string))
            .collect();
        let Some(key_values) = key_values else {
            skipped += 1;
            continue;
        };
        let sums = groups
            .entry((key_values, r.period()))
            .or_insert_with(|| vec![0.0; measures.len()]);
        for (slot, m) in sums.iter_mut().zip(measures) {
            *slot += m.value(r).unwrap_or(0.0);
        }
    }
    if skipped > 0 {
        debug!(skipped, "records without complete group keys left out of summary");
    }

    groups
        .into_iter()
        .map(|((keys, period), sums)| AggregateRow {
            keys,
            period,
            sums: measures.iter().copied().zip(sums).collect(),
        })
        .collect()
}
