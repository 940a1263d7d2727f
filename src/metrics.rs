//! Per-record derived metrics and selection-level KPIs.
//!
//! Undefined ratios stay `None` all the way to the presenter; they are
//! never folded into zero.

use crate::types::{DerivedMetrics, KpiSummary, Record, Schema};
use crate::util::average;

/// `numerator / denominator` when the denominator is positive.
fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d > 0.0 => Some(n / d).filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Units sold per session.
pub fn visitor_conversion_rate(record: &Record) -> Option<f64> {
    ratio(record.units_sold, record.sessions)
}

/// Ad orders per ad click.
pub fn ad_conversion_rate(record: &Record) -> Option<f64> {
    ratio(record.ad_orders, record.clicks)
}

/// Sum of the spend columns the schema has. Zero when it has none.
pub fn ad_spend(record: &Record, schema: &Schema) -> f64 {
    schema
        .ad_channels
        .iter()
        .filter_map(|c| record.ad_spend(*c))
        .sum()
}

pub fn derive(record: &Record, schema: &Schema) -> DerivedMetrics {
    DerivedMetrics {
        ad_spend: ad_spend(record, schema),
        visitor_conversion_rate: visitor_conversion_rate(record),
        ad_conversion_rate: ad_conversion_rate(record),
        acos: record.acos.filter(|v| v.is_finite()),
    }
}

/// Headline totals for a selection. Missing values add nothing; the ACOS
/// mean only covers rows that have one.
pub fn summarize(records: &[&Record], schema: &Schema) -> KpiSummary {
    let acos: Vec<f64> = records
        .iter()
        .filter_map(|r| r.acos)
        .filter(|v| v.is_finite())
        .collect();
    KpiSummary {
        total_revenue: records.iter().filter_map(|r| r.revenue).sum(),
        total_ad_spend: records.iter().map(|r| ad_spend(r, schema)).sum(),
        total_sessions: records.iter().filter_map(|r| r.sessions).sum(),
        mean_acos: average(&acos),
    }
}
