//! Display formatting.
//!
//! Everything here reads numbers and produces strings. Nothing produced
//! here is fed back into aggregation or charting.

use crate::metrics::derive;
use crate::reports::{AggregateRow, MonthlyLayout};
use crate::types::{DerivedMetrics, Record, Schema};
use crate::util::{format_one_decimal, format_percent, format_text, format_whole, PLACEHOLDER};
use serde::Serialize;

/// A value that can appear as a column of a detail table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailField {
    Date,
    Store,
    Sessions,
    UnitsSold,
    Orders,
    VisitorConversionRate,
    Cvr,
    Revenue,
    AvgOrderValue,
    Impressions,
    Clicks,
    Ctr,
    Cpc,
    AdOrders,
    AdRevenue,
    AdConversionRate,
    AdSpend,
    Cpa,
    Acos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetailColumn {
    pub field: DetailField,
    pub label: &'static str,
}

/// A top header spanning `span` consecutive columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Band {
    pub label: String,
    pub span: usize,
}

/// Column order, headers and optional bands for a detail view.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailLayout {
    pub bands: Vec<Band>,
    pub columns: Vec<DetailColumn>,
    pub sort_by_date: bool,
}

/// Fully formatted table, exactly as it is shown and exported.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DisplayTable {
    pub bands: Vec<Band>,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DisplayTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Band label for every column, or `None` for an unbanded table.
    pub fn band_row(&self) -> Option<Vec<String>> {
        if self.bands.is_empty() {
            return None;
        }
        Some(
            self.bands
                .iter()
                .flat_map(|b| std::iter::repeat(b.label.clone()).take(b.span))
                .collect(),
        )
    }
}

impl DetailField {
    /// Whether the sheet has the column this field reads. Fields computed
    /// from other columns, or always present, report `true`.
    pub fn is_available(self, schema: &Schema) -> bool {
        match self {
            DetailField::Cpc => schema.has_cpc,
            DetailField::Cpa => schema.has_cpa,
            DetailField::AvgOrderValue => schema.has_avg_order_value,
            _ => true,
        }
    }
}

pub fn format_field(field: DetailField, record: &Record, derived: &DerivedMetrics) -> String {
    match field {
        DetailField::Date => record.date.format("%Y-%m-%d").to_string(),
        DetailField::Store => format_text(record.store.as_deref()),
        DetailField::Sessions => format_whole(record.sessions),
        DetailField::UnitsSold => format_whole(record.units_sold),
        DetailField::Orders => format_whole(record.orders),
        DetailField::VisitorConversionRate => format_percent(derived.visitor_conversion_rate),
        DetailField::Cvr => format_text(record.cvr.as_deref()),
        DetailField::Revenue => format_whole(record.revenue),
        DetailField::AvgOrderValue => format_whole(record.avg_order_value),
        DetailField::Impressions => format_whole(record.impressions),
        DetailField::Clicks => format_whole(record.clicks),
        DetailField::Ctr => format_text(record.ctr.as_deref()),
        DetailField::Cpc => format_one_decimal(record.cpc),
        DetailField::AdOrders => format_whole(record.ad_orders),
        DetailField::AdRevenue => format_whole(record.ad_revenue),
        DetailField::AdConversionRate => format_percent(derived.ad_conversion_rate),
        DetailField::AdSpend => format_whole(Some(derived.ad_spend)),
        DetailField::Cpa => format_whole(record.cpa),
        DetailField::Acos => format_percent(derived.acos),
    }
}

pub fn detail_table(records: &[&Record], schema: &Schema, layout: &DetailLayout) -> DisplayTable {
    let mut ordered: Vec<&Record> = records.to_vec();
    if layout.sort_by_date {
        ordered.sort_by_key(|r| r.date);
    }
    // Columns missing from the sheet are filled with the placeholder.
    let available: Vec<bool> = layout
        .columns
        .iter()
        .map(|c| c.field.is_available(schema))
        .collect();
    let rows = ordered
        .iter()
        .map(|r| {
            let derived = derive(r, schema);
            layout
                .columns
                .iter()
                .zip(&available)
                .map(|(c, present)| {
                    if *present {
                        format_field(c.field, r, &derived)
                    } else {
                        PLACEHOLDER.to_string()
                    }
                })
                .collect()
        })
        .collect();
    DisplayTable {
        bands: layout.bands.clone(),
        headers: layout.columns.iter().map(|c| c.label.to_string()).collect(),
        rows,
    }
}

pub fn monthly_table(rows: &[AggregateRow], layout: &MonthlyLayout) -> DisplayTable {
    let headers = layout
        .keys
        .iter()
        .map(|k| k.label().to_string())
        .chain(std::iter::once("月份".to_string()))
        .chain(layout.columns.iter().map(|c| c.label.to_string()))
        .collect();
    let rows = rows
        .iter()
        .map(|row| {
            row.keys
                .iter()
                .cloned()
                .chain(std::iter::once(row.period.to_string()))
                .chain(layout.columns.iter().map(|c| format_whole(row.sum(c.measure))))
                .collect()
        })
        .collect();
    DisplayTable {
        bands: Vec::new(),
        headers,
        rows,
    }
}
