use crate::error::{DashboardError, Result};
use crate::source::RawTable;
use crate::types::{columns, Dataset, LoadReport, Record, Schema};
use crate::util::{clean_text, parse_date_safe, parse_f64_safe, parse_percent};
use std::collections::HashMap;
use tracing::{info, warn};

/// Maps localized header names to cell positions.
struct ColumnIndex<'a> {
    positions: HashMap<&'a str, usize>,
}

impl<'a> ColumnIndex<'a> {
    fn new(headers: &'a [String]) -> Self {
        let mut positions = HashMap::new();
        for (i, h) in headers.iter().enumerate() {
            // First occurrence wins when a header repeats.
            positions.entry(h.trim()).or_insert(i);
        }
        ColumnIndex { positions }
    }

    fn cell<'r>(&self, row: &'r [String], name: &str) -> Option<&'r str> {
        self.positions
            .get(name)
            .and_then(|&i| row.get(i))
            .map(String::as_str)
    }

    fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }
}

/// Turn the raw sheet into typed records.
///
/// Rows whose date does not parse are dropped and counted; every other
/// unparseable cell simply becomes `None` on the record.
pub fn load_and_clean(table: &RawTable) -> Result<Dataset> {
    let index = ColumnIndex::new(&table.headers);
    if !index.contains(columns::DATE) {
        return Err(DashboardError::MissingColumn(columns::DATE));
    }
    let schema = Schema::from_headers(&table.headers);

    let mut records = Vec::with_capacity(table.rows.len());
    let mut dropped_dates = 0usize;
    for row in &table.rows {
        let Some(date) = parse_date_safe(index.cell(row, columns::DATE)) else {
            dropped_dates += 1;
            continue;
        };
        let text = |name| clean_text(index.cell(row, name));
        let num = |name| parse_f64_safe(index.cell(row, name));

        let mut record = Record {
            date,
            store: text(columns::STORE),
            product_id: text(columns::ASIN),
            sku: text(columns::SKU),
            name: text(columns::NAME),
            title: text(columns::TITLE),
            sessions: num(columns::SESSIONS),
            units_sold: num(columns::UNITS_SOLD),
            orders: num(columns::ORDERS),
            revenue: num(columns::REVENUE),
            discounted_revenue: num(columns::DISCOUNTED_REVENUE),
            avg_order_value: num(columns::AVG_ORDER_VALUE),
            impressions: num(columns::IMPRESSIONS),
            clicks: num(columns::CLICKS),
            cpc: num(columns::CPC),
            ad_orders: num(columns::AD_ORDERS),
            ad_revenue: num(columns::AD_REVENUE),
            refunds: num(columns::REFUNDS),
            cpa: num(columns::CPA),
            acos: parse_percent(index.cell(row, columns::ACOS)),
            ad_spend_by_channel: [None; 4],
            cvr: text(columns::CVR),
            ctr: text(columns::CTR),
        };
        for channel in &schema.ad_channels {
            record.set_ad_spend(*channel, num(channel.column()));
        }
        records.push(record);
    }

    if dropped_dates > 0 {
        warn!(dropped = dropped_dates, "rows without a usable date were dropped");
    }
    let report = LoadReport {
        total_rows: table.rows.len(),
        kept_rows: records.len(),
        dropped_dates,
    };
    info!(
        total = report.total_rows,
        kept = report.kept_rows,
        ad_channels = schema.ad_channels.len(),
        "source table loaded"
    );
    Ok(Dataset {
        records,
        schema,
        report,
    })
}
