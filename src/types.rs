use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::fmt;

/// Localized source column names.
pub mod columns {
    pub const DATE: &str = "日期";
    pub const STORE: &str = "店铺";
    pub const ASIN: &str = "ASIN";
    pub const SKU: &str = "SKU";
    pub const NAME: &str = "品名";
    pub const TITLE: &str = "标题";
    pub const SESSIONS: &str = "Sessions-Total";
    pub const UNITS_SOLD: &str = "销量";
    pub const ORDERS: &str = "订单量";
    pub const CVR: &str = "CVR";
    pub const REVENUE: &str = "销售额";
    pub const DISCOUNTED_REVENUE: &str = "销售额(折后)";
    pub const AVG_ORDER_VALUE: &str = "平均客单价(折后)";
    pub const IMPRESSIONS: &str = "展示";
    pub const CLICKS: &str = "点击";
    pub const CTR: &str = "CTR";
    pub const CPC: &str = "CPC";
    pub const AD_ORDERS: &str = "广告订单量";
    pub const AD_REVENUE: &str = "广告销售额";
    pub const ACOS: &str = "ACOS";
    pub const CPA: &str = "CPA";
    pub const REFUNDS: &str = "退款量";
}

/// Advertising channels that carry their own spend column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AdChannel {
    SponsoredProducts,
    SponsoredDisplay,
    SponsoredBrands,
    SponsoredBrandsVideo,
}

impl AdChannel {
    pub const ALL: [AdChannel; 4] = [
        AdChannel::SponsoredProducts,
        AdChannel::SponsoredDisplay,
        AdChannel::SponsoredBrands,
        AdChannel::SponsoredBrandsVideo,
    ];

    pub fn column(self) -> &'static str {
        match self {
            AdChannel::SponsoredProducts => "花费-SP广告",
            AdChannel::SponsoredDisplay => "花费-SD广告",
            AdChannel::SponsoredBrands => "花费-SB广告",
            AdChannel::SponsoredBrandsVideo => "花费-SBV广告",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// What optional columns the loaded sheet actually has.
///
/// Computed once from the header row; the deriver and the presenter
/// consult it instead of probing each record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    pub ad_channels: Vec<AdChannel>,
    pub has_cpc: bool,
    pub has_cpa: bool,
    pub has_avg_order_value: bool,
}

impl Schema {
    pub fn from_headers<S: AsRef<str>>(headers: &[S]) -> Self {
        let has = |name: &str| headers.iter().any(|h| h.as_ref().trim() == name);
        Schema {
            ad_channels: AdChannel::ALL
                .into_iter()
                .filter(|c| has(c.column()))
                .collect(),
            has_cpc: has(columns::CPC),
            has_cpa: has(columns::CPA),
            has_avg_order_value: has(columns::AVG_ORDER_VALUE),
        }
    }
}

/// One cleaned row of the source sheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pub date: NaiveDate,
    pub store: Option<String>,
    pub product_id: Option<String>,
    pub sku: Option<String>,
    pub name: Option<String>,
    pub title: Option<String>,
    pub sessions: Option<f64>,
    pub units_sold: Option<f64>,
    pub orders: Option<f64>,
    pub revenue: Option<f64>,
    pub discounted_revenue: Option<f64>,
    pub avg_order_value: Option<f64>,
    pub impressions: Option<f64>,
    pub clicks: Option<f64>,
    pub cpc: Option<f64>,
    pub ad_orders: Option<f64>,
    pub ad_revenue: Option<f64>,
    pub refunds: Option<f64>,
    pub cpa: Option<f64>,
    /// Fraction, already parsed; the not-applicable sentinel maps to `None`.
    pub acos: Option<f64>,
    pub ad_spend_by_channel: [Option<f64>; 4],
    /// Shown verbatim.
    pub cvr: Option<String>,
    pub ctr: Option<String>,
}

impl Record {
    pub fn ad_spend(&self, channel: AdChannel) -> Option<f64> {
        self.ad_spend_by_channel[channel.index()]
    }

    pub fn set_ad_spend(&mut self, channel: AdChannel, value: Option<f64>) {
        self.ad_spend_by_channel[channel.index()] = value;
    }

    pub fn period(&self) -> YearMonth {
        YearMonth::of(self.date)
    }
}

/// Calendar month bucket, displayed as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Inclusive date interval; `start <= end` is enforced by the constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> crate::error::Result<Self> {
        if start > end {
            return Err(crate::error::DashboardError::InvalidDateRange { start, end });
        }
        Ok(DateRange { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Values computed from a single record; never stored back into it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DerivedMetrics {
    pub ad_spend: f64,
    pub visitor_conversion_rate: Option<f64>,
    pub ad_conversion_rate: Option<f64>,
    pub acos: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub dropped_dates: usize,
}

/// Immutable snapshot of the source sheet for one session.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<Record>,
    pub schema: Schema,
    pub report: LoadReport,
}

impl Dataset {
    /// Earliest and latest record dates, if any rows survived loading.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.date).min()?;
        let max = self.records.iter().map(|r| r.date).max()?;
        Some((min, max))
    }

    /// Distinct product ids in first-seen order.
    pub fn product_ids(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.records
            .iter()
            .filter_map(|r| r.product_id.as_deref())
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KpiSummary {
    pub total_revenue: f64,
    pub total_ad_spend: f64,
    pub total_sessions: f64,
    pub mean_acos: Option<f64>,
}
