//! The two dashboards as configurations of one pipeline.
//!
//! filter -> (empty? stop) -> KPIs -> monthly summaries -> detail table ->
//! chart. Each dashboard only chooses which of those steps run and which
//! columns and labels it shows.

use crate::chart::{build_conversion_chart, ChartOutcome};
use crate::filter::{FilterCriteria, SearchField};
use crate::metrics::summarize;
use crate::presenter::{detail_table, monthly_table, Band, DetailColumn, DetailField, DetailLayout, DisplayTable};
use crate::reports::{monthly_summary, MonthlyLayout};
use crate::types::{Dataset, KpiSummary, Record};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardKind {
    /// Daily detail, KPIs and chart for a single ASIN.
    AsinDaily,
    /// Monthly product summaries plus daily detail, searchable by keyword.
    ProductMonthly,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub kind: DashboardKind,
    pub title: &'static str,
    pub search_fields: Vec<SearchField>,
    pub show_kpis: bool,
    pub show_chart: bool,
    pub monthly: Vec<MonthlyLayout>,
    pub detail_title: &'static str,
    pub detail: DetailLayout,
}

const fn col(field: DetailField, label: &'static str) -> DetailColumn {
    DetailColumn { field, label }
}

impl DashboardConfig {
    pub fn asin_daily() -> Self {
        use DetailField::*;
        DashboardConfig {
            kind: DashboardKind::AsinDaily,
            title: "ASIN 日报数据分析面板",
            search_fields: SearchField::DEFAULT.to_vec(),
            show_kpis: true,
            show_chart: true,
            monthly: Vec::new(),
            detail_title: "每日维度数据明细",
            detail: DetailLayout {
                bands: vec![
                    Band { label: "整体数据".into(), span: 9 },
                    Band { label: "广告数据".into(), span: 10 },
                ],
                columns: vec![
                    col(Date, "日期"),
                    col(Store, "店铺"),
                    col(Sessions, "访客数"),
                    col(UnitsSold, "销量"),
                    col(Orders, "订单数"),
                    col(VisitorConversionRate, "访客转化率"),
                    col(Cvr, "转化率"),
                    col(Revenue, "销售额"),
                    col(AvgOrderValue, "客单价(折后)"),
                    col(Impressions, "Impressions"),
                    col(Clicks, "Click"),
                    col(Ctr, "CTR"),
                    col(Cpc, "CPC-SP"),
                    col(AdOrders, "广告订单"),
                    col(AdRevenue, "广告销售额"),
                    col(AdConversionRate, "CR"),
                    col(AdSpend, "广告花费"),
                    col(Cpa, "CPA"),
                    col(Acos, "ACOS"),
                ],
                sort_by_date: false,
            },
        }
    }

    pub fn product_monthly() -> Self {
        use DetailField::*;
        DashboardConfig {
            kind: DashboardKind::ProductMonthly,
            title: "产品历史销量数据看板",
            search_fields: SearchField::DEFAULT.to_vec(),
            show_kpis: false,
            show_chart: false,
            monthly: vec![MonthlyLayout::by_product(), MonthlyLayout::by_product_and_asin()],
            detail_title: "按日维度的数据明细",
            detail: DetailLayout {
                bands: Vec::new(),
                columns: vec![
                    col(Date, "日期"),
                    col(Sessions, "访客"),
                    col(UnitsSold, "销量"),
                    col(Orders, "订单数"),
                    col(VisitorConversionRate, "访客转化率"),
                    col(Cvr, "CVR"),
                    col(Revenue, "销售额"),
                    col(AvgOrderValue, "客单价(折后)"),
                    col(Impressions, "Impressions"),
                    col(Clicks, "Click"),
                    col(Ctr, "CTR"),
                    col(Cpc, "CPC-SP"),
                    col(AdOrders, "广告订单"),
                    col(AdRevenue, "广告销售额"),
                    col(AdConversionRate, "CR"),
                    col(AdSpend, "广告花费"),
                    col(Acos, "ACOS"),
                ],
                sort_by_date: true,
            },
        }
    }

    pub fn for_kind(kind: DashboardKind) -> Self {
        match kind {
            DashboardKind::AsinDaily => Self::asin_daily(),
            DashboardKind::ProductMonthly => Self::product_monthly(),
        }
    }

    /// Download name for the detail CSV.
    pub fn export_file_name(&self, criteria: &FilterCriteria) -> String {
        match self.kind {
            DashboardKind::AsinDaily => format!(
                "ASIN日报_{}.csv",
                criteria.product_id.as_deref().unwrap_or("全部")
            ),
            DashboardKind::ProductMonthly => "日度明细.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TitledTable {
    pub title: &'static str,
    pub table: DisplayTable,
}

/// Everything one dashboard shows for a non-empty selection.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardReport {
    pub title: &'static str,
    pub selected_rows: usize,
    pub kpis: Option<KpiSummary>,
    pub monthly: Vec<TitledTable>,
    pub detail: TitledTable,
    pub chart: Option<ChartOutcome>,
    pub export_file_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardView {
    /// The selection matched nothing; nothing else was computed.
    NoData,
    Ready(Box<DashboardReport>),
}

pub fn run(config: &DashboardConfig, dataset: &Dataset, criteria: &FilterCriteria) -> DashboardView {
    let selected: Vec<&Record> = criteria.apply_with_fields(&dataset.records, &config.search_fields);
    if selected.is_empty() {
        warn!(dashboard = config.title, "no rows match the current selection");
        return DashboardView::NoData;
    }
    info!(dashboard = config.title, rows = selected.len(), "selection filtered");

    let kpis = config
        .show_kpis
        .then(|| summarize(&selected, &dataset.schema));
    let monthly = config
        .monthly
        .iter()
        .map(|layout| TitledTable {
            title: layout.title,
            table: monthly_table(&monthly_summary(&selected, &layout.keys, &layout.measures()), layout),
        })
        .collect();
    let detail = TitledTable {
        title: config.detail_title,
        table: detail_table(&selected, &dataset.schema, &config.detail),
    };
    let chart = config.show_chart.then(|| build_conversion_chart(&selected));

    DashboardView::Ready(Box::new(DashboardReport {
        title: config.title,
        selected_rows: selected.len(),
        kpis,
        monthly,
        detail,
        chart,
        export_file_name: config.export_file_name(criteria),
    }))
}
