//! Traffic vs. conversion chart.
//!
//! Builds a Plotly-compatible figure: sessions and clicks as lines on the
//! left axis, both conversion rates as bars on a right percentage axis,
//! plus a dotted trailing moving average of each rate.

use crate::metrics::{ad_conversion_rate, visitor_conversion_rate};
use crate::types::Record;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

pub const MOVING_AVERAGE_WINDOW: usize = 30;

/// Trailing mean over `window` points. Positions with fewer than `window`
/// points so far are `None`; partial windows are never averaged.
pub fn trailing_moving_average(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    let mut out = Vec::with_capacity(values.len());
    let mut running = 0.0;
    for (i, v) in values.iter().enumerate() {
        running += v;
        if i >= window {
            running -= values[i - window];
        }
        if i + 1 >= window {
            out.push(Some(running / window as f64));
        } else {
            out.push(None);
        }
    }
    out
}

/// One day of cleaned chart input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub sessions: f64,
    pub clicks: f64,
    pub visitor_conversion_rate: f64,
    pub ad_conversion_rate: f64,
}

#[derive(Default)]
struct DayTotals {
    sessions: f64,
    units_sold: f64,
    clicks: f64,
    ad_orders: f64,
}

/// Keep rows where sessions, clicks and both rates are defined, merge rows
/// that share a date, and return them in date order.
pub fn daily_series(records: &[&Record]) -> Vec<DailyPoint> {
    let mut days: BTreeMap<NaiveDate, DayTotals> = BTreeMap::new();
    let mut skipped = 0usize;
    for r in records {
        let usable = r.sessions.is_some()
            && r.clicks.is_some()
            && visitor_conversion_rate(r).is_some()
            && ad_conversion_rate(r).is_some();
        if !usable {
            skipped += 1;
            continue;
        }
        let day = days.entry(r.date).or_default();
        day.sessions += r.sessions.unwrap_or(0.0);
        day.units_sold += r.units_sold.unwrap_or(0.0);
        day.clicks += r.clicks.unwrap_or(0.0);
        day.ad_orders += r.ad_orders.unwrap_or(0.0);
    }
    debug!(days = days.len(), skipped, "chart series cleaned");
    days.into_iter()
        .map(|(date, t)| DailyPoint {
            date,
            sessions: t.sessions,
            clicks: t.clicks,
            visitor_conversion_rate: t.units_sold / t.sessions,
            ad_conversion_rate: t.ad_orders / t.clicks,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineStyle {
    pub dash: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: String,
    /// Serialized as `YYYY-MM-DD`, which Plotly reads as a date axis.
    pub x: Vec<NaiveDate>,
    pub y: Vec<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<LineStyle>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub title: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlaying: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<&'static str>,
    #[serde(rename = "tickformat", skip_serializing_if = "Option::is_none")]
    pub tick_format: Option<&'static str>,
}

impl Axis {
    fn plain(title: &'static str) -> Self {
        Axis {
            title,
            overlaying: None,
            side: None,
            tick_format: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub orientation: &'static str,
    pub yanchor: &'static str,
    pub y: f64,
    pub xanchor: &'static str,
    pub x: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Layout {
    pub title: &'static str,
    pub height: u32,
    pub xaxis: Axis,
    pub yaxis: Axis,
    pub yaxis2: Axis,
    pub legend: Legend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartOutcome {
    Ready(Figure),
    InsufficientData,
}

fn line(name: &str, x: &[NaiveDate], y: Vec<Option<f64>>) -> Trace {
    Trace {
        kind: "scatter",
        name: name.to_string(),
        x: x.to_vec(),
        y,
        mode: Some("lines+markers"),
        yaxis: None,
        line: None,
    }
}

fn bar(name: &str, x: &[NaiveDate], y: Vec<Option<f64>>) -> Trace {
    Trace {
        kind: "bar",
        name: name.to_string(),
        x: x.to_vec(),
        y,
        mode: None,
        yaxis: Some("y2"),
        line: None,
    }
}

fn dotted(name: &str, x: &[NaiveDate], y: Vec<Option<f64>>) -> Trace {
    Trace {
        kind: "scatter",
        name: name.to_string(),
        x: x.to_vec(),
        y,
        mode: None,
        yaxis: Some("y2"),
        line: Some(LineStyle { dash: "dot" }),
    }
}

pub fn build_conversion_chart(records: &[&Record]) -> ChartOutcome {
    let series = daily_series(records);
    if series.is_empty() {
        info!("not enough data to draw the conversion chart");
        return ChartOutcome::InsufficientData;
    }

    let x: Vec<NaiveDate> = series.iter().map(|p| p.date).collect();
    let visitor: Vec<f64> = series.iter().map(|p| p.visitor_conversion_rate).collect();
    let ad: Vec<f64> = series.iter().map(|p| p.ad_conversion_rate).collect();
    let wrap = |v: &[f64]| v.iter().copied().map(Some).collect::<Vec<_>>();

    let data = vec![
        line("访客", &x, series.iter().map(|p| Some(p.sessions)).collect()),
        line("点击", &x, series.iter().map(|p| Some(p.clicks)).collect()),
        bar("访客转化率", &x, wrap(&visitor)),
        bar("广告转化率", &x, wrap(&ad)),
        dotted(
            "访客转化率-30MA",
            &x,
            trailing_moving_average(&visitor, MOVING_AVERAGE_WINDOW),
        ),
        dotted(
            "广告转化率-30MA",
            &x,
            trailing_moving_average(&ad, MOVING_AVERAGE_WINDOW),
        ),
    ];
    let layout = Layout {
        title: "访客 & 点击 vs 转化率",
        height: 600,
        xaxis: Axis::plain("日期"),
        yaxis: Axis::plain("流量"),
        yaxis2: Axis {
            title: "转化率",
            overlaying: Some("y"),
            side: Some("right"),
            tick_format: Some(".0%"),
        },
        legend: Legend {
            orientation: "h",
            yanchor: "bottom",
            y: 1.02,
            xanchor: "center",
            x: 0.5,
        },
    };
    ChartOutcome::Ready(Figure { data, layout })
}
