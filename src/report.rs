//! Campaign performance report over a cleaned table.
//!
//! Aggregates follow skip-missing semantics: sums and means ignore missing
//! cells, and a ratio with a zero or missing denominator is itself missing.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use log::info;
use serde::Serialize;

use crate::{
    clean::{self, ACTIVE, CHANNEL, CLICKS, CONVERSIONS, IMPRESSIONS, SPEND, START_DATE},
    cli::{ReportArgs, ReportFormat},
    config::CleanConfig,
    error::CleanError,
    frame::Table,
    io_utils,
    metrics::{self, ratio},
    table,
};

/// Campaign-duration buckets as `(lower, upper]` day ranges.
pub const DURATION_BUCKETS: &[(i64, i64)] = &[(0, 7), (7, 14), (14, 30), (30, 100)];

pub const CORRELATED_COLUMNS: &[&str] = &[SPEND, CLICKS, IMPRESSIONS, CONVERSIONS];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelPerformance {
    pub channel: String,
    pub campaigns: usize,
    pub spend: f64,
    pub clicks: f64,
    pub conversions: f64,
    pub cpa: Option<f64>,
    pub cvr: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationBucket {
    pub label: String,
    pub campaigns: usize,
    pub mean_cpa: Option<f64>,
    pub mean_conversions: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTrend {
    pub month: String,
    pub spend: f64,
    pub conversions: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivitySplit {
    pub active_campaigns: usize,
    pub inactive_campaigns: usize,
    pub active_mean_cpa: Option<f64>,
    pub inactive_mean_cpa: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignReport {
    pub rows: usize,
    pub channels: Vec<ChannelPerformance>,
    pub correlations: CorrelationMatrix,
    pub durations: Vec<DurationBucket>,
    pub monthly: Vec<MonthlyTrend>,
    pub activity: ActivitySplit,
    pub best_channel: Option<String>,
    pub worst_channel: Option<String>,
}

pub fn build_report(
    table: &Table,
    revenue_per_conversion: f64,
) -> Result<CampaignReport, CleanError> {
    let row_metrics = metrics::compute_metrics(table, revenue_per_conversion)?;
    let row_cpa = row_metrics.iter().map(|m| m.cpa).collect::<Vec<_>>();

    let channels = channel_performance(table)?;
    let ranked = channels
        .iter()
        .filter(|c| c.cpa.is_some())
        .collect::<Vec<_>>();
    let best_channel = ranked.first().map(|c| c.channel.clone());
    let worst_channel = ranked.last().map(|c| c.channel.clone());

    let conversions = metrics::numbers(table, CONVERSIONS);
    let durations = DURATION_BUCKETS
        .iter()
        .map(|&(lower, upper)| {
            let rows = row_metrics
                .iter()
                .enumerate()
                .filter(|(_, m)| m.duration_days.is_some_and(|d| d > lower && d <= upper))
                .map(|(row, _)| row)
                .collect::<Vec<_>>();
            DurationBucket {
                label: format!("({lower}, {upper}]"),
                campaigns: rows.len(),
                mean_cpa: mean(rows.iter().map(|&row| row_cpa[row])),
                mean_conversions: mean(rows.iter().map(|&row| conversions[row])),
            }
        })
        .collect();

    let active = table
        .require(ACTIVE)?
        .iter()
        .map(|cell| cell.as_bool().unwrap_or(false))
        .collect::<Vec<_>>();
    let active_campaigns = active.iter().filter(|a| **a).count();
    let activity = ActivitySplit {
        active_campaigns,
        inactive_campaigns: active.len() - active_campaigns,
        active_mean_cpa: mean(
            row_cpa
                .iter()
                .zip(&active)
                .filter(|(_, a)| **a)
                .map(|(cpa, _)| *cpa),
        ),
        inactive_mean_cpa: mean(
            row_cpa
                .iter()
                .zip(&active)
                .filter(|(_, a)| !**a)
                .map(|(cpa, _)| *cpa),
        ),
    };

    Ok(CampaignReport {
        rows: table.row_count(),
        channels,
        correlations: correlation_matrix(table, CORRELATED_COLUMNS),
        durations,
        monthly: monthly_trend(table)?,
        activity,
        best_channel,
        worst_channel,
    })
}

/// Per-channel totals ranked by CPA ascending; channels without a CPA sort last.
pub fn channel_performance(table: &Table) -> Result<Vec<ChannelPerformance>, CleanError> {
    let names = table.require(CHANNEL)?;
    let spend = metrics::numbers(table, SPEND);
    let clicks = metrics::numbers(table, CLICKS);
    let conversions = metrics::numbers(table, CONVERSIONS);

    let mut grouped: BTreeMap<String, ChannelPerformance> = BTreeMap::new();
    for (row, cell) in names.iter().enumerate() {
        let name = cell.as_display();
        let entry = grouped
            .entry(name.clone())
            .or_insert_with(|| ChannelPerformance {
                channel: name,
                campaigns: 0,
                spend: 0.0,
                clicks: 0.0,
                conversions: 0.0,
                cpa: None,
                cvr: None,
            });
        entry.campaigns += 1;
        entry.spend += spend[row].unwrap_or(0.0);
        entry.clicks += clicks[row].unwrap_or(0.0);
        entry.conversions += conversions[row].unwrap_or(0.0);
    }

    let mut channels = grouped
        .into_values()
        .map(|mut c| {
            c.cpa = ratio(Some(c.spend), Some(c.conversions));
            c.cvr = ratio(Some(c.conversions), Some(c.clicks));
            c
        })
        .collect::<Vec<_>>();
    channels.sort_by(|a, b| match (a.cpa, b.cpa) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    Ok(channels)
}

/// Pearson correlation over pairwise-complete rows.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let pairs = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| (*x).zip(*y))
        .collect::<Vec<_>>();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;
    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        cov += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
        var_y += (y - mean_y).powi(2);
    }
    let r = cov / (var_x * var_y).sqrt();
    r.is_finite().then_some(r.clamp(-1.0, 1.0))
}

pub fn correlation_matrix(table: &Table, columns: &[&str]) -> CorrelationMatrix {
    let series = columns
        .iter()
        .map(|name| metrics::numbers(table, name))
        .collect::<Vec<_>>();
    let values = series
        .iter()
        .enumerate()
        .map(|(i, xs)| {
            series
                .iter()
                .enumerate()
                .map(|(j, ys)| {
                    let r = pearson(xs, ys);
                    if i == j { r.map(|_| 1.0) } else { r }
                })
                .collect()
        })
        .collect();
    CorrelationMatrix {
        columns: columns.iter().map(|c| c.to_string()).collect(),
        values,
    }
}

/// Spend and conversions per campaign start month (`YYYY-MM`).
pub fn monthly_trend(table: &Table) -> Result<Vec<MonthlyTrend>, CleanError> {
    let starts = table.require(START_DATE)?;
    let spend = metrics::numbers(table, SPEND);
    let conversions = metrics::numbers(table, CONVERSIONS);
    let mut months: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for (row, cell) in starts.iter().enumerate() {
        if let Some(date) = cell.as_date() {
            let totals = months.entry(date.format("%Y-%m").to_string()).or_default();
            totals.0 += spend[row].unwrap_or(0.0);
            totals.1 += conversions[row].unwrap_or(0.0);
        }
    }
    Ok(months
        .into_iter()
        .map(|(month, (spend, conversions))| MonthlyTrend {
            month,
            spend,
            conversions,
        })
        .collect())
}

fn mean(values: impl Iterator<Item = Option<f64>>) -> Option<f64> {
    let (sum, count) = values
        .flatten()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.precision$}"))
}

fn headers(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

pub fn render_text(report: &CampaignReport) -> String {
    let mut out = String::new();

    out.push_str("Channel performance\n");
    let rows = report
        .channels
        .iter()
        .map(|c| {
            vec![
                c.channel.clone(),
                c.campaigns.to_string(),
                format!("{:.2}", c.spend),
                format!("{:.0}", c.clicks),
                format!("{:.0}", c.conversions),
                fmt_opt(c.cpa, 2),
                fmt_opt(c.cvr, 4),
            ]
        })
        .collect::<Vec<_>>();
    out.push_str(&table::render_table(
        &headers(&["channel", "campaigns", "spend", "clicks", "conversions", "cpa", "cvr"]),
        &rows,
    ));

    out.push_str("\nCorrelations\n");
    let mut corr_headers = vec![String::new()];
    corr_headers.extend(report.correlations.columns.iter().cloned());
    let rows = report
        .correlations
        .columns
        .iter()
        .zip(&report.correlations.values)
        .map(|(name, values)| {
            let mut row = vec![name.clone()];
            row.extend(values.iter().map(|v| fmt_opt(*v, 3)));
            row
        })
        .collect::<Vec<_>>();
    out.push_str(&table::render_table(&corr_headers, &rows));

    out.push_str("\nCampaign duration vs performance\n");
    let rows = report
        .durations
        .iter()
        .map(|d| {
            vec![
                d.label.clone(),
                d.campaigns.to_string(),
                fmt_opt(d.mean_cpa, 2),
                fmt_opt(d.mean_conversions, 2),
            ]
        })
        .collect::<Vec<_>>();
    out.push_str(&table::render_table(
        &headers(&["duration_days", "campaigns", "mean_cpa", "mean_conversions"]),
        &rows,
    ));

    out.push_str("\nMonthly trend\n");
    let rows = report
        .monthly
        .iter()
        .map(|m| {
            vec![
                m.month.clone(),
                format!("{:.2}", m.spend),
                format!("{:.0}", m.conversions),
            ]
        })
        .collect::<Vec<_>>();
    out.push_str(&table::render_table(
        &headers(&["month", "spend", "conversions"]),
        &rows,
    ));

    out.push_str("\nKey insights\n");
    let channel_cpa = |name: &Option<String>| {
        name.as_ref().and_then(|name| {
            report
                .channels
                .iter()
                .find(|c| &c.channel == name)
                .and_then(|c| c.cpa)
        })
    };
    out.push_str(&format!(
        "Most efficient channel (lowest CPA): {} ({})\n",
        report.best_channel.as_deref().unwrap_or("-"),
        fmt_opt(channel_cpa(&report.best_channel), 2)
    ));
    out.push_str(&format!(
        "Least efficient channel (highest CPA): {} ({})\n",
        report.worst_channel.as_deref().unwrap_or("-"),
        fmt_opt(channel_cpa(&report.worst_channel), 2)
    ));
    let unranked = report
        .channels
        .iter()
        .filter(|c| c.cpa.is_none())
        .map(|c| c.channel.as_str())
        .collect::<Vec<_>>();
    if !unranked.is_empty() {
        out.push_str(&format!(
            "Excluded from ranking (no conversions): {}\n",
            unranked.join(", ")
        ));
    }
    out.push_str(&format!(
        "Active campaigns: {} (avg CPA {})\n",
        report.activity.active_campaigns,
        fmt_opt(report.activity.active_mean_cpa, 2)
    ));
    out.push_str(&format!(
        "Inactive campaigns: {} (avg CPA {})\n",
        report.activity.inactive_campaigns,
        fmt_opt(report.activity.inactive_mean_cpa, 2)
    ));
    out
}

pub fn execute(args: &ReportArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let config = CleanConfig::load_or_default(args.config.as_deref())?;
    let (table, _summary) = clean::load_clean_table(&args.input, delimiter, encoding, &config)?;
    let report = build_report(&table, config.revenue_per_conversion)
        .with_context(|| format!("Building report for {:?}", args.input))?;
    match args.format {
        ReportFormat::Text => print!("{}", render_text(&report)),
        ReportFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Serializing report")?
        ),
    }
    info!(
        "Reported on {} campaign(s) across {} channel(s)",
        report.rows,
        report.channels.len()
    );
    Ok(())
}
