//! Per-campaign efficiency metrics derived from a cleaned table.
//!
//! Every ratio is missing when an operand is missing or the result is not
//! finite (division by zero included).

use anyhow::Result;
use serde::Serialize;

use crate::{
    clean::{CLICKS, CONVERSIONS, END_DATE, SPEND, START_DATE},
    data::Value,
    error::CleanError,
    frame::Table,
};

pub const CPC: &str = "cpc";
pub const CPA: &str = "cpa";
pub const CVR: &str = "cvr";
pub const ROI: &str = "roi";
pub const DURATION_DAYS: &str = "duration_days";

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CampaignMetrics {
    pub cpc: Option<f64>,
    pub cpa: Option<f64>,
    pub cvr: Option<f64>,
    pub roi: Option<f64>,
    pub duration_days: Option<i64>,
}

pub fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let value = numerator? / denominator?;
    value.is_finite().then_some(value)
}

/// Numeric view of a column; absent columns read as all-missing.
pub fn numbers(table: &Table, name: &str) -> Vec<Option<f64>> {
    match table.column(name) {
        Some(cells) => cells.iter().map(Value::as_number).collect(),
        None => vec![None; table.row_count()],
    }
}

pub fn compute_metrics(
    table: &Table,
    revenue_per_conversion: f64,
) -> Result<Vec<CampaignMetrics>, CleanError> {
    let spend = numbers(table, SPEND);
    let clicks = numbers(table, CLICKS);
    let conversions = numbers(table, CONVERSIONS);
    let starts = table.require(START_DATE)?;
    let ends = table.require(END_DATE)?;

    Ok((0..table.row_count())
        .map(|row| {
            let revenue = conversions[row].map(|c| c * revenue_per_conversion);
            CampaignMetrics {
                cpc: ratio(spend[row], clicks[row]),
                cpa: ratio(spend[row], conversions[row]),
                cvr: ratio(conversions[row], clicks[row]),
                roi: ratio(
                    revenue.zip(spend[row]).map(|(revenue, spend)| revenue - spend),
                    spend[row],
                ),
                duration_days: starts[row]
                    .as_date()
                    .zip(ends[row].as_date())
                    .map(|(start, end)| (end - start).num_days()),
            }
        })
        .collect())
}

/// Appends `cpc`, `cpa`, `cvr`, `roi` and `duration_days` columns, replacing
/// any left over from an earlier run.
pub fn append_metrics(table: &mut Table, revenue_per_conversion: f64) -> Result<()> {
    let metrics = compute_metrics(table, revenue_per_conversion)?;
    let number = |value: Option<f64>| value.map_or(Value::Missing, Value::Number);
    let columns: [(&str, fn(&CampaignMetrics) -> Option<f64>); 5] = [
        (CPC, |m| m.cpc),
        (CPA, |m| m.cpa),
        (CVR, |m| m.cvr),
        (ROI, |m| m.roi),
        (DURATION_DAYS, |m| m.duration_days.map(|days| days as f64)),
    ];
    for (name, extract) in columns {
        let cells = metrics.iter().map(|m| number(extract(m))).collect();
        table.set_column(name, cells)?;
    }
    Ok(())
}
