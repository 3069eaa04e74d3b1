//! Plain-text summaries: category breakdowns, property-value statistics and the final report.

use std::{fmt::Write, path::Path};

use anyhow::{Context, Result};
use log::{info, warn};
use polars::prelude::{
    col, len, DataFrame, DataType, IntoColumn, IntoLazy, PolarsResult, SortMultipleOptions, StringChunked,
};

use crate::{
    common::stats::Summary,
    layer::PointLayer,
    metrics::buffer_column,
    types::Party,
};

/// Files produced by the analysis stage, in the order they are written.
pub const ANALYSIS_FILES: [&str; 8] = [
    "analysis_1_urban_rural_classification.csv",
    "analysis_2_school_buffers.csv",
    "analysis_2_sample_schools.geojson",
    "analysis_3_age_demographics.csv",
    "analysis_4_distance_to_centers.csv",
    "analysis_4_county_centers.geojson",
    "analysis_5_registration_patterns.csv",
    "spatial_analysis_summary_report.txt",
];

/// Occurrences of each non-null value of a string column, most frequent first
/// (ties keep first-seen order). `None` when the column is absent.
pub fn category_counts(layer: &PointLayer, column: &str) -> Option<Vec<(String, usize)>> {
    let values = layer.str_column(column).ok()?;
    match value_counts(values) {
        Ok(counts) => Some(counts),
        Err(e) => {
            warn!("[report::category_counts] Failed to count {column:?}: {e}");
            None
        }
    }
}

fn value_counts(values: &StringChunked) -> PolarsResult<Vec<(String, usize)>> {
    let counts = DataFrame::new(vec![values.clone().with_name("value".into()).into_column()])?
        .lazy()
        .filter(col("value").is_not_null())
        .group_by_stable([col("value")])
        .agg([len().cast(DataType::UInt64).alias("count")])
        .sort(["count"], SortMultipleOptions::default().with_order_descending(true).with_maintain_order(true))
        .collect()?;

    let names = counts.column("value")?.str()?;
    let totals = counts.column("count")?.u64()?;
    Ok(names.into_iter().zip(totals)
        .filter_map(|(name, n)| Some((name?.to_string(), n? as usize)))
        .collect())
}

/// Non-null `parcel_value`s, optionally restricted to rows where `keep` holds.
fn parcel_values(layer: &PointLayer, keep: impl Fn(usize) -> bool) -> Vec<f64> {
    let Ok(values) = layer.data().column("parcel_value").and_then(|c| c.f64().cloned()) else {
        return Vec::new();
    };
    values.into_iter().enumerate()
        .filter_map(|(row, value)| value.filter(|_| keep(row)))
        .collect()
}

/// Statistics of `parcel_value` over all voters with a value.
pub fn value_summary(layer: &PointLayer) -> Option<Summary> {
    Summary::of(&parcel_values(layer, |_| true))
}

/// Statistics of `parcel_value` for each main party that has at least one value.
pub fn party_value_stats(layer: &PointLayer, party_column: &str) -> Vec<(Party, Summary)> {
    let Ok(parties) = layer.str_column(party_column) else { return Vec::new() };
    let parties = parties.into_iter()
        .map(|code| code.map(Party::from_code))
        .collect::<Vec<_>>();
    Party::main().into_iter()
        .filter_map(|party| {
            let values = parcel_values(layer, |row| parties[row] == Some(party));
            Summary::of(&values).map(|summary| (party, summary))
        })
        .collect()
}

/// Log per-party value statistics under a heading such as a county name.
pub fn log_party_value_stats(label: &str, layer: &PointLayer, party_column: &str) {
    let stats = party_value_stats(layer, party_column);
    if stats.is_empty() {
        info!("{label}: no property values to summarize by party");
        return;
    }
    info!("{label}: property values by party");
    for (party, s) in stats {
        info!(
            "  {}: count={} mean={:.2} median={:.2} std={:.2} min={:.2} max={:.2}",
            party.to_str(), s.count, s.mean, s.median, s.std, s.min, s.max
        );
    }
}

/// `1234567` -> `1,234,567`.
pub fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 { out.push(',') }
        out.push(c);
    }
    out
}

/// `1234.5` -> `$1,234.50`.
pub fn dollars(value: f64) -> String {
    if !value.is_finite() { return "n/a".to_string() }
    let cents = (value.abs() * 100.0).round() as u64;
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}${}.{:02}", thousands((cents / 100) as usize), cents % 100)
}

#[inline]
fn percent(count: usize, total: usize) -> f64 {
    if total == 0 { 0.0 } else { count as f64 / total as f64 * 100.0 }
}

fn write_counts(out: &mut String, indent: &str, counts: &[(String, usize)], total: usize) -> std::fmt::Result {
    for (value, count) in counts {
        writeln!(out, "{indent}{value}: {} ({:.1}%)", thousands(*count), percent(*count, total))?;
    }
    Ok(())
}

/// Render the summary report for a fully analysed layer.
pub fn render_summary(layer: &PointLayer, party_column: &str, buffer_radii: &[f64]) -> Result<String> {
    let total = layer.len();
    let mut out = String::new();

    writeln!(out, "SPATIAL ANALYSIS SUMMARY")?;
    writeln!(out, "{}\n", "=".repeat(60))?;
    writeln!(out, "Total Voters Analyzed: {}", thousands(total))?;
    let counties = category_counts(layer, "county").unwrap_or_default();
    let mut names = Vec::new();
    if let Ok(county) = layer.str_column("county") {
        for name in county.into_iter().flatten() {
            if !names.contains(&name) { names.push(name) }
        }
    }
    writeln!(out, "Counties: {}\n", names.join(", "))?;

    writeln!(out, "OVERALL POLITICAL BREAKDOWN:")?;
    write_counts(&mut out, "  ", &category_counts(layer, party_column).unwrap_or_default(), total)?;
    writeln!(out)?;

    if let Some(s) = value_summary(layer) {
        writeln!(out, "PROPERTY VALUE SUMMARY:")?;
        writeln!(out, "  Mean: {}", dollars(s.mean))?;
        writeln!(out, "  Median: {}", dollars(s.median))?;
        writeln!(out, "  Min: {}", dollars(s.min))?;
        writeln!(out, "  Max: {}\n", dollars(s.max))?;

        writeln!(out, "PROPERTY VALUE BY PARTY:")?;
        for (party, s) in party_value_stats(layer, party_column) {
            writeln!(
                out, "  {}: {} parcels, mean {}, median {}",
                party.to_str(), thousands(s.count), dollars(s.mean), dollars(s.median)
            )?;
        }
        writeln!(out)?;
    }

    writeln!(out, "KEY FINDINGS BY ANALYSIS:\n")?;
    let sections = [
        ("1. URBAN/RURAL CLASSIFICATION:", "urban_rural"),
        ("3. AGE DEMOGRAPHICS:", "age_group"),
        ("4. DISTANCE TO COUNTY CENTERS:", "distance_category"),
        ("5. REGISTRATION PATTERNS:", "registration_period"),
    ];
    for (i, (title, column)) in sections.iter().enumerate() {
        writeln!(out, "{title}")?;
        if let Some(counts) = category_counts(layer, column) {
            write_counts(&mut out, "   - ", &counts, total)?;
        }
        writeln!(out)?;

        if i == 0 {
            writeln!(out, "2. SCHOOL BUFFER ANALYSIS:")?;
            for &radius in buffer_radii {
                let Ok(flags) = layer.data().column(&buffer_column(radius)).and_then(|c| c.bool().cloned()) else {
                    continue;
                };
                let within = flags.into_iter().filter(|f| *f == Some(true)).count();
                writeln!(
                    out, "   - Within {radius} ft of schools: {} ({:.1}%)",
                    thousands(within), percent(within, total)
                )?;
            }
            writeln!(out)?;
        }
    }

    if counties.len() > 1 {
        writeln!(out, "VOTERS BY COUNTY:")?;
        write_counts(&mut out, "  ", &counties, total)?;
        writeln!(out)?;
    }

    writeln!(out, "FILES CREATED:")?;
    for file in ANALYSIS_FILES {
        writeln!(out, "- {file}")?;
    }
    Ok(out)
}

/// Render and write the summary report.
pub fn write_summary_report(path: &Path, layer: &PointLayer, party_column: &str, buffer_radii: &[f64]) -> Result<()> {
    let text = render_summary(layer, party_column, buffer_radii)?;
    std::fs::write(path, text)
        .with_context(|| format!("[report::write_summary_report] Failed to write {}", path.display()))?;
    info!("Summary report saved: {}", path.display());
    Ok(())
}
