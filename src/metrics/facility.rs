use anyhow::{Context, Result};
use geo::{Distance, Euclidean, Point};
use log::info;
use polars::prelude::*;

use crate::layer::PointLayer;

/// Name of the flag column for a buffer radius, e.g. `within_1000ft_school`.
pub fn buffer_column(radius: f64) -> String {
    format!("within_{radius}ft_school")
}

/// Sample facility sites from the densest voters.
///
/// The `candidates` highest `density_score` rows are taken (ties keep input
/// order) and every `stride`-th of them becomes a facility with a
/// `school_id` and, when present, the voter's `county`.
pub fn sample_facilities(layer: &PointLayer, candidates: usize, stride: usize) -> Result<PointLayer> {
    let scores = layer.data().column("density_score")
            .context("[metrics::sample_facilities] density_score has not been computed")?
        .cast(&DataType::Float64)?;
    let scores = scores.f64()?;

    let mut order = (0..layer.len()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| {
        let (a, b) = (scores.get(a).unwrap_or(f64::NEG_INFINITY), scores.get(b).unwrap_or(f64::NEG_INFINITY));
        b.total_cmp(&a)
    });

    let picked = order.into_iter()
        .take(candidates)
        .enumerate()
        .filter(|(i, _)| i % stride.max(1) == 0)
        .map(|(_, row)| row)
        .collect::<Vec<_>>();

    let points = picked.iter().map(|&row| layer.points()[row]).collect::<Vec<_>>();
    let ids = (1..=picked.len()).map(|n| format!("School_{n}")).collect::<Vec<_>>();
    let mut columns = vec![Column::new("school_id".into(), ids)];
    if layer.has_column("county") {
        let county = layer.str_column("county")?;
        columns.push(Column::new(
            "county".into(),
            picked.iter().map(|&row| county.get(row)).collect::<Vec<_>>(),
        ));
    }

    info!("Created {} sample facilities from the {candidates} densest voters", picked.len());
    PointLayer::from_columns(points, columns, layer.epsg())
}

/// True where `point` is strictly closer than `radius` to any facility.
pub fn within_any(points: &[Point<f64>], facilities: &[Point<f64>], radius: f64) -> Vec<bool> {
    points.iter()
        .map(|p| facilities.iter().any(|f| Euclidean.distance(p, f) < radius))
        .collect()
}

/// Add one `within_<r>ft_school` column per radius. Returns the flagged count per radius.
pub fn add_buffer_flags(layer: &mut PointLayer, facilities: &[Point<f64>], radii: &[f64]) -> Result<Vec<usize>> {
    let mut counts = Vec::with_capacity(radii.len());
    for &radius in radii {
        let flags = within_any(layer.points(), facilities, radius);
        let count = flags.iter().filter(|&&f| f).count();
        info!("Voters within {radius} ft of a facility: {count}");
        layer.set_column(Column::new(buffer_column(radius).into(), flags))?;
        counts.push(count);
    }
    Ok(counts)
}
