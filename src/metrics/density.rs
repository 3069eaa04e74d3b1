use anyhow::Result;
use geo::Point;
use log::{debug, info};
use polars::prelude::*;
use rayon::prelude::*;
use rstar::RTree;
use serde::Deserialize;

use crate::{common::stats, layer::PointLayer};

/// How neighbor counts are computed. Both give identical results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DensityMethod {
    /// Compare every pair of points.
    Scan,
    /// Query an R-tree of all points.
    Index,
}

/// Density tier of a voter relative to the whole distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrbanRural {
    Urban,
    Suburban,
    Rural,
}

impl UrbanRural {
    pub fn to_str(&self) -> &'static str {
        match self {
            UrbanRural::Urban => "Urban",
            UrbanRural::Suburban => "Suburban",
            UrbanRural::Rural => "Rural",
        }
    }
}

#[inline]
fn distance(a: &Point<f64>, b: &Point<f64>) -> f64 {
    ((a.x() - b.x()).powi(2) + (a.y() - b.y()).powi(2)).sqrt()
}

#[inline]
fn is_neighbor(d: f64, radius: f64) -> bool { d > 0.0 && d <= radius }

fn counts_by_scan(points: &[Point<f64>], radius: f64) -> Vec<u32> {
    points.par_iter()
        .map(|p| points.iter().filter(|q| is_neighbor(distance(p, q), radius)).count() as u32)
        .collect()
}

fn counts_by_index(points: &[Point<f64>], radius: f64) -> Vec<u32> {
    let tree = RTree::bulk_load(points.iter().map(|p| [p.x(), p.y()]).collect::<Vec<_>>());
    // Candidates come from a slightly larger circle; the exact test below decides.
    let search = (radius * (1.0 + 1e-9)).powi(2);
    points.par_iter()
        .map(|p| {
            tree.locate_within_distance([p.x(), p.y()], search)
                .filter(|q| is_neighbor(distance(p, &Point::new(q[0], q[1])), radius))
                .count() as u32
        })
        .collect()
}

/// For each point, the number of other points at distance `0 < d <= radius`.
/// Coincident points do not count as neighbors.
pub fn neighbor_counts(points: &[Point<f64>], radius: f64, method: DensityMethod) -> Vec<u32> {
    debug!("Counting neighbors within {radius} of {} points ({method:?})", points.len());
    match method {
        DensityMethod::Scan => counts_by_scan(points, radius),
        DensityMethod::Index => counts_by_index(points, radius),
    }
}

/// Tier each score against the 25th and 75th percentiles of all scores.
/// Scores at or below p25 are Rural, even when p25 equals p75.
pub fn classify(scores: &[f64]) -> Vec<UrbanRural> {
    let p75 = stats::percentile(scores, 75.0);
    let p25 = stats::percentile(scores, 25.0);
    scores.iter()
        .map(|&s| if s <= p25 {
            UrbanRural::Rural
        } else if s >= p75 {
            UrbanRural::Urban
        } else {
            UrbanRural::Suburban
        })
        .collect()
}

/// Add `density_score` and `urban_rural`.
pub fn add_urban_rural(layer: &mut PointLayer, radius: f64, method: DensityMethod) -> Result<()> {
    let counts = neighbor_counts(layer.points(), radius, method);
    let scores = counts.iter().map(|&c| c as f64).collect::<Vec<_>>();
    let tiers = classify(&scores);
    info!(
        "Density thresholds: rural <= {:.1}, urban >= {:.1}",
        stats::percentile(&scores, 25.0), stats::percentile(&scores, 75.0)
    );

    layer.set_column(Column::new("density_score".into(), counts))?;
    layer.set_column(Column::new(
        "urban_rural".into(),
        tiers.iter().map(UrbanRural::to_str).collect::<Vec<_>>(),
    ))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> Vec<Point<f64>> {
        let mut points = Vec::new();
        for i in 0..12 {
            for j in 0..9 {
                points.push(Point::new(i as f64 * 700.0 + (j % 3) as f64 * 13.0, j as f64 * 650.0));
            }
        }
        points.push(Point::new(0.0, 0.0)); // coincident with the first point
        points.push(Point::new(2000.0, 0.0)); // exactly on the radius of the origin
        points
    }

    #[test]
    fn scan_and_index_agree() {
        let points = grid();
        assert_eq!(
            neighbor_counts(&points, 2000.0, DensityMethod::Scan),
            neighbor_counts(&points, 2000.0, DensityMethod::Index),
        );
    }

    #[test]
    fn coincident_points_are_not_neighbors_and_radius_is_inclusive() {
        let points = vec![Point::new(0.0, 0.0), Point::new(0.0, 0.0), Point::new(2000.0, 0.0), Point::new(2000.1, 0.0)];
        for method in [DensityMethod::Scan, DensityMethod::Index] {
            assert_eq!(neighbor_counts(&points, 2000.0, method), vec![1, 1, 3, 1]);
        }
    }

    #[test]
    fn tiers_use_inclusive_percentiles() {
        // p25 = 2.0, p75 = 4.0
        let tiers = classify(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(tiers, vec![
            UrbanRural::Rural, UrbanRural::Rural, UrbanRural::Suburban, UrbanRural::Urban, UrbanRural::Urban,
        ]);
    }

    #[test]
    fn uniform_scores_are_rural() {
        assert!(classify(&[3.0; 4]).iter().all(|&t| t == UrbanRural::Rural));
    }

    #[test]
    fn adds_columns() {
        let mut layer = PointLayer::from_columns(
            vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0), Point::new(9000.0, 0.0)],
            vec![Column::new("party_cd".into(), &["DEM", "REP", "UNA"])],
            2264,
        ).unwrap();
        add_urban_rural(&mut layer, 2000.0, DensityMethod::Index).unwrap();
        let scores = layer.data().column("density_score").unwrap().u32().unwrap();
        assert_eq!(scores.into_iter().collect::<Vec<_>>(), vec![Some(1), Some(1), Some(0)]);
        assert_eq!(layer.str_column("urban_rural").unwrap().get(2), Some("Rural"));
    }
}
