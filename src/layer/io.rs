use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use crate::{common, io, layer::PointLayer};

impl PointLayer {
    /// Write the attribute table, with `x` and `y`, as CSV.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut df = self.data_with_xy()?;
        io::csv::write_csv(&mut df, path)
    }

    /// Write the points as a GeoJSON FeatureCollection in the layer's CRS.
    pub fn write_geojson(&self, path: &Path) -> Result<()> {
        io::geojson::write_points_geojson(path, &self.points, &self.data, self.epsg)
    }

    /// Write `<stem>.csv` and `<stem>.geojson` into `dir`, returning the CSV path.
    pub fn write_outputs(&self, dir: &Path, stem: &str) -> Result<PathBuf> {
        common::ensure_dir_exists(dir)?;
        let csv_path = dir.join(format!("{stem}.csv"));
        let geojson_path = dir.join(format!("{stem}.geojson"));
        self.write_csv(&csv_path)
            .with_context(|| format!("[PointLayer::write_outputs] {stem}"))?;
        self.write_geojson(&geojson_path)
            .with_context(|| format!("[PointLayer::write_outputs] {stem}"))?;
        info!("Saved {} rows to {}", self.len(), csv_path.display());
        Ok(csv_path)
    }
}

#[cfg(test)]
mod tests {
    use geo::Point;
    use polars::prelude::*;

    use super::*;

    #[test]
    fn writes_csv_and_geojson_side_by_side() {
        let dir = tempfile::tempdir().unwrap();
        let layer = PointLayer::from_columns(
            vec![Point::new(100.0, 200.0)],
            vec![Column::new("party_cd".into(), &["DEM"])],
            2264,
        ).unwrap();

        let csv_path = layer.write_outputs(&dir.path().join("out"), "pitt_voters_geocoded").unwrap();
        let text = std::fs::read_to_string(&csv_path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("party_cd,x,y"));
        assert_eq!(lines.next(), Some("DEM,100.0,200.0"));
        assert!(dir.path().join("out/pitt_voters_geocoded.geojson").exists());
    }
}
