//! IO module for format-specific reading and writing operations.
//!
//! - `csv` - tab-delimited voter extracts in, CSV attribute tables out
//! - `encoding` - text decodings tried on voter extracts
//! - `shp` - Shapefile points and polygons with dBase attributes
//! - `geojson` - GeoJSON FeatureCollections in and out

pub(crate) mod csv;
mod encoding;
pub(crate) mod geojson;
pub(crate) mod shp;

use std::path::Path;

use anyhow::{bail, Result};
use geo::{MultiPolygon, Point};
use polars::frame::DataFrame;

use crate::common;

pub use csv::read_voter_file;
pub use encoding::TextEncoding;

/// Geometries plus a row-aligned attribute table, as read from disk.
#[derive(Debug, Clone)]
pub(crate) struct Features<G> {
    pub geoms: Vec<G>,
    pub data: DataFrame,
    /// CRS declared by the file, if it could be recognised.
    pub epsg: Option<u32>,
}

/// Read point features from a shapefile or GeoJSON file, chosen by extension.
pub(crate) fn read_point_features(path: &Path) -> Result<Features<Point<f64>>> {
    match common::extension(path).as_deref() {
        Some("shp") => shp::read_point_shapefile(path),
        Some("geojson" | "json") => geojson::read_point_geojson(path),
        other => bail!("[io] unsupported point dataset format {other:?}: {}", path.display()),
    }
}

/// Read polygon features from a shapefile or GeoJSON file, chosen by extension.
pub(crate) fn read_polygon_features(path: &Path) -> Result<Features<MultiPolygon<f64>>> {
    match common::extension(path).as_deref() {
        Some("shp") => shp::read_polygon_shapefile(path),
        Some("geojson" | "json") => geojson::read_polygon_geojson(path),
        other => bail!("[io] unsupported polygon dataset format {other:?}: {}", path.display()),
    }
}

/// GeoJSON without a `crs` member is WGS84 lon/lat; shapefiles without a recognisable `.prj` are not assumed.
pub(crate) fn default_epsg(path: &Path) -> Option<u32> {
    match common::extension(path).as_deref() {
        Some("geojson" | "json") => Some(4326),
        _ => None,
    }
}
