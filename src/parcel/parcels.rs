use std::path::Path;

use anyhow::{anyhow, ensure, Context, Result};
use geo::{BoundingRect, Contains, MultiPolygon, Point};
use log::info;
use polars::frame::DataFrame;
use rstar::{RTree, AABB};

use crate::{common, io, parcel::BoundingBox};

/// Parcel polygons with their attribute table and an R-tree over their bounds.
#[derive(Debug, Clone)]
pub struct Parcels {
    shapes: Vec<MultiPolygon<f64>>,
    rtree: RTree<BoundingBox>,
    data: DataFrame,
    epsg: u32,
}

impl Parcels {
    pub fn new(shapes: Vec<MultiPolygon<f64>>, data: DataFrame, epsg: u32) -> Result<Self> {
        ensure!(
            data.width() == 0 || data.height() == shapes.len(),
            "[Parcels::new] attribute rows ({}) do not match parcel count ({})",
            data.height(), shapes.len()
        );
        Ok(Self {
            rtree: RTree::bulk_load(
                shapes.iter().enumerate()
                    .filter_map(|(i, shape)| shape.bounding_rect().map(|rect| BoundingBox::new(i, rect)))
                    .collect()
            ),
            shapes,
            data,
            epsg,
        })
    }

    /// Read a parcel dataset and reproject it into `working_epsg`.
    pub fn load(path: &Path, epsg_override: Option<u32>, working_epsg: u32) -> Result<Self> {
        let features = io::read_polygon_features(path)
            .with_context(|| format!("[Parcels::load] Failed to read {}", path.display()))?;
        let epsg = epsg_override
            .or(features.epsg)
            .or_else(|| io::default_epsg(path))
            .ok_or_else(|| anyhow!("[Parcels::load] unknown CRS for {}; set parcel_epsg", path.display()))?;

        let shapes = common::reproject_shapes(&features.geoms, epsg, working_epsg)
            .with_context(|| format!("[Parcels::load] Failed to reproject {}", path.display()))?;
        info!("Loaded {} parcels from {} (EPSG:{epsg})", shapes.len(), path.display());
        Self::new(shapes, features.data, working_epsg)
    }

    #[inline] pub fn len(&self) -> usize { self.shapes.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.shapes.is_empty() }

    #[inline] pub fn data(&self) -> &DataFrame { &self.data }

    #[inline] pub fn epsg(&self) -> u32 { self.epsg }

    /// Index of the parcel strictly containing `point`; the lowest index wins
    /// when parcels overlap. Points on a boundary are not contained.
    pub fn locate(&self, point: &Point<f64>) -> Option<usize> {
        let envelope = AABB::from_point([point.x(), point.y()]);
        self.rtree.locate_in_envelope_intersecting(&envelope)
            .map(|bbox| bbox.idx())
            .filter(|&i| self.shapes[i].contains(point))
            .min()
    }
}

#[cfg(test)]
mod tests {
    use geo::{polygon, MultiPolygon};
    use serde_json::json;

    use super::*;

    fn square(x0: f64, y0: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: x0, y: y0), (x: x0 + size, y: y0), (x: x0 + size, y: y0 + size), (x: x0, y: y0 + size), (x: x0, y: y0),
        ]])
    }

    #[test]
    fn locate_finds_containing_parcel() {
        let parcels = Parcels::new(vec![square(0.0, 0.0, 10.0), square(20.0, 0.0, 10.0)], DataFrame::empty(), 2264).unwrap();
        assert_eq!(parcels.locate(&Point::new(5.0, 5.0)), Some(0));
        assert_eq!(parcels.locate(&Point::new(25.0, 5.0)), Some(1));
        assert_eq!(parcels.locate(&Point::new(15.0, 5.0)), None);
    }

    #[test]
    fn overlapping_parcels_resolve_to_lowest_index() {
        let parcels = Parcels::new(vec![
            square(5.0, 5.0, 10.0),
            square(0.0, 0.0, 10.0),
            square(6.0, 6.0, 2.0),
        ], DataFrame::empty(), 2264).unwrap();
        assert_eq!(parcels.locate(&Point::new(7.0, 7.0)), Some(0));
        assert_eq!(parcels.locate(&Point::new(2.0, 2.0)), Some(1));
    }

    #[test]
    fn boundary_points_are_outside() {
        let parcels = Parcels::new(vec![square(0.0, 0.0, 10.0)], DataFrame::empty(), 2264).unwrap();
        assert_eq!(parcels.locate(&Point::new(0.0, 5.0)), None);
        assert_eq!(parcels.locate(&Point::new(10.0, 10.0)), None);
    }

    #[test]
    fn load_keeps_parcels_without_geometry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parcels.geojson");
        let collection = json!({
            "type": "FeatureCollection",
            "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::2264" } },
            "features": [
                { "type": "Feature", "geometry": null, "properties": { "PIN": "VOID" } },
                { "type": "Feature",
                  "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [0, 10], [10, 10], [10, 0], [0, 0]]] },
                  "properties": { "PIN": "P1" } },
            ]
        });
        std::fs::write(&path, collection.to_string()).unwrap();

        let parcels = Parcels::load(&path, None, 2264).unwrap();
        assert_eq!(parcels.len(), 2);
        assert_eq!(parcels.data().height(), 2);
        assert_eq!(parcels.locate(&Point::new(5.0, 5.0)), Some(1));
    }
}
