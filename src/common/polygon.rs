use anyhow::{bail, Result};
use geo::{Coord, LineString, MultiPolygon, Point, Polygon};
use shapefile::{
    record::{polygon::GenericPolygon, traits::HasXY},
    Shape,
};

/// Twice the signed area of a closed ring (negative when clockwise).
fn ring_orientation(coords: &[Coord<f64>]) -> f64 {
    coords.windows(2)
        .map(|w| w[0].x * w[1].y - w[1].x * w[0].y)
        .sum()
}

/// Convert a shapefile polygon (plain, M or Z) into a MultiPolygon.
///
/// Shapefile rings are stored as `[outer CW, hole CCW, ..., next outer CW, ...]`,
/// so each clockwise ring starts a new polygon and collects the holes after it.
pub(crate) fn shp_to_geo<P: HasXY>(polygon: &GenericPolygon<P>) -> MultiPolygon<f64> {
    let mut polygons = Vec::new();
    let mut exterior: Option<LineString<f64>> = None;
    let mut holes = Vec::new();

    for ring in polygon.rings() {
        let mut coords = ring.points().iter()
            .map(|pt| Coord { x: pt.x(), y: pt.y() })
            .collect::<Vec<_>>();
        if coords.first() != coords.last() {
            if let Some(&first) = coords.first() { coords.push(first) }
        }

        if ring_orientation(&coords) < 0.0 {
            if let Some(outer) = exterior.take() {
                polygons.push(Polygon::new(outer, std::mem::take(&mut holes)));
            }
            exterior = Some(LineString(coords));
        } else {
            holes.push(LineString(coords));
        }
    }
    if let Some(outer) = exterior {
        polygons.push(Polygon::new(outer, holes));
    }

    MultiPolygon(polygons)
}

/// Coerce a shape into a point, raising an error for any other shape type.
pub(crate) fn shape_to_point(shape: Shape) -> Result<Point<f64>> {
    match shape {
        Shape::Point(p) => Ok(Point::new(p.x, p.y)),
        Shape::PointM(p) => Ok(Point::new(p.x, p.y)),
        Shape::PointZ(p) => Ok(Point::new(p.x, p.y)),
        other => bail!("found non-Point shape in layer: {:?}", other.shapetype()),
    }
}

/// Coerce a shape into a multipolygon, raising an error for any other shape type.
/// A null shape becomes an empty multipolygon so the record keeps its row.
pub(crate) fn shape_to_multipolygon(shape: Shape) -> Result<MultiPolygon<f64>> {
    match shape {
        Shape::Polygon(polygon) => Ok(shp_to_geo(&polygon)),
        Shape::PolygonM(polygon) => Ok(shp_to_geo(&polygon)),
        Shape::PolygonZ(polygon) => Ok(shp_to_geo(&polygon)),
        Shape::NullShape => Ok(MultiPolygon(Vec::new())),
        other => bail!("found non-Polygon shape in layer: {:?}", other.shapetype()),
    }
}
