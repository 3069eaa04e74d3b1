use std::{path::Path, sync::LazyLock};

use anyhow::{anyhow, bail, Context, Result};
use geo::{Coord, MapCoords, MultiPolygon, Point};
use proj4rs::{proj::Proj as Proj4, transform::transform};
use regex::Regex;

/// NAD83 / North Carolina (ftUS). Every distance and buffer is computed in this CRS.
pub const WORKING_EPSG: u32 = 2264;

/// Look up the PROJ.4 definition for a supported EPSG code.
pub(crate) fn proj4_string(epsg: u32) -> Result<&'static str> {
    Ok(match epsg {
        4326 => "+proj=longlat +datum=WGS84 +no_defs +type=crs",
        4269 => "+proj=longlat +datum=NAD83 +no_defs +type=crs",
        2264 => "+proj=lcc +lat_0=33.75 +lon_0=-79 +lat_1=36.1666666666667 +lat_2=34.3333333333333 \
                 +x_0=609601.219202438 +y_0=0 +datum=NAD83 +units=us-ft +no_defs +type=crs",
        32119 => "+proj=lcc +lat_0=33.75 +lon_0=-79 +lat_1=36.1666666666667 +lat_2=34.3333333333333 \
                  +x_0=609601.22 +y_0=0 +datum=NAD83 +units=m +no_defs +type=crs",
        3358 => "+proj=lcc +lat_0=33.75 +lon_0=-79 +lat_1=36.1666666666667 +lat_2=34.3333333333333 \
                 +x_0=609601.22 +y_0=0 +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +units=m +no_defs +type=crs",
        other => bail!("[common::crs] unsupported EPSG code: {other}"),
    })
}

/// Geographic CRSs take and return radians in proj4rs.
#[inline]
fn is_geographic(epsg: u32) -> bool { matches!(epsg, 4326 | 4269) }

/// A coordinate transform between two supported EPSG codes.
pub(crate) struct Transform {
    from: Proj4,
    to: Proj4,
    from_geographic: bool,
    to_geographic: bool,
}

impl Transform {
    pub(crate) fn new(from_epsg: u32, to_epsg: u32) -> Result<Self> {
        let build = |epsg: u32| -> Result<Proj4> {
            let proj_string = proj4_string(epsg)?;
            Proj4::from_proj_string(proj_string)
                .with_context(|| anyhow!("failed to build PROJ.4 for EPSG:{epsg}: {proj_string}"))
        };

        Ok(Self {
            from: build(from_epsg)?,
            to: build(to_epsg)?,
            from_geographic: is_geographic(from_epsg),
            to_geographic: is_geographic(to_epsg),
        })
    }

    /// Transform a single coordinate.
    pub(crate) fn apply(&self, coord: Coord<f64>) -> Result<Coord<f64>> {
        let mut point = if self.from_geographic {
            (coord.x.to_radians(), coord.y.to_radians(), 0.0)
        } else {
            (coord.x, coord.y, 0.0)
        };
        transform(&self.from, &self.to, &mut point)
            .map_err(|e| anyhow!("CRS transform failed at ({}, {}): {e:?}", coord.x, coord.y))?;

        Ok(if self.to_geographic {
            Coord { x: point.0.to_degrees(), y: point.1.to_degrees() }
        } else {
            Coord { x: point.0, y: point.1 }
        })
    }
}

/// Reproject points in place; a no-op when the CRSs already agree.
pub(crate) fn reproject_points(points: &mut [Point<f64>], from_epsg: u32, to_epsg: u32) -> Result<()> {
    if from_epsg == to_epsg { return Ok(()) }
    let tf = Transform::new(from_epsg, to_epsg)?;
    for point in points.iter_mut() {
        *point = Point(tf.apply(point.0)?);
    }
    Ok(())
}

/// Reproject shapes, returning new geometries; a clone when the CRSs already agree.
pub(crate) fn reproject_shapes(shapes: &[MultiPolygon<f64>], from_epsg: u32, to_epsg: u32) -> Result<Vec<MultiPolygon<f64>>> {
    if from_epsg == to_epsg { return Ok(shapes.to_vec()) }
    let tf = Transform::new(from_epsg, to_epsg)?;
    shapes.iter()
        .map(|shape| shape.try_map_coords(|coord| tf.apply(coord)))
        .collect()
}

static AUTHORITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"AUTHORITY\[\s*"EPSG"\s*,\s*"?(\d+)"?\s*\]\s*\]\s*$"#).expect("authority pattern is valid")
});

static URN_EPSG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"EPSG:+(\d+)\s*$").expect("urn pattern is valid")
});

/// Guess the EPSG code of an ESRI/OGC WKT string (e.g. a shapefile `.prj`).
pub(crate) fn epsg_from_wkt(wkt: &str) -> Option<u32> {
    let wkt = wkt.trim();
    if let Some(code) = AUTHORITY.captures(wkt).and_then(|c| c[1].parse().ok()) {
        return Some(code);
    }

    let upper = wkt.to_ascii_uppercase();
    if upper.starts_with("PROJCS") {
        if !upper.contains("NORTH_CAROLINA") && !upper.contains("NORTH CAROLINA") { return None }
        if upper.contains("FOOT") || upper.contains("FEET") || upper.contains("_FT") { return Some(2264) }
        if upper.contains("HARN") { return Some(3358) }
        return Some(32119);
    }
    if upper.starts_with("GEOGCS") {
        if upper.contains("NORTH_AMERICAN_1983") || upper.contains("NAD83") { return Some(4269) }
        if upper.contains("WGS_1984") || upper.contains("WGS 84") || upper.contains("WGS84") { return Some(4326) }
    }
    None
}

/// Read the `.prj` sidecar of a shapefile and guess its EPSG code.
pub(crate) fn epsg_from_shapefile(path: &Path) -> Option<u32> {
    let wkt = std::fs::read_to_string(path.with_extension("prj")).ok()?;
    epsg_from_wkt(&wkt)
}

/// Parse a GeoJSON `crs` name such as `urn:ogc:def:crs:EPSG::2264` or `EPSG:4326`.
pub(crate) fn epsg_from_crs_name(name: &str) -> Option<u32> {
    if name.ends_with("CRS84") { return Some(4326) }
    URN_EPSG.captures(name).and_then(|c| c[1].parse().ok())
}
