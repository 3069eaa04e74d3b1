//! GeoJSON reading and writing (serde_json values, no schema).

use std::{fs::File, io::BufWriter, path::Path};

use anyhow::{anyhow, bail, Context, Result};
use geo::{Coord, LineString, MultiPolygon, Point, Polygon};
use polars::prelude::*;
use serde_json::{json, Map, Value};

use crate::{common, io::Features};

/// Parse a `[x, y, ...]` position.
fn parse_coord(value: &Value) -> Result<Coord<f64>> {
    let pos = value.as_array().ok_or_else(|| anyhow!("position is not an array"))?;
    match (pos.first().and_then(Value::as_f64), pos.get(1).and_then(Value::as_f64)) {
        (Some(x), Some(y)) => Ok(Coord { x, y }),
        _ => bail!("position must hold two numbers: {value}"),
    }
}

fn parse_ring(value: &Value) -> Result<LineString<f64>> {
    value.as_array()
        .ok_or_else(|| anyhow!("ring is not an array"))?
        .iter()
        .map(parse_coord)
        .collect::<Result<Vec<_>>>()
        .map(LineString::new)
}

fn parse_polygon(value: &Value) -> Result<Polygon<f64>> {
    let mut rings = value.as_array()
        .ok_or_else(|| anyhow!("polygon is not an array"))?
        .iter()
        .map(parse_ring)
        .collect::<Result<Vec<_>>>()?;
    if rings.is_empty() { bail!("polygon has no rings") }
    let exterior = rings.remove(0);
    Ok(Polygon::new(exterior, rings))
}

/// Parse a Point (or the first position of a MultiPoint).
fn parse_point_geometry(geometry: &Value) -> Result<Point<f64>> {
    let coords = &geometry["coordinates"];
    match geometry["type"].as_str() {
        Some("Point") => Ok(Point(parse_coord(coords)?)),
        Some("MultiPoint") => coords.get(0)
            .ok_or_else(|| anyhow!("empty MultiPoint"))
            .and_then(parse_coord)
            .map(Point),
        other => bail!("expected Point geometry, found {other:?}"),
    }
}

/// Parse a Polygon or MultiPolygon into a MultiPolygon. A null geometry is an
/// empty MultiPolygon, keeping the feature's attribute row.
fn parse_polygon_geometry(geometry: &Value) -> Result<MultiPolygon<f64>> {
    if geometry.is_null() { return Ok(MultiPolygon(Vec::new())) }
    let coords = &geometry["coordinates"];
    match geometry["type"].as_str() {
        Some("Polygon") => Ok(MultiPolygon(vec![parse_polygon(coords)?])),
        Some("MultiPolygon") => coords.as_array()
            .ok_or_else(|| anyhow!("MultiPolygon coordinates are not an array"))?
            .iter()
            .map(parse_polygon)
            .collect::<Result<Vec<_>>>()
            .map(MultiPolygon),
        other => bail!("expected Polygon geometry, found {other:?}"),
    }
}

/// Render a property value as text; `None` for JSON null.
fn property_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Read a FeatureCollection, converting each geometry with `parse`.
/// Property columns appear in first-seen key order.
fn read_features<G>(path: &Path, parse: impl Fn(&Value) -> Result<G>) -> Result<Features<G>> {
    let bytes = common::read_bytes(path)?;
    let value: Value = serde_json::from_slice(&bytes)
        .with_context(|| format!("[io::geojson] Failed to parse GeoJSON {}", path.display()))?;
    let features = value["features"].as_array()
        .ok_or_else(|| anyhow!("[io::geojson] {} is not a FeatureCollection", path.display()))?;

    let mut names: Vec<String> = Vec::new();
    for feature in features {
        if let Some(props) = feature["properties"].as_object() {
            for key in props.keys() {
                if !names.contains(key) { names.push(key.clone()) }
            }
        }
    }

    let geoms = features.iter().enumerate()
        .map(|(i, feature)| parse(&feature["geometry"])
            .with_context(|| format!("[io::geojson] feature {i} in {}", path.display())))
        .collect::<Result<Vec<_>>>()?;

    let columns = names.iter()
        .map(|name| Column::new(
            name.as_str().into(),
            features.iter()
                .map(|feature| feature["properties"].get(name).and_then(property_to_string))
                .collect::<Vec<Option<String>>>(),
        ))
        .collect::<Vec<_>>();

    Ok(Features {
        geoms,
        data: DataFrame::new(columns)?,
        epsg: value["crs"]["properties"]["name"].as_str().and_then(common::epsg_from_crs_name),
    })
}

pub(crate) fn read_point_geojson(path: &Path) -> Result<Features<Point<f64>>> {
    read_features(path, parse_point_geometry)
}

pub(crate) fn read_polygon_geojson(path: &Path) -> Result<Features<MultiPolygon<f64>>> {
    read_features(path, parse_polygon_geometry)
}

/// Convert a single cell to JSON.
fn any_value_to_json(value: AnyValue) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => json!(b),
        AnyValue::String(s) => json!(s),
        AnyValue::StringOwned(s) => json!(s.as_str()),
        AnyValue::Float64(f) => if f.is_finite() { json!(f) } else { Value::Null },
        AnyValue::Float32(f) => if f.is_finite() { json!(f) } else { Value::Null },
        AnyValue::Int32(i) => json!(i),
        AnyValue::Int64(i) => json!(i),
        AnyValue::UInt32(u) => json!(u),
        AnyValue::UInt64(u) => json!(u),
        other => json!(other.to_string()),
    }
}

/// Write points with the columns of `data` as properties.
pub(crate) fn write_points_geojson(path: &Path, points: &[Point<f64>], data: &DataFrame, epsg: u32) -> Result<()> {
    let columns = data.get_columns();
    let features = points.iter().enumerate()
        .map(|(row, point)| {
            let mut properties = Map::new();
            for column in columns {
                let value = column.get(row).map(any_value_to_json).unwrap_or(Value::Null);
                properties.insert(column.name().to_string(), value);
            }
            Ok(json!({
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [point.x(), point.y()] },
                "properties": properties,
            }))
        })
        .collect::<Result<Vec<_>>>()?;

    let collection = json!({
        "type": "FeatureCollection",
        "crs": { "type": "name", "properties": { "name": format!("urn:ogc:def:crs:EPSG::{epsg}") } },
        "features": features,
    });

    let file = File::create(path)
        .with_context(|| format!("[io::geojson] Failed to create {}", path.display()))?;
    serde_json::to_writer(BufWriter::new(file), &collection)
        .with_context(|| format!("[io::geojson] Failed to write GeoJSON to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_json(dir: &Path, name: &str, value: &Value) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, serde_json::to_vec(value).unwrap()).unwrap();
        path
    }

    #[test]
    fn reads_points_with_properties_and_crs() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json(dir.path(), "addr.geojson", &json!({
            "type": "FeatureCollection",
            "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::2264" } },
            "features": [
                { "type": "Feature", "geometry": { "type": "Point", "coordinates": [1.0, 2.0] },
                  "properties": { "FULLADDR": "100 OAK ST", "ZIP": 27858 } },
                { "type": "Feature", "geometry": { "type": "Point", "coordinates": [3.0, 4.0] },
                  "properties": { "FULLADDR": null, "UNIT": "B" } },
            ]
        }));

        let features = read_point_geojson(&path).unwrap();
        assert_eq!(features.geoms, vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)]);
        assert_eq!(features.epsg, Some(2264));
        let names = features.data.get_column_names().iter().map(|s| s.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["FULLADDR", "ZIP", "UNIT"]);
        let zip = features.data.column("ZIP").unwrap().str().unwrap();
        assert_eq!(zip.get(0), Some("27858"));
        assert_eq!(zip.get(1), None);
        assert_eq!(features.data.column("FULLADDR").unwrap().str().unwrap().get(1), None);
    }

    #[test]
    fn reads_polygons() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json(dir.path(), "parcels.geojson", &json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature",
                  "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]]] },
                  "properties": { "PARVAL": 100000 } },
                { "type": "Feature",
                  "geometry": { "type": "MultiPolygon", "coordinates": [
                      [[[20, 0], [30, 0], [30, 10], [20, 0]]],
                      [[[40, 0], [50, 0], [50, 10], [40, 0]]]
                  ] },
                  "properties": { "PARVAL": 5 } },
            ]
        }));

        let features = read_polygon_geojson(&path).unwrap();
        assert_eq!(features.geoms.len(), 2);
        assert_eq!(features.geoms[1].0.len(), 2);
        assert_eq!(features.epsg, None);
    }

    #[test]
    fn null_polygon_geometry_keeps_its_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json(dir.path(), "parcels.geojson", &json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature",
                  "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [10, 0], [10, 10], [0, 0]]] },
                  "properties": { "PIN": "A" } },
                { "type": "Feature", "geometry": null, "properties": { "PIN": "B" } },
            ]
        }));

        let features = read_polygon_geojson(&path).unwrap();
        assert_eq!(features.geoms.len(), 2);
        assert!(features.geoms[1].0.is_empty());
        assert_eq!(features.data.column("PIN").unwrap().str().unwrap().get(1), Some("B"));
        assert!(read_point_geojson(&path).is_err());
    }

    #[test]
    fn wrong_geometry_type_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json(dir.path(), "bad.geojson", &json!({
            "type": "FeatureCollection",
            "features": [ { "type": "Feature", "geometry": { "type": "Point", "coordinates": [0, 0] }, "properties": {} } ]
        }));
        assert!(read_polygon_geojson(&path).is_err());
    }

    #[test]
    fn writes_points_with_typed_properties() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.geojson");
        let data = DataFrame::new(vec![
            Column::new("party_cd".into(), vec![Some("DEM"), None]),
            Column::new("parcel_value".into(), vec![Some(1.5), None]),
            Column::new("matched".into(), vec![true, true]),
        ]).unwrap();

        write_points_geojson(&path, &[Point::new(1.0, 2.0), Point::new(3.0, 4.0)], &data, 2264).unwrap();

        let value: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        let features = value["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0]["properties"]["party_cd"], json!("DEM"));
        assert_eq!(features[0]["properties"]["parcel_value"], json!(1.5));
        assert_eq!(features[1]["properties"]["parcel_value"], Value::Null);
        assert_eq!(features[1]["properties"]["matched"], json!(true));
        assert_eq!(features[1]["geometry"]["coordinates"], json!([3.0, 4.0]));
        assert_eq!(value["crs"]["properties"]["name"], json!("urn:ogc:def:crs:EPSG::2264"));
    }
}
