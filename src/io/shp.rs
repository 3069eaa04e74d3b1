//! Shapefile reading: shapes plus their dBase attribute table.

use std::path::Path;

use anyhow::{Context, Result};
use polars::prelude::*;
use shapefile::{dbase::{self, FieldValue, Record}, Reader, Shape};

use crate::{common, io::Features};

/// Render a dBase value as text; `None` for nulls and unsupported types.
fn field_to_string(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Character(s) => s.as_ref().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
        FieldValue::Memo(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        FieldValue::Numeric(n) => n.map(|n| n.to_string()),
        FieldValue::Float(f) => f.map(|f| f.to_string()),
        FieldValue::Integer(i) => Some(i.to_string()),
        FieldValue::Double(d) => Some(d.to_string()),
        FieldValue::Logical(b) => b.map(|b| b.to_string()),
        _ => None,
    }
}

/// Build a string-typed DataFrame with one column per dBase field, in file order.
fn records_to_dataframe(field_names: &[String], records: &[Record]) -> Result<DataFrame> {
    let columns = field_names.iter()
        .map(|name| Column::new(
            name.as_str().into(),
            records.iter()
                .map(|record| record.get(name).and_then(field_to_string))
                .collect::<Vec<Option<String>>>(),
        ))
        .collect::<Vec<_>>();
    DataFrame::new(columns).context("[io::shp] Failed to build attribute table")
}

/// Reads all shapes + attribute records from a given `.shp` file path.
fn read_shapes_and_records(path: &Path) -> Result<(Vec<Shape>, Vec<Record>, Vec<String>)> {
    common::require_file_exists(path)?;
    let mut reader = Reader::from_path(path)
        .with_context(|| format!("[io::shp] Failed to open shapefile: {}", path.display()))?;

    let mut shapes = Vec::with_capacity(reader.shape_count()?);
    let mut records = Vec::with_capacity(shapes.capacity());
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result.context("[io::shp] Error reading shape+record")?;
        shapes.push(shape);
        records.push(record);
    }

    let dbf = dbase::Reader::from_path(path.with_extension("dbf"))
        .with_context(|| format!("[io::shp] Failed to open attribute table for {}", path.display()))?;
    let field_names = dbf.fields().iter()
        .map(|field| field.name().to_string())
        .filter(|name| name != "DeletionFlag")
        .collect();

    Ok((shapes, records, field_names))
}

/// Read a point shapefile.
pub(crate) fn read_point_shapefile(path: &Path) -> Result<Features<geo::Point<f64>>> {
    let (shapes, records, field_names) = read_shapes_and_records(path)?;
    let geoms = shapes.into_iter()
        .map(common::shape_to_point)
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("[io::shp] Error converting shapes to points in {}", path.display()))?;

    Ok(Features {
        geoms,
        data: records_to_dataframe(&field_names, &records)?,
        epsg: common::epsg_from_shapefile(path),
    })
}

/// Read a polygon shapefile.
pub(crate) fn read_polygon_shapefile(path: &Path) -> Result<Features<geo::MultiPolygon<f64>>> {
    let (shapes, records, field_names) = read_shapes_and_records(path)?;
    let geoms = shapes.into_iter()
        .map(common::shape_to_multipolygon)
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("[io::shp] Error converting shapes to multipolygons in {}", path.display()))?;

    Ok(Features {
        geoms,
        data: records_to_dataframe(&field_names, &records)?,
        epsg: common::epsg_from_shapefile(path),
    })
}
