//! Point layers: geometries plus a row-aligned polars attribute table.

mod io;
mod layer;

pub use layer::PointLayer;
