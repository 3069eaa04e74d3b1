mod columns;
mod crs;
mod fs;
mod polygon;
pub mod stats;

pub(crate) use columns::*;
pub use crs::WORKING_EPSG;
pub(crate) use crs::{epsg_from_crs_name, epsg_from_shapefile, proj4_string, reproject_points, reproject_shapes};
pub(crate) use fs::*;
pub(crate) use polygon::*;
