//! Exact-match geocoding of voter addresses against a reference address layer.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use geo::{Coord, Point};
use log::{info, warn};
use polars::prelude::*;

use crate::{
    address::{normalize, AddressLookup},
    common,
    config::FieldMap,
    io,
    layer::PointLayer,
    types::VoterStatus,
};

/// Load reference address points into an exact-match lookup.
///
/// The CRS comes from `epsg_override`, then the file itself, then the format default.
pub fn load_reference_lookup(path: &Path, epsg_override: Option<u32>, address_column: Option<&str>) -> Result<AddressLookup> {
    let features = io::read_point_features(path)
        .with_context(|| format!("[geocode::load_reference_lookup] Failed to read {}", path.display()))?;

    let epsg = epsg_override
        .or(features.epsg)
        .or_else(|| io::default_epsg(path))
        .ok_or_else(|| anyhow!("[geocode::load_reference_lookup] unknown CRS for {}; set address_epsg", path.display()))?;

    let names = features.data.get_column_names_str();
    let column = common::select_column(&names, address_column, "reference address", common::is_address_column)
        .ok_or_else(|| anyhow!("[geocode::load_reference_lookup] no address column in {} (columns: {names:?})", path.display()))?;
    info!("Using reference address column {column:?} from {}", path.display());

    let addresses = features.data.column(column)?.str()?;
    let lookup = AddressLookup::build(
        addresses.into_iter().zip(features.geoms.iter().map(|p| p.0)),
        epsg,
    );
    info!("Created address lookup with {} unique addresses (EPSG:{epsg})", lookup.len());
    if lookup.duplicates() > 0 {
        warn!("{} duplicate reference addresses ignored", lookup.duplicates());
    }
    Ok(lookup)
}

/// Output of [`geocode`].
#[derive(Debug, Clone)]
pub struct GeocodeResult {
    /// Matched active voters, in the working CRS.
    pub layer: PointLayer,
    /// Voters with an ACTIVE status.
    pub active: usize,
    /// Active voters whose address was found.
    pub matched: usize,
}

impl GeocodeResult {
    /// Percentage of active voters matched; 0 when there are none.
    pub fn match_rate(&self) -> f64 {
        if self.active == 0 { 0.0 } else { self.matched as f64 / self.active as f64 * 100.0 }
    }
}

/// Geocode active voters by exact match of their normalized address.
///
/// Adds `clean_address`, `x`, `y` and `matched`; unmatched voters are dropped.
/// Points are returned in `working_epsg`.
pub fn geocode(voters: &DataFrame, lookup: &AddressLookup, fields: &FieldMap, working_epsg: u32) -> Result<GeocodeResult> {
    let status = voters.column(&fields.status)
        .with_context(|| format!("[geocode] missing status column {:?}", fields.status))?
        .str()?;
    let active_mask = status.into_iter()
        .map(|s| s.is_some_and(|s| VoterStatus::parse(s).is_active()))
        .collect::<Vec<_>>();
    let mut active = voters.filter(&BooleanChunked::from_slice("active".into(), &active_mask))?;
    info!("Active voters: {} of {}", active.height(), voters.height());

    let addresses = active.column(&fields.address)
        .with_context(|| format!("[geocode] missing address column {:?}", fields.address))?
        .str()?;
    let clean = addresses.into_iter().map(normalize).collect::<Vec<_>>();
    let hits: Vec<Option<Coord<f64>>> = clean.iter().map(|key| lookup.get(key)).collect();
    let matched_mask = hits.iter().map(Option::is_some).collect::<Vec<_>>();

    active.with_column(Column::new("clean_address".into(), clean))?;
    active.with_column(Column::new("matched".into(), &matched_mask))?;

    let data = active.filter(&BooleanChunked::from_slice("matched".into(), &matched_mask))?;
    let points = hits.into_iter().flatten().map(Point).collect::<Vec<_>>();
    let mut layer = PointLayer::new(points, data, lookup.epsg())?;
    layer.to_crs(working_epsg)?;

    let xs = layer.points().iter().map(|p| p.x()).collect::<Vec<_>>();
    let ys = layer.points().iter().map(|p| p.y()).collect::<Vec<_>>();
    layer.set_column(Column::new("x".into(), xs))?;
    layer.set_column(Column::new("y".into(), ys))?;

    let result = GeocodeResult { active: active.height(), matched: layer.len(), layer };
    info!("Matched {} of {} active voters ({:.1}%)", result.matched, result.active, result.match_rate());
    Ok(result)
}
