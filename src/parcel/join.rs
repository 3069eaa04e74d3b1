use anyhow::{Context, Result};
use log::{info, warn};
use polars::prelude::*;
use rayon::prelude::*;

use crate::{common, layer::PointLayer, parcel::Parcels};

/// Output of [`join_parcels`].
#[derive(Debug, Clone)]
pub struct JoinResult {
    /// Every input voter, with parcel attributes (null when outside all parcels).
    pub layer: PointLayer,
    /// Voters that fell inside a parcel.
    pub joined: usize,
    /// Parcel column used for `parcel_value`, if one was found.
    pub value_field: Option<String>,
}

impl JoinResult {
    /// Percentage of voters with a parcel; 0 for an empty layer.
    pub fn join_rate(&self) -> f64 {
        if self.layer.is_empty() { 0.0 } else { self.joined as f64 / self.layer.len() as f64 * 100.0 }
    }
}

/// Left join of voters onto the parcels containing them.
///
/// Parcel columns that collide with voter columns get a `_right` suffix. Adds
/// `parcel_fid`, the numeric `parcel_value` when a value field is found, and
/// `county` on every row.
pub fn join_parcels(voters: &PointLayer, parcels: &Parcels, county: &str, value_field: Option<&str>) -> Result<JoinResult> {
    let mut layer = voters.clone();
    layer.to_crs(parcels.epsg())
        .context("[parcel::join_parcels] Failed to reproject voters onto parcels")?;

    let hits = layer.points().par_iter()
        .map(|point| parcels.locate(point).map(|i| i as IdxSize))
        .collect::<Vec<_>>();
    let joined = hits.iter().flatten().count();

    let index = IdxCa::from_iter_options("parcel_fid".into(), hits.iter().copied());
    let matched = parcels.data().take(&index)
        .context("[parcel::join_parcels] Failed to gather parcel attributes")?;

    for column in matched.get_columns() {
        let mut column = column.clone();
        if layer.has_column(column.name()) {
            let renamed = format!("{}_right", column.name());
            column.rename(renamed.into());
        }
        layer.set_column(column)?;
    }
    layer.set_column(index.into_column())?;

    let names = parcels.data().get_column_names_str();
    let field = common::select_column(&names, value_field, "property value", common::is_value_column);
    match field {
        Some(field) => {
            info!("Using property value field {field:?}");
            let values = matched.column(field)?.cast(&DataType::Float64)?;
            layer.set_column(values.with_name("parcel_value".into()))?;
        }
        None => warn!("No property value field found among parcel columns {names:?}; value statistics will be skipped"),
    }

    let rows = layer.len();
    layer.set_column(Column::new("county".into(), vec![county; rows]))?;

    let result = JoinResult { layer, joined, value_field: field.map(str::to_string) };
    info!("{county}: {} of {} voters joined to parcels ({:.1}%)", result.joined, result.layer.len(), result.join_rate());
    Ok(result)
}
