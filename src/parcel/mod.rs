mod bbox;
mod join;
mod parcels;

use bbox::BoundingBox;
pub use join::{join_parcels, JoinResult};
pub use parcels::Parcels;
