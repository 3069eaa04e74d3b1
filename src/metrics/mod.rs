//! Derived per-voter metrics. Each pass appends its own columns to a [`PointLayer`](crate::layer::PointLayer).
//!
//! - `density` - neighbor counts and urban/suburban/rural tiers
//! - `facility` - sampled facility sites and buffer membership flags
//! - `center` - distance to the county's mean voter location
//! - `buckets` - age groups and registration periods

mod buckets;
mod center;
mod density;
mod facility;

pub use buckets::{
    add_age_groups, add_registration_periods, age_group, parse_registration_year, parse_year,
    registration_period, UNKNOWN,
};
pub use center::{add_distance_to_center, centers_layer, county_centers, distance_category};
pub use density::{add_urban_rural, classify, neighbor_counts, DensityMethod, UrbanRural};
pub use facility::{add_buffer_flags, buffer_column, sample_facilities, within_any};
