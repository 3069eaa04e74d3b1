#![doc = "parcelvote public API"]
mod address;
mod common;
mod config;
mod geocode;
mod io;
mod layer;
mod metrics;
mod parcel;
mod pipeline;
mod report;
mod types;

#[doc(inline)]
pub use address::{normalize, AddressLookup};

#[doc(inline)]
pub use common::{stats, WORKING_EPSG};

#[doc(inline)]
pub use config::{CountyConfig, FieldMap, PipelineConfig};

#[doc(inline)]
pub use geocode::{geocode, load_reference_lookup, GeocodeResult};

#[doc(inline)]
pub use io::{read_voter_file, TextEncoding};

#[doc(inline)]
pub use layer::PointLayer;

pub use metrics::*;

#[doc(inline)]
pub use parcel::{join_parcels, JoinResult, Parcels};

#[doc(inline)]
pub use pipeline::Pipeline;

#[doc(inline)]
pub use report::{category_counts, party_value_stats, render_summary, value_summary, write_summary_report};

#[doc(inline)]
pub use types::{Party, VoterStatus};
