//! Address canonicalization and the exact-match reference table.

mod lookup;
mod normalize;

pub use lookup::AddressLookup;
pub use normalize::normalize;
