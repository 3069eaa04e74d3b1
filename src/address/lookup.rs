use ahash::AHashMap;
use geo::Coord;

use super::normalize;

/// Exact-match table from canonical address key to a reference coordinate.
#[derive(Debug, Clone)]
pub struct AddressLookup {
    entries: AHashMap<String, Coord<f64>>,
    epsg: u32,
    duplicates: usize,
    blanks: usize,
}

impl AddressLookup {
    /// Build a lookup from raw reference addresses in source order.
    ///
    /// Addresses normalizing to the empty string are skipped. On duplicate keys the
    /// first coordinate is kept and later ones are dropped.
    pub fn build<'a>(entries: impl IntoIterator<Item = (Option<&'a str>, Coord<f64>)>, epsg: u32) -> Self {
        let mut lookup = Self { entries: AHashMap::new(), epsg, duplicates: 0, blanks: 0 };
        for (raw, coord) in entries {
            let key = normalize(raw);
            if key.is_empty() {
                lookup.blanks += 1;
            } else if lookup.entries.contains_key(&key) {
                lookup.duplicates += 1;
            } else {
                lookup.entries.insert(key, coord);
            }
        }
        lookup
    }

    /// Coordinate for an already-normalized key.
    #[inline] pub fn get(&self, key: &str) -> Option<Coord<f64>> { self.entries.get(key).copied() }

    /// Number of unique keys.
    #[inline] pub fn len(&self) -> usize { self.entries.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// EPSG code of the stored coordinates.
    #[inline] pub fn epsg(&self) -> u32 { self.epsg }

    /// Number of later duplicates that were dropped.
    #[inline] pub fn duplicates(&self) -> usize { self.duplicates }

    /// Number of reference rows whose address normalized to nothing.
    #[inline] pub fn blanks(&self) -> usize { self.blanks }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_coordinate_wins() {
        let lookup = AddressLookup::build([
            (Some("10 Elm Street"), Coord { x: 1.0, y: 1.0 }),
            (Some("10 ELM ST"), Coord { x: 2.0, y: 2.0 }),
            (Some("11 Elm St."), Coord { x: 3.0, y: 3.0 }),
        ], 2264);

        assert_eq!(lookup.len(), 2);
        assert_eq!(lookup.get("10 ELM ST"), Some(Coord { x: 1.0, y: 1.0 }));
        assert_eq!(lookup.get("11 ELM ST"), Some(Coord { x: 3.0, y: 3.0 }));
        assert_eq!(lookup.duplicates(), 1);
    }

    #[test]
    fn blank_keys_are_excluded() {
        let lookup = AddressLookup::build([
            (None, Coord { x: 1.0, y: 1.0 }),
            (Some(" # "), Coord { x: 2.0, y: 2.0 }),
        ], 2264);

        assert!(lookup.is_empty());
        assert_eq!(lookup.get(""), None);
        assert_eq!(lookup.blanks(), 2);
    }
}
