//! Pipeline configuration, loaded from a JSON file.

use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use serde::Deserialize;

use crate::{common, io::TextEncoding, metrics::DensityMethod};

/// Maps logical voter/parcel fields to source column names.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FieldMap {
    pub address: String,
    pub party: String,
    pub status: String,
    pub birth_year: String,
    pub registration_date: String,
    /// Address column in the reference dataset; name matching when unset.
    pub reference_address: Option<String>,
    /// Property-value column in the parcel dataset; name matching when unset.
    pub parcel_value: Option<String>,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            address: "res_street_address".to_string(),
            party: "party_cd".to_string(),
            status: "voter_status_desc".to_string(),
            birth_year: "birth_year".to_string(),
            registration_date: "registr_dt".to_string(),
            reference_address: None,
            parcel_value: None,
        }
    }
}

/// Input files for one county.
#[derive(Debug, Clone, Deserialize)]
pub struct CountyConfig {
    pub name: String,
    /// Tab-delimited voter registration extract.
    pub voters: PathBuf,
    /// Reference address points (shapefile or GeoJSON).
    pub addresses: PathBuf,
    /// Parcel polygons (shapefile or GeoJSON).
    pub parcels: PathBuf,
    /// Override for the reference address CRS.
    #[serde(default)]
    pub address_epsg: Option<u32>,
    /// Override for the parcel CRS.
    #[serde(default)]
    pub parcel_epsg: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub output_dir: PathBuf,
    pub working_epsg: u32,
    /// Year that ages are computed against.
    pub reference_year: i32,
    /// Neighbor search radius for the density score, in working CRS units.
    pub density_radius: f64,
    pub density_method: DensityMethod,
    /// Facility buffer distances, in working CRS units.
    pub buffer_radii: Vec<f64>,
    /// Number of highest-density voters considered as facility sites.
    pub facility_candidates: usize,
    /// Every `facility_stride`-th candidate becomes a facility.
    pub facility_stride: usize,
    /// Voter file decodings, tried in order.
    pub encodings: Vec<TextEncoding>,
    /// Read at most this many voter rows per county.
    pub voter_limit: Option<usize>,
    pub fields: FieldMap,
    pub counties: Vec<CountyConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("outputs"),
            working_epsg: common::WORKING_EPSG,
            reference_year: 2025,
            density_radius: 2000.0,
            density_method: DensityMethod::Index,
            buffer_radii: vec![1000.0, 2000.0, 5000.0],
            facility_candidates: 20,
            facility_stride: 4,
            encodings: TextEncoding::fallback_order().to_vec(),
            voter_limit: None,
            fields: FieldMap::default(),
            counties: Vec::new(),
        }
    }
}

impl PipelineConfig {
    /// Load a config file; relative paths inside it resolve against its directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = common::read_bytes(path)?;
        let mut config: Self = serde_json::from_slice(&bytes)
            .with_context(|| format!("[config] Failed to parse config file {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.resolve_paths(base);
        config.validate()?;
        Ok(config)
    }

    /// Make every relative path absolute with respect to `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        self.output_dir = common::resolve_path(base, &self.output_dir);
        for county in &mut self.counties {
            county.voters = common::resolve_path(base, &county.voters);
            county.addresses = common::resolve_path(base, &county.addresses);
            county.parcels = common::resolve_path(base, &county.parcels);
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.counties.is_empty(), "[config] no counties configured");
        ensure!(!self.encodings.is_empty(), "[config] encoding list is empty");
        ensure!(self.density_radius > 0.0, "[config] density_radius must be positive");
        ensure!(self.buffer_radii.iter().all(|&r| r > 0.0), "[config] buffer radii must be positive");
        ensure!(self.facility_stride > 0, "[config] facility_stride must be at least 1");
        common::proj4_string(self.working_epsg)
            .with_context(|| format!("[config] working_epsg {} is not supported", self.working_epsg))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let json = r#"{ "counties": [
            { "name": "Pitt", "voters": "v.txt", "addresses": "a.shp", "parcels": "p.shp" }
        ] }"#;
        let mut config: PipelineConfig = serde_json::from_str(json).unwrap();
        config.resolve_paths(Path::new("/data"));
        config.validate().unwrap();

        assert_eq!(config.working_epsg, 2264);
        assert_eq!(config.reference_year, 2025);
        assert_eq!(config.buffer_radii, vec![1000.0, 2000.0, 5000.0]);
        assert_eq!(config.fields.address, "res_street_address");
        assert_eq!(config.encodings, TextEncoding::fallback_order().to_vec());
        assert_eq!(config.counties[0].voters, PathBuf::from("/data/v.txt"));
        assert_eq!(config.output_dir, PathBuf::from("/data/outputs"));
    }

    #[test]
    fn explicit_fields_and_encodings() {
        let json = r#"{
            "encodings": ["cp1252"],
            "density_method": "scan",
            "fields": { "parcel_value": "PARVAL", "reference_address": "FULLADDR" },
            "counties": [
                { "name": "Beaufort", "voters": "/v.txt", "addresses": "/a.geojson",
                  "parcels": "/p.geojson", "parcel_epsg": 4326 }
            ]
        }"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.encodings, vec![TextEncoding::Cp1252]);
        assert_eq!(config.density_method, DensityMethod::Scan);
        assert_eq!(config.fields.parcel_value.as_deref(), Some("PARVAL"));
        assert_eq!(config.fields.status, "voter_status_desc");
        assert_eq!(config.counties[0].parcel_epsg, Some(4326));
    }

    #[test]
    fn empty_county_list_is_rejected() {
        assert!(PipelineConfig::default().validate().is_err());
    }

    #[test]
    fn unknown_encoding_is_rejected() {
        let json = r#"{ "encodings": ["ebcdic"], "counties": [] }"#;
        assert!(serde_json::from_str::<PipelineConfig>(json).is_err());
    }
}
