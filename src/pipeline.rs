//! Stage driver: geocode and join each county, combine them, then run the analyses.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use log::{error, info, warn};
use polars::prelude::DataType;

use crate::{
    common,
    config::{CountyConfig, PipelineConfig},
    geocode::{geocode, load_reference_lookup, GeocodeResult},
    io,
    layer::PointLayer,
    metrics,
    parcel::{join_parcels, JoinResult, Parcels},
    report,
};

/// Columns earlier stages write as numbers; GeoJSON properties are read back as text.
const NUMERIC_STAGE_COLUMNS: [&str; 3] = ["x", "y", "parcel_value"];

/// File stem of a per-county stage output, e.g. `pitt_voters_geocoded`.
fn county_stem(county: &CountyConfig, stage: &str) -> String {
    format!("{}_{stage}", county.name.to_lowercase())
}

/// Runs the configured stages, writing every stage's output to `output_dir`.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self { Self { config } }

    /// Load, resolve and validate a config file.
    pub fn from_config_file(path: &Path) -> Result<Self> {
        Ok(Self::new(PipelineConfig::from_file(path)?))
    }

    #[inline] pub fn config(&self) -> &PipelineConfig { &self.config }

    /// Override the per-county voter row limit.
    pub fn with_voter_limit(mut self, limit: Option<usize>) -> Self {
        if limit.is_some() { self.config.voter_limit = limit }
        self
    }

    #[inline]
    fn output_dir(&self) -> &Path { &self.config.output_dir }

    /// Stage 1 for one county.
    pub fn geocode_county(&self, county: &CountyConfig) -> Result<GeocodeResult> {
        info!("=== Geocoding {} County ===", county.name);
        let voters = io::read_voter_file(&county.voters, &self.config.encodings, self.config.voter_limit)?;
        let lookup = load_reference_lookup(
            &county.addresses,
            county.address_epsg,
            self.config.fields.reference_address.as_deref(),
        )?;
        let result = geocode(&voters, &lookup, &self.config.fields, self.config.working_epsg)
            .with_context(|| format!("[pipeline::geocode_county] {}", county.name))?;

        result.layer.write_outputs(self.output_dir(), &county_stem(county, "voters_geocoded"))?;
        Ok(result)
    }

    /// Stage 2 for one county, given its geocoded voters.
    pub fn join_county(&self, county: &CountyConfig, geocoded: &PointLayer) -> Result<JoinResult> {
        info!("=== Spatial join: {} County ===", county.name);
        let parcels = Parcels::load(&county.parcels, county.parcel_epsg, self.config.working_epsg)?;
        let result = join_parcels(geocoded, &parcels, &county.name, self.config.fields.parcel_value.as_deref())?;

        result.layer.write_outputs(self.output_dir(), &county_stem(county, "voters_with_parcels"))?;
        report::log_party_value_stats(&county.name, &result.layer, &self.config.fields.party);
        Ok(result)
    }

    /// Geocode every county. Failed counties are logged and skipped.
    pub fn geocode(&self) -> Result<Vec<(String, GeocodeResult)>> {
        let results = self.config.counties.iter()
            .filter_map(|county| match self.geocode_county(county) {
                Ok(result) => Some((county.name.clone(), result)),
                Err(e) => {
                    error!("Skipping {} County: {e:#}", county.name);
                    None
                }
            })
            .collect::<Vec<_>>();
        if results.is_empty() { bail!("[pipeline::geocode] no county could be geocoded") }
        Ok(results)
    }

    /// Reload a point layer written by an earlier run, in the working CRS.
    pub fn load_stage(&self, path: &Path) -> Result<PointLayer> {
        common::require_file_exists(path)
            .with_context(|| format!("[pipeline::load_stage] no stage output at {}; run the earlier stage first", path.display()))?;
        let features = io::read_point_features(path)
            .with_context(|| format!("[pipeline::load_stage] Failed to read {}", path.display()))?;
        let epsg = features.epsg
            .or_else(|| io::default_epsg(path))
            .ok_or_else(|| anyhow!("[pipeline::load_stage] unknown CRS for {}", path.display()))?;

        let mut data = features.data;
        for name in NUMERIC_STAGE_COLUMNS {
            let Ok(column) = data.column(name) else { continue };
            let column = column.cast(&DataType::Float64)
                .with_context(|| format!("[pipeline::load_stage] column {name:?} is not numeric"))?;
            data.with_column(column)?;
        }

        let mut layer = PointLayer::new(features.geoms, data, epsg)?;
        layer.to_crs(self.config.working_epsg)?;
        info!("Resumed {} voters from {}", layer.len(), path.display());
        Ok(layer)
    }

    /// Join each county's geocoded voters to its parcels, then write the combined layer.
    fn join_counties(&self, geocoded: impl Fn(&CountyConfig) -> Result<PointLayer>) -> Result<PointLayer> {
        let mut joined = Vec::new();
        for county in &self.config.counties {
            let result = geocoded(county)
                .and_then(|layer| self.join_county(county, &layer));
            match result {
                Ok(result) => joined.push(result.layer),
                Err(e) => error!("Skipping {} County: {e:#}", county.name),
            }
        }
        if joined.is_empty() { bail!("[pipeline::join] no county could be joined to parcels") }

        let combined = PointLayer::concat(joined)?;
        info!("Combined dataset: {} voters", combined.len());
        combined.write_outputs(self.output_dir(), "combined_voters_with_parcels")?;
        report::log_party_value_stats("Combined", &combined, &self.config.fields.party);
        Ok(combined)
    }

    /// Geocode and join every county, then write the combined layer.
    pub fn join(&self) -> Result<PointLayer> {
        self.join_counties(|county| Ok(self.geocode_county(county)?.layer))
    }

    /// Join using the `<county>_voters_geocoded.geojson` files of an earlier
    /// geocode run in `dir`. Counties without one are logged and skipped.
    pub fn join_from(&self, dir: &Path) -> Result<PointLayer> {
        self.join_counties(|county| {
            let path = dir.join(format!("{}.geojson", county_stem(county, "voters_geocoded")));
            self.load_stage(&path)
        })
    }

    /// Full run: join, then every analysis and the summary report.
    pub fn analyze(&self) -> Result<PointLayer> {
        let combined = self.join()?;
        self.run_analyses(combined)
    }

    /// Analyses and report on a combined layer written by an earlier join.
    pub fn analyze_from(&self, combined: &Path) -> Result<PointLayer> {
        let layer = self.load_stage(combined)?;
        self.run_analyses(layer)
    }

    /// Run the five analyses on a combined layer, writing each intermediate result.
    pub fn run_analyses(&self, mut layer: PointLayer) -> Result<PointLayer> {
        let out = self.output_dir();
        let fields = &self.config.fields;

        info!("=== Analysis 1: urban/rural classification ===");
        metrics::add_urban_rural(&mut layer, self.config.density_radius, self.config.density_method)?;
        log_breakdown(&layer, "urban_rural");
        layer.write_outputs(out, "analysis_1_urban_rural_classification")?;

        info!("=== Analysis 2: facility buffers ===");
        let facilities = metrics::sample_facilities(&layer, self.config.facility_candidates, self.config.facility_stride)?;
        metrics::add_buffer_flags(&mut layer, facilities.points(), &self.config.buffer_radii)?;
        facilities.write_geojson(&out.join("analysis_2_sample_schools.geojson"))?;
        layer.write_outputs(out, "analysis_2_school_buffers")?;

        info!("=== Analysis 3: age demographics ===");
        metrics::add_age_groups(&mut layer, &fields.birth_year, self.config.reference_year)?;
        log_breakdown(&layer, "age_group");
        layer.write_outputs(out, "analysis_3_age_demographics")?;

        info!("=== Analysis 4: distance to county centers ===");
        if layer.has_column("county") {
            let centers = metrics::county_centers(&layer)?;
            metrics::add_distance_to_center(&mut layer, &centers)?;
            metrics::centers_layer(&centers, layer.epsg())?
                .write_geojson(&out.join("analysis_4_county_centers.geojson"))?;
            log_breakdown(&layer, "distance_category");
        } else {
            warn!("No county column; distance to county centers skipped");
        }
        layer.write_outputs(out, "analysis_4_distance_to_centers")?;

        info!("=== Analysis 5: registration patterns ===");
        metrics::add_registration_periods(&mut layer, &fields.registration_date)?;
        log_breakdown(&layer, "registration_period");
        layer.write_outputs(out, "analysis_5_registration_patterns")?;

        report::write_summary_report(
            &out.join("spatial_analysis_summary_report.txt"),
            &layer,
            &fields.party,
            &self.config.buffer_radii,
        )?;
        Ok(layer)
    }
}

fn log_breakdown(layer: &PointLayer, column: &str) {
    let Some(counts) = report::category_counts(layer, column) else { return };
    for (value, count) in counts {
        info!("  {value}: {} ({:.1}%)", report::thousands(count), count as f64 / layer.len().max(1) as f64 * 100.0);
    }
}
