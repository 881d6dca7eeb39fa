//! Site and analysis configuration.
//!
//! The pipeline itself is pure computation; everything site-specific —
//! catchment area for the unit conversion, latitude for the radiation
//! model, where the recession scan may start — comes in through this
//! configuration, loaded from a TOML file.
//!
//! Model-defining constants (window sizes, noise and rain thresholds,
//! bin minimums) are not configuration: they live as `pub const` items
//! in their owning modules.

use serde::Deserialize;
use std::error::Error;
use std::fs;

// ---------------------------------------------------------------------------
// Configuration types
// ---------------------------------------------------------------------------

/// Top-level configuration file layout.
///
/// ```toml
/// [site]
/// name = "Weierbach"
/// catchment_area_m2 = 450000.0
/// latitude_deg = 49.83
///
/// [analysis]
/// start_row = 73
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    pub site: Site,
    #[serde(default)]
    pub analysis: Analysis,
}

/// Physical description of the gauged catchment.
#[derive(Debug, Clone, Deserialize)]
pub struct Site {
    /// Human-readable site name, used only for logging context.
    pub name: String,
    /// Catchment area in square metres, for the volume-rate to
    /// depth-rate conversion.
    pub catchment_area_m2: f64,
    /// Site latitude in decimal degrees (negative south), for the
    /// extraterrestrial radiation model.
    pub latitude_deg: f64,
}

/// Tunable analysis parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct Analysis {
    /// First hourly row the recession scan may consider. Must leave the
    /// smoothing window and the antecedent-rainfall window fully
    /// defined; the extractor rejects anything smaller than 73.
    #[serde(default = "default_start_row")]
    pub start_row: usize,
}

impl Default for Analysis {
    fn default() -> Self {
        Analysis { start_row: default_start_row() }
    }
}

fn default_start_row() -> usize {
    // One hour past the 72-hour smoothing window.
    73
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load a site configuration from a TOML file.
pub fn load_config(path: &str) -> Result<SiteConfig, Box<dyn Error>> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("Could not read config file {}: {}", path, e))?;
    let config: SiteConfig = toml::from_str(&text)
        .map_err(|e| format!("Could not parse config file {}: {}", path, e))?;

    if config.site.catchment_area_m2 <= 0.0 {
        return Err(format!(
            "catchment_area_m2 must be positive, got {}",
            config.site.catchment_area_m2
        )
        .into());
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"
        [site]
        name = "Weierbach"
        catchment_area_m2 = 450000.0
        latitude_deg = 49.83

        [analysis]
        start_row = 100
    "#;

    #[test]
    fn test_parse_full_config() {
        let config: SiteConfig = toml::from_str(EXAMPLE).expect("example config should parse");
        assert_eq!(config.site.name, "Weierbach");
        assert!((config.site.catchment_area_m2 - 450_000.0).abs() < 1e-9);
        assert_eq!(config.analysis.start_row, 100);
    }

    #[test]
    fn test_analysis_section_is_optional_with_defaults() {
        let minimal = r#"
            [site]
            name = "Test"
            catchment_area_m2 = 1.0e6
            latitude_deg = 50.0
        "#;
        let config: SiteConfig = toml::from_str(minimal).expect("minimal config should parse");
        assert_eq!(
            config.analysis.start_row, 73,
            "default start_row must sit one past the smoothing window"
        );
    }

    #[test]
    fn test_missing_site_section_is_an_error() {
        let result: Result<SiteConfig, _> = toml::from_str("[analysis]\nstart_row = 73");
        assert!(result.is_err(), "config without a [site] section must not parse");
    }
}
