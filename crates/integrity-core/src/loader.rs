use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::schema::{Band, EngineConfig};

/// Load an [`EngineConfig`] from a YAML file on disk.
///
/// Validates the config after deserialization (version check, table sanity).
pub fn load_config(path: impl AsRef<Path>) -> Result<EngineConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read engine config: {}", path.display()))?;
    load_config_from_str(&contents)
        .with_context(|| format!("failed to parse engine config: {}", path.display()))
}

/// Parse and validate an [`EngineConfig`] from a YAML string.
pub fn load_config_from_str(yaml: &str) -> Result<EngineConfig> {
    let config: EngineConfig =
        serde_yml::from_str(yaml).context("YAML deserialization failed")?;
    validate(&config)?;
    Ok(config)
}

/// Run post-deserialization validation checks.
pub fn validate(config: &EngineConfig) -> Result<()> {
    if config.version != "1.0" {
        bail!(
            "unsupported config version '{}'; only '1.0' is supported",
            config.version
        );
    }

    for (name, bands) in config.score_bands.tables() {
        validate_bands(name, bands)?;
    }

    for (plan, discount) in &config.plans.discounts {
        if !(0.0..1.0).contains(discount) {
            bail!("discount for plan '{plan}' must be in [0, 1), got {discount}");
        }
    }
    for (plan, multiplier) in &config.plans.multipliers {
        if !multiplier.is_finite() || *multiplier <= 0.0 {
            bail!("multiplier for plan '{plan}' must be positive, got {multiplier}");
        }
    }

    if config.action.allowed_mission_types.is_empty() {
        bail!("allowed_mission_types must not be empty");
    }

    if config.queue.max_entries_per_queue == 0 {
        bail!("queue.max_entries_per_queue must be at least 1");
    }

    let mut seen = HashSet::new();
    for term in &config.action.forbidden_terms {
        if term.trim().is_empty() {
            bail!("forbidden term must not be empty");
        }
        if !seen.insert(term.to_lowercase()) {
            bail!("duplicate forbidden term: '{term}'");
        }
    }

    let mut seen = HashSet::new();
    for anomaly in &config.anomalies {
        if !(anomaly.max_rate > 0.0 && anomaly.max_rate <= 1.0) {
            bail!(
                "anomaly threshold for '{}' must be in (0, 1], got {}",
                anomaly.rule,
                anomaly.max_rate
            );
        }
        if !seen.insert(&anomaly.rule) {
            bail!("duplicate anomaly threshold for rule '{}'", anomaly.rule);
        }
    }

    Ok(())
}

/// Band thresholds must be finite and strictly descending so that the first
/// matching band is the highest applicable one. Points must not increase
/// down the list, otherwise a larger metric could score fewer points.
fn validate_bands(name: &str, bands: &[Band]) -> Result<()> {
    for band in bands {
        if !band.above.is_finite() {
            bail!("band threshold for '{name}' must be finite");
        }
    }
    for pair in bands.windows(2) {
        if pair[0].above <= pair[1].above {
            bail!(
                "bands for '{name}' must be sorted by descending threshold ({} then {})",
                pair[0].above,
                pair[1].above
            );
        }
        if pair[0].points < pair[1].points {
            bail!(
                "bands for '{name}' must not award more points to a lower threshold \
                 ({} points above {} but {} points above {})",
                pair[0].points,
                pair[0].above,
                pair[1].points,
                pair[1].above
            );
        }
    }
    Ok(())
}
