use anyhow::{Context, Result, bail};
use chrono_tz::Tz;
use schemars::{Schema, schema_for};
use serde_valid::Validate;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, trace};

use super::models::Config;

/// Load configuration from a string slice.
pub fn load_from_str(s: &str) -> Result<Config> {
    let cfg: Config =
        serde_json::from_str(s).context("Failed to parse JSON config string into Config")?;
    validate_config(&cfg)?;
    Ok(cfg)
}

/// Load configuration from any reader (e.g., a file).
pub fn load_from_reader<R: Read>(reader: R) -> Result<Config> {
    let cfg: Config =
        serde_json::from_reader(reader).context("Failed to parse JSON config from reader")?;
    validate_config(&cfg)?;
    Ok(cfg)
}

/// Load configuration from a file path synchronously.
pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path_ref = path.as_ref();
    let file = File::open(path_ref)
        .with_context(|| format!("Failed to open config file {}", path_ref.display()))?;
    let cfg = load_from_reader(file)?;
    debug!("Loaded config from {}", path_ref.display());
    Ok(cfg)
}

/// Load configuration from a file path asynchronously (Tokio).
pub async fn load_from_path_async<P: AsRef<Path>>(path: P) -> Result<Config> {
    use tokio::fs;
    let path_ref = path.as_ref();
    let bytes = fs::read(path_ref)
        .await
        .with_context(|| format!("Failed to read config file {}", path_ref.display()))?;
    let cfg: Config = serde_json::from_slice(&bytes)
        .with_context(|| format!("Failed to parse JSON config from {}", path_ref.display()))?;
    validate_config(&cfg)?;
    debug!("Loaded config from {}", path_ref.display());
    Ok(cfg)
}

/// Generate the JSON Schema for the Config model (for external validation or tooling).
pub fn generate_schema() -> Schema {
    schema_for!(Config)
}

/// Write the JSON Schema for the Config model to any writer (pretty-printed).
pub fn write_schema_to_writer<W: Write>(mut writer: W) -> Result<()> {
    let schema = generate_schema();
    let json = serde_json::to_string_pretty(&schema).context("Failed to serialize schema")?;
    writer
        .write_all(json.as_bytes())
        .context("Failed to write schema to writer")?;
    Ok(())
}

/// Check everything the generators assume about their inputs:
/// - field ranges declared on the models (probabilities, hours, weekdays)
/// - every min/max pair is ordered
/// - the working-hours window is non-empty and the timezone resolves
pub fn validate_config(cfg: &Config) -> Result<()> {
    cfg.validate()
        .map_err(|errors| anyhow::anyhow!("{errors}"))
        .context("Config field validation failed")?;

    ensure_ordered(
        "mouse.min_speed",
        cfg.mouse.min_speed,
        "mouse.max_speed",
        cfg.mouse.max_speed,
    )?;
    ensure_ordered(
        "typing.min_key_delay_ms",
        cfg.typing.min_key_delay_ms,
        "typing.max_key_delay_ms",
        cfg.typing.max_key_delay_ms,
    )?;
    ensure_ordered(
        "scrolling.min_speed",
        cfg.scrolling.min_speed,
        "scrolling.max_speed",
        cfg.scrolling.max_speed,
    )?;
    ensure_ordered(
        "timing.min_action_delay_ms",
        cfg.timing.min_action_delay_ms,
        "timing.max_action_delay_ms",
        cfg.timing.max_action_delay_ms,
    )?;
    ensure_ordered(
        "timing.min_think_time_ms",
        cfg.timing.min_think_time_ms,
        "timing.max_think_time_ms",
        cfg.timing.max_think_time_ms,
    )?;

    let schedule = &cfg.schedule;
    if schedule.start_hour >= schedule.end_hour {
        bail!(
            "schedule.start_hour ({}) must be before schedule.end_hour ({})",
            schedule.start_hour,
            schedule.end_hour
        );
    }
    if let Some(day) = schedule.work_days.iter().find(|d| **d > 6) {
        bail!("schedule.work_days contains {day}; weekdays are numbered 0 (Sunday) to 6");
    }
    schedule
        .timezone
        .parse::<Tz>()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("Unknown schedule.timezone '{}'", schedule.timezone))?;

    trace!("Config validation passed");
    Ok(())
}

fn ensure_ordered<T: PartialOrd + std::fmt::Display>(
    min_name: &str,
    min: T,
    max_name: &str,
    max: T,
) -> Result<()> {
    if min > max {
        bail!("{min_name} ({min}) must not exceed {max_name} ({max})");
    }
    Ok(())
}
