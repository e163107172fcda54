use sensor_feed::{DispenserConfig, OutputKind, QuantParams};
use std::path::Path;

/// Check that an input file exists and is a regular file.
pub fn validate_file(file: &str) -> Result<(), String> {
    let path = Path::new(file);
    if !path.exists() {
        return Err(format!("File not found: {}", file));
    }
    if !path.is_file() {
        return Err(format!("Not a regular file: {}", file));
    }
    Ok(())
}

/// Build a dispenser configuration from an optional JSON config plus flags.
///
/// Flags override values loaded from the config file.
pub fn build_config(
    config_path: Option<&str>,
    file: Option<&str>,
    columns: Option<usize>,
    rows: Option<usize>,
    scale: Option<f32>,
    zero_point: Option<i32>,
) -> Result<DispenserConfig, String> {
    let mut config = match config_path {
        Some(path) => {
            DispenserConfig::from_json_file(Path::new(path)).map_err(|e| e.to_string())?
        }
        None => {
            let file = file.ok_or("--file is required without --config")?;
            let columns = columns.ok_or("--columns is required without --config")?;
            let rows = rows.ok_or("--rows is required without --config")?;
            DispenserConfig::new(file, columns, rows)
        }
    };

    if let Some(file) = file {
        config.path = file.into();
    }
    if let Some(columns) = columns {
        config.columns = columns;
    }
    if let Some(rows) = rows {
        config.rows = rows;
    }
    if scale.is_some() || zero_point.is_some() {
        let current = config.quantisation;
        config.quantisation = QuantParams::new(
            scale.unwrap_or(current.scale),
            zero_point.unwrap_or(current.zero_point),
        )
        .map_err(|e| e.to_string())?;
    }

    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

/// Parse the --format flag into an output kind with at least one destination.
pub fn parse_format(format: &str) -> Result<OutputKind, String> {
    match format.parse::<OutputKind>() {
        Ok(OutputKind::None) | Err(_) => Err(format!(
            "Invalid format '{}': expected float, quantized or both",
            format
        )),
        Ok(kind) => Ok(kind),
    }
}
