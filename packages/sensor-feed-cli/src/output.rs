use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::exit_codes;

/// Write text to a file, or to stdout followed by a newline.
pub fn write_output(text: &str, output_path: Option<&str>) -> Result<(), String> {
    match output_path {
        Some(path) => std::fs::write(Path::new(path), text)
            .map_err(|e| format!("Failed to write output file '{}': {}", path, e)),
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(text.as_bytes())
                .and_then(|_| handle.write_all(b"\n"))
                .map_err(|e| format!("Failed to write to stdout: {}", e))
        }
    }
}

/// Serialize a value to JSON (pretty or compact).
pub fn to_json<T: Serialize>(value: &T, compact: bool) -> Result<String, String> {
    let result = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    result.map_err(|e| format!("JSON serialization failed: {}", e))
}

/// Serialize and write a value, returning the exit code for the outcome.
pub fn emit<T: Serialize>(value: &T, compact: bool, output_path: Option<&str>) -> i32 {
    match to_json(value, compact).and_then(|json| write_output(&json, output_path)) {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            exit_codes::EXECUTION_ERROR
        }
    }
}
