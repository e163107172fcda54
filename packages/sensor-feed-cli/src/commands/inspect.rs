use crate::cli::InspectArgs;
use crate::exit_codes;
use crate::feed_params;
use crate::output;
use sensor_feed::{inspect_source, FsStorage};
use std::path::Path;

pub fn execute(args: InspectArgs) -> i32 {
    if let Err(msg) = feed_params::validate_file(&args.file) {
        eprintln!("Error: {}", msg);
        return exit_codes::INPUT_ERROR;
    }

    let summary = match inspect_source(FsStorage, Path::new(&args.file), args.columns) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::for_error(&e);
        }
    };

    if args.json {
        let code = output::emit(&summary, false, None);
        if code != exit_codes::SUCCESS {
            return code;
        }
    } else {
        println!(
            "File '{}': {} columns, {} data rows, {} malformed",
            summary.path, summary.columns, summary.data_rows, summary.malformed_rows
        );
        for ch in &summary.channels {
            println!(
                "  {:<16} min={:<12} max={:<12} mean={}",
                ch.label, ch.min, ch.max, ch.mean
            );
        }
        if let Some(q) = summary.suggested_quantisation {
            println!("Suggested quantisation: scale={} zero_point={}", q.scale, q.zero_point);
        }
    }

    if let Some(ref err) = summary.first_error {
        eprintln!("First error: {}", err);
    }

    if summary.malformed_rows > 0 {
        exit_codes::SCHEMA_ERROR
    } else {
        exit_codes::SUCCESS
    }
}
