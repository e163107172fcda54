use crate::cli::BatchArgs;
use crate::exit_codes;
use crate::output;
use rayon::prelude::*;
use sensor_feed::{inspect_source, FileSummary, FsStorage};
use std::path::Path;
use std::time::Instant;

pub fn execute(args: BatchArgs) -> i32 {
    let files = match resolve_files(&args) {
        Ok(f) => f,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };

    if files.is_empty() {
        eprintln!("Error: No matching files found");
        return exit_codes::INPUT_ERROR;
    }

    if args.dry_run {
        for f in &files {
            println!("{}", f);
        }
        if !args.quiet {
            eprintln!("Found {} file(s)", files.len());
        }
        return exit_codes::SUCCESS;
    }

    let start_time = Instant::now();
    let results: Vec<(String, Result<FileSummary, String>)> = files
        .par_iter()
        .map(|file| {
            let result = inspect_source(FsStorage, Path::new(file), args.columns)
                .map_err(|e| e.to_string());
            (file.clone(), result)
        })
        .collect();

    let total = results.len();
    let mut succeeded = 0usize;
    let mut failed = 0usize;

    for (file, result) in results {
        match result {
            Ok(summary) => {
                if summary.malformed_rows > 0 && !args.quiet {
                    eprintln!("  {}: {} malformed rows", file, summary.malformed_rows);
                }
                let code = output::emit(&summary, true, None);
                if code != exit_codes::SUCCESS {
                    eprintln!("  {}: failed to write summary", file);
                }
                if file_passed(&summary, code) {
                    succeeded += 1;
                } else {
                    failed += 1;
                }
            }
            Err(e) => {
                eprintln!("  {}: {}", file, e);
                failed += 1;
            }
        }
    }

    if !args.quiet {
        eprintln!(
            "Batch complete: {}/{} passed, {}/{} failed, {:.1}s",
            succeeded,
            total,
            failed,
            total,
            start_time.elapsed().as_secs_f64()
        );
    }

    if failed == 0 {
        exit_codes::SUCCESS
    } else if succeeded > 0 {
        exit_codes::PARTIAL_FAILURE
    } else {
        exit_codes::EXECUTION_ERROR
    }
}

fn resolve_files(args: &BatchArgs) -> Result<Vec<String>, String> {
    if let Some(ref pattern) = args.glob {
        resolve_glob(pattern)
    } else if let Some(ref files) = args.files {
        Ok(files.clone())
    } else {
        Err("One of --glob or --files must be specified".to_string())
    }
}

fn resolve_glob(pattern: &str) -> Result<Vec<String>, String> {
    let paths = glob::glob(pattern)
        .map_err(|e| format!("Invalid glob pattern '{}': {}", pattern, e))?;

    let mut files: Vec<String> = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => {
                if path.is_file() {
                    if let Some(s) = path.to_str() {
                        files.push(s.to_string());
                    }
                }
            }
            Err(e) => {
                log::warn!("glob error: {}", e);
            }
        }
    }
    files.sort();
    Ok(files)
}

/// A file passes when it has no malformed rows and its summary was written
fn file_passed(summary: &FileSummary, emit_code: i32) -> bool {
    summary.malformed_rows == 0 && emit_code == exit_codes::SUCCESS
}
