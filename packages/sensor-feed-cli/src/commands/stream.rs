use crate::cli::StreamArgs;
use crate::exit_codes;
use crate::feed_params;
use crate::output;
use sensor_feed::{
    DispenserConfig, FeedError, FsStorage, InputDispenser, MmapStorage, OutputBuffers, OutputKind,
    QuantParams, Storage,
};
use serde::Serialize;

#[derive(Serialize)]
struct WindowOutput {
    index: usize,
    /// Data row count (1-based) of the row that completed this window
    last_row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    float: Option<Vec<f32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quantized: Option<Vec<u8>>,
}

#[derive(Serialize)]
struct StreamOutput {
    source: String,
    header: Vec<String>,
    columns: usize,
    rows: usize,
    format: OutputKind,
    quantisation: QuantParams,
    rows_streamed: usize,
    rows_skipped: usize,
    partial_rows: usize,
    windows: Vec<WindowOutput>,
}

pub fn execute(args: StreamArgs) -> i32 {
    let config = match feed_params::build_config(
        args.config.as_deref(),
        args.file.as_deref(),
        args.columns,
        args.rows,
        args.scale,
        args.zero_point,
    ) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };

    let kind = match feed_params::parse_format(&args.format) {
        Ok(k) => k,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };

    if let Some(path) = config.path.to_str() {
        if let Err(msg) = feed_params::validate_file(path) {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    }

    if !args.quiet {
        eprintln!("Streaming {}...", config.path.display());
        eprintln!("  Window: {} columns x {} rows", config.columns, config.rows);
        eprintln!(
            "  Quantisation: scale={}, zero_point={}",
            config.quantisation.scale, config.quantisation.zero_point
        );
    }

    let result = if args.mmap {
        stream_windows(MmapStorage, &config, kind, &args)
    } else {
        stream_windows(FsStorage, &config, kind, &args)
    };

    match result {
        Ok(out) => {
            if !args.quiet {
                eprintln!(
                    "Streamed {} rows into {} windows ({} skipped)",
                    out.rows_streamed,
                    out.windows.len(),
                    out.rows_skipped
                );
            }
            output::emit(&out, args.compact, args.output.as_deref())
        }
        Err(e) => {
            eprintln!("Streaming failed: {}", e);
            exit_codes::for_error(&e)
        }
    }
}

fn stream_windows<S: Storage>(
    storage: S,
    config: &DispenserConfig,
    kind: OutputKind,
    args: &StreamArgs,
) -> Result<StreamOutput, FeedError> {
    let window_len = config.window_len();
    let mut float = vec![0.0f32; if kind.writes_float() { window_len } else { 0 }];
    let mut quantized = vec![0u8; if kind.writes_quantized() { window_len } else { 0 }];

    let mut dispenser = InputDispenser::from_config(storage, config)?;
    dispenser.set_output_buffer(OutputBuffers::from_parts(
        kind.writes_float().then_some(float.as_mut_slice()),
        kind.writes_quantized().then_some(quantized.as_mut_slice()),
    ))?;
    dispenser.begin()?;

    let mut windows = Vec::new();
    let mut rows_streamed = 0usize;
    let mut rows_skipped = 0usize;

    loop {
        match dispenser.stream_next() {
            Ok(()) => rows_streamed += 1,
            Err(FeedError::EndOfData) => break,
            Err(e @ FeedError::MalformedRow { .. }) if args.skip_malformed => {
                log::warn!("Skipping row: {}", e);
                rows_skipped += 1;
                continue;
            }
            Err(e) => return Err(e),
        }

        if dispenser.row_cursor() == 0 {
            let window = dispenser.output();
            windows.push(WindowOutput {
                index: windows.len(),
                last_row: rows_streamed + rows_skipped,
                float: window.float().map(<[f32]>::to_vec),
                quantized: window.quantized().map(<[u8]>::to_vec),
            });
            if args.max_windows.is_some_and(|max| windows.len() >= max) {
                break;
            }
        }
    }

    Ok(StreamOutput {
        source: config.path.display().to_string(),
        header: dispenser.header().to_vec(),
        columns: config.columns,
        rows: config.rows,
        format: kind,
        quantisation: dispenser.quantisation(),
        rows_streamed,
        rows_skipped,
        partial_rows: dispenser.row_cursor(),
        windows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensor_feed::MemoryStorage;

    fn make_args() -> StreamArgs {
        StreamArgs {
            config: None,
            file: Some("s.csv".to_string()),
            columns: Some(2),
            rows: Some(2),
            scale: None,
            zero_point: None,
            format: "both".to_string(),
            max_windows: None,
            skip_malformed: false,
            mmap: false,
            output: None,
            compact: true,
            quiet: true,
        }
    }

    fn storage() -> MemoryStorage {
        MemoryStorage::new().with_file("s.csv", "a,b\n1,2\n3,4\n5,6\n7,8\n9,10\n")
    }

    #[test]
    fn test_stream_windows_both_formats() {
        let args = make_args();
        let config = DispenserConfig::new("s.csv", 2, 2)
            .with_quantisation(QuantParams::new(0.5, 0).unwrap());
        let out = stream_windows(storage(), &config, OutputKind::Both, &args).unwrap();

        assert_eq!(out.rows_streamed, 5);
        assert_eq!(out.partial_rows, 1);
        assert_eq!(out.windows.len(), 2);
        assert_eq!(out.windows[0].float.as_deref(), Some(&[1.0, 3.0, 2.0, 4.0][..]));
        assert_eq!(out.windows[1].quantized.as_deref(), Some(&[10, 14, 12, 16][..]));
        assert_eq!(out.windows[1].last_row, 4);
    }

    #[test]
    fn test_stream_windows_respects_max_windows() {
        let mut args = make_args();
        args.max_windows = Some(1);
        let config = DispenserConfig::new("s.csv", 2, 2);
        let out = stream_windows(storage(), &config, OutputKind::Float, &args).unwrap();
        assert_eq!(out.windows.len(), 1);
        assert!(out.windows[0].quantized.is_none());
    }

    #[test]
    fn test_stream_windows_schema_mismatch() {
        let args = make_args();
        let config = DispenserConfig::new("s.csv", 3, 2);
        let err = stream_windows(storage(), &config, OutputKind::Float, &args)
            .err()
            .unwrap();
        assert_eq!(exit_codes::for_error(&err), exit_codes::SCHEMA_ERROR);
    }
}
