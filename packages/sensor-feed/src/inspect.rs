use std::path::Path;

use crate::dispenser::{InputDispenser, OutputBuffers};
use crate::error::{FeedError, Result};
use crate::pooling::AvgPool;
use crate::quantize::QuantParams;
use crate::storage::Storage;
use crate::types::{ChannelStats, FileSummary};

/// Stream a whole source once and summarise it
///
/// Header and open failures are returned as errors. Malformed rows are
/// counted, and the first one is reported in `first_error`.
pub fn inspect_source<S: Storage>(storage: S, path: &Path, columns: usize) -> Result<FileSummary> {
    let mut row = vec![0.0f32; columns];
    let mut dispenser = InputDispenser::with_storage(storage, path, columns, 1)?;
    dispenser.set_output_buffer(OutputBuffers::Float(&mut row))?;
    dispenser.begin()?;

    let mut means = AvgPool::new(columns);
    let mut min = vec![f32::INFINITY; columns];
    let mut max = vec![f32::NEG_INFINITY; columns];
    let mut data_rows = 0usize;
    let mut malformed_rows = 0usize;
    let mut first_error = None;

    loop {
        match dispenser.stream_next() {
            Ok(()) => {}
            Err(FeedError::EndOfData) => break,
            Err(e @ FeedError::MalformedRow { .. }) => {
                malformed_rows += 1;
                first_error.get_or_insert_with(|| e.to_string());
                continue;
            }
            Err(e) => return Err(e),
        }

        data_rows += 1;
        let values = dispenser.last_row();
        means.add(values);
        for ((lo, hi), &v) in min.iter_mut().zip(max.iter_mut()).zip(values) {
            *lo = lo.min(v);
            *hi = hi.max(v);
        }
    }

    let header = dispenser.header().to_vec();
    let (channels, suggested_quantisation) = match means.mean() {
        Some(mean) => {
            let channels: Vec<ChannelStats> = header
                .iter()
                .zip(mean)
                .zip(min.iter().zip(&max))
                .map(|((label, mean), (&min, &max))| ChannelStats {
                    label: label.clone(),
                    min,
                    max,
                    mean,
                })
                .collect();
            let lo = min.iter().copied().fold(f32::INFINITY, f32::min);
            let hi = max.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            (channels, QuantParams::from_range(lo, hi).ok())
        }
        None => (Vec::new(), None),
    };

    log::info!(
        "Inspected {}: {} data rows, {} malformed",
        path.display(),
        data_rows,
        malformed_rows
    );

    Ok(FileSummary {
        path: path.display().to_string(),
        columns,
        header,
        data_rows,
        malformed_rows,
        first_error,
        channels,
        suggested_quantisation,
    })
}
