use crate::cli::PoolArgs;
use crate::exit_codes;
use crate::feed_params;
use crate::output;
use sensor_feed::{
    AvgPool, FeedError, FsStorage, InputDispenser, OutputBuffers, PooledFeatures, Storage,
};
use std::path::Path;

pub fn execute(args: PoolArgs) -> i32 {
    if let Err(msg) = feed_params::validate_file(&args.file) {
        eprintln!("Error: {}", msg);
        return exit_codes::INPUT_ERROR;
    }

    match pool_rows(FsStorage, Path::new(&args.file), args.dim, args.skip_malformed) {
        Ok(result) => output::emit(&result, args.compact, args.output.as_deref()),
        Err(e) => {
            eprintln!("Pooling failed: {}", e);
            exit_codes::for_error(&e)
        }
    }
}

/// Average every row of a feature CSV, each row being one feature vector
fn pool_rows<S: Storage>(
    storage: S,
    path: &Path,
    dim: usize,
    skip_malformed: bool,
) -> Result<PooledFeatures, FeedError> {
    let mut row = vec![0.0f32; dim];
    let mut dispenser = InputDispenser::with_storage(storage, path, dim, 1)?;
    dispenser.set_output_buffer(OutputBuffers::Float(&mut row))?;
    dispenser.begin()?;

    let mut pool = AvgPool::new(dim);
    let mut skipped = 0usize;
    loop {
        match dispenser.stream_next() {
            Ok(()) => pool.add(dispenser.last_row()),
            Err(FeedError::EndOfData) => break,
            Err(e @ FeedError::MalformedRow { .. }) if skip_malformed => {
                log::warn!("Skipping row: {}", e);
                skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    let features = pool.mean().ok_or(FeedError::EndOfData)?;
    let count = pool.count() as usize;
    Ok(PooledFeatures::new(
        path.display().to_string(),
        count,
        count,
        skipped,
        features,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensor_feed::MemoryStorage;

    #[test]
    fn test_pool_rows_mean() {
        let storage = MemoryStorage::new().with_file("f.csv", "f0,f1\n1,2\n3,4\n");
        let result = pool_rows(storage, Path::new("f.csv"), 2, false).unwrap();
        assert_eq!(result.features, vec![2.0, 3.0]);
        assert_eq!(result.windows, 2);
    }

    #[test]
    fn test_pool_rows_skip_malformed() {
        let storage = MemoryStorage::new().with_file("f.csv", "f0,f1\n1,2\n3\n5,6\n");
        assert!(matches!(
            pool_rows(&storage, Path::new("f.csv"), 2, false),
            Err(FeedError::MalformedRow { .. })
        ));
        let result = pool_rows(&storage, Path::new("f.csv"), 2, true).unwrap();
        assert_eq!(result.features, vec![3.0, 4.0]);
        assert_eq!(result.rows_skipped, 1);
    }

    #[test]
    fn test_pool_rows_empty_file() {
        let storage = MemoryStorage::new().with_file("f.csv", "f0\n");
        assert!(matches!(
            pool_rows(storage, Path::new("f.csv"), 1, false),
            Err(FeedError::EndOfData)
        ));
    }
}
