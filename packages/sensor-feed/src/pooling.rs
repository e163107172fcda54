//! Average pooling over a sequence of feature vectors
//!
//! Feature vectors (typically one per inference window) are summed into a
//! fixed-width accumulator and read out as their element-wise mean.

/// Running element-wise mean of fixed-width vectors
#[derive(Debug, Clone)]
pub struct AvgPool {
    sum: Box<[f32]>,
    count: u32,
}

impl AvgPool {
    /// Create an empty accumulator for vectors of width `dim`
    pub fn new(dim: usize) -> Self {
        Self {
            sum: vec![0.0; dim].into_boxed_slice(),
            count: 0,
        }
    }

    /// Zero the sum and the sample count
    pub fn reset(&mut self) {
        self.sum.fill(0.0);
        self.count = 0;
    }

    /// Add one feature vector to the running sum
    ///
    /// `vec` must have exactly [`dim`](Self::dim) elements. This is only
    /// checked in debug builds; in release builds the shorter length wins.
    pub fn add(&mut self, vec: &[f32]) {
        debug_assert_eq!(vec.len(), self.sum.len(), "feature vector width mismatch");
        for (acc, &v) in self.sum.iter_mut().zip(vec) {
            *acc += v;
        }
        self.count += 1;
    }

    /// Write the mean of all added vectors into `out`
    ///
    /// Leaves the accumulator untouched, so it can be called repeatedly
    /// between [`add`](Self::add) calls.
    ///
    /// Precondition: at least one vector has been added. With a count of
    /// zero every output element is the result of `0.0 / 0.0` (NaN).
    pub fn finalize(&self, out: &mut [f32]) {
        debug_assert!(self.count > 0, "finalize called on an empty AvgPool");
        debug_assert_eq!(out.len(), self.sum.len(), "output width mismatch");
        let count = self.count as f32;
        for (o, &s) in out.iter_mut().zip(self.sum.iter()) {
            *o = s / count;
        }
    }

    /// The current mean as a new vector, or `None` before the first `add`
    pub fn mean(&self) -> Option<Vec<f32>> {
        if self.count == 0 {
            return None;
        }
        let mut out = vec![0.0; self.sum.len()];
        self.finalize(&mut out);
        Some(out)
    }

    pub fn dim(&self) -> usize {
        self.sum.len()
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
