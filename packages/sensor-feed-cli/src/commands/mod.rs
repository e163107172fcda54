pub mod batch;
pub mod inspect;
pub mod pool;
pub mod stream;
