pub mod batch;
pub mod pool;

pub use batch::{evaluate_batch, evaluate_request, TtkRequest};
pub use pool::WorkerPool;
