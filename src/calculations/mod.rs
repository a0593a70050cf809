pub mod backward_pass;
pub mod critical_path;
pub mod forward_pass;
pub mod rollup;

pub use backward_pass::{BackwardPass, LateDates};
pub use critical_path::{CriticalPathAnalysis, CriticalPathIdentifier};
pub use forward_pass::{EarlyDates, ForwardPass, ForwardPassResult};
pub use rollup::WbsAggregator;
