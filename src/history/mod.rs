pub mod channels;
pub mod series;
pub mod store;

pub use channels::{EntityHistory, Metric, MetricsHistory};
pub use series::{Sample, Series};
pub use store::DataStore;
