pub mod detector;

pub use detector::{Alert, AlertDetector, AlertLevel};
