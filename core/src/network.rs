pub mod tcp;
pub mod trace;

pub use tcp::LivenessProbe;
pub use trace::{FingerprintConfig, FingerprintProbe};
