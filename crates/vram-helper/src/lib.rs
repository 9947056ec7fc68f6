//! Watches the VRAM usage and temperature of the main NVIDIA GPU and sends a
//! desktop warning whenever either climbs past its limit.

pub mod autodetect;
pub mod config;
pub mod gpu_query;
pub mod monitor;
pub mod notify;
pub mod threshold;

pub use gpu_query::{GpuQuery, GpuQueryError, NvidiaSmi, Reading};
pub use monitor::Monitor;
pub use notify::{NotifySend, Notifier, Urgency};
pub use threshold::{Metric, Threshold, Transition};
