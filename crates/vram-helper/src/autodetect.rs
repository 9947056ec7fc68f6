//! Fills in the GPU dependent limits before monitoring starts.

use crate::config::MonitorConfig;
use crate::gpu_query::GpuQuery;
use crate::gpu_query::GpuQueryError;

/// Share of the total VRAM considered acceptable, in percent.
pub const VRAM_MAX_PERCENT: u64 = 90;

/// Detects the GPU and derives the VRAM limits from its capacity.
///
/// A missing query tool is fatal. Any other failure keeps the configured
/// values.
pub fn autodetect<Q: GpuQuery>(query: &Q, config: &mut MonitorConfig) -> Result<(), GpuQueryError> {
    tracing::info!("Attempting to autodetect necessary info...");

    match detect(query, config) {
        Ok(()) => Ok(()),
        Err(e @ GpuQueryError::NotFound { .. }) => {
            tracing::error!("Failed to gather necessary info: {e}");
            Err(e)
        }
        Err(e) => {
            tracing::error!("Failed to gather necessary info, keeping configured values: {e}");
            Ok(())
        }
    }
}

fn detect<Q: GpuQuery>(query: &Q, config: &mut MonitorConfig) -> Result<(), GpuQueryError> {
    let name = query.gpu_name()?;
    tracing::info!("Detected GPU: {name}");

    let total = query.memory_total_mib()?;
    config.vram_total_mib = total;
    config.vram_max_mib = total.saturating_mul(VRAM_MAX_PERCENT) / 100;
    tracing::info!("Detected {total}MiB of VRAM available");
    tracing::info!("Maximum VRAM usage set to {}MiB", config.vram_max_mib);

    tracing::info!("Updating every {}s", config.interval.as_secs_f64());
    tracing::info!(
        "Max acceptable temperature is set to {}°C",
        config.temperature_max_celsius
    );
    Ok(())
}
