use nvml_wrapper::enum_wrappers::device::TemperatureSensor;
use nvml_wrapper::Device;
use nvml_wrapper::Nvml;

use super::GpuQuery;
use super::GpuQueryError;

const MIB: u64 = 1024 * 1024;

/// Queries the main GPU through NVML instead of spawning `nvidia-smi`.
pub struct NvmlQuery {
    nvml: Nvml,
}

impl NvmlQuery {
    pub fn init() -> Result<Self, GpuQueryError> {
        Ok(Self { nvml: Nvml::init()? })
    }

    fn device(&self) -> Result<Device<'_>, GpuQueryError> {
        Ok(self.nvml.device_by_index(0)?)
    }
}

impl GpuQuery for NvmlQuery {
    fn memory_used_mib(&self) -> Result<u64, GpuQueryError> {
        Ok(self.device()?.memory_info()?.used / MIB)
    }

    fn memory_total_mib(&self) -> Result<u64, GpuQueryError> {
        Ok(self.device()?.memory_info()?.total / MIB)
    }

    fn temperature_celsius(&self) -> Result<u64, GpuQueryError> {
        Ok(u64::from(
            self.device()?.temperature(TemperatureSensor::Gpu)?,
        ))
    }

    fn gpu_name(&self) -> Result<String, GpuQueryError> {
        Ok(self.device()?.name()?)
    }
}
