use std::path::PathBuf;

use clap::Parser;

use crate::gpu_query::NvidiaSmi;
use crate::notify::NotifySend;
use crate::notify::Urgency;

#[derive(Parser, Debug, Clone)]
pub struct StartArgs {
    #[arg(
        long,
        env = "VRAM_HELPER_MAX_VRAM",
        default_value_t = 1900,
        help = "Maximum acceptable VRAM usage in MiB, overridden by autodetection"
    )]
    pub max_vram: u64,

    #[arg(
        long,
        env = "VRAM_HELPER_VRAM_STEP",
        default_value_t = 100,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Send another warning for every this many MiB above the maximum"
    )]
    pub vram_step: u64,

    #[arg(
        long,
        env = "VRAM_HELPER_VRAM_TOTAL",
        default_value_t = 2048,
        help = "Total VRAM in MiB, overridden by autodetection"
    )]
    pub vram_total: u64,

    #[arg(
        long,
        env = "VRAM_HELPER_MAX_TEMP",
        default_value_t = 80,
        help = "Maximum acceptable GPU temperature in °C"
    )]
    pub max_temp: u64,

    #[arg(
        long,
        env = "VRAM_HELPER_TEMP_STEP",
        default_value_t = 5,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Send another warning for every this many °C above the maximum"
    )]
    pub temp_step: u64,

    #[arg(
        long,
        env = "VRAM_HELPER_INTERVAL",
        default_value_t = 2,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Seconds between two samples"
    )]
    pub interval: u64,

    #[arg(
        long,
        env = "VRAM_HELPER_URGENCY",
        value_enum,
        default_value_t = Urgency::Critical,
        help = "Urgency of the desktop notifications"
    )]
    pub urgency: Urgency,

    #[arg(
        long,
        env = "VRAM_HELPER_NVIDIA_SMI",
        default_value = NvidiaSmi::DEFAULT_PROGRAM,
        value_hint = clap::ValueHint::CommandName,
        help = "nvidia-smi executable used to query the GPU"
    )]
    pub nvidia_smi: PathBuf,

    #[arg(
        long,
        env = "VRAM_HELPER_NOTIFY_SEND",
        default_value = NotifySend::DEFAULT_PROGRAM,
        value_hint = clap::ValueHint::CommandName,
        help = "notify-send executable used to show warnings"
    )]
    pub notify_send: PathBuf,

    #[cfg(feature = "nvml")]
    #[arg(
        long,
        help = "Query the GPU through NVML instead of nvidia-smi",
        default_value_t = false
    )]
    pub nvml: bool,
}
