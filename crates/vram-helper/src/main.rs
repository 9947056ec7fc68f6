use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use utils::logging;
use utils::version;
use vram_helper::autodetect::autodetect;
use vram_helper::config::Cli;
use vram_helper::config::Commands;
use vram_helper::config::MonitorConfig;
use vram_helper::config::StartArgs;
use vram_helper::GpuQuery;
use vram_helper::Monitor;
use vram_helper::NotifySend;
use vram_helper::NvidiaSmi;

/// Sets up global panic hooks.
fn setup_global_hooks() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        default_hook(panic_info);
        tracing::error!("Thread panicked: {}", panic_info);
    }));
}

fn main() -> Result<()> {
    setup_global_hooks();

    let cli = Cli::parse();
    logging::init(cli.log_options());

    match cli.command {
        Some(Commands::Start(ref start_args)) => run_start(start_args, cli.autodetect()),
        None => {
            tracing::error!("No command to execute!");
            anyhow::bail!("no command to execute, try `vram-helper start`")
        }
    }
}

fn run_start(args: &StartArgs, autodetect: bool) -> Result<()> {
    tracing::info!("Starting vram-helper {}", &**version::VERSION);

    let config = MonitorConfig::try_from(args).context("invalid monitor configuration")?;
    let notifier = NotifySend::new(&args.notify_send);

    #[cfg(feature = "nvml")]
    {
        if args.nvml {
            let query = vram_helper::gpu_query::NvmlQuery::init()
                .context("failed to initialize NVML")?;
            return run_monitor(query, notifier, config, autodetect);
        }
    }

    run_monitor(NvidiaSmi::new(&args.nvidia_smi), notifier, config, autodetect)
}

fn run_monitor<Q: GpuQuery>(
    query: Q,
    notifier: NotifySend,
    mut config: MonitorConfig,
    detect: bool,
) -> Result<()> {
    if detect {
        autodetect(&query, &mut config).context("failed to autodetect GPU information")?;
    } else {
        tracing::warn!(
            "Autodetection disabled, make sure the configured limits match your GPU! \
             (max VRAM {}MiB of {}MiB, max temperature {}°C)",
            config.vram_max_mib,
            config.vram_total_mib,
            config.temperature_max_celsius
        );
    }

    let mut monitor = Monitor::new(query, notifier, config);
    match monitor.run().context("GPU monitoring stopped")? {}
}
