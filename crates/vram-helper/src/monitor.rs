//! The polling loop.

use std::convert::Infallible;
use std::thread;

use crate::config::MonitorConfig;
use crate::gpu_query::GpuQuery;
use crate::gpu_query::GpuQueryError;
use crate::gpu_query::Reading;
use crate::notify::Notifier;
use crate::threshold::Metric;
use crate::threshold::Threshold;
use crate::threshold::Transition;

/// Notification summary line.
pub const ALERT_SUMMARY: &str = "Warning!";

/// A warning produced by a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub metric: Metric,
    pub value: u64,
    pub message: String,
    /// Whether the notifier accepted the message.
    pub delivered: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub reading: Reading,
    pub temperature: Transition,
    pub vram: Transition,
    pub alerts: Vec<Alert>,
}

pub struct Monitor<Q, N> {
    query: Q,
    notifier: N,
    config: MonitorConfig,
    vram: Threshold,
    temperature: Threshold,
}

impl<Q: GpuQuery, N: Notifier> Monitor<Q, N> {
    pub fn new(query: Q, notifier: N, config: MonitorConfig) -> Self {
        let vram = Threshold::new(config.vram_max_mib, config.vram_step_mib);
        let temperature =
            Threshold::new(config.temperature_max_celsius, config.temperature_step_celsius);
        Self {
            query,
            notifier,
            config,
            vram,
            temperature,
        }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn threshold(&self, metric: Metric) -> &Threshold {
        match metric {
            Metric::Vram => &self.vram,
            Metric::Temperature => &self.temperature,
        }
    }

    /// Samples the GPU once and sends the warnings that are due.
    ///
    /// Only a failed query is an error, failed notifications are logged and
    /// reported through [`Alert::delivered`].
    pub fn tick(&mut self) -> Result<TickReport, GpuQueryError> {
        let reading = self.query.sample()?;
        tracing::info!(
            "VRAM usage: {} MiB, temp: {}°C",
            reading.vram_used_mib,
            reading.temperature_celsius
        );

        let mut alerts = Vec::new();

        let temperature = self.temperature.observe(reading.temperature_celsius);
        self.log_recovery(Metric::Temperature, temperature);
        if temperature.is_raised() {
            let message = temperature_message(reading.temperature_celsius);
            alerts.push(self.alert(Metric::Temperature, reading.temperature_celsius, message));
        }

        let vram = self.vram.observe(reading.vram_used_mib);
        self.log_recovery(Metric::Vram, vram);
        if vram.is_raised() {
            let message = vram_message(reading.vram_used_mib, self.config.vram_total_mib);
            alerts.push(self.alert(Metric::Vram, reading.vram_used_mib, message));
        }

        Ok(TickReport {
            reading,
            temperature,
            vram,
            alerts,
        })
    }

    /// Ticks forever, sleeping the configured interval in between.
    ///
    /// Returns with the first query error, left to the caller to report.
    pub fn run(&mut self) -> Result<Infallible, GpuQueryError> {
        loop {
            self.tick()?;
            thread::sleep(self.config.interval);
        }
    }

    fn alert(&self, metric: Metric, value: u64, message: String) -> Alert {
        tracing::warn!("{message}");
        let delivered = match self
            .notifier
            .notify(self.config.urgency, ALERT_SUMMARY, &message)
        {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to send {metric} warning: {e}");
                false
            }
        };
        Alert {
            metric,
            value,
            message,
            delivered,
        }
    }

    fn log_recovery(&self, metric: Metric, transition: Transition) {
        if let Transition::Recovered { to, .. } = transition {
            tracing::debug!(
                "{metric} threshold lowered to {to}{unit}, next warning above {}{unit}",
                self.threshold(metric).alert_level(),
                unit = metric.unit()
            );
        }
    }
}

pub fn temperature_message(celsius: u64) -> String {
    format!("GPU temperature exceeded {celsius}°C")
}

pub fn vram_message(used_mib: u64, total_mib: u64) -> String {
    let free = total_mib.saturating_sub(used_mib);
    let percent = used_mib
        .saturating_mul(100)
        .checked_div(total_mib)
        .unwrap_or(0);
    format!("VRAM usage critical! {used_mib}/{total_mib}MiB ({free}MiB free, {percent}% used)")
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::time::Duration;

    use similar_asserts::assert_eq;
    use tempfile::TempDir;
    use test_log::test;

    use super::*;
    use crate::gpu_query::tests::fake_nvidia_smi;
    use crate::gpu_query::NvidiaSmi;
    use crate::notify::NotifyError;
    use crate::notify::Urgency;

    /// Replays scripted readings, failing once they run out.
    struct ScriptedQuery {
        readings: RefCell<VecDeque<(u64, u64)>>,
    }

    impl ScriptedQuery {
        fn new(readings: &[(u64, u64)]) -> Self {
            Self {
                readings: RefCell::new(readings.iter().copied().collect()),
            }
        }

        fn next(&self) -> Result<(u64, u64), GpuQueryError> {
            self.readings
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| GpuQueryError::NotFound {
                    program: "scripted".to_string(),
                })
        }
    }

    impl GpuQuery for ScriptedQuery {
        fn memory_used_mib(&self) -> Result<u64, GpuQueryError> {
            unreachable!("sample is overridden")
        }

        fn memory_total_mib(&self) -> Result<u64, GpuQueryError> {
            Ok(2048)
        }

        fn temperature_celsius(&self) -> Result<u64, GpuQueryError> {
            unreachable!("sample is overridden")
        }

        fn gpu_name(&self) -> Result<String, GpuQueryError> {
            Ok("scripted".to_string())
        }

        fn sample(&self) -> Result<Reading, GpuQueryError> {
            let (vram_used_mib, temperature_celsius) = self.next()?;
            Ok(Reading {
                vram_used_mib,
                temperature_celsius,
            })
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: RefCell<Vec<(Urgency, String, String)>>,
        fail: bool,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, urgency: Urgency, summary: &str, body: &str) -> Result<(), NotifyError> {
            self.sent
                .borrow_mut()
                .push((urgency, summary.to_string(), body.to_string()));
            if self.fail {
                Err(NotifyError::NotFound {
                    program: "recording".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn monitor(
        readings: &[(u64, u64)],
        notifier: RecordingNotifier,
    ) -> Monitor<ScriptedQuery, RecordingNotifier> {
        Monitor::new(ScriptedQuery::new(readings), notifier, MonitorConfig {
            interval: Duration::from_millis(1),
            ..Default::default()
        })
    }

    #[test]
    fn quiet_below_limits() {
        let mut monitor = monitor(&[(1000, 60), (1900, 80)], RecordingNotifier::default());

        for _ in 0..2 {
            let report = monitor.tick().unwrap();
            assert!(report.alerts.is_empty());
        }
        assert!(monitor.notifier().sent.borrow().is_empty());
    }

    #[test]
    fn vram_alert_message() {
        let mut monitor = monitor(&[(1950, 60)], RecordingNotifier::default());

        let report = monitor.tick().unwrap();

        assert_eq!(report.reading, Reading {
            vram_used_mib: 1950,
            temperature_celsius: 60,
        });
        assert_eq!(report.vram, Transition::Raised {
            from: 1800,
            to: 1900
        });
        assert_eq!(report.alerts, vec![Alert {
            metric: Metric::Vram,
            value: 1950,
            message: "VRAM usage critical! 1950/2048MiB (98MiB free, 95% used)".to_string(),
            delivered: true,
        }]);
        assert_eq!(monitor.notifier().sent.borrow().clone(), vec![(
            Urgency::Critical,
            "Warning!".to_string(),
            "VRAM usage critical! 1950/2048MiB (98MiB free, 95% used)".to_string(),
        )]);
    }

    #[test]
    fn simultaneous_breaches_alert_independently() {
        let mut monitor = monitor(&[(2001, 90), (2001, 90)], RecordingNotifier::default());

        let report = monitor.tick().unwrap();
        let metrics: Vec<_> = report.alerts.iter().map(|a| a.metric).collect();
        assert_eq!(metrics, vec![Metric::Temperature, Metric::Vram]);
        assert_eq!(
            report.alerts[0].message,
            "GPU temperature exceeded 90°C".to_string()
        );

        let report = monitor.tick().unwrap();
        assert!(report.alerts.is_empty());
        assert_eq!(monitor.notifier().sent.borrow().len(), 2);
    }

    #[test]
    fn realerts_only_after_another_step() {
        let readings = [
            (1901, 50),
            (1990, 50),
            (2000, 50),
            (2001, 50),
            (1850, 50),
            (1850, 50),
            (2001, 50),
        ];
        let mut monitor = monitor(&readings, RecordingNotifier::default());

        let alerts: Vec<usize> = (0..readings.len())
            .map(|_| monitor.tick().unwrap().alerts.len())
            .collect();

        assert_eq!(alerts, vec![1, 0, 0, 1, 0, 0, 1]);
        assert_eq!(monitor.threshold(Metric::Vram).marker(), 2000);
        assert_eq!(monitor.threshold(Metric::Temperature).marker(), 75);
    }

    #[test]
    fn notification_failure_is_not_fatal() {
        let notifier = RecordingNotifier {
            fail: true,
            ..Default::default()
        };
        let mut monitor = monitor(&[(2100, 95), (2300, 95)], notifier);

        let report = monitor.tick().unwrap();
        assert_eq!(report.alerts.len(), 2);
        assert!(report.alerts.iter().all(|a| !a.delivered));

        let report = monitor.tick().unwrap();
        assert_eq!(report.alerts.len(), 1);
        assert_eq!(monitor.notifier().sent.borrow().len(), 3);
    }

    #[test]
    fn run_stops_at_first_query_error() {
        let mut monitor = monitor(&[(100, 40), (2500, 40)], RecordingNotifier::default());

        let err = match monitor.run() {
            Ok(never) => match never {},
            Err(e) => e,
        };

        assert!(matches!(err, GpuQueryError::NotFound { .. }));
        assert_eq!(monitor.notifier().sent.borrow().len(), 1);
    }

    #[test]
    fn ticks_against_nvidia_smi() {
        let dir = TempDir::new().unwrap();
        let query = NvidiaSmi::new(fake_nvidia_smi(&dir, "4000", "4096", "70"));
        let config = MonitorConfig {
            vram_max_mib: 3800,
            vram_step_mib: 200,
            vram_total_mib: 4096,
            ..Default::default()
        };
        let mut monitor = Monitor::new(query, RecordingNotifier::default(), config);

        let report = monitor.tick().unwrap();

        assert_eq!(report.temperature, Transition::Steady);
        assert_eq!(report.vram, Transition::Raised {
            from: 3600,
            to: 3800
        });
        assert_eq!(
            report.alerts[0].message,
            "VRAM usage critical! 4000/4096MiB (96MiB free, 97% used)"
        );
    }

    #[test]
    fn vram_message_handles_unknown_total() {
        assert_eq!(
            vram_message(500, 0),
            "VRAM usage critical! 500/0MiB (0MiB free, 0% used)"
        );
        assert_eq!(
            vram_message(1024, 1024),
            "VRAM usage critical! 1024/1024MiB (0MiB free, 100% used)"
        );
    }
}
