//! Resource governor: CPU/memory-pressure-driven dispatch ceiling.
//!
//! Grounded verbatim on `original_source/scc-top/tools/scc/automation/
//! resource_governor.py`'s `GovernorConfig` and `decide_max_outstanding`
//! hysteresis function. The Python original reads `/proc/loadavg` and
//! `/proc/meminfo`; this port takes samples through a `PressureSampler`
//! trait so the decision function itself stays unit-testable without
//! touching the real `/proc` filesystem.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use crate::domain::models::GovernorConfig;

/// A point-in-time CPU/memory utilization sample, each in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy)]
pub struct PressureSample {
    pub cpu: f64,
    pub mem: f64,
}

#[async_trait]
pub trait PressureSampler: Send + Sync {
    async fn sample(&self) -> PressureSample;
}

/// Always reports zero pressure; used when no real sampler is wired
/// (tests, or platforms without `/proc`).
pub struct NullSampler;

#[async_trait]
impl PressureSampler for NullSampler {
    async fn sample(&self) -> PressureSample {
        PressureSample { cpu: 0.0, mem: 0.0 }
    }
}

/// Tracks a hysteresis-controlled `max_outstanding` ceiling that the
/// scheduler consults alongside per-agent capacity.
pub struct ResourceGovernor {
    config: GovernorConfig,
    current: AtomicU32,
}

impl ResourceGovernor {
    pub fn new(config: GovernorConfig) -> Self {
        let current = config.max_outstanding;
        Self {
            config,
            current: AtomicU32::new(current),
        }
    }

    pub async fn current_max_outstanding(&self) -> u32 {
        self.current.load(Ordering::Relaxed)
    }

    /// Re-evaluates the ceiling from a fresh pressure sample and returns
    /// the new value. High pressure steps the ceiling down; low pressure
    /// steps it back up; anything in between holds steady.
    pub fn evaluate(&self, sample: PressureSample) -> u32 {
        let prev = self.current.load(Ordering::Relaxed);
        let next = decide_max_outstanding(&self.config, prev, sample);
        self.current.store(next, Ordering::Relaxed);
        next
    }

    pub async fn tick(&self, sampler: &dyn PressureSampler) -> u32 {
        let sample = sampler.sample().await;
        self.evaluate(sample)
    }
}

/// Pure hysteresis decision function, ported from
/// `resource_governor.py`'s `decide_max_outstanding`.
pub fn decide_max_outstanding(config: &GovernorConfig, current: u32, sample: PressureSample) -> u32 {
    let high_pressure = sample.cpu >= config.cpu_high || sample.mem >= config.mem_high;
    let low_pressure = sample.cpu <= config.cpu_low && sample.mem <= config.mem_low;

    let next = if high_pressure {
        current.saturating_sub(config.step)
    } else if low_pressure {
        current.saturating_add(config.step)
    } else {
        current
    };

    next.clamp(config.min_outstanding, config.max_outstanding)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GovernorConfig {
        GovernorConfig::default()
    }

    #[test]
    fn high_pressure_steps_down() {
        let cfg = config();
        let next = decide_max_outstanding(&cfg, 3, PressureSample { cpu: 0.9, mem: 0.5 });
        assert_eq!(next, 2);
    }

    #[test]
    fn low_pressure_steps_up_but_clamps_to_max() {
        let cfg = config();
        let next = decide_max_outstanding(&cfg, 3, PressureSample { cpu: 0.1, mem: 0.1 });
        assert_eq!(next, 3);
    }

    #[test]
    fn never_drops_below_minimum() {
        let cfg = config();
        let next = decide_max_outstanding(&cfg, 1, PressureSample { cpu: 0.95, mem: 0.95 });
        assert_eq!(next, 1);
    }

    #[test]
    fn mid_pressure_holds_steady() {
        let cfg = config();
        let next = decide_max_outstanding(&cfg, 2, PressureSample { cpu: 0.65, mem: 0.65 });
        assert_eq!(next, 2);
    }

    #[tokio::test]
    async fn tick_reads_sampler_and_updates_current() {
        let governor = ResourceGovernor::new(config());
        let ceiling = governor.tick(&NullSampler).await;
        assert_eq!(ceiling, governor.current_max_outstanding().await);
    }
}
