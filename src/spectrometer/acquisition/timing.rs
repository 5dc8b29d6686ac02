use std::time::{Duration, Instant};

use tracing::debug;

#[derive(Debug, Clone)]
pub struct StageTiming {
    pub name: &'static str,
    pub duration: Duration,
}

/// Stages of one processing run, in the order they ran.
#[derive(Debug, Clone, Default)]
pub struct ProcessTimings {
    stages: Vec<StageTiming>,
}

impl ProcessTimings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_stage(&mut self, (name, duration): (&'static str, Duration)) {
        self.stages.push(StageTiming { name, duration });
    }

    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|s| s.duration).sum()
    }

    pub fn get_stage(&self, name: &str) -> Option<Duration> {
        self.stages.iter().find(|s| s.name == name).map(|s| s.duration)
    }

    pub fn stages(&self) -> &[StageTiming] {
        &self.stages
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name).collect()
    }

    pub fn log_summary(&self) {
        let total = self.total_duration();
        for stage in &self.stages {
            let share = if total.as_secs_f64() > 0.0 {
                stage.duration.as_secs_f64() / total.as_secs_f64() * 100.0
            } else {
                0.0
            };
            debug!(
                "{:<12} {:>10.3}ms ({:>5.1}%)",
                stage.name,
                stage.duration.as_secs_f64() * 1000.0,
                share
            );
        }
        debug!("{:<12} {:>10.3}ms", "total", total.as_secs_f64() * 1000.0);
    }
}

pub struct Timer {
    start: Instant,
    name: &'static str,
}

impl Timer {
    pub fn start(name: &'static str) -> Self {
        Self { start: Instant::now(), name }
    }

    pub fn stop(self) -> (&'static str, Duration) {
        (self.name, self.start.elapsed())
    }
}
