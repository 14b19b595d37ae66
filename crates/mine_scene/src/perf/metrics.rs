//! Sampled metrics and memory probes

use serde::{Deserialize, Serialize};

use crate::foundation::collections::RollingHistory;

/// One harness sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsSample {
    /// Frame rate over the interval since the previous sample
    pub fps: f32,
    /// Mean frame time over the same interval
    pub frame_time_ms: f32,
    /// Resident memory, 0 when unavailable
    pub memory_mb: f32,
    /// Draw calls of the latest frame
    pub draw_calls: u32,
    /// Triangles of the latest frame
    pub triangles: u64,
    /// Milliseconds since the run started
    pub timestamp_ms: f64,
}

/// Best-effort memory introspection
///
/// Implementations never fail; they report 0 when the host offers no data.
pub trait MemoryProbe {
    /// Current memory usage in megabytes
    fn memory_mb(&self) -> f32;
}

/// Probe that always reports 0
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProbe;

impl MemoryProbe for NullProbe {
    fn memory_mb(&self) -> f32 {
        0.0
    }
}

/// Resident set size from `/proc/self/status` (Linux)
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcStatusProbe;

impl MemoryProbe for ProcStatusProbe {
    fn memory_mb(&self) -> f32 {
        match std::fs::read_to_string("/proc/self/status") {
            Ok(status) => parse_vm_rss_mb(&status).unwrap_or(0.0),
            Err(e) => {
                log::trace!("Memory probe unavailable: {}", e);
                0.0
            }
        }
    }
}

impl<F> MemoryProbe for F
where
    F: Fn() -> f32,
{
    fn memory_mb(&self) -> f32 {
        self()
    }
}

/// Extract `VmRSS` (kB) from a `/proc/<pid>/status` dump, in megabytes
pub fn parse_vm_rss_mb(status: &str) -> Option<f32> {
    let line = status.lines().find(|line| line.starts_with("VmRSS:"))?;
    let kilobytes: f32 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kilobytes / 1024.0)
}

/// Default probe for the current platform
pub fn platform_probe() -> Box<dyn MemoryProbe> {
    if cfg!(target_os = "linux") {
        Box::new(ProcStatusProbe)
    } else {
        Box::new(NullProbe)
    }
}

/// Smoothed frame-rate display over the last few frames
#[derive(Debug, Clone)]
pub struct PerformanceMonitor {
    frame_times: RollingHistory<f32>,
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new(Self::WINDOW)
    }
}

impl PerformanceMonitor {
    /// Default window length in frames
    pub const WINDOW: usize = 10;

    /// Create a monitor averaging over `window` frames
    pub fn new(window: usize) -> Self {
        Self { frame_times: RollingHistory::new(window) }
    }

    /// Record one frame time in milliseconds
    pub fn record_frame_time(&mut self, frame_time_ms: f32) {
        if frame_time_ms.is_finite() && frame_time_ms >= 0.0 {
            self.frame_times.push(frame_time_ms);
        }
    }

    /// Mean frame time over the window
    pub fn average_frame_time_ms(&self) -> Option<f32> {
        if self.frame_times.is_empty() {
            return None;
        }
        Some(self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32)
    }

    /// Smoothed frames per second; 0 before the first frame
    pub fn fps(&self) -> f32 {
        match self.average_frame_time_ms() {
            Some(ms) if ms > 0.0 => 1000.0 / ms,
            _ => 0.0,
        }
    }

    /// Worst frame time in the window
    pub fn max_frame_time_ms(&self) -> f32 {
        self.frame_times.iter().copied().fold(0.0, f32::max)
    }

    /// Frames currently averaged
    pub fn len(&self) -> usize {
        self.frame_times.len()
    }

    /// Whether no frames were recorded yet
    pub fn is_empty(&self) -> bool {
        self.frame_times.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const STATUS: &str = "Name:\tpit_perf\nVmPeak:\t  204800 kB\nVmRSS:\t   51200 kB\nThreads:\t4\n";

    #[test]
    fn test_parse_vm_rss() {
        assert_eq!(parse_vm_rss_mb(STATUS), Some(50.0));
        assert_eq!(parse_vm_rss_mb("Name:\tx\n"), None);
        assert_eq!(parse_vm_rss_mb("VmRSS:\tgarbage kB\n"), None);
    }

    #[test]
    fn test_probes_never_fail() {
        assert_eq!(NullProbe.memory_mb(), 0.0);
        assert!(platform_probe().memory_mb() >= 0.0);
        let fixed = || 12.5_f32;
        assert_eq!(fixed.memory_mb(), 12.5);
    }

    #[test]
    fn test_monitor_keeps_last_ten_frames() {
        let mut monitor = PerformanceMonitor::default();
        assert_eq!(monitor.fps(), 0.0);

        for _ in 0..5 {
            monitor.record_frame_time(100.0);
        }
        for _ in 0..10 {
            monitor.record_frame_time(20.0);
        }
        assert_eq!(monitor.len(), 10);
        assert_relative_eq!(monitor.fps(), 50.0, epsilon = 1e-3);
        assert_eq!(monitor.max_frame_time_ms(), 20.0);
    }

    #[test]
    fn test_monitor_ignores_invalid_frame_times() {
        let mut monitor = PerformanceMonitor::new(3);
        monitor.record_frame_time(f32::NAN);
        monitor.record_frame_time(-1.0);
        assert!(monitor.is_empty());
    }
}
