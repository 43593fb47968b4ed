//! Timing spans and standard events for plan computation
//!
//! ```rust
//! use ubtile_tracing::performance::PerformanceSpan;
//!
//! {
//!     let _span = PerformanceSpan::new("plan_batch", Some(100));
//!     // ... compute plans ...
//! } // logged only if it took at least 100μs
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;
use tracing::Level;
use ubtile_core::TilingPlan;

static ENABLED: AtomicBool = AtomicBool::new(true);
/// `u64::MAX` means no process-wide threshold
static THRESHOLD_US: AtomicU64 = AtomicU64::new(u64::MAX);

/// Apply the performance settings of a [`crate::TracingConfig`]
pub fn configure(enabled: bool, threshold_us: Option<u64>) {
    ENABLED.store(enabled, Ordering::Relaxed);
    THRESHOLD_US.store(threshold_us.unwrap_or(u64::MAX), Ordering::Relaxed);
}

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

fn global_threshold() -> Option<u64> {
    match THRESHOLD_US.load(Ordering::Relaxed) {
        u64::MAX => None,
        t => Some(t),
    }
}

/// RAII guard that times a region and logs it on drop.
///
/// Nothing is logged when performance tracing is disabled, or when the
/// region finished faster than the threshold. A span without its own
/// threshold uses the process-wide one from [`configure`].
pub struct PerformanceSpan {
    name: String,
    threshold_us: Option<u64>,
    start_time: Instant,
    span: tracing::Span,
}

impl PerformanceSpan {
    pub fn new(name: impl Into<String>, threshold_us: Option<u64>) -> Self {
        Self::with_level(Level::DEBUG, name, threshold_us)
    }

    pub fn with_level(level: Level, name: impl Into<String>, threshold_us: Option<u64>) -> Self {
        let name = name.into();
        let span = match level {
            Level::TRACE => tracing::trace_span!("perf", name = %name),
            Level::DEBUG => tracing::debug_span!("perf", name = %name),
            Level::INFO => tracing::info_span!("perf", name = %name),
            Level::WARN => tracing::warn_span!("perf", name = %name),
            Level::ERROR => tracing::error_span!("perf", name = %name),
        };
        Self::from_span(span, name, threshold_us)
    }

    /// Time an existing span, e.g. one carrying extra fields
    pub fn from_span(span: tracing::Span, name: impl Into<String>, threshold_us: Option<u64>) -> Self {
        Self {
            name: name.into(),
            threshold_us,
            start_time: Instant::now(),
            span,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn elapsed_us(&self) -> u64 {
        u64::try_from(self.start_time.elapsed().as_micros()).unwrap_or(u64::MAX)
    }

    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }

    fn should_log(&self, elapsed_us: u64) -> bool {
        is_enabled() && self.threshold_us.or_else(global_threshold).map_or(true, |t| elapsed_us >= t)
    }
}

impl Drop for PerformanceSpan {
    fn drop(&mut self) {
        let elapsed_us = self.elapsed_us();
        if self.should_log(elapsed_us) {
            let _entered = self.span.enter();
            tracing::debug!(
                duration_us = elapsed_us,
                duration_ms = elapsed_us as f64 / 1000.0,
                "performance_span_complete"
            );
        }
    }
}

/// Emit the standard event for a computed plan
pub fn record_plan(operation: &str, plan: &TilingPlan, duration_us: u64) {
    let assignment = &plan.core_assignment;
    tracing::debug!(
        event = "tiling_plan",
        operation,
        total_elements = assignment.total_elements,
        used_cores = plan.used_core_count,
        big_cores = assignment.big_core_count,
        tiling_key = plan.tiling_key,
        max_tile_elements = plan.max_tile_elements,
        small_loops = plan.small_core_plan.tile_loop_count,
        big_loops = plan.big_core_plan.tile_loop_count,
        tile_buffer_bytes = plan.tile_buffer_bytes(),
        duration_us,
        "tiling_plan_computed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;
    use ubtile_core::{PlatformBudget, Tiler, WorkDescriptor};

    #[test]
    fn test_span_fields() {
        let span = PerformanceSpan::new("plan", Some(1000));
        assert_eq!(span.name(), "plan");
        assert_eq!(span.threshold_us, Some(1000));
    }

    #[test]
    fn test_span_elapsed() {
        let span = PerformanceSpan::with_level(Level::INFO, "sleep", None);
        thread::sleep(Duration::from_millis(5));
        assert!(span.elapsed_us() >= 5_000);
    }

    #[test]
    fn test_threshold_filters() {
        let span = PerformanceSpan::new("fast", Some(1_000_000));
        assert!(!span.should_log(10));
        assert!(span.should_log(1_000_000));
    }

    #[test]
    fn test_record_plan() {
        let plan = Tiler::new(PlatformBudget::new(8, 2048, 32).unwrap())
            .plan(&WorkDescriptor::new(1000, 4, 2).unwrap())
            .unwrap();
        record_plan("elementwise", &plan, 3);
    }
}
