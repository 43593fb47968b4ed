//! Shorthand for the common performance patterns

/// Timed [`crate::performance::PerformanceSpan`] with optional span fields.
///
/// ```rust
/// use ubtile_tracing::perf_span;
///
/// {
///     let _span = perf_span!("plan", total_elements = 1000u64, cores = 8u32);
///     // ...
/// }
/// ```
#[macro_export]
macro_rules! perf_span {
    ($name:expr) => {{
        $crate::performance::PerformanceSpan::new($name, None)
    }};
    ($name:expr, $($field:tt = $value:expr),+ $(,)?) => {{
        let span = $crate::tracing::debug_span!("perf", name = $name, $($field = $value),+);
        $crate::performance::PerformanceSpan::from_span(span, $name, None)
    }};
}

/// Run a block and return `(result, duration_us)`, logging the duration.
///
/// ```rust
/// use ubtile_tracing::timed_block;
///
/// let (sum, _us) = timed_block!("sum", { (1..=100u64).sum::<u64>() });
/// assert_eq!(sum, 5050);
/// ```
#[macro_export]
macro_rules! timed_block {
    ($name:expr, $block:block) => {{
        let start = ::std::time::Instant::now();
        let result = $block;
        let duration_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);
        $crate::tracing::debug!(operation = $name, duration_us, "timed_block_complete");
        (result, duration_us)
    }};
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_perf_span_macro() {
        let span = perf_span!("plan");
        assert_eq!(span.name(), "plan");
        let with_fields = perf_span!("plan", cores = 8u32, total = 1000u64);
        assert_eq!(with_fields.name(), "plan");
    }

    #[test]
    fn test_timed_block_macro() {
        let (result, duration_us) = timed_block!("sleep", {
            thread::sleep(Duration::from_millis(5));
            42
        });
        assert_eq!(result, 42);
        assert!(duration_us >= 5_000);
    }
}
