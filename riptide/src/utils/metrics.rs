#[cfg(feature = "metrics")]
use std::time::Instant;

/// Measures how long given operation takes and logs it at the debug level;
/// compiles down to a plain call without the `metrics` feature.
#[cfg(feature = "metrics")]
pub fn measure<T>(label: &str, f: impl FnOnce() -> T) -> T {
    let tt = Instant::now();
    let result = f();

    log::debug!(
        "{label}: {}",
        humantime::format_duration(tt.elapsed())
    );

    result
}

#[cfg(not(feature = "metrics"))]
pub fn measure<T>(_label: &str, f: impl FnOnce() -> T) -> T {
    f()
}
