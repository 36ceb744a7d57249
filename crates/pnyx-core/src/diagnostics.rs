//! Operator-facing fault diagnostics.
//!
//! Every intercepted fault produces one record on the `pnyx::fault` target:
//! the classified message on the first line, then the stack snapshot with
//! the fault machinery's own frames cut out. Both lines go out as a single
//! `tracing` event so concurrent requests cannot interleave them.

use std::sync::OnceLock;

use regex::Regex;

use crate::fault::Trace;

/// Tracing target used for fault diagnostics.
pub const FAULT_TARGET: &str = "pnyx::fault";

/// Frames matching this pattern mark where a fault actually originated.
///
/// Everything above the first match belongs to the capture machinery.
pub const FAULT_ORIGIN_PATTERN: &str = r"(?m)^\s*\d+: (?:pnyx_core::fault::raise|pnyx_core::fault::Fault::capture|core::panicking::panic|std::panicking::begin_panic)";

fn fault_origin() -> &'static Regex {
    static ORIGIN: OnceLock<Regex> = OnceLock::new();
    ORIGIN.get_or_init(|| {
        Regex::new(FAULT_ORIGIN_PATTERN).expect("fault origin pattern is valid")
    })
}

/// Strips capture frames from a rendered stack snapshot.
///
/// Keeps the first line (the header) followed by everything from the first
/// fault-origin frame onward. Returns the input unchanged when no origin
/// frame is present.
///
/// # Example
///
/// ```
/// use pnyx_core::diagnostics::sanitize_trace;
///
/// let trace = concat!(
///     "fault backtrace (thread 'main'):\n",
///     "   0: std::backtrace::Backtrace::force_capture\n",
///     "   1: pnyx_core::fault::Fault::capture\n",
///     "   2: app::handler\n",
/// );
///
/// assert_eq!(
///     sanitize_trace(trace),
///     "fault backtrace (thread 'main'):\n   1: pnyx_core::fault::Fault::capture\n   2: app::handler\n",
/// );
/// ```
#[must_use]
pub fn sanitize_trace(trace: &str) -> String {
    let header_end = trace.find('\n').map_or(trace.len(), |index| index + 1);

    match fault_origin().find(trace) {
        Some(origin) if origin.start() >= header_end => {
            let mut sanitized = String::with_capacity(header_end + trace.len() - origin.start());
            sanitized.push_str(&trace[..header_end]);
            sanitized.push_str(&trace[origin.start()..]);
            sanitized
        }
        _ => trace.to_string(),
    }
}

/// Emits the two-line diagnostic record for an intercepted fault.
///
/// The record is an `ERROR` event on [`FAULT_TARGET`]. It only reaches the
/// error stream when a subscriber is installed, e.g. through
/// `pnyx_telemetry::init_logging`; without one it is dropped.
pub fn report(message: &str, trace: &Trace) {
    let snapshot = sanitize_trace(&trace.to_string());
    tracing::error!(target: FAULT_TARGET, "{message}\n{snapshot}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_without_marker_is_verbatim() {
        let trace = "fault backtrace (thread 'main'):\n   0: app::main\n   1: std::rt::lang_start\n";
        assert_eq!(sanitize_trace(trace), trace);
    }

    #[test]
    fn test_sanitize_drops_frames_above_panic_origin() {
        let trace = concat!(
            "fault backtrace (thread 'tokio-runtime-worker'):\n",
            "   0: std::backtrace::Backtrace::force_capture\n",
            "   1: pnyx_core::recovery::install_hook::{{closure}}\n",
            "   2: std::panicking::rust_panic_with_hook\n",
            "   3: core::panicking::panic_bounds_check\n",
            "   4: app::lookup\n",
        );

        let sanitized = sanitize_trace(trace);
        assert_eq!(
            sanitized,
            "fault backtrace (thread 'tokio-runtime-worker'):\n   3: core::panicking::panic_bounds_check\n   4: app::lookup\n"
        );
    }

    #[test]
    fn test_sanitize_uses_first_marker() {
        let trace = "header\n  10: core::panicking::panic_fmt\n  11: core::panicking::panic\n  12: app\n";
        assert_eq!(sanitize_trace(trace), trace);
    }

    #[test]
    fn test_sanitize_ignores_marker_text_mid_line() {
        let trace = "header\n   0: app::calls core::panicking::panic_fmt\n";
        assert_eq!(sanitize_trace(trace), trace);
    }

    #[test]
    fn test_sanitize_empty_input() {
        assert_eq!(sanitize_trace(""), "");
    }

    #[test]
    fn test_sanitize_real_capture_keeps_header() {
        let fault = crate::Fault::message("boom");
        let rendered = fault.trace().to_string();
        let sanitized = sanitize_trace(&rendered);
        assert!(sanitized.starts_with("fault backtrace (thread '"));
        assert!(sanitized.len() < rendered.len(), "{rendered}");

        let first_frame = sanitized.lines().nth(1).unwrap();
        assert!(first_frame.contains("pnyx_core::fault::"), "{sanitized}");
        assert!(!sanitized.contains("Backtrace::force_capture"), "{sanitized}");
    }
}
