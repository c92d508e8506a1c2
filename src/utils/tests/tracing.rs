use fastrace::collector::{Config, ConsoleReporter};

/// Flush the spans reported during a test on drop.
pub(crate) struct TestTraceLogGuard;

impl Drop for TestTraceLogGuard {
    fn drop(&mut self) {
        fastrace::flush();
    }
}

#[must_use = "guard should be kept alive to keep the trace log"]
pub(crate) fn test_trace_log_setup() -> TestTraceLogGuard {
    fastrace::set_reporter(ConsoleReporter, Config::default());
    let _ignore = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Trace)
        .try_init();
    TestTraceLogGuard
}
