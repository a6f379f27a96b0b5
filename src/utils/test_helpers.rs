use std::sync::OnceLock;

static TEST_LOGGING: OnceLock<()> = OnceLock::new();

/// Routes `tracing` output through the test harness' captured writer.
/// Safe to call from every test; only the first call installs a subscriber.
pub fn setup_test_logging() {
    TEST_LOGGING.get_or_init(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("repo_ingest=debug"));
        // A subscriber may already be installed by another test binary helper.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Permission tests cannot provoke read failures for root, so they bail out.
#[cfg(test)]
pub fn running_as_root() -> bool {
    #[cfg(unix)]
    {
        // SAFETY: geteuid only reads the effective uid.
        unsafe { libc::geteuid() == 0 }
    }
    #[cfg(not(unix))]
    {
        false
    }
}
