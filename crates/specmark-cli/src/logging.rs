//! Logging initialisation for the command line front end.
//!
//! Structured events go to stderr so stdout stays parseable by callers
//! consuming token listings or JSON reports. The filter comes from
//! `SPECMARK_LOG`, defaulting to `info`.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the tracing filter directive.
pub(crate) const LOG_ENV_VAR: &str = "SPECMARK_LOG";

pub(crate) fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    // A subscriber may already be installed; the first one wins.
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests {
    use super::init;

    #[test]
    fn init_is_idempotent() {
        init();
        init();
    }
}
