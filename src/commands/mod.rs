pub mod plan;
pub mod run;

use courier::error::{CourierErrorTrait, Error};

// Re-export command functions for convenience
pub use plan::plan;
pub use run::{run, RunOutcome, RunParams};

/// Log a library failure with its category and wrap it for the CLI
pub(crate) fn classify(err: impl Into<Error>, action: &str) -> anyhow::Error {
    let err = err.into();
    let category = err.category().as_str();

    tracing::error!(
        category,
        recoverable = err.is_recoverable(),
        error = %err,
        "{action}"
    );

    anyhow::Error::new(err).context(format!("{action} ({category} error)"))
}
