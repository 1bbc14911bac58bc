use thiserror::Error;

/// Narrow error surface for the CLI boundary: everything that happens while
/// turning records into a report is the analysis core's problem (it never
/// fails — a query it can't make sense of is just marked unsupported), so
/// only the two places this driver actually touches the outside world can
/// fail here.
#[derive(Debug, Error)]
pub enum AppError {
	#[error("failed to open input stream: {0}")]
	InputOpen(#[source] std::io::Error),
	#[error("failed to write output: {0}")]
	OutputWrite(#[source] std::io::Error),
	#[error("invalid configuration: {0}")]
	Config(#[from] config::ConfigError),
	#[error("configuration validation failed: {0}")]
	Validation(#[from] validator::ValidationErrors),
	#[error(transparent)]
	Other(#[from] anyhow::Error),
}
