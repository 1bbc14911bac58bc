use anyhow::Result;

pub trait ResultLogger {
	fn log_e(self) -> Self;
}

impl<T> ResultLogger for Result<T> {
	fn log_e(self) -> Self {
		match self {
			Ok(v) => Ok(v),
			Err(e) => {
				tracing::warn!(error = ?e, "operation failed");
				Err(e)
			}
		}
	}
}
