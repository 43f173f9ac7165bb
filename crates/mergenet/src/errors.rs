// SPDX-License-Identifier: GPL-3.0

use crate::{log_level::ParticipantLogLevel, provision::ServiceId};
use std::time::Duration;
use strum_macros::Display;
use thiserror::Error;

/// The step of a client launch at which an error occurred.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Stage {
	/// Resolving client options (e.g. log levels, bootnode records) before anything is started.
	#[strum(to_string = "configuration")]
	Configuration,
	/// Starting the underlying process.
	#[strum(to_string = "provisioning")]
	Provisioning,
	/// Waiting for the process to report itself as ready.
	#[strum(to_string = "readiness check")]
	Readiness,
	/// Querying the identity of a ready process.
	#[strum(to_string = "identity retrieval")]
	Identity,
}

#[derive(Error, Debug)]
pub enum Error {
	#[error("Configuration mismatch: {0}")]
	ConfigurationMismatch(String),
	#[error("HTTP error: {0}")]
	Http(#[from] reqwest::Error),
	#[error("Failed to retrieve the identity of `{service}`: {message}")]
	IdentityRetrievalFailed { service: ServiceId, message: String },
	#[error("Invalid response: {0}")]
	InvalidResponse(String),
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
	#[error("The {stage} of `{service}` failed: {source}")]
	Launch {
		service: ServiceId,
		stage: Stage,
		#[source]
		source: Box<Error>,
	},
	#[error("Failed to provision `{service}`: {message}")]
	ProvisioningFailed { service: ServiceId, message: String },
	#[error("RPC error {code}: {message}")]
	Rpc { code: i64, message: String },
	#[error(
		"Not available after {retries} retries with {interval:?} between retries (last error: {})",
		.last_error.as_deref().unwrap_or("none")
	)]
	Unavailable { retries: u32, interval: Duration, last_error: Option<String> },
	#[error("No {client} log level defined for `{level}`")]
	UnsupportedLogLevel { client: String, level: ParticipantLogLevel },
	#[error("URL error: {0}")]
	Url(#[from] url::ParseError),
}

impl Error {
	/// Wraps the error with the stage and service at which it occurred.
	///
	/// # Arguments
	/// * `service` - The service being launched.
	/// * `stage` - The launch step that failed.
	pub(crate) fn at(self, service: &ServiceId, stage: Stage) -> Self {
		Error::Launch { service: service.clone(), stage, source: Box::new(self) }
	}

	/// The underlying error kind, with any stage/service wrapping removed.
	pub fn root_cause(&self) -> &Error {
		match self {
			Error::Launch { source, .. } => source.root_cause(),
			error => error,
		}
	}
}
