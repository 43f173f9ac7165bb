// SPDX-License-Identifier: GPL-3.0

use crate::errors::Error;
use serde::Deserialize;
use strum_macros::{AsRefStr, Display, EnumString, VariantArray};

/// A client-agnostic log level, mapped onto each client's own vocabulary.
#[derive(
	AsRefStr,
	Clone,
	Copy,
	Debug,
	Default,
	Deserialize,
	Display,
	EnumString,
	Eq,
	Hash,
	PartialEq,
	VariantArray,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ParticipantLogLevel {
	Error,
	Warn,
	#[default]
	Info,
	Debug,
	Trace,
}

/// An immutable mapping from [`ParticipantLogLevel`] to the log level string understood by a
/// specific client.
#[derive(Clone, Copy, Debug)]
pub struct LogLevels(&'static [(ParticipantLogLevel, &'static str)]);

impl LogLevels {
	/// Creates a new table from `(level, client level)` pairs.
	pub const fn new(levels: &'static [(ParticipantLogLevel, &'static str)]) -> Self {
		Self(levels)
	}

	/// The client log level for `level`, if the client supports one.
	pub fn get(&self, level: ParticipantLogLevel) -> Option<&'static str> {
		self.0.iter().find(|(l, _)| *l == level).map(|(_, client_level)| *client_level)
	}

	/// Resolves the log level string to pass to a client.
	///
	/// A non-empty participant override is passed through as-is, in the client's own vocabulary.
	/// Otherwise the global level is mapped through the table.
	///
	/// # Arguments
	/// * `client` - The name of the client, used for error reporting.
	/// * `global` - The global log level requested for the network.
	/// * `participant` - An optional client-specific override.
	pub fn resolve(
		&self,
		client: &str,
		global: ParticipantLogLevel,
		participant: Option<&str>,
	) -> Result<String, Error> {
		if let Some(level) = participant.map(str::trim).filter(|l| !l.is_empty()) {
			return Ok(level.to_string());
		}
		self.get(global)
			.map(str::to_string)
			.ok_or_else(|| Error::UnsupportedLogLevel { client: client.to_string(), level: global })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::str::FromStr;
	use strum::VariantArray as _;

	const LEVELS: LogLevels = LogLevels::new(&[
		(ParticipantLogLevel::Error, "ERROR"),
		(ParticipantLogLevel::Warn, "WARN"),
		(ParticipantLogLevel::Info, "INFO"),
	]);

	#[test]
	fn resolve_maps_global_level() -> Result<(), Error> {
		assert_eq!(LEVELS.resolve("test", ParticipantLogLevel::Warn, None)?, "WARN");
		assert_eq!(LEVELS.resolve("test", ParticipantLogLevel::Info, Some("  "))?, "INFO");
		Ok(())
	}

	#[test]
	fn resolve_prefers_participant_override() -> Result<(), Error> {
		assert_eq!(LEVELS.resolve("test", ParticipantLogLevel::Trace, Some("verbose"))?, "verbose");
		Ok(())
	}

	#[test]
	fn resolve_fails_for_unmapped_level() {
		assert!(matches!(
			LEVELS.resolve("test", ParticipantLogLevel::Trace, None),
			Err(Error::UnsupportedLogLevel { client, level: ParticipantLogLevel::Trace })
				if client == "test"
		));
	}

	#[test]
	fn participant_log_level_parses_lowercase_names() {
		for level in ParticipantLogLevel::VARIANTS {
			assert_eq!(ParticipantLogLevel::from_str(level.as_ref()).unwrap(), *level);
		}
		assert!(ParticipantLogLevel::from_str("verbose").is_err());
	}
}
