// SPDX-License-Identifier: GPL-3.0

use anyhow::{Context, Result};
use mergenet::{
	ClClientType, ClLaunchRequest, ElAssignment, ElClientType, ElLaunchRequest, GenesisMaterial,
	NetworkLaunchRequest, ParticipantLogLevel, ValidatorKeystore,
};
use serde::Deserialize;
use std::{
	fs,
	net::Ipv4Addr,
	path::{Path, PathBuf},
};

/// The description of a network, as loaded from a TOML file.
///
/// Relative paths are resolved against the directory containing the file.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct NetworkConfig {
	#[serde(default)]
	pub(crate) docker: DockerConfig,
	/// The log level of every client, unless overridden per participant.
	#[serde(default)]
	pub(crate) log_level: ParticipantLogLevel,
	#[serde(default)]
	pub(crate) el_assignment: ElAssignment,
	pub(crate) genesis: GenesisMaterial,
	#[serde(default)]
	pub(crate) execution: Vec<ExecutionParticipant>,
	#[serde(default)]
	pub(crate) consensus: Vec<ConsensusParticipant>,
	pub(crate) external_miner: Option<ExternalMinerConfig>,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct DockerConfig {
	pub(crate) network: String,
	pub(crate) subnet: Ipv4Addr,
	pub(crate) prefix_len: u8,
}

impl Default for DockerConfig {
	fn default() -> Self {
		Self { network: "mergenet".into(), subnet: Ipv4Addr::new(172, 28, 0, 0), prefix_len: 16 }
	}
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct ExecutionParticipant {
	pub(crate) client: ElClientType,
	pub(crate) image: Option<String>,
	/// A log level in the client's own vocabulary.
	pub(crate) log_level: Option<String>,
	#[serde(default)]
	pub(crate) extra_params: Vec<String>,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct ConsensusParticipant {
	pub(crate) client: ClClientType,
	pub(crate) image: Option<String>,
	/// A log level in the client's own vocabulary.
	pub(crate) log_level: Option<String>,
	#[serde(default)]
	pub(crate) extra_params: Vec<String>,
	#[serde(default)]
	pub(crate) validator_extra_params: Vec<String>,
	pub(crate) keystore: ValidatorKeystore,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub(crate) struct ExternalMinerConfig {
	pub(crate) image: Option<String>,
	/// A block height to wait for once the miner is running.
	pub(crate) wait_for_block: Option<u64>,
}

impl NetworkConfig {
	/// Loads a network description from the given file.
	///
	/// # Arguments
	/// * `path` - The path to the TOML file.
	pub(crate) fn load(path: &Path) -> Result<Self> {
		let contents = fs::read_to_string(path)
			.with_context(|| format!("failed to read `{}`", path.display()))?;
		let mut config: NetworkConfig = toml::from_str(&contents)
			.with_context(|| format!("failed to parse `{}`", path.display()))?;
		let base = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
		let base = fs::canonicalize(base).unwrap_or_else(|_| base.to_path_buf());
		config.resolve_paths(&base);
		Ok(config)
	}

	fn resolve_paths(&mut self, base: &Path) {
		let resolve = |path: &mut PathBuf| {
			if path.is_relative() {
				*path = base.join(&*path);
			}
		};
		let genesis = &mut self.genesis;
		for path in [
			&mut genesis.el_genesis_json,
			&mut genesis.el_chainspec_json,
			&mut genesis.cl_testnet_dir,
			&mut genesis.jwt_secret,
		] {
			resolve(path);
		}
		for participant in &mut self.consensus {
			resolve(&mut participant.keystore.keys_dir);
			resolve(&mut participant.keystore.secrets_dir);
		}
	}

	/// The launch instructions for every participant.
	pub(crate) fn launch_request(&self) -> NetworkLaunchRequest {
		let execution = self
			.execution
			.iter()
			.map(|p| ElLaunchRequest {
				client: p.client,
				image: p.image.clone().unwrap_or_else(|| p.client.default_image().to_string()),
				log_level: self.log_level,
				log_level_override: p.log_level.clone(),
				extra_params: p.extra_params.clone(),
			})
			.collect();
		let consensus = self
			.consensus
			.iter()
			.map(|p| ClLaunchRequest {
				client: p.client,
				image: p.image.clone().unwrap_or_else(|| p.client.default_image().to_string()),
				log_level: self.log_level,
				log_level_override: p.log_level.clone(),
				extra_params: p.extra_params.clone(),
				validator_extra_params: p.validator_extra_params.clone(),
				keystore: p.keystore.clone(),
			})
			.collect();
		NetworkLaunchRequest { execution, consensus, el_assignment: self.el_assignment }
	}
}
