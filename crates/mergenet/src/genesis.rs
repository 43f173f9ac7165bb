// SPDX-License-Identifier: GPL-3.0

use serde::Deserialize;
use std::path::PathBuf;

/// Where the JWT secret is mounted within execution and consensus client containers.
pub(crate) const JWT_SECRET_PATH: &str = "/jwt/jwtsecret";

/// The shared genesis state of the network, as prepared ahead of the launch.
///
/// The files are staged into each client container as-is; their contents are never inspected.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct GenesisMaterial {
	/// The genesis JSON consumed by Geth.
	pub el_genesis_json: PathBuf,
	/// The chainspec JSON consumed by Nethermind.
	pub el_chainspec_json: PathBuf,
	/// The consensus testnet directory, containing `config.yaml` and `genesis.ssz`.
	pub cl_testnet_dir: PathBuf,
	/// The secret shared by execution and consensus clients to authenticate the Engine API.
	pub jwt_secret: PathBuf,
	pub network_id: u64,
	pub terminal_total_difficulty: u64,
}

/// The keys and secrets a validator client signs with.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct ValidatorKeystore {
	pub keys_dir: PathBuf,
	pub secrets_dir: PathBuf,
}
