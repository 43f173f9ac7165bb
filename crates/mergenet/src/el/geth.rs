// SPDX-License-Identifier: GPL-3.0

use super::{
	ENGINE_RPC_PORT, ElContainerParams, ElFamily, EXECUTION_DATA_DIR, FEE_RECIPIENT, RPC_PORT,
	WS_PORT, used_ports,
};
use crate::{
	genesis::JWT_SECRET_PATH,
	log_level::{LogLevels, ParticipantLogLevel},
	provision::{ContainerConfig, Mount, ServiceEnvironment},
	readiness::FixedInterval,
};
use std::time::Duration;

const GENESIS_JSON_PATH: &str = "/genesis/genesis.json";

pub(super) const FAMILY: ElFamily = ElFamily {
	log_levels: LogLevels::new(&[
		(ParticipantLogLevel::Error, "1"),
		(ParticipantLogLevel::Warn, "2"),
		(ParticipantLogLevel::Info, "3"),
		(ParticipantLogLevel::Debug, "4"),
		(ParticipantLogLevel::Trace, "5"),
	]),
	readiness: FixedInterval::new(20, Duration::from_millis(500)),
	provides_enr: true,
};

/// Geth has to initialise its database from the genesis file before it can start, so both
/// steps run within a shell. The Geth arguments are handed to the shell as positional parameters
/// and never pass through its word splitting.
pub(super) fn container_config(
	params: &ElContainerParams<'_>,
	env: &ServiceEnvironment,
) -> ContainerConfig {
	let script =
		format!("geth init --datadir={EXECUTION_DATA_DIR} {GENESIS_JSON_PATH} && exec geth \"$@\"");
	let mut cmd = vec!["-c".to_string(), script, "sh".to_string()];
	cmd.extend([
		format!("--verbosity={}", params.log_level),
		format!("--datadir={EXECUTION_DATA_DIR}"),
		format!("--networkid={}", params.genesis.network_id),
		"--http".to_string(),
		"--http.addr=0.0.0.0".to_string(),
		format!("--http.port={RPC_PORT}"),
		"--http.vhosts=*".to_string(),
		"--http.corsdomain=*".to_string(),
		"--http.api=admin,engine,net,eth,web3".to_string(),
		"--ws".to_string(),
		"--ws.addr=0.0.0.0".to_string(),
		format!("--ws.port={WS_PORT}"),
		"--ws.api=admin,engine,net,eth,web3".to_string(),
		"--ws.origins=*".to_string(),
		"--authrpc.addr=0.0.0.0".to_string(),
		format!("--authrpc.port={ENGINE_RPC_PORT}"),
		"--authrpc.vhosts=*".to_string(),
		format!("--authrpc.jwtsecret={JWT_SECRET_PATH}"),
		"--syncmode=full".to_string(),
		format!("--nat=extip:{}", env.private_ip),
		format!("--miner.etherbase={FEE_RECIPIENT}"),
	]);
	if let Some(enode) = params.bootnode_enode {
		cmd.push(format!("--bootnodes={enode}"));
	}
	cmd.extend(params.extra_params.iter().cloned());

	ContainerConfig {
		image: params.image.to_string(),
		entrypoint: Some("sh".to_string()),
		cmd,
		ports: used_ports(),
		mounts: vec![
			Mount::read_only(&params.genesis.el_genesis_json, GENESIS_JSON_PATH),
			Mount::read_only(&params.genesis.jwt_secret, JWT_SECRET_PATH),
		],
	}
}
