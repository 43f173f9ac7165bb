// SPDX-License-Identifier: GPL-3.0

use super::{
	DISCOVERY_PORT, ENGINE_RPC_PORT, ElContainerParams, ElFamily, EXECUTION_DATA_DIR,
	FEE_RECIPIENT, RPC_PORT, WS_PORT, used_ports,
};
use crate::{
	genesis::JWT_SECRET_PATH,
	log_level::{LogLevels, ParticipantLogLevel},
	provision::{ContainerConfig, Mount, ServiceEnvironment},
	readiness::FixedInterval,
};
use std::time::Duration;

const CHAINSPEC_JSON_PATH: &str = "/genesis/chainspec.json";

pub(super) const FAMILY: ElFamily = ElFamily {
	log_levels: LogLevels::new(&[
		(ParticipantLogLevel::Error, "ERROR"),
		(ParticipantLogLevel::Warn, "WARN"),
		(ParticipantLogLevel::Info, "INFO"),
		(ParticipantLogLevel::Debug, "DEBUG"),
		(ParticipantLogLevel::Trace, "TRACE"),
	]),
	readiness: FixedInterval::new(20, Duration::from_millis(500)),
	// The node info of Nethermind carries no ENR.
	provides_enr: false,
};

pub(super) fn container_config(
	params: &ElContainerParams<'_>,
	env: &ServiceEnvironment,
) -> ContainerConfig {
	let mut cmd = vec![
		format!("--log={}", params.log_level),
		format!("--datadir={EXECUTION_DATA_DIR}"),
		format!("--Init.ChainSpecPath={CHAINSPEC_JSON_PATH}"),
		"--Init.WebSocketsEnabled=true".to_string(),
		"--Init.DiagnosticMode=None".to_string(),
		"--JsonRpc.Enabled=true".to_string(),
		"--JsonRpc.EnabledModules=net,eth,consensus,engine,subscribe,web3,admin".to_string(),
		"--JsonRpc.Host=0.0.0.0".to_string(),
		format!("--JsonRpc.Port={RPC_PORT}"),
		format!("--JsonRpc.WebSocketsPort={WS_PORT}"),
		"--JsonRpc.EngineHost=0.0.0.0".to_string(),
		format!("--JsonRpc.EnginePort={ENGINE_RPC_PORT}"),
		format!("--JsonRpc.JwtSecretFile={JWT_SECRET_PATH}"),
		format!("--Network.ExternalIp={}", env.private_ip),
		format!("--Network.LocalIp={}", env.private_ip),
		format!("--Network.DiscoveryPort={DISCOVERY_PORT}"),
		format!("--Network.P2PPort={DISCOVERY_PORT}"),
		"--Merge.Enabled=true".to_string(),
		format!("--Merge.TerminalTotalDifficulty={}", params.genesis.terminal_total_difficulty),
		format!("--Merge.FeeRecipient={FEE_RECIPIENT}"),
	];
	if let Some(enode) = params.bootnode_enode {
		cmd.push(format!("--Discovery.Bootnodes={enode}"));
	}
	cmd.extend(params.extra_params.iter().cloned());

	ContainerConfig {
		image: params.image.to_string(),
		entrypoint: None,
		cmd,
		ports: used_ports(),
		mounts: vec![
			Mount::read_only(&params.genesis.el_chainspec_json, CHAINSPEC_JSON_PATH),
			Mount::read_only(&params.genesis.jwt_secret, JWT_SECRET_PATH),
		],
	}
}
