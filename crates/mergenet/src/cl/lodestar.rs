// SPDX-License-Identifier: GPL-3.0

use super::{
	BEACON_HTTP_PORT, BeaconContainerParams, BeaconGate, CONSENSUS_DATA_DIR, ClFamily,
	DISCOVERY_PORT, TESTNET_DIR, VALIDATOR_KEYS_DIR, VALIDATOR_SECRETS_DIR,
	ValidatorContainerParams, ValidatorGate, beacon_ports,
};
use crate::{
	genesis::JWT_SECRET_PATH,
	log_level::{LogLevels, ParticipantLogLevel},
	provision::{ContainerConfig, Mount, ServiceEnvironment},
	readiness::FixedInterval,
};
use std::time::Duration;

/// Lodestar has no `trace` level.
pub(super) const FAMILY: ClFamily = ClFamily {
	log_levels: LogLevels::new(&[
		(ParticipantLogLevel::Error, "error"),
		(ParticipantLogLevel::Warn, "warn"),
		(ParticipantLogLevel::Info, "info"),
		(ParticipantLogLevel::Debug, "debug"),
	]),
	beacon_readiness: FixedInterval::new(20, Duration::from_secs(1)),
	beacon_gate: BeaconGate::Health,
	// The validator counts as attached once its beacon node reports `is_syncing == true`.
	// Whether `false` was intended is unresolved; the check is reproduced as observed.
	validator_gate: Some(ValidatorGate {
		readiness: FixedInterval::new(30, Duration::from_secs(1)),
		ready_when_syncing: true,
	}),
};

pub(super) fn beacon_config(
	params: &BeaconContainerParams<'_>,
	env: &ServiceEnvironment,
) -> ContainerConfig {
	let peers = params.expected_beacon_nodes.saturating_sub(1);
	let mut cmd = vec![
		"beacon".to_string(),
		format!("--logLevel={}", params.log_level),
		format!("--port={DISCOVERY_PORT}"),
		format!("--discoveryPort={DISCOVERY_PORT}"),
		format!("--rootDir={CONSENSUS_DATA_DIR}"),
		format!("--paramsFile={TESTNET_DIR}/config.yaml"),
		format!("--genesisStateFile={TESTNET_DIR}/genesis.ssz"),
		"--network.connectToDiscv5Bootnodes=true".to_string(),
		"--network.discv5.enabled=true".to_string(),
		"--eth1.enabled=true".to_string(),
		"--eth1.disableEth1DepositDataTracker=true".to_string(),
		format!("--eth1.providerUrls={}", params.execution_rpc_url),
		format!("--execution.urls={}", params.execution_engine_url),
		format!("--jwt-secret={JWT_SECRET_PATH}"),
		format!("--network.targetPeers={peers}"),
		format!("--network.maxPeers={peers}"),
		"--api.rest.enabled=true".to_string(),
		"--api.rest.host=0.0.0.0".to_string(),
		"--api.rest.api=*".to_string(),
		format!("--api.rest.port={BEACON_HTTP_PORT}"),
		format!("--enr.ip={}", env.private_ip),
		format!("--enr.tcp={DISCOVERY_PORT}"),
		format!("--enr.udp={DISCOVERY_PORT}"),
	];
	if let Some(enr) = params.bootnode_enr {
		cmd.push(format!("--network.discv5.bootEnrs={enr}"));
	}
	cmd.extend(params.extra_params.iter().cloned());

	ContainerConfig {
		image: params.image.to_string(),
		entrypoint: None,
		cmd,
		ports: beacon_ports(false),
		mounts: vec![
			Mount::read_only(&params.genesis.cl_testnet_dir, TESTNET_DIR),
			Mount::read_only(&params.genesis.jwt_secret, JWT_SECRET_PATH),
		],
	}
}

pub(super) fn validator_config(
	params: &ValidatorContainerParams<'_>,
	_env: &ServiceEnvironment,
) -> ContainerConfig {
	let mut cmd = vec![
		"validator".to_string(),
		format!("--logLevel={}", params.log_level),
		format!("--rootDir={CONSENSUS_DATA_DIR}/{}", params.service_id),
		format!("--paramsFile={TESTNET_DIR}/config.yaml"),
		format!("--server={}", params.beacon_url),
		format!("--keystoresDir={VALIDATOR_KEYS_DIR}"),
		format!("--secretsDir={VALIDATOR_SECRETS_DIR}"),
	];
	cmd.extend(params.extra_params.iter().cloned());

	ContainerConfig {
		image: params.image.to_string(),
		entrypoint: None,
		cmd,
		ports: Default::default(),
		mounts: vec![
			Mount::read_only(&params.genesis.cl_testnet_dir, TESTNET_DIR),
			Mount::read_only(&params.keystore.keys_dir, VALIDATOR_KEYS_DIR),
			Mount::read_only(&params.keystore.secrets_dir, VALIDATOR_SECRETS_DIR),
		],
	}
}
