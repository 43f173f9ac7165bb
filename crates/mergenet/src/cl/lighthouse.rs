// SPDX-License-Identifier: GPL-3.0

use super::{
	BEACON_HTTP_PORT, BEACON_METRICS_PORT, BeaconContainerParams, BeaconGate, CONSENSUS_DATA_DIR,
	ClFamily, DISCOVERY_PORT, TESTNET_DIR, VALIDATOR_HTTP_PORT, VALIDATOR_KEYS_DIR,
	VALIDATOR_METRICS_PORT, VALIDATOR_SECRETS_DIR, ValidatorContainerParams, beacon_ports,
	validator_ports,
};
use crate::{
	genesis::JWT_SECRET_PATH,
	log_level::{LogLevels, ParticipantLogLevel},
	provision::{ContainerConfig, Mount, ServiceEnvironment},
	readiness::FixedInterval,
};
use std::time::Duration;

pub(super) const FAMILY: ClFamily = ClFamily {
	log_levels: LogLevels::new(&[
		(ParticipantLogLevel::Error, "error"),
		(ParticipantLogLevel::Warn, "warn"),
		(ParticipantLogLevel::Info, "info"),
		(ParticipantLogLevel::Debug, "debug"),
		(ParticipantLogLevel::Trace, "trace"),
	]),
	beacon_readiness: FixedInterval::new(10, Duration::from_secs(1)),
	beacon_gate: BeaconGate::HealthAndSyncStatus,
	validator_gate: None,
};

pub(super) fn beacon_config(
	params: &BeaconContainerParams<'_>,
	env: &ServiceEnvironment,
) -> ContainerConfig {
	let ip = env.private_ip;
	let mut cmd = vec![
		"lighthouse".to_string(),
		"beacon_node".to_string(),
		format!("--debug-level={}", params.log_level),
		format!("--datadir={CONSENSUS_DATA_DIR}"),
		format!("--testnet-dir={TESTNET_DIR}"),
		"--eth1".to_string(),
		"--disable-enr-auto-update".to_string(),
		format!("--enr-address={ip}"),
		format!("--enr-udp-port={DISCOVERY_PORT}"),
		format!("--enr-tcp-port={DISCOVERY_PORT}"),
		"--listen-address=0.0.0.0".to_string(),
		format!("--port={DISCOVERY_PORT}"),
		"--http".to_string(),
		"--http-address=0.0.0.0".to_string(),
		format!("--http-port={BEACON_HTTP_PORT}"),
		"--http-allow-sync-stalled".to_string(),
		"--disable-packet-filter".to_string(),
		format!("--execution-endpoints={}", params.execution_engine_url),
		format!("--execution-jwt={JWT_SECRET_PATH}"),
		format!("--eth1-endpoints={}", params.execution_rpc_url),
		"--subscribe-all-subnets".to_string(),
		"--metrics".to_string(),
		format!("--metrics-address={ip}"),
		"--metrics-allow-origin=*".to_string(),
		format!("--metrics-port={BEACON_METRICS_PORT}"),
	];
	if let Some(enr) = params.bootnode_enr {
		cmd.push(format!("--boot-nodes={enr}"));
	}
	cmd.extend(params.extra_params.iter().cloned());

	ContainerConfig {
		image: params.image.to_string(),
		entrypoint: None,
		cmd,
		ports: beacon_ports(true),
		mounts: vec![
			Mount::read_only(&params.genesis.cl_testnet_dir, TESTNET_DIR),
			Mount::read_only(&params.genesis.jwt_secret, JWT_SECRET_PATH),
		],
	}
}

pub(super) fn validator_config(
	params: &ValidatorContainerParams<'_>,
	env: &ServiceEnvironment,
) -> ContainerConfig {
	let mut cmd = vec![
		"lighthouse".to_string(),
		"validator_client".to_string(),
		format!("--debug-level={}", params.log_level),
		format!("--testnet-dir={TESTNET_DIR}"),
		format!("--validators-dir={VALIDATOR_KEYS_DIR}"),
		format!("--secrets-dir={VALIDATOR_SECRETS_DIR}"),
		"--init-slashing-protection".to_string(),
		"--http".to_string(),
		"--unencrypted-http-transport".to_string(),
		"--http-address=0.0.0.0".to_string(),
		format!("--http-port={VALIDATOR_HTTP_PORT}"),
		format!("--beacon-nodes={}", params.beacon_url),
		"--enable-doppelganger-protection=false".to_string(),
		"--metrics".to_string(),
		format!("--metrics-address={}", env.private_ip),
		"--metrics-allow-origin=*".to_string(),
		format!("--metrics-port={VALIDATOR_METRICS_PORT}"),
	];
	cmd.extend(params.extra_params.iter().cloned());

	ContainerConfig {
		image: params.image.to_string(),
		entrypoint: None,
		cmd,
		ports: validator_ports(),
		mounts: vec![
			Mount::read_only(&params.genesis.cl_testnet_dir, TESTNET_DIR),
			// Lighthouse keeps its slashing protection database alongside the keys.
			Mount::writable(&params.keystore.keys_dir, VALIDATOR_KEYS_DIR),
			Mount::read_only(&params.keystore.secrets_dir, VALIDATOR_SECRETS_DIR),
		],
	}
}
