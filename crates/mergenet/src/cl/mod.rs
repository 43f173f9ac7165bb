// SPDX-License-Identifier: GPL-3.0

use crate::{
	clients::{Collaborators, http_url},
	descriptor::{DiscoveryRecord, EndpointDescriptor, NodeRole, PortSpec, Ports},
	el::{ENGINE_RPC_PORT_ID, RPC_PORT_ID},
	errors::{Error, Stage},
	genesis::{GenesisMaterial, ValidatorKeystore},
	log_level::{LogLevels, ParticipantLogLevel},
	provision::{ContainerConfig, ServiceEnvironment, ServiceId},
	readiness::{FixedInterval, Readiness, wait_until_ready},
};
use async_trait::async_trait;
use log::info;
pub use rest::{BeaconApi, BeaconRestClient, NodeIdentity, SyncingData};
use serde::Deserialize;
use std::{collections::BTreeMap, sync::Arc};
use strum_macros::{AsRefStr, Display, EnumString, VariantArray};

mod lighthouse;
mod lodestar;
mod rest;

pub const BEACON_HTTP_PORT_ID: &str = "http";
pub const BEACON_METRICS_PORT_ID: &str = "metrics";
pub const TCP_DISCOVERY_PORT_ID: &str = "tcp-discovery";
pub const UDP_DISCOVERY_PORT_ID: &str = "udp-discovery";
pub const VALIDATOR_HTTP_PORT_ID: &str = "validator-http";
pub const VALIDATOR_METRICS_PORT_ID: &str = "validator-metrics";

const DISCOVERY_PORT: u16 = 9000;
const BEACON_HTTP_PORT: u16 = 4000;
const BEACON_METRICS_PORT: u16 = 5054;
const VALIDATOR_HTTP_PORT: u16 = 5042;
const VALIDATOR_METRICS_PORT: u16 = 5064;

const CONSENSUS_DATA_DIR: &str = "/consensus-data";
const TESTNET_DIR: &str = "/genesis/testnet";
const VALIDATOR_KEYS_DIR: &str = "/validator-keys";
const VALIDATOR_SECRETS_DIR: &str = "/validator-secrets";

/// The supported consensus clients.
#[derive(
	AsRefStr,
	Clone,
	Copy,
	Debug,
	Deserialize,
	Display,
	EnumString,
	Eq,
	Hash,
	Ord,
	PartialEq,
	PartialOrd,
	VariantArray,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ClClientType {
	Lighthouse,
	Lodestar,
}

impl ClClientType {
	/// The default behaviour of the client.
	pub fn family(&self) -> ClFamily {
		match self {
			ClClientType::Lighthouse => lighthouse::FAMILY,
			ClClientType::Lodestar => lodestar::FAMILY,
		}
	}

	/// The image used when none is configured.
	pub fn default_image(&self) -> &'static str {
		match self {
			ClClientType::Lighthouse => "sigp/lighthouse:latest",
			ClClientType::Lodestar => "chainsafe/lodestar:next",
		}
	}
}

/// What a beacon node has to answer before it is considered available.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BeaconGate {
	Health,
	/// The health check passes and the sync status endpoint answers.
	HealthAndSyncStatus,
}

/// A wait, after the validator has been started, on the sync status of its beacon node.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ValidatorGate {
	pub readiness: FixedInterval,
	/// The value of `is_syncing` counting as success.
	pub ready_when_syncing: bool,
}

/// The behaviour which differs between consensus clients.
#[derive(Clone, Copy, Debug)]
pub struct ClFamily {
	pub log_levels: LogLevels,
	pub beacon_readiness: FixedInterval,
	pub beacon_gate: BeaconGate,
	/// Absent when the launch completes as soon as the validator has been started.
	pub validator_gate: Option<ValidatorGate>,
}

/// The instructions for launching one consensus client, i.e. a beacon node and its validator.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClLaunchRequest {
	pub client: ClClientType,
	pub image: String,
	pub log_level: ParticipantLogLevel,
	/// A client-specific log level, taking precedence over `log_level`.
	pub log_level_override: Option<String>,
	/// Additional arguments for the beacon node.
	pub extra_params: Vec<String>,
	/// Additional arguments for the validator.
	pub validator_extra_params: Vec<String>,
	pub keystore: ValidatorKeystore,
}

impl ClLaunchRequest {
	/// A request for the given client, using its default image.
	pub fn new(client: ClClientType, keystore: ValidatorKeystore) -> Self {
		Self {
			client,
			image: client.default_image().to_string(),
			log_level: ParticipantLogLevel::default(),
			log_level_override: None,
			extra_params: Vec::new(),
			validator_extra_params: Vec::new(),
			keystore,
		}
	}
}

/// Launches consensus clients.
#[async_trait]
pub trait ConsensusLauncher: Send + Sync {
	/// Launches a beacon node and its validator, returning the descriptor of the beacon node.
	///
	/// # Arguments
	/// * `service_id` - The identifier of the client; its sub-services are suffixed with
	///   `-beacon` and `-validator`.
	/// * `request` - The launch instructions.
	/// * `role` - Whether the client is the bootnode, or which beacon node it joins through.
	/// * `execution` - The execution client the beacon node attaches to.
	async fn launch(
		&self,
		service_id: &ServiceId,
		request: &ClLaunchRequest,
		role: NodeRole<'_>,
		execution: &EndpointDescriptor,
	) -> Result<EndpointDescriptor, Error>;
}

pub(crate) struct BeaconContainerParams<'a> {
	pub(crate) image: &'a str,
	pub(crate) log_level: &'a str,
	pub(crate) bootnode_enr: Option<&'a str>,
	pub(crate) execution_rpc_url: &'a str,
	pub(crate) execution_engine_url: &'a str,
	pub(crate) expected_beacon_nodes: usize,
	pub(crate) extra_params: &'a [String],
	pub(crate) genesis: &'a GenesisMaterial,
}

pub(crate) struct ValidatorContainerParams<'a> {
	pub(crate) service_id: &'a ServiceId,
	pub(crate) image: &'a str,
	pub(crate) log_level: &'a str,
	pub(crate) beacon_url: &'a str,
	pub(crate) extra_params: &'a [String],
	pub(crate) keystore: &'a ValidatorKeystore,
	pub(crate) genesis: &'a GenesisMaterial,
}

fn beacon_ports(metrics: bool) -> Ports {
	let mut ports = Ports::from([
		(TCP_DISCOVERY_PORT_ID.to_string(), PortSpec::tcp(DISCOVERY_PORT)),
		(UDP_DISCOVERY_PORT_ID.to_string(), PortSpec::udp(DISCOVERY_PORT)),
		(BEACON_HTTP_PORT_ID.to_string(), PortSpec::tcp(BEACON_HTTP_PORT)),
	]);
	if metrics {
		ports.insert(BEACON_METRICS_PORT_ID.to_string(), PortSpec::tcp(BEACON_METRICS_PORT));
	}
	ports
}

fn validator_ports() -> Ports {
	Ports::from([
		(VALIDATOR_HTTP_PORT_ID.to_string(), PortSpec::tcp(VALIDATOR_HTTP_PORT)),
		(VALIDATOR_METRICS_PORT_ID.to_string(), PortSpec::tcp(VALIDATOR_METRICS_PORT)),
	])
}

/// Launches consensus clients of any supported type.
#[derive(Clone)]
pub struct ClLauncher {
	collaborators: Collaborators,
	genesis: Arc<GenesisMaterial>,
	expected_beacon_nodes: usize,
	families: BTreeMap<ClClientType, ClFamily>,
}

impl ClLauncher {
	/// Creates a launcher using the default behaviour of each client.
	///
	/// # Arguments
	/// * `collaborators` - Used to start clients and query them once started.
	/// * `genesis` - The genesis material shared by the network.
	/// * `expected_beacon_nodes` - The number of beacon nodes in the network, used to size peer
	///   limits.
	pub fn new(
		collaborators: Collaborators,
		genesis: Arc<GenesisMaterial>,
		expected_beacon_nodes: usize,
	) -> Self {
		use strum::VariantArray as _;
		let families = ClClientType::VARIANTS.iter().map(|c| (*c, c.family())).collect();
		Self { collaborators, genesis, expected_beacon_nodes, families }
	}

	/// Overrides the behaviour of a client.
	pub fn with_family(mut self, client: ClClientType, family: ClFamily) -> Self {
		self.families.insert(client, family);
		self
	}

	fn family(&self, client: ClClientType) -> Result<&ClFamily, Error> {
		self.families
			.get(&client)
			.ok_or_else(|| {
				Error::ConfigurationMismatch(format!("no behaviour defined for {client}"))
			})
	}
}

#[async_trait]
impl ConsensusLauncher for ClLauncher {
	async fn launch(
		&self,
		service_id: &ServiceId,
		request: &ClLaunchRequest,
		role: NodeRole<'_>,
		execution: &EndpointDescriptor,
	) -> Result<EndpointDescriptor, Error> {
		let client = request.client;
		let configuration = |e: Error| e.at(service_id, Stage::Configuration);
		let family = self.family(client).map_err(configuration)?;
		let log_level = family
			.log_levels
			.resolve(client.as_ref(), request.log_level, request.log_level_override.as_deref())
			.map_err(configuration)?;
		let bootnode_enr = match role.bootnode() {
			None => None,
			Some(bootnode) => match bootnode.discovery_record() {
				Some(DiscoveryRecord::Enr(enr)) => Some(enr.as_str()),
				_ => {
					return Err(configuration(Error::ConfigurationMismatch(format!(
						"bootnode `{}` has no consensus ENR",
						bootnode.service_id()
					))));
				},
			},
		};
		let execution_rpc_url =
			execution.url_for(RPC_PORT_ID).unwrap_or_else(|| execution.api_url());
		let execution_engine_url =
			execution.url_for(ENGINE_RPC_PORT_ID).unwrap_or_else(|| execution.api_url());

		// Beacon node.
		let beacon_id = service_id.child("beacon");
		let params = BeaconContainerParams {
			image: &request.image,
			log_level: &log_level,
			bootnode_enr,
			execution_rpc_url: &execution_rpc_url,
			execution_engine_url: &execution_engine_url,
			expected_beacon_nodes: self.expected_beacon_nodes,
			extra_params: &request.extra_params,
			genesis: &self.genesis,
		};
		let supplier = |env: &ServiceEnvironment| -> Result<ContainerConfig, Error> {
			Ok(match client {
				ClClientType::Lighthouse => lighthouse::beacon_config(&params, env),
				ClClientType::Lodestar => lodestar::beacon_config(&params, env),
			})
		};
		info!(
			"Launching {client} beacon node `{beacon_id}` attached to `{}`",
			execution.service_id()
		);
		let beacon = self
			.collaborators
			.provisioner
			.start(&beacon_id, &supplier)
			.await
			.map_err(|e| e.at(&beacon_id, Stage::Provisioning))?;
		let http_port = beacon
			.port(BEACON_HTTP_PORT_ID)
			.map_err(|e| e.at(&beacon_id, Stage::Provisioning))?;
		let api = self
			.collaborators
			.clients
			.beacon(beacon.private_ip(), http_port.number())
			.map_err(|e| e.at(&beacon_id, Stage::Readiness))?;

		let beacon_api = api.as_ref();
		let gate = family.beacon_gate;
		wait_until_ready(&family.beacon_readiness, || async move {
			beacon_api.health().await?;
			if gate == BeaconGate::HealthAndSyncStatus {
				beacon_api.syncing().await?;
			}
			Ok::<_, Error>(Readiness::Ready(()))
		})
		.await
		.map_err(|e| e.at(&beacon_id, Stage::Readiness))?;

		let identity_failed = |message: String| {
			Error::IdentityRetrievalFailed { service: beacon_id.clone(), message }
				.at(&beacon_id, Stage::Identity)
		};
		let identity = api.node_identity().await.map_err(|e| identity_failed(e.to_string()))?;
		if identity.enr.is_empty() {
			return Err(identity_failed("the node reported an empty ENR".into()));
		}

		// Validator.
		let validator_id = service_id.child("validator");
		let beacon_url = http_url(beacon.private_ip(), http_port.number())
			.map_err(|e| e.at(&validator_id, Stage::Configuration))?;
		let beacon_url = beacon_url.as_str().trim_end_matches('/');
		let params = ValidatorContainerParams {
			service_id: &validator_id,
			image: &request.image,
			log_level: &log_level,
			beacon_url,
			extra_params: &request.validator_extra_params,
			keystore: &request.keystore,
			genesis: &self.genesis,
		};
		let supplier = |env: &ServiceEnvironment| -> Result<ContainerConfig, Error> {
			Ok(match client {
				ClClientType::Lighthouse => lighthouse::validator_config(&params, env),
				ClClientType::Lodestar => lodestar::validator_config(&params, env),
			})
		};
		info!("Launching {client} validator `{validator_id}` against {beacon_url}");
		self.collaborators
			.provisioner
			.start(&validator_id, &supplier)
			.await
			.map_err(|e| e.at(&validator_id, Stage::Provisioning))?;

		if let Some(ValidatorGate { readiness, ready_when_syncing }) = family.validator_gate {
			wait_until_ready(&readiness, || async move {
				let status = beacon_api.syncing().await?;
				Ok::<_, Error>(if status.is_syncing == ready_when_syncing {
					Readiness::Ready(())
				} else {
					let is_syncing = status.is_syncing;
					Readiness::Pending(format!("beacon node reports is_syncing = {is_syncing}"))
				})
			})
			.await
			.map_err(|e| e.at(&validator_id, Stage::Readiness))?;
		}

		info!(
			"Consensus client `{service_id}` is available at {} with ENR {}",
			beacon.private_ip(),
			identity.enr
		);
		Ok(EndpointDescriptor::new(
			beacon_id,
			beacon.private_ip(),
			beacon.ports().clone(),
			http_port.number(),
			Some(DiscoveryRecord::Enr(identity.enr)),
		))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		clients::ClientFactory,
		testing::{FakeBeaconApi, FakeClients, FakeProvisioner, genesis, keystore},
	};
	use std::{net::IpAddr, time::Duration};
	use tokio::time::Instant;

	struct TestLauncher {
		launcher: ClLauncher,
		provisioner: Arc<FakeProvisioner>,
		clients: Arc<FakeClients>,
	}

	impl TestLauncher {
		fn new(provisioner: FakeProvisioner, beacon: FakeBeaconApi) -> Self {
			let provisioner = Arc::new(provisioner);
			let clients = Arc::new(FakeClients::default().with_beacon(beacon));
			let launcher = ClLauncher::new(
				Collaborators::new(provisioner.clone(), clients.clone() as Arc<dyn ClientFactory>),
				Arc::new(genesis()),
				2,
			);
			Self { launcher, provisioner, clients }
		}

		async fn launch(
			&self,
			service_id: &str,
			client: ClClientType,
			role: NodeRole<'_>,
		) -> Result<EndpointDescriptor, Error> {
			self.launcher.launch(&service_id.into(), &request(client), role, &execution()).await
		}

		fn cmd(&self, service_id: &str) -> Vec<String> {
			self.provisioner.config(&service_id.into()).expect("service started").cmd
		}
	}

	fn execution() -> EndpointDescriptor {
		EndpointDescriptor::new(
			"el-client-0".into(),
			"172.28.1.2".parse::<IpAddr>().unwrap(),
			Ports::from([
				("rpc".to_string(), PortSpec::tcp(8545)),
				("engine-rpc".to_string(), PortSpec::tcp(8551)),
			]),
			8545,
			Some(DiscoveryRecord::Enode {
				enode: "enode://fake@172.28.1.2:30303".into(),
				enr: None,
			}),
		)
	}

	fn request(client: ClClientType) -> ClLaunchRequest {
		ClLaunchRequest::new(client, keystore())
	}

	fn started(service_ids: &[&str]) -> Vec<ServiceId> {
		service_ids.iter().map(|id| ServiceId::from(*id)).collect()
	}

	#[tokio::test(start_paused = true)]
	async fn lighthouse_launch_works() -> Result<(), Error> {
		let test = TestLauncher::new(
			FakeProvisioner::default(),
			FakeBeaconApi::default().unhealthy_for(2),
		);
		let start = Instant::now();

		let descriptor =
			test.launch("cl-client-0", ClClientType::Lighthouse, NodeRole::Bootnode).await?;

		assert_eq!(descriptor.service_id().as_str(), "cl-client-0-beacon");
		assert_eq!(descriptor.api_url(), "http://172.28.0.2:4000");
		assert_eq!(
			descriptor.discovery_record(),
			Some(&DiscoveryRecord::Enr("enr:-fake-172.28.0.2".into()))
		);
		assert!(descriptor.mining_waiter().is_none());
		assert_eq!(start.elapsed(), Duration::from_secs(2));
		assert_eq!(
			test.provisioner.started(),
			started(&["cl-client-0-beacon", "cl-client-0-validator"])
		);

		let beacon = test.cmd("cl-client-0-beacon");
		assert!(beacon.contains(&"--execution-endpoints=http://172.28.1.2:8551".to_string()));
		assert!(beacon.contains(&"--eth1-endpoints=http://172.28.1.2:8545".to_string()));
		assert!(beacon.contains(&"--enr-address=172.28.0.2".to_string()));
		assert!(!beacon.iter().any(|arg| arg.starts_with("--boot-nodes")));
		let validator = test.cmd("cl-client-0-validator");
		assert!(validator.contains(&"--beacon-nodes=http://172.28.0.2:4000".to_string()));
		Ok(())
	}

	#[tokio::test(start_paused = true)]
	async fn lighthouse_requires_sync_status_to_answer() {
		let test = TestLauncher::new(
			FakeProvisioner::default(),
			FakeBeaconApi::default().without_sync_status(),
		);
		let start = Instant::now();

		let result = test.launch("cl-client-0", ClClientType::Lighthouse, NodeRole::Bootnode).await;

		assert!(matches!(
			result.as_ref().map_err(Error::root_cause),
			Err(Error::Unavailable { retries: 10, .. })
		));
		assert_eq!(start.elapsed(), Duration::from_secs(10));
		assert_eq!(test.clients.beacon_apis()[0].sync_checks(), 11);
	}

	#[tokio::test(start_paused = true)]
	async fn unavailable_beacon_never_starts_validator() {
		let test =
			TestLauncher::new(FakeProvisioner::default(), FakeBeaconApi::default().never_healthy());
		let start = Instant::now();

		let result = test.launch("cl-client-0", ClClientType::Lighthouse, NodeRole::Bootnode).await;

		match result {
			Err(Error::Launch { service, stage: Stage::Readiness, source }) => {
				assert_eq!(service.as_str(), "cl-client-0-beacon");
				assert!(matches!(
					*source,
					Error::Unavailable { retries: 10, interval, .. }
						if interval == Duration::from_secs(1)
				));
			},
			other => panic!("expected the beacon readiness check to fail, got {other:?}"),
		}
		assert_eq!(start.elapsed(), Duration::from_secs(10));
		assert_eq!(test.clients.beacon_apis()[0].health_checks(), 11);
		assert_eq!(test.provisioner.started(), started(&["cl-client-0-beacon"]));
	}

	#[tokio::test(start_paused = true)]
	async fn identity_failure_never_starts_validator() {
		let test = TestLauncher::new(
			FakeProvisioner::default(),
			FakeBeaconApi::default().without_identity(),
		);

		let result = test.launch("cl-client-0", ClClientType::Lodestar, NodeRole::Bootnode).await;

		assert!(matches!(
			result.as_ref().map_err(Error::root_cause),
			Err(Error::IdentityRetrievalFailed { service, .. })
				if service.as_str() == "cl-client-0-beacon"
		));
		assert_eq!(test.provisioner.started(), started(&["cl-client-0-beacon"]));
	}

	#[tokio::test(start_paused = true)]
	async fn lodestar_validator_waits_for_syncing_beacon() -> Result<(), Error> {
		let test = TestLauncher::new(
			FakeProvisioner::default(),
			FakeBeaconApi::default().with_is_syncing(true),
		);
		let bootnode = EndpointDescriptor::new(
			"cl-client-0-beacon".into(),
			"172.28.0.9".parse::<IpAddr>().unwrap(),
			Ports::new(),
			4000,
			Some(DiscoveryRecord::Enr("enr:-bootnode".into())),
		);

		let descriptor = test
			.launch("cl-client-1", ClClientType::Lodestar, NodeRole::Follower(&bootnode))
			.await?;

		assert_eq!(
			descriptor.discovery_record().and_then(DiscoveryRecord::enr),
			Some("enr:-fake-172.28.0.2")
		);
		assert_eq!(test.clients.beacon_apis()[0].sync_checks(), 1);
		let beacon = test.cmd("cl-client-1-beacon");
		assert!(beacon.contains(&"--network.discv5.bootEnrs=enr:-bootnode".to_string()));
		assert!(beacon.contains(&"--network.targetPeers=1".to_string()));
		assert!(beacon.contains(&"--paramsFile=/genesis/testnet/config.yaml".to_string()));
		assert!(beacon.contains(&"--genesisStateFile=/genesis/testnet/genesis.ssz".to_string()));
		let validator = test.cmd("cl-client-1-validator");
		assert!(validator.contains(&"--server=http://172.28.0.2:4000".to_string()));
		assert!(validator.contains(&"--rootDir=/consensus-data/cl-client-1-validator".to_string()));
		Ok(())
	}

	#[tokio::test(start_paused = true)]
	async fn lodestar_validator_gate_fails_on_synced_beacon() {
		let test = TestLauncher::new(
			FakeProvisioner::default(),
			FakeBeaconApi::default().with_is_syncing(false),
		);
		let start = Instant::now();

		let result = test.launch("cl-client-0", ClClientType::Lodestar, NodeRole::Bootnode).await;

		match result {
			Err(Error::Launch { service, stage: Stage::Readiness, source }) => {
				assert_eq!(service.as_str(), "cl-client-0-validator");
				assert!(matches!(*source, Error::Unavailable { retries: 30, .. }));
			},
			other => panic!("expected the validator gate to fail, got {other:?}"),
		}
		assert_eq!(start.elapsed(), Duration::from_secs(30));
		assert_eq!(test.provisioner.started().len(), 2);
	}

	#[tokio::test]
	async fn lodestar_rejects_trace_log_level() {
		let test = TestLauncher::new(FakeProvisioner::default(), FakeBeaconApi::default());
		let mut request = request(ClClientType::Lodestar);
		request.log_level = ParticipantLogLevel::Trace;

		let result = test
			.launcher
			.launch(&"cl-client-0".into(), &request, NodeRole::Bootnode, &execution())
			.await;

		assert!(matches!(
			result.as_ref().map_err(Error::root_cause),
			Err(Error::UnsupportedLogLevel { client, level: ParticipantLogLevel::Trace })
				if client == "lodestar"
		));
		assert!(test.provisioner.started().is_empty());
	}

	#[tokio::test]
	async fn follower_requires_consensus_bootnode() {
		let test = TestLauncher::new(FakeProvisioner::default(), FakeBeaconApi::default());
		let el = execution();

		let result = test
			.launch("cl-client-1", ClClientType::Lighthouse, NodeRole::Follower(&el))
			.await;

		assert!(matches!(
			result.as_ref().map_err(Error::root_cause),
			Err(Error::ConfigurationMismatch(_))
		));
		assert!(test.provisioner.started().is_empty());
	}

	#[tokio::test]
	async fn validator_provisioning_failure_is_attributed_to_validator() {
		let test = TestLauncher::new(
			FakeProvisioner::default().failing("cl-client-0-validator"),
			FakeBeaconApi::default(),
		);

		let result = test.launch("cl-client-0", ClClientType::Lighthouse, NodeRole::Bootnode).await;

		assert!(matches!(
			result,
			Err(Error::Launch { ref service, stage: Stage::Provisioning, .. })
				if service.as_str() == "cl-client-0-validator"
		));
	}
}
