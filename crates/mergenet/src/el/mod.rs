// SPDX-License-Identifier: GPL-3.0

use crate::{
	clients::Collaborators,
	descriptor::{DiscoveryRecord, EndpointDescriptor, NodeRole, PortSpec, Ports},
	errors::{Error, Stage},
	genesis::GenesisMaterial,
	log_level::{LogLevels, ParticipantLogLevel},
	provision::{ContainerConfig, ServiceEnvironment, ServiceId},
	readiness::{FixedInterval, Readiness, wait_until_ready},
};
use async_trait::async_trait;
use log::info;
pub use mining::MiningWaiter;
pub use rpc::{ElRpcClient, ExecutionApi, NodeInfo};
use serde::Deserialize;
use std::{collections::BTreeMap, sync::Arc};
use strum_macros::{AsRefStr, Display, EnumString, VariantArray};

mod geth;
mod mining;
mod nethermind;
mod rpc;

pub const RPC_PORT_ID: &str = "rpc";
pub const WS_PORT_ID: &str = "ws";
pub const ENGINE_RPC_PORT_ID: &str = "engine-rpc";
pub const TCP_DISCOVERY_PORT_ID: &str = "tcp-discovery";
pub const UDP_DISCOVERY_PORT_ID: &str = "udp-discovery";

const RPC_PORT: u16 = 8545;
const WS_PORT: u16 = 8546;
const ENGINE_RPC_PORT: u16 = 8551;
const DISCOVERY_PORT: u16 = 30303;

const EXECUTION_DATA_DIR: &str = "/execution-data";
const FEE_RECIPIENT: &str = "0x0000000000000000000000000000000000000001";

/// The supported execution clients.
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
pub enum ElClientType {
	Geth,
	Nethermind,
}

impl ElClientType {
	/// The default behaviour of the client.
	pub fn family(&self) -> ElFamily {
		match self {
			ElClientType::Geth => geth::FAMILY,
			ElClientType::Nethermind => nethermind::FAMILY,
		}
	}

	/// The image used when none is configured.
	pub fn default_image(&self) -> &'static str {
		match self {
			ElClientType::Geth => "ethereum/client-go:latest",
			ElClientType::Nethermind => "nethermind/nethermind:latest",
		}
	}
}

/// The behaviour which differs between execution clients.
#[derive(Clone, Copy, Debug)]
pub struct ElFamily {
	pub log_levels: LogLevels,
	/// How long to wait for the client to answer JSON-RPC requests.
	pub readiness: FixedInterval,
	/// Whether the client reports an Ethereum Node Record through its node information.
	pub provides_enr: bool,
}

/// The instructions for launching one execution client.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ElLaunchRequest {
	pub client: ElClientType,
	pub image: String,
	pub log_level: ParticipantLogLevel,
	/// A client-specific log level, taking precedence over `log_level`.
	pub log_level_override: Option<String>,
	pub extra_params: Vec<String>,
}

impl ElLaunchRequest {
	/// A request for the given client, using its default image.
	pub fn new(client: ElClientType) -> Self {
		Self {
			client,
			image: client.default_image().to_string(),
			log_level: ParticipantLogLevel::default(),
			log_level_override: None,
			extra_params: Vec::new(),
		}
	}
}

/// Launches execution clients.
#[async_trait]
pub trait ExecutionLauncher: Send + Sync {
	/// Launches a client, returning its descriptor once it is ready and its identity is known.
	///
	/// # Arguments
	/// * `service_id` - The identifier of the service to launch.
	/// * `request` - The launch instructions.
	/// * `role` - Whether the client is the bootnode, or which bootnode it joins through.
	async fn launch(
		&self,
		service_id: &ServiceId,
		request: &ElLaunchRequest,
		role: NodeRole<'_>,
	) -> Result<EndpointDescriptor, Error>;
}

pub(crate) struct ElContainerParams<'a> {
	pub(crate) image: &'a str,
	pub(crate) log_level: &'a str,
	pub(crate) bootnode_enode: Option<&'a str>,
	pub(crate) extra_params: &'a [String],
	pub(crate) genesis: &'a GenesisMaterial,
}

fn used_ports() -> Ports {
	Ports::from([
		(RPC_PORT_ID.to_string(), PortSpec::tcp(RPC_PORT)),
		(WS_PORT_ID.to_string(), PortSpec::tcp(WS_PORT)),
		(ENGINE_RPC_PORT_ID.to_string(), PortSpec::tcp(ENGINE_RPC_PORT)),
		(TCP_DISCOVERY_PORT_ID.to_string(), PortSpec::tcp(DISCOVERY_PORT)),
		(UDP_DISCOVERY_PORT_ID.to_string(), PortSpec::udp(DISCOVERY_PORT)),
	])
}

/// Launches execution clients of any supported type.
#[derive(Clone)]
pub struct ElLauncher {
	collaborators: Collaborators,
	genesis: Arc<GenesisMaterial>,
	families: BTreeMap<ElClientType, ElFamily>,
}

impl ElLauncher {
	/// Creates a launcher using the default behaviour of each client.
	///
	/// # Arguments
	/// * `collaborators` - Used to start clients and query them once started.
	/// * `genesis` - The genesis material shared by the network.
	pub fn new(collaborators: Collaborators, genesis: Arc<GenesisMaterial>) -> Self {
		use strum::VariantArray as _;
		let families = ElClientType::VARIANTS.iter().map(|c| (*c, c.family())).collect();
		Self { collaborators, genesis, families }
	}

	/// Overrides the behaviour of a client.
	pub fn with_family(mut self, client: ElClientType, family: ElFamily) -> Self {
		self.families.insert(client, family);
		self
	}

	fn family(&self, client: ElClientType) -> Result<&ElFamily, Error> {
		self.families
			.get(&client)
			.ok_or_else(|| {
				Error::ConfigurationMismatch(format!("no behaviour defined for {client}"))
			})
	}
}

#[async_trait]
impl ExecutionLauncher for ElLauncher {
	async fn launch(
		&self,
		service_id: &ServiceId,
		request: &ElLaunchRequest,
		role: NodeRole<'_>,
	) -> Result<EndpointDescriptor, Error> {
		let client = request.client;
		let family = self.family(client).map_err(|e| e.at(service_id, Stage::Configuration))?;
		let log_level = family
			.log_levels
			.resolve(client.as_ref(), request.log_level, request.log_level_override.as_deref())
			.map_err(|e| e.at(service_id, Stage::Configuration))?;
		let bootnode_enode = match role.bootnode() {
			None => None,
			Some(bootnode) => Some(
				bootnode.discovery_record().and_then(DiscoveryRecord::enode).ok_or_else(|| {
					Error::ConfigurationMismatch(format!(
						"bootnode `{}` has no enode",
						bootnode.service_id()
					))
					.at(service_id, Stage::Configuration)
				})?,
			),
		};

		let params = ElContainerParams {
			image: &request.image,
			log_level: &log_level,
			bootnode_enode,
			extra_params: &request.extra_params,
			genesis: &self.genesis,
		};
		let supplier = |env: &ServiceEnvironment| -> Result<ContainerConfig, Error> {
			Ok(match client {
				ElClientType::Geth => geth::container_config(&params, env),
				ElClientType::Nethermind => nethermind::container_config(&params, env),
			})
		};
		info!("Launching {client} execution client `{service_id}`");
		let service = self
			.collaborators
			.provisioner
			.start(service_id, &supplier)
			.await
			.map_err(|e| e.at(service_id, Stage::Provisioning))?;

		let rpc_port =
			service.port(RPC_PORT_ID).map_err(|e| e.at(service_id, Stage::Provisioning))?;
		let api = self
			.collaborators
			.clients
			.execution(service.private_ip(), rpc_port.number())
			.map_err(|e| e.at(service_id, Stage::Readiness))?;
		let rpc = api.as_ref();
		wait_until_ready(&family.readiness, || async move {
			rpc.health().await.map(Readiness::Ready)
		})
		.await
		.map_err(|e| e.at(service_id, Stage::Readiness))?;

		let identity_failed = |message: String| {
			Error::IdentityRetrievalFailed { service: service_id.clone(), message }
				.at(service_id, Stage::Identity)
		};
		let node_info = api.node_info().await.map_err(|e| identity_failed(e.to_string()))?;
		if node_info.enode.is_empty() {
			return Err(identity_failed("the node reported an empty enode".into()));
		}
		let enr = match family.provides_enr {
			true => node_info.enr.filter(|enr| !enr.is_empty()),
			false => None,
		};
		info!(
			"Execution client `{service_id}` is available at {} with enode {}",
			service.private_ip(),
			node_info.enode
		);

		Ok(EndpointDescriptor::new(
			service_id.clone(),
			service.private_ip(),
			service.ports().clone(),
			rpc_port.number(),
			Some(DiscoveryRecord::Enode { enode: node_info.enode, enr }),
		)
		.with_mining_waiter(MiningWaiter::new(api)))
	}
}
