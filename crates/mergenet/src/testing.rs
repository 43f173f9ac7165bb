// SPDX-License-Identifier: GPL-3.0

//! In-memory collaborators for exercising launchers without Docker or live clients.

use crate::{
	cl::{BeaconApi, NodeIdentity, SyncingData},
	clients::ClientFactory,
	el::{ExecutionApi, NodeInfo},
	errors::Error,
	genesis::{GenesisMaterial, ValidatorKeystore},
	provision::{
		ConfigSupplier, ContainerConfig, Provisioner, RunningService, ServiceEnvironment, ServiceId,
	},
};
use async_trait::async_trait;
use std::{
	net::{IpAddr, Ipv4Addr},
	sync::{
		Arc, Mutex,
		atomic::{AtomicU32, AtomicUsize, Ordering},
	},
};

pub(crate) fn genesis() -> GenesisMaterial {
	GenesisMaterial {
		el_genesis_json: "/network/el/genesis.json".into(),
		el_chainspec_json: "/network/el/chainspec.json".into(),
		cl_testnet_dir: "/network/cl".into(),
		jwt_secret: "/network/jwtsecret".into(),
		network_id: 3151908,
		terminal_total_difficulty: 60_000_000,
	}
}

pub(crate) fn keystore() -> ValidatorKeystore {
	ValidatorKeystore {
		keys_dir: "/network/keys/0".into(),
		secrets_dir: "/network/secrets/0".into(),
	}
}

/// Hands out sequential addresses within `172.28.0.0/16`, starting at `.2`, and records what was
/// started.
#[derive(Default)]
pub(crate) struct FakeProvisioner {
	failing: Vec<ServiceId>,
	started: Mutex<Vec<(ServiceId, ContainerConfig)>>,
}

impl FakeProvisioner {
	pub(crate) fn failing(mut self, service_id: &str) -> Self {
		self.failing.push(service_id.into());
		self
	}

	pub(crate) fn started(&self) -> Vec<ServiceId> {
		self.started.lock().unwrap().iter().map(|(id, _)| id.clone()).collect()
	}

	pub(crate) fn config(&self, service_id: &ServiceId) -> Option<ContainerConfig> {
		self.started
			.lock()
			.unwrap()
			.iter()
			.find(|(id, _)| id == service_id)
			.map(|(_, config)| config.clone())
	}
}

#[async_trait]
impl Provisioner for FakeProvisioner {
	async fn start(
		&self,
		service_id: &ServiceId,
		config: ConfigSupplier<'_>,
	) -> Result<RunningService, Error> {
		if self.failing.contains(service_id) {
			return Err(Error::ProvisioningFailed {
				service: service_id.clone(),
				message: "image not found".into(),
			});
		}
		let mut started = self.started.lock().unwrap();
		let host = u8::try_from(started.len() + 2).unwrap();
		let private_ip = IpAddr::V4(Ipv4Addr::new(172, 28, 0, host));
		let config = config(&ServiceEnvironment { private_ip })?;
		let ports = config.ports.clone();
		started.push((service_id.clone(), config));
		Ok(RunningService::new(service_id.clone(), private_ip, ports))
	}
}

/// An execution client whose enode is derived from its address, i.e. `enode://fake@<ip>:30303`.
#[derive(Default)]
pub(crate) struct FakeExecutionApi {
	ip: Option<IpAddr>,
	unhealthy_checks: u32,
	identity_unavailable: bool,
	enode: Option<String>,
	enr: Option<String>,
	blocks: Vec<u64>,
	health_checks: AtomicU32,
	node_info_calls: AtomicU32,
	block_queries: AtomicUsize,
}

impl FakeExecutionApi {
	/// Fails the given number of health checks before succeeding.
	pub(crate) fn unhealthy_for(mut self, checks: u32) -> Self {
		self.unhealthy_checks = checks;
		self
	}

	pub(crate) fn never_healthy(self) -> Self {
		self.unhealthy_for(u32::MAX)
	}

	pub(crate) fn without_identity(mut self) -> Self {
		self.identity_unavailable = true;
		self
	}

	/// Reports the given enode in place of one derived from the address.
	pub(crate) fn with_enode(mut self, enode: &str) -> Self {
		self.enode = Some(enode.to_string());
		self
	}

	pub(crate) fn with_enr(mut self, enr: &str) -> Self {
		self.enr = Some(enr.to_string());
		self
	}

	/// The block numbers reported by successive queries; the last one repeats.
	pub(crate) fn with_blocks(mut self, blocks: impl IntoIterator<Item = u64>) -> Self {
		self.blocks = blocks.into_iter().collect();
		self
	}

	pub(crate) fn health_checks(&self) -> u32 {
		self.health_checks.load(Ordering::SeqCst)
	}

	pub(crate) fn node_info_calls(&self) -> u32 {
		self.node_info_calls.load(Ordering::SeqCst)
	}

	// A fresh instance with the same behaviour, answering for the given address.
	fn spawn(&self, ip: IpAddr) -> Self {
		Self {
			ip: Some(ip),
			unhealthy_checks: self.unhealthy_checks,
			identity_unavailable: self.identity_unavailable,
			enode: self.enode.clone(),
			enr: self.enr.clone(),
			blocks: self.blocks.clone(),
			..Default::default()
		}
	}
}

#[async_trait]
impl ExecutionApi for FakeExecutionApi {
	async fn health(&self) -> Result<(), Error> {
		let check = self.health_checks.fetch_add(1, Ordering::SeqCst) + 1;
		if check <= self.unhealthy_checks {
			return Err(Error::InvalidResponse("connection refused".into()));
		}
		Ok(())
	}

	async fn node_info(&self) -> Result<NodeInfo, Error> {
		self.node_info_calls.fetch_add(1, Ordering::SeqCst);
		if self.identity_unavailable {
			return Err(Error::Rpc {
				code: -32601,
				message: "the method admin_nodeInfo does not exist".into(),
			});
		}
		let ip = self.ip.unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
		Ok(NodeInfo {
			enode: self.enode.clone().unwrap_or_else(|| format!("enode://fake@{ip}:30303")),
			enr: self.enr.clone(),
			id: None,
			name: None,
		})
	}

	async fn block_number(&self) -> Result<u64, Error> {
		let query = self.block_queries.fetch_add(1, Ordering::SeqCst);
		Ok(self.blocks.get(query).or(self.blocks.last()).copied().unwrap_or_default())
	}
}

/// A beacon node whose ENR is derived from its address, i.e. `enr:-fake-<ip>`.
#[derive(Default)]
pub(crate) struct FakeBeaconApi {
	ip: Option<IpAddr>,
	unhealthy_checks: u32,
	sync_status_unanswered: bool,
	is_syncing: bool,
	identity_unavailable: bool,
	health_checks: AtomicU32,
	sync_checks: AtomicU32,
}

impl FakeBeaconApi {
	pub(crate) fn unhealthy_for(mut self, checks: u32) -> Self {
		self.unhealthy_checks = checks;
		self
	}

	pub(crate) fn never_healthy(self) -> Self {
		self.unhealthy_for(u32::MAX)
	}

	/// Fails every sync status query.
	pub(crate) fn without_sync_status(mut self) -> Self {
		self.sync_status_unanswered = true;
		self
	}

	pub(crate) fn with_is_syncing(mut self, is_syncing: bool) -> Self {
		self.is_syncing = is_syncing;
		self
	}

	pub(crate) fn without_identity(mut self) -> Self {
		self.identity_unavailable = true;
		self
	}

	pub(crate) fn health_checks(&self) -> u32 {
		self.health_checks.load(Ordering::SeqCst)
	}

	pub(crate) fn sync_checks(&self) -> u32 {
		self.sync_checks.load(Ordering::SeqCst)
	}

	fn spawn(&self, ip: IpAddr) -> Self {
		Self {
			ip: Some(ip),
			unhealthy_checks: self.unhealthy_checks,
			sync_status_unanswered: self.sync_status_unanswered,
			is_syncing: self.is_syncing,
			identity_unavailable: self.identity_unavailable,
			..Default::default()
		}
	}
}

#[async_trait]
impl BeaconApi for FakeBeaconApi {
	async fn health(&self) -> Result<(), Error> {
		let check = self.health_checks.fetch_add(1, Ordering::SeqCst) + 1;
		if check <= self.unhealthy_checks {
			return Err(Error::InvalidResponse("connection refused".into()));
		}
		Ok(())
	}

	async fn syncing(&self) -> Result<SyncingData, Error> {
		self.sync_checks.fetch_add(1, Ordering::SeqCst);
		if self.sync_status_unanswered {
			return Err(Error::InvalidResponse("connection refused".into()));
		}
		Ok(SyncingData { is_syncing: self.is_syncing, head_slot: None, sync_distance: None })
	}

	async fn node_identity(&self) -> Result<NodeIdentity, Error> {
		if self.identity_unavailable {
			return Err(Error::InvalidResponse("missing field `enr`".into()));
		}
		let ip = self.ip.unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
		Ok(NodeIdentity {
			enr: format!("enr:-fake-{ip}"),
			peer_id: None,
			p2p_addresses: vec![],
			discovery_addresses: vec![],
		})
	}
}

/// Creates a fresh fake, configured like the template, for every client requested.
#[derive(Default)]
pub(crate) struct FakeClients {
	execution: FakeExecutionApi,
	beacon: FakeBeaconApi,
	execution_apis: Mutex<Vec<Arc<FakeExecutionApi>>>,
	beacon_apis: Mutex<Vec<Arc<FakeBeaconApi>>>,
}

impl FakeClients {
	pub(crate) fn with_execution(mut self, template: FakeExecutionApi) -> Self {
		self.execution = template;
		self
	}

	pub(crate) fn with_beacon(mut self, template: FakeBeaconApi) -> Self {
		self.beacon = template;
		self
	}

	pub(crate) fn execution_apis(&self) -> Vec<Arc<FakeExecutionApi>> {
		self.execution_apis.lock().unwrap().clone()
	}

	pub(crate) fn beacon_apis(&self) -> Vec<Arc<FakeBeaconApi>> {
		self.beacon_apis.lock().unwrap().clone()
	}
}

impl ClientFactory for FakeClients {
	fn execution(&self, ip: IpAddr, _port: u16) -> Result<Arc<dyn ExecutionApi>, Error> {
		let api = Arc::new(self.execution.spawn(ip));
		self.execution_apis.lock().unwrap().push(api.clone());
		Ok(api)
	}

	fn beacon(&self, ip: IpAddr, _port: u16) -> Result<Arc<dyn BeaconApi>, Error> {
		let api = Arc::new(self.beacon.spawn(ip));
		self.beacon_apis.lock().unwrap().push(api.clone());
		Ok(api)
	}
}
