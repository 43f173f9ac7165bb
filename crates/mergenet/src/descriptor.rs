// SPDX-License-Identifier: GPL-3.0

use crate::{el::MiningWaiter, provision::ServiceId};
use std::{collections::BTreeMap, fmt, net::IpAddr};

/// The transport protocol of a port.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TransportProtocol {
	Tcp,
	Udp,
}

impl fmt::Display for TransportProtocol {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			TransportProtocol::Tcp => "tcp",
			TransportProtocol::Udp => "udp",
		})
	}
}

/// A port number and the transport it is served over.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct PortSpec {
	number: u16,
	protocol: TransportProtocol,
}

impl PortSpec {
	pub const fn tcp(number: u16) -> Self {
		Self { number, protocol: TransportProtocol::Tcp }
	}

	pub const fn udp(number: u16) -> Self {
		Self { number, protocol: TransportProtocol::Udp }
	}

	pub const fn number(&self) -> u16 {
		self.number
	}

	pub const fn protocol(&self) -> TransportProtocol {
		self.protocol
	}
}

/// Ports keyed by their logical role (e.g. `rpc`, `http`, `udp-discovery`).
pub type Ports = BTreeMap<String, PortSpec>;

/// The identity other clients use to dial in to a node.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DiscoveryRecord {
	/// An execution client, identified by its `enode://` URL. Some clients also expose an
	/// Ethereum Node Record; others cannot, in which case `enr` is `None`.
	Enode { enode: String, enr: Option<String> },
	/// A consensus client, identified by its Ethereum Node Record.
	Enr(String),
}

impl DiscoveryRecord {
	/// The record peers of the same layer use to seed discovery.
	pub fn peer_seed(&self) -> &str {
		match self {
			DiscoveryRecord::Enode { enode, .. } => enode,
			DiscoveryRecord::Enr(enr) => enr,
		}
	}

	pub fn enode(&self) -> Option<&str> {
		match self {
			DiscoveryRecord::Enode { enode, .. } => Some(enode),
			DiscoveryRecord::Enr(_) => None,
		}
	}

	pub fn enr(&self) -> Option<&str> {
		match self {
			DiscoveryRecord::Enode { enr, .. } => enr.as_deref(),
			DiscoveryRecord::Enr(enr) => Some(enr),
		}
	}
}

/// The network identity of a launched client.
///
/// Only produced by a successful launch, once the client has passed its readiness checks and its
/// identity has been retrieved. A descriptor cannot be modified once created.
#[derive(Clone, Debug)]
pub struct EndpointDescriptor {
	service_id: ServiceId,
	ip_addr: IpAddr,
	ports: Ports,
	api_port: u16,
	discovery_record: Option<DiscoveryRecord>,
	mining_waiter: Option<MiningWaiter>,
}

impl EndpointDescriptor {
	/// Creates a new descriptor.
	///
	/// # Arguments
	/// * `service_id` - The service the client runs as.
	/// * `ip_addr` - The private address of the client.
	/// * `ports` - The ports exposed by the client.
	/// * `api_port` - The port serving the client's HTTP API (JSON-RPC or Beacon API).
	/// * `discovery_record` - The record peers use to dial in, if any.
	pub fn new(
		service_id: ServiceId,
		ip_addr: IpAddr,
		ports: Ports,
		api_port: u16,
		discovery_record: Option<DiscoveryRecord>,
	) -> Self {
		Self { service_id, ip_addr, ports, api_port, discovery_record, mining_waiter: None }
	}

	/// Attaches a capability for waiting on chain progress.
	pub fn with_mining_waiter(self, mining_waiter: MiningWaiter) -> Self {
		Self { mining_waiter: Some(mining_waiter), ..self }
	}

	pub fn service_id(&self) -> &ServiceId {
		&self.service_id
	}

	pub fn ip_addr(&self) -> IpAddr {
		self.ip_addr
	}

	pub fn ports(&self) -> &Ports {
		&self.ports
	}

	pub fn port(&self, id: &str) -> Option<PortSpec> {
		self.ports.get(id).copied()
	}

	pub fn api_port(&self) -> u16 {
		self.api_port
	}

	/// The URL of the client's HTTP API.
	pub fn api_url(&self) -> String {
		self.url_for_port(self.api_port)
	}

	/// The HTTP URL of the port with the given identifier, if exposed.
	pub fn url_for(&self, port_id: &str) -> Option<String> {
		self.port(port_id).map(|p| self.url_for_port(p.number()))
	}

	pub fn discovery_record(&self) -> Option<&DiscoveryRecord> {
		self.discovery_record.as_ref()
	}

	pub fn mining_waiter(&self) -> Option<&MiningWaiter> {
		self.mining_waiter.as_ref()
	}

	fn url_for_port(&self, port: u16) -> String {
		match self.ip_addr {
			IpAddr::V4(ip) => format!("http://{ip}:{port}"),
			IpAddr::V6(ip) => format!("http://[{ip}]:{port}"),
		}
	}
}

/// Whether a client starts a new network of its layer, or joins one through an existing node.
#[derive(Clone, Copy, Debug)]
pub enum NodeRole<'a> {
	/// The first client of its layer; it has no peer to seed discovery from.
	Bootnode,
	/// A client joining through the given, already running, bootnode.
	Follower(&'a EndpointDescriptor),
}

impl<'a> NodeRole<'a> {
	pub fn bootnode(&self) -> Option<&'a EndpointDescriptor> {
		match *self {
			NodeRole::Bootnode => None,
			NodeRole::Follower(descriptor) => Some(descriptor),
		}
	}
}
