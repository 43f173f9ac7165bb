// SPDX-License-Identifier: GPL-3.0

use crate::{
	descriptor::{PortSpec, Ports},
	errors::Error,
};
use async_trait::async_trait;
use std::{fmt, net::IpAddr, path::PathBuf};

/// Provisioning through the Docker CLI.
pub mod docker;

/// The unique identifier of a provisioned service.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ServiceId(String);

impl ServiceId {
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// The identifier of a sub-service, e.g. `cl-client-0-beacon`.
	pub fn child(&self, suffix: &str) -> ServiceId {
		ServiceId(format!("{}-{suffix}", self.0))
	}
}

impl fmt::Display for ServiceId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for ServiceId {
	fn from(value: &str) -> Self {
		ServiceId(value.to_string())
	}
}

impl From<String> for ServiceId {
	fn from(value: String) -> Self {
		ServiceId(value)
	}
}

/// A host path made available inside a container.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Mount {
	pub source: PathBuf,
	pub target: String,
	pub read_only: bool,
}

impl Mount {
	pub fn read_only(source: impl Into<PathBuf>, target: impl Into<String>) -> Self {
		Self { source: source.into(), target: target.into(), read_only: true }
	}

	pub fn writable(source: impl Into<PathBuf>, target: impl Into<String>) -> Self {
		Self { source: source.into(), target: target.into(), read_only: false }
	}
}

/// Everything required to start a client container.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ContainerConfig {
	pub image: String,
	pub entrypoint: Option<String>,
	pub cmd: Vec<String>,
	pub ports: Ports,
	pub mounts: Vec<Mount>,
}

/// The environment a service is about to be started in, known before the process starts.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServiceEnvironment {
	/// The address the service will be reachable at within the network.
	pub private_ip: IpAddr,
}

/// Builds the container configuration of a service once its environment is known.
pub type ConfigSupplier<'a> =
	&'a (dyn Fn(&ServiceEnvironment) -> Result<ContainerConfig, Error> + Send + Sync);

/// A started service.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RunningService {
	service_id: ServiceId,
	private_ip: IpAddr,
	ports: Ports,
}

impl RunningService {
	pub fn new(service_id: ServiceId, private_ip: IpAddr, ports: Ports) -> Self {
		Self { service_id, private_ip, ports }
	}

	pub fn service_id(&self) -> &ServiceId {
		&self.service_id
	}

	pub fn private_ip(&self) -> IpAddr {
		self.private_ip
	}

	pub fn ports(&self) -> &Ports {
		&self.ports
	}

	/// The port with the given identifier, which the service is expected to expose.
	///
	/// # Arguments
	/// * `id` - The identifier of the port.
	pub fn port(&self, id: &str) -> Result<PortSpec, Error> {
		self.ports.get(id).copied().ok_or_else(|| Error::ProvisioningFailed {
			service: self.service_id.clone(),
			message: format!(
				"expected the service to have a port with ID `{id}`, but none was found"
			),
		})
	}
}

/// Starts client processes.
#[async_trait]
pub trait Provisioner: Send + Sync {
	/// Starts a service, failing with [`Error::ProvisioningFailed`] if it cannot be started.
	///
	/// # Arguments
	/// * `service_id` - The identifier of the service.
	/// * `config` - Supplies the container configuration, given the service environment.
	async fn start(
		&self,
		service_id: &ServiceId,
		config: ConfigSupplier<'_>,
	) -> Result<RunningService, Error>;
}
