// SPDX-License-Identifier: GPL-3.0

use super::{
	ConfigSupplier, ContainerConfig, Provisioner, RunningService, ServiceEnvironment, ServiceId,
};
use crate::errors::Error;
use async_trait::async_trait;
use duct::cmd;
use log::{debug, trace};
use std::{
	io::ErrorKind,
	net::{IpAddr, Ipv4Addr},
	process::Command,
	sync::atomic::{AtomicU32, Ordering},
};
use tokio::task::spawn_blocking;

const DOCKER: &str = "docker";
// .0 is the network address and .1 the gateway.
const FIRST_HOST: u32 = 2;

#[derive(Debug, Eq, PartialEq)]
pub enum DockerStatus {
	NotInstalled,
	Installed,
	Running,
}

impl DockerStatus {
	pub fn detect() -> Result<Self, Error> {
		Self::detect_with(DOCKER)
	}

	/// Detects the status of Docker using the given binary.
	///
	/// # Arguments
	/// * `binary` - The name or path of the `docker` binary.
	pub fn detect_with(binary: &str) -> Result<Self, Error> {
		match Command::new(binary).arg("info").output() {
			Ok(output) if output.status.success() => Ok(DockerStatus::Running),
			Ok(_) => Ok(DockerStatus::Installed),
			Err(err) if err.kind() == ErrorKind::NotFound => Ok(DockerStatus::NotInstalled),
			Err(err) => Err(Error::IO(err)),
		}
	}
}

/// Starts services as containers on a dedicated Docker network, assigning each the next free
/// address of the network's subnet.
#[derive(Debug)]
pub struct DockerProvisioner {
	binary: String,
	network: String,
	subnet: Ipv4Addr,
	prefix_len: u8,
	next_host: AtomicU32,
}

impl DockerProvisioner {
	/// Creates a provisioner for the given network. Host bits set in `subnet` are cleared and
	/// prefix lengths above 32 are treated as 32.
	///
	/// # Arguments
	/// * `network` - The name of the Docker network the services are attached to.
	/// * `subnet` - The network address of the subnet (e.g. `172.28.0.0`).
	/// * `prefix_len` - The prefix length of the subnet (e.g. `16`).
	pub fn new(network: impl Into<String>, subnet: Ipv4Addr, prefix_len: u8) -> Self {
		let prefix_len = prefix_len.min(32);
		let mask = u32::MAX.checked_shl(32 - u32::from(prefix_len)).unwrap_or(0);
		Self {
			binary: DOCKER.to_string(),
			network: network.into(),
			subnet: Ipv4Addr::from(u32::from(subnet) & mask),
			prefix_len,
			next_host: AtomicU32::new(FIRST_HOST),
		}
	}

	/// Uses the given binary in place of `docker`.
	pub fn with_binary(self, binary: impl Into<String>) -> Self {
		Self { binary: binary.into(), ..self }
	}

	/// The subnet in CIDR notation.
	pub fn subnet(&self) -> String {
		format!("{}/{}", self.subnet, self.prefix_len)
	}

	/// Creates the Docker network, unless it already exists.
	pub fn ensure_network(&self) -> Result<(), Error> {
		let exists = cmd!(&self.binary, "network", "inspect", &self.network)
			.stdout_null()
			.stderr_null()
			.unchecked()
			.run()
			.map(|o| o.status.success())
			.unwrap_or(false);
		if exists {
			return Ok(());
		}
		debug!("Creating Docker network `{}` with subnet {}", self.network, self.subnet());
		let subnet = self.subnet();
		let output = cmd!(&self.binary, "network", "create", "--subnet", subnet, &self.network)
			.stdout_null()
			.stderr_capture()
			.unchecked()
			.run()?;
		if !output.status.success() {
			return Err(Error::ConfigurationMismatch(format!(
				"failed to create Docker network `{}`: {}",
				self.network,
				String::from_utf8_lossy(&output.stderr).trim()
			)));
		}
		Ok(())
	}

	fn allocate_ip(&self, service_id: &ServiceId) -> Result<Ipv4Addr, Error> {
		let host = self.next_host.fetch_add(1, Ordering::SeqCst);
		// The last address of the subnet is its broadcast address.
		let capacity = 1u64 << (32 - u32::from(self.prefix_len));
		u32::from(self.subnet)
			.checked_add(host)
			.filter(|_| u64::from(host) < capacity.saturating_sub(1))
			.map(Ipv4Addr::from)
			.ok_or_else(|| Error::ProvisioningFailed {
				service: service_id.clone(),
				message: format!("no free addresses left in subnet {}", self.subnet()),
			})
	}

	fn run_args(
		&self,
		service_id: &ServiceId,
		ip: Ipv4Addr,
		config: &ContainerConfig,
	) -> Vec<String> {
		let mut args = vec![
			"run".to_string(),
			"--detach".to_string(),
			"--name".to_string(),
			service_id.to_string(),
			"--network".to_string(),
			self.network.clone(),
			"--ip".to_string(),
			ip.to_string(),
		];
		for mount in &config.mounts {
			args.push("--volume".to_string());
			let suffix = if mount.read_only { ":ro" } else { "" };
			args.push(format!("{}:{}{suffix}", mount.source.display(), mount.target));
		}
		if let Some(entrypoint) = &config.entrypoint {
			args.push("--entrypoint".to_string());
			args.push(entrypoint.clone());
		}
		args.push(config.image.clone());
		args.extend(config.cmd.iter().cloned());
		args
	}
}

#[async_trait]
impl Provisioner for DockerProvisioner {
	async fn start(
		&self,
		service_id: &ServiceId,
		config: ConfigSupplier<'_>,
	) -> Result<RunningService, Error> {
		let ip = self.allocate_ip(service_id)?;
		let config = config(&ServiceEnvironment { private_ip: IpAddr::V4(ip) })?;
		let args = self.run_args(service_id, ip, &config);
		trace!("{} {}", self.binary, args.join(" "));

		let failed =
			|message: String| Error::ProvisioningFailed { service: service_id.clone(), message };
		let docker_run = cmd(&self.binary, &args).stdout_capture().stderr_capture().unchecked();
		let output = spawn_blocking(move || docker_run.run())
			.await
			.map_err(|e| failed(e.to_string()))?
			.map_err(|e| failed(e.to_string()))?;
		if !output.status.success() {
			return Err(failed(String::from_utf8_lossy(&output.stderr).trim().to_string()));
		}
		debug!(
			"Started container {} for `{service_id}` at {ip}",
			String::from_utf8_lossy(&output.stdout).trim()
		);
		Ok(RunningService::new(service_id.clone(), IpAddr::V4(ip), config.ports))
	}
}
