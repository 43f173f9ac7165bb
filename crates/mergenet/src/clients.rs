// SPDX-License-Identifier: GPL-3.0

use crate::{
	cl::{BeaconApi, BeaconRestClient},
	el::{ElRpcClient, ExecutionApi},
	errors::Error,
	provision::Provisioner,
};
use std::{net::IpAddr, sync::Arc, time::Duration};
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Creates query clients for running client processes.
pub trait ClientFactory: Send + Sync {
	/// A client for the JSON-RPC endpoint of an execution client.
	fn execution(&self, ip: IpAddr, port: u16) -> Result<Arc<dyn ExecutionApi>, Error>;

	/// A client for the Beacon API of a consensus client.
	fn beacon(&self, ip: IpAddr, port: u16) -> Result<Arc<dyn BeaconApi>, Error>;
}

/// Creates HTTP clients sharing one connection pool.
#[derive(Clone, Debug)]
pub struct HttpClients {
	http: reqwest::Client,
}

impl HttpClients {
	pub fn new() -> Result<Self, Error> {
		Ok(Self { http: reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()? })
	}
}

impl ClientFactory for HttpClients {
	fn execution(&self, ip: IpAddr, port: u16) -> Result<Arc<dyn ExecutionApi>, Error> {
		Ok(Arc::new(ElRpcClient::new(self.http.clone(), http_url(ip, port)?)))
	}

	fn beacon(&self, ip: IpAddr, port: u16) -> Result<Arc<dyn BeaconApi>, Error> {
		Ok(Arc::new(BeaconRestClient::new(self.http.clone(), http_url(ip, port)?)))
	}
}

/// The external collaborators a launcher drives.
#[derive(Clone)]
pub struct Collaborators {
	pub provisioner: Arc<dyn Provisioner>,
	pub clients: Arc<dyn ClientFactory>,
}

impl Collaborators {
	pub fn new(provisioner: Arc<dyn Provisioner>, clients: Arc<dyn ClientFactory>) -> Self {
		Self { provisioner, clients }
	}
}

pub(crate) fn http_url(ip: IpAddr, port: u16) -> Result<Url, Error> {
	let url = match ip {
		IpAddr::V4(ip) => format!("http://{ip}:{port}"),
		IpAddr::V6(ip) => format!("http://[{ip}]:{port}"),
	};
	Ok(url.parse()?)
}
