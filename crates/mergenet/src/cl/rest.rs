// SPDX-License-Identifier: GPL-3.0

use crate::errors::Error;
use async_trait::async_trait;
use serde::{Deserialize, de::DeserializeOwned};
use url::Url;

const NODE_HEALTH: &str = "eth/v1/node/health";
const NODE_IDENTITY: &str = "eth/v1/node/identity";
const NODE_SYNCING: &str = "eth/v1/node/syncing";

/// The sync status reported by a beacon node.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct SyncingData {
	pub is_syncing: bool,
	#[serde(default)]
	pub head_slot: Option<String>,
	#[serde(default)]
	pub sync_distance: Option<String>,
}

/// The network identity reported by a beacon node.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct NodeIdentity {
	pub enr: String,
	#[serde(default)]
	pub peer_id: Option<String>,
	#[serde(default)]
	pub p2p_addresses: Vec<String>,
	#[serde(default)]
	pub discovery_addresses: Vec<String>,
}

/// Queries against a running beacon node.
#[async_trait]
pub trait BeaconApi: Send + Sync {
	/// Succeeds once the node reports itself healthy.
	async fn health(&self) -> Result<(), Error>;

	async fn syncing(&self) -> Result<SyncingData, Error>;

	async fn node_identity(&self) -> Result<NodeIdentity, Error>;
}

#[derive(Deserialize)]
struct Envelope<T> {
	data: T,
}

/// A client for a beacon node's REST API.
#[derive(Clone, Debug)]
pub struct BeaconRestClient {
	http: reqwest::Client,
	url: Url,
}

impl BeaconRestClient {
	/// Creates a new client.
	///
	/// # Arguments
	/// * `http` - The HTTP client used to send requests.
	/// * `url` - The base URL of the Beacon API (e.g. `http://172.28.0.4:4000`).
	pub fn new(http: reqwest::Client, url: Url) -> Self {
		Self { http, url }
	}

	async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
		let envelope: Envelope<T> = self
			.http
			.get(self.url.join(path)?)
			.send()
			.await?
			.error_for_status()?
			.json()
			.await?;
		Ok(envelope.data)
	}
}

#[async_trait]
impl BeaconApi for BeaconRestClient {
	async fn health(&self) -> Result<(), Error> {
		self.http.get(self.url.join(NODE_HEALTH)?).send().await?.error_for_status()?;
		Ok(())
	}

	async fn syncing(&self) -> Result<SyncingData, Error> {
		self.get(NODE_SYNCING).await
	}

	async fn node_identity(&self) -> Result<NodeIdentity, Error> {
		self.get(NODE_IDENTITY).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use mockito::Server;
	use serde_json::json;

	fn client(server: &Server) -> BeaconRestClient {
		BeaconRestClient::new(reqwest::Client::new(), server.url().parse().unwrap())
	}

	#[tokio::test]
	async fn health_works() -> Result<(), Error> {
		let mut server = Server::new_async().await;
		// Lighthouse answers 206 while syncing, which still counts as available.
		let mock = server.mock("GET", "/eth/v1/node/health").with_status(206).create_async().await;

		client(&server).health().await?;

		mock.assert_async().await;
		Ok(())
	}

	#[tokio::test]
	async fn health_fails_before_genesis() {
		let mut server = Server::new_async().await;
		server.mock("GET", "/eth/v1/node/health").with_status(503).create_async().await;

		assert!(matches!(client(&server).health().await, Err(Error::Http(_))));
	}

	#[tokio::test]
	async fn syncing_works() -> Result<(), Error> {
		let mut server = Server::new_async().await;
		server
			.mock("GET", "/eth/v1/node/syncing")
			.with_status(200)
			.with_header("content-type", "application/json")
			.with_body(
				json!({
					"data": {
						"head_slot": "12",
						"sync_distance": "0",
						"is_syncing": true,
						"is_optimistic": false
					}
				})
				.to_string(),
			)
			.create_async()
			.await;

		let syncing = client(&server).syncing().await?;

		assert!(syncing.is_syncing);
		assert_eq!(syncing.head_slot.as_deref(), Some("12"));
		Ok(())
	}

	#[tokio::test]
	async fn node_identity_works() -> Result<(), Error> {
		let mut server = Server::new_async().await;
		server
			.mock("GET", "/eth/v1/node/identity")
			.with_status(200)
			.with_header("content-type", "application/json")
			.with_body(
				json!({
					"data": {
						"peer_id": "16Uiu2HAmQ",
						"enr": "enr:-MS4QHXY",
						"p2p_addresses": ["/ip4/172.28.0.4/tcp/9000/p2p/16Uiu2HAmQ"],
						"discovery_addresses": ["/ip4/172.28.0.4/udp/9000/p2p/16Uiu2HAmQ"],
						"metadata": { "seq_number": "1", "attnets": "0x0000000000000000" }
					}
				})
				.to_string(),
			)
			.create_async()
			.await;

		let identity = client(&server).node_identity().await?;

		assert_eq!(identity.enr, "enr:-MS4QHXY");
		assert_eq!(identity.peer_id.as_deref(), Some("16Uiu2HAmQ"));
		assert_eq!(identity.p2p_addresses.len(), 1);
		Ok(())
	}

	#[tokio::test]
	async fn node_identity_fails_on_malformed_body() {
		let mut server = Server::new_async().await;
		server
			.mock("GET", "/eth/v1/node/identity")
			.with_status(200)
			.with_body(json!({"data": {"peer_id": "16Uiu2HAmQ"}}).to_string())
			.create_async()
			.await;

		assert!(client(&server).node_identity().await.is_err());
	}
}
