// SPDX-License-Identifier: GPL-3.0

use crate::errors::Error;
use async_trait::async_trait;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use url::Url;

const ADMIN_NODE_INFO: &str = "admin_nodeInfo";
const ETH_BLOCK_NUMBER: &str = "eth_blockNumber";
const WEB3_CLIENT_VERSION: &str = "web3_clientVersion";

/// The node information reported by an execution client.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct NodeInfo {
	pub enode: String,
	/// Not every client reports a record (e.g. Nethermind).
	#[serde(default)]
	pub enr: Option<String>,
	#[serde(default)]
	pub id: Option<String>,
	#[serde(default)]
	pub name: Option<String>,
}

/// Queries against a running execution client.
#[async_trait]
pub trait ExecutionApi: Send + Sync {
	/// Succeeds once the client answers requests.
	async fn health(&self) -> Result<(), Error>;

	/// The client's self-reported node information.
	async fn node_info(&self) -> Result<NodeInfo, Error>;

	/// The number of the most recent block.
	async fn block_number(&self) -> Result<u64, Error>;
}

#[derive(Deserialize)]
struct RpcResponse<T> {
	result: Option<T>,
	error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
	code: i64,
	message: String,
}

/// A JSON-RPC client for an execution client's HTTP endpoint.
#[derive(Clone, Debug)]
pub struct ElRpcClient {
	http: reqwest::Client,
	url: Url,
}

impl ElRpcClient {
	/// Creates a new client.
	///
	/// # Arguments
	/// * `http` - The HTTP client used to send requests.
	/// * `url` - The JSON-RPC endpoint of the execution client.
	pub fn new(http: reqwest::Client, url: Url) -> Self {
		Self { http, url }
	}

	async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, Error> {
		let body = json!({
			"jsonrpc": "2.0",
			"method": method,
			"params": params,
			"id": 1
		});
		let response: RpcResponse<T> = self
			.http
			.post(self.url.clone())
			.json(&body)
			.send()
			.await?
			.error_for_status()?
			.json()
			.await?;
		match (response.result, response.error) {
			(_, Some(RpcError { code, message })) => Err(Error::Rpc { code, message }),
			(Some(result), None) => Ok(result),
			(None, None) => Err(Error::InvalidResponse(format!("`{method}` returned no result"))),
		}
	}
}

#[async_trait]
impl ExecutionApi for ElRpcClient {
	async fn health(&self) -> Result<(), Error> {
		self.call::<String>(WEB3_CLIENT_VERSION, json!([])).await.map(|_| ())
	}

	async fn node_info(&self) -> Result<NodeInfo, Error> {
		self.call(ADMIN_NODE_INFO, json!([])).await
	}

	async fn block_number(&self) -> Result<u64, Error> {
		let number: String = self.call(ETH_BLOCK_NUMBER, json!([])).await?;
		parse_quantity(&number)
	}
}

// Parses a hex-encoded JSON-RPC quantity, e.g. `0x1a`.
fn parse_quantity(quantity: &str) -> Result<u64, Error> {
	quantity
		.strip_prefix("0x")
		.and_then(|digits| u64::from_str_radix(digits, 16).ok())
		.ok_or_else(|| Error::InvalidResponse(format!("invalid quantity `{quantity}`")))
}
