// SPDX-License-Identifier: GPL-3.0

use crate::{
	descriptor::EndpointDescriptor,
	errors::Error,
	provision::{ContainerConfig, Provisioner, RunningService, ServiceEnvironment, ServiceId},
};
use log::info;

/// The image of the external miner.
pub const EXTERNAL_MINER_IMAGE: &str = "marioevz/external_miner:latest";
const EXTERNAL_MINER_SERVICE_ID: &str = "external-miner";

/// Starts a miner which drives every execution client up to the terminal total difficulty.
///
/// # Arguments
/// * `provisioner` - Starts the miner.
/// * `image` - The image of the miner.
/// * `execution` - The execution clients to mine on.
/// * `terminal_total_difficulty` - The difficulty at which the merge happens.
pub async fn launch_external_miner(
	provisioner: &dyn Provisioner,
	image: &str,
	execution: &[EndpointDescriptor],
	terminal_total_difficulty: u64,
) -> Result<RunningService, Error> {
	if execution.is_empty() {
		return Err(Error::ConfigurationMismatch(
			"the external miner requires at least one execution client".into(),
		));
	}
	let mut cmd = vec![
		"--delay".to_string(),
		"TTD,600".to_string(),
		"--ttd".to_string(),
		terminal_total_difficulty.to_string(),
	];
	for el in execution {
		cmd.push("--rpc".to_string());
		cmd.push(el.api_url());
	}
	let config = ContainerConfig { image: image.to_string(), cmd, ..Default::default() };
	let supplier =
		|_: &ServiceEnvironment| -> Result<ContainerConfig, Error> { Ok(config.clone()) };

	let service_id = ServiceId::from(EXTERNAL_MINER_SERVICE_ID);
	info!("Launching external miner against {} execution clients", execution.len());
	provisioner.start(&service_id, &supplier).await
}
