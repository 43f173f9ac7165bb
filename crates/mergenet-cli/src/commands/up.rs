// SPDX-License-Identifier: GPL-3.0

use crate::{
	config::NetworkConfig,
	style::{bar, format_url, style},
};
use clap::Args;
use cliclack::{ProgressBar, intro, log, outro, outro_cancel, spinner};
use console::Term;
use mergenet::{
	ClLauncher, Collaborators, DiscoveryRecord, EXTERNAL_MINER_IMAGE, ElLauncher,
	EndpointDescriptor, HttpClients, NetworkDescriptors, Status, launch_external_miner,
	launch_network,
	provision::docker::{DockerProvisioner, DockerStatus},
	readiness::ExponentialBackoff,
};
use std::{path::PathBuf, sync::Arc, time::Duration};

const MINING_BACKOFF: ExponentialBackoff =
	ExponentialBackoff::new(20, Duration::from_secs(1), Duration::from_secs(30));

#[derive(Args, Clone)]
pub(crate) struct UpCommand {
	/// The network description file to be used.
	#[arg(short, long)]
	file: PathBuf,
	/// Whether each launch step should be reported on its own line.
	#[arg(short, long, action)]
	verbose: bool,
}

impl UpCommand {
	/// Executes the command.
	pub(crate) async fn execute(self) -> anyhow::Result<()> {
		intro(format!("{}: Launch a merge network", style(" mergenet ").black().on_blue()))?;

		match DockerStatus::detect()? {
			DockerStatus::NotInstalled => {
				outro_cancel(
					"🚫 Docker is required to launch a network, but could not be found.",
				)?;
				return Ok(());
			},
			DockerStatus::Installed => {
				outro_cancel(
					"🚫 Docker is installed but not running. Please start Docker and retry.",
				)?;
				return Ok(());
			},
			DockerStatus::Running => {},
		}

		let config = match NetworkConfig::load(&self.file) {
			Ok(config) => config,
			Err(e) => {
				outro_cancel(format!("🚫 A configuration error occurred: {e:#}"))?;
				return Ok(());
			},
		};
		let docker = &config.docker;
		let provisioner = DockerProvisioner::new(&docker.network, docker.subnet, docker.prefix_len);
		provisioner.ensure_network()?;
		log::info(format!(
			"Using Docker network `{}` ({})",
			config.docker.network,
			provisioner.subnet()
		))?;

		let progress = spinner();
		progress.start("🚀 Launching merge network...");
		match self.launch(&config, Arc::new(provisioner), &progress).await {
			Ok(descriptors) => {
				let summary = summary(&descriptors);
				progress.stop(format!("🚀 Network launched successfully{summary}"));
				outro("Done. Containers keep running until removed with `docker rm -f`.")?;
			},
			Err(e) => {
				progress.error("Launch failed");
				outro_cancel(format!("🚫 Could not launch network: {e}"))?;
			},
		}
		Ok(())
	}

	async fn launch(
		&self,
		config: &NetworkConfig,
		provisioner: Arc<DockerProvisioner>,
		progress: &ProgressBar,
	) -> Result<NetworkDescriptors, mergenet::Error> {
		let collaborators = Collaborators::new(provisioner.clone(), Arc::new(HttpClients::new()?));
		let genesis = Arc::new(config.genesis.clone());
		let request = config.launch_request();
		let el = ElLauncher::new(collaborators.clone(), genesis.clone());
		let cl = ClLauncher::new(collaborators, genesis, request.consensus.len());

		let descriptors = if self.verbose {
			launch_network(&el, &cl, &request, &VerboseReporter).await?
		} else {
			launch_network(&el, &cl, &request, &ProgressReporter(progress)).await?
		};

		if let Some(miner) = &config.external_miner {
			progress.set_message("⛏️ Launching external miner...");
			let image = miner.image.as_deref().unwrap_or(EXTERNAL_MINER_IMAGE);
			launch_external_miner(
				provisioner.as_ref(),
				image,
				&descriptors.execution,
				config.genesis.terminal_total_difficulty,
			)
			.await?;
			if let Some(height) = miner.wait_for_block
				&& let Some(waiter) =
					descriptors.execution.first().and_then(|el| el.mining_waiter())
			{
				progress.set_message(format!("⛏️ Waiting for block {height}..."));
				waiter.wait_for_block(height, &MINING_BACKOFF).await?;
			}
		}
		Ok(descriptors)
	}
}

// Renders every descriptor below the progress bar.
fn summary(descriptors: &NetworkDescriptors) -> String {
	let bar = bar();
	let mut output = String::new();
	let mut layer = |title: &str, descriptors: &[EndpointDescriptor]| {
		if descriptors.is_empty() {
			return;
		}
		output.push_str(&format!("\n{bar}  {title}"));
		for descriptor in descriptors {
			output.push_str(&format!(
				"\n{bar}       {}: {}",
				descriptor.service_id(),
				format_url(&descriptor.api_url())
			));
			match descriptor.discovery_record() {
				Some(DiscoveryRecord::Enode { enode, enr }) => {
					output.push_str(&format!("\n{bar}         enode: {enode}"));
					if let Some(enr) = enr {
						output.push_str(&format!("\n{bar}         enr: {enr}"));
					}
				},
				Some(DiscoveryRecord::Enr(enr)) => {
					output.push_str(&format!("\n{bar}         enr: {enr}"))
				},
				None => {},
			}
		}
	};
	layer("⛓️ execution", &descriptors.execution);
	layer("🛰️ consensus", &descriptors.consensus);
	output
}

/// Reports any observed status updates to a progress bar.
#[derive(Copy, Clone)]
struct ProgressReporter<'a>(&'a ProgressBar);

impl Status for ProgressReporter<'_> {
	fn update(&self, status: &str) {
		self.0.set_message(status)
	}
}

/// Reports any observed status updates as indented messages.
#[derive(Copy, Clone)]
struct VerboseReporter;

impl Status for VerboseReporter {
	fn update(&self, status: &str) {
		let message = format!("{}  {}", bar(), style(status).dim());
		if let Err(e) = Term::stderr().write_line(&message) {
			println!("An error occurred logging the status message of '{status}': {e}")
		}
	}
}
