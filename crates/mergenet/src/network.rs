// SPDX-License-Identifier: GPL-3.0

//! Sequential bring-up of a merge network.
//!
//! Execution clients launch first, then consensus clients. The first client of each layer is
//! its bootnode: every later client of that layer is launched with the bootnode's descriptor, and
//! is only started once the bootnode is fully ready and its identity known.

use crate::{
	cl::{ClLaunchRequest, ConsensusLauncher},
	descriptor::{EndpointDescriptor, NodeRole},
	el::{ElLaunchRequest, ExecutionLauncher},
	errors::Error,
	provision::ServiceId,
	status::Status,
};
use log::info;
use serde::Deserialize;

/// How consensus clients are assigned to the execution clients they attach to.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum ElAssignment {
	/// Consensus client `j` attaches to execution client `j % N`.
	#[default]
	RoundRobin,
	/// Every consensus client attaches to the execution client with the given index.
	Fixed(usize),
}

impl ElAssignment {
	fn select(&self, consensus_index: usize, execution_clients: usize) -> usize {
		match *self {
			ElAssignment::RoundRobin => consensus_index % execution_clients,
			ElAssignment::Fixed(index) => index,
		}
	}
}

/// The participants of a network, in launch order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NetworkLaunchRequest {
	pub execution: Vec<ElLaunchRequest>,
	pub consensus: Vec<ClLaunchRequest>,
	pub el_assignment: ElAssignment,
}

/// The descriptors of a launched network, in launch order.
#[derive(Clone, Debug)]
pub struct NetworkDescriptors {
	pub execution: Vec<EndpointDescriptor>,
	pub consensus: Vec<EndpointDescriptor>,
}

/// The service identifier of the execution client at the given index.
pub fn el_service_id(index: usize) -> ServiceId {
	format!("el-client-{index}").into()
}

/// The service identifier of the consensus client at the given index.
pub fn cl_service_id(index: usize) -> ServiceId {
	format!("cl-client-{index}").into()
}

/// Launches every participant of a network, one at a time.
///
/// Either every participant is launched and all descriptors are returned, or the first failure
/// is returned. Participants already started when a launch fails are left running.
///
/// # Arguments
/// * `execution` - Launches the execution clients.
/// * `consensus` - Launches the consensus clients.
/// * `request` - The participants to launch.
/// * `status` - Observer for reporting progress.
pub async fn launch_network(
	execution: &impl ExecutionLauncher,
	consensus: &impl ConsensusLauncher,
	request: &NetworkLaunchRequest,
	status: &impl Status,
) -> Result<NetworkDescriptors, Error> {
	validate(request)?;

	let mut el_descriptors: Vec<EndpointDescriptor> = Vec::with_capacity(request.execution.len());
	for (i, el_request) in request.execution.iter().enumerate() {
		let service_id = el_service_id(i);
		status.update(&format!(
			"Launching {} execution client `{service_id}`...",
			el_request.client
		));
		let role = el_descriptors.first().map_or(NodeRole::Bootnode, NodeRole::Follower);
		let descriptor = execution.launch(&service_id, el_request, role).await?;
		el_descriptors.push(descriptor);
	}

	let mut cl_descriptors: Vec<EndpointDescriptor> = Vec::with_capacity(request.consensus.len());
	for (j, cl_request) in request.consensus.iter().enumerate() {
		let service_id = cl_service_id(j);
		let el = &el_descriptors[request.el_assignment.select(j, el_descriptors.len())];
		status.update(&format!(
			"Launching {} consensus client `{service_id}` attached to `{}`...",
			cl_request.client,
			el.service_id()
		));
		let role = cl_descriptors.first().map_or(NodeRole::Bootnode, NodeRole::Follower);
		let descriptor = consensus.launch(&service_id, cl_request, role, el).await?;
		cl_descriptors.push(descriptor);
	}

	info!(
		"Launched {} execution and {} consensus clients",
		el_descriptors.len(),
		cl_descriptors.len()
	);
	Ok(NetworkDescriptors { execution: el_descriptors, consensus: cl_descriptors })
}

// Rejects requests which cannot be satisfied, before anything is launched.
fn validate(request: &NetworkLaunchRequest) -> Result<(), Error> {
	let execution_clients = request.execution.len();
	if request.consensus.is_empty() {
		return Ok(());
	}
	if execution_clients == 0 {
		return Err(Error::ConfigurationMismatch(
			"consensus clients require at least one execution client".into(),
		));
	}
	if let ElAssignment::Fixed(index) = request.el_assignment
		&& index >= execution_clients
	{
		return Err(Error::ConfigurationMismatch(format!(
			"consensus clients are assigned to execution client {index}, \
			 but only {execution_clients} are configured"
		)));
	}
	Ok(())
}
