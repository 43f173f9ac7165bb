// SPDX-License-Identifier: GPL-3.0

#![doc = include_str!("../README.md")]

/// Consensus clients: beacon node and validator launches.
pub mod cl;
mod clients;
mod descriptor;
/// Execution clients.
pub mod el;
mod errors;
mod genesis;
mod log_level;
mod miner;
mod network;
/// Provides functionality for starting client processes.
pub mod provision;
/// Polling-based readiness checks and their retry policies.
pub mod readiness;
mod status;
#[cfg(test)]
mod testing;

pub use cl::{ClClientType, ClLaunchRequest, ClLauncher, ConsensusLauncher};
pub use clients::{ClientFactory, Collaborators, HttpClients};
pub use descriptor::{
	DiscoveryRecord, EndpointDescriptor, NodeRole, PortSpec, Ports, TransportProtocol,
};
pub use el::{ElClientType, ElLaunchRequest, ElLauncher, ExecutionLauncher, MiningWaiter};
pub use errors::{Error, Stage};
pub use genesis::{GenesisMaterial, ValidatorKeystore};
pub use log_level::{LogLevels, ParticipantLogLevel};
pub use miner::{EXTERNAL_MINER_IMAGE, launch_external_miner};
pub use network::{
	ElAssignment, NetworkDescriptors, NetworkLaunchRequest, cl_service_id, el_service_id,
	launch_network,
};
pub use status::Status;
