// SPDX-License-Identifier: GPL-3.0

use super::ExecutionApi;
use crate::{
	errors::Error,
	readiness::{Backoff, Readiness, wait_until_ready},
};
use std::{fmt, sync::Arc};

/// Waits for an execution client's chain to make progress.
#[derive(Clone)]
pub struct MiningWaiter {
	client: Arc<dyn ExecutionApi>,
}

impl MiningWaiter {
	pub fn new(client: Arc<dyn ExecutionApi>) -> Self {
		Self { client }
	}

	/// Waits until the client's chain reaches the given height, returning the height reached.
	///
	/// # Arguments
	/// * `height` - The block number to wait for.
	/// * `backoff` - How often, and for how long, to poll the client.
	pub async fn wait_for_block(&self, height: u64, backoff: &impl Backoff) -> Result<u64, Error> {
		let client = self.client.as_ref();
		wait_until_ready(backoff, || async move {
			let number = client.block_number().await?;
			Ok::<_, Error>(if number >= height {
				Readiness::Ready(number)
			} else {
				Readiness::Pending(format!("at block {number}, waiting for block {height}"))
			})
		})
		.await
	}
}

impl fmt::Debug for MiningWaiter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MiningWaiter").finish_non_exhaustive()
	}
}
