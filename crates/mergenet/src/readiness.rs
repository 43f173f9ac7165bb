// SPDX-License-Identifier: GPL-3.0

//! Polling-based readiness checks.
//!
//! A readiness check is polled until it reports [`Readiness::Ready`] or the retry budget of a
//! [`Backoff`] policy is exhausted. The wait is sequential: the check is never called
//! concurrently with itself, and the only suspension point is the sleep between attempts.

use crate::errors::Error;
use log::debug;
use std::{fmt::Display, future::Future, time::Duration};
use tokio::time::sleep;

/// A retry policy for readiness checks.
pub trait Backoff: Send + Sync {
	/// The number of retries after the initial attempt.
	fn max_retries(&self) -> u32;

	/// The delay before the given retry, numbered from 1.
	fn delay(&self, retry: u32) -> Duration;
}

/// Retries on a fixed interval.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FixedInterval {
	max_retries: u32,
	interval: Duration,
}

impl FixedInterval {
	pub const fn new(max_retries: u32, interval: Duration) -> Self {
		Self { max_retries, interval }
	}
}

impl Backoff for FixedInterval {
	fn max_retries(&self) -> u32 {
		self.max_retries
	}

	fn delay(&self, _retry: u32) -> Duration {
		self.interval
	}
}

/// Retries with a delay that doubles after each attempt, up to `max_delay`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ExponentialBackoff {
	max_retries: u32,
	initial: Duration,
	max_delay: Duration,
}

impl ExponentialBackoff {
	pub const fn new(max_retries: u32, initial: Duration, max_delay: Duration) -> Self {
		Self { max_retries, initial, max_delay }
	}
}

impl Backoff for ExponentialBackoff {
	fn max_retries(&self) -> u32 {
		self.max_retries
	}

	fn delay(&self, retry: u32) -> Duration {
		let factor = 2u32.saturating_pow(retry.saturating_sub(1));
		self.initial.saturating_mul(factor).min(self.max_delay)
	}
}

/// The outcome of a single successful check.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Readiness<T> {
	/// The target is ready.
	Ready(T),
	/// The target answered, but is not ready yet.
	Pending(String),
}

/// Polls `check` until it reports ready, sleeping between attempts as dictated by `backoff`.
///
/// The check is called at most `max_retries + 1` times. Both errors and [`Readiness::Pending`]
/// results count as failed attempts.
///
/// # Arguments
/// * `backoff` - The retry policy.
/// * `check` - The readiness check to poll.
pub async fn wait_until_ready<T, E, F, Fut>(
	backoff: &impl Backoff,
	mut check: F,
) -> Result<T, Error>
where
	E: Display,
	F: FnMut() -> Fut,
	Fut: Future<Output = Result<Readiness<T>, E>>,
{
	let max_retries = backoff.max_retries();
	let mut last_error = None;
	for attempt in 0..=max_retries {
		if attempt > 0 {
			sleep(backoff.delay(attempt)).await;
		}
		match check().await {
			Ok(Readiness::Ready(value)) => return Ok(value),
			Ok(Readiness::Pending(reason)) => last_error = Some(reason),
			Err(e) => last_error = Some(e.to_string()),
		}
		debug!(
			"Readiness attempt {}/{} failed: {}",
			attempt + 1,
			max_retries + 1,
			last_error.as_deref().unwrap_or_default()
		);
	}
	Err(Error::Unavailable { retries: max_retries, interval: backoff.delay(1), last_error })
}
