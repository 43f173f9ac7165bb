// SPDX-License-Identifier: GPL-3.0

/// Trait for observing the progress of a network launch.
pub trait Status {
	/// Update the observer with the provided `status`.
	fn update(&self, status: &str);
}

impl Status for () {
	// no-op: status updates are ignored
	fn update(&self, _: &str) {}
}
