use crate::{error::FileIOError, Error};

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

/// Watches a user may hold when the system limit can't be read, the historical kernel default.
pub const DEFAULT_MAX_USER_WATCHES: usize = 8192;

const MAX_USER_WATCHES_PATH: &str = "/proc/sys/fs/inotify/max_user_watches";

/// How [`rwatch`](crate::RecursiveNotifier::rwatch) sets up coverage of a tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupStrategy {
	/// Watch the root only, new subdirectories are picked up from creation events.
	#[default]
	Lazy,
	/// Walk the whole tree first and watch every directory in it, refusing trees that don't fit
	/// in the watch quota.
	Eager,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
	#[serde(default = "default_max_user_watches")]
	pub max_user_watches: usize,
	#[serde(default)]
	pub strategy: SetupStrategy,
}

const fn default_max_user_watches() -> usize {
	DEFAULT_MAX_USER_WATCHES
}

impl Default for Config {
	fn default() -> Self {
		Self {
			max_user_watches: DEFAULT_MAX_USER_WATCHES,
			strategy: SetupStrategy::default(),
		}
	}
}

impl Config {
	/// Default config with the quota the kernel currently enforces for this user.
	pub fn from_system() -> Result<Self, Error> {
		Ok(Self::default().with_max_user_watches(read_max_user_watches(Path::new(
			MAX_USER_WATCHES_PATH,
		))?))
	}

	#[must_use]
	pub const fn with_max_user_watches(mut self, max_user_watches: usize) -> Self {
		self.max_user_watches = max_user_watches;
		self
	}

	#[must_use]
	pub const fn with_strategy(mut self, strategy: SetupStrategy) -> Self {
		self.strategy = strategy;
		self
	}
}

fn read_max_user_watches(path: &Path) -> Result<usize, Error> {
	let contents = fs::read_to_string(path)
		.map_err(|e| FileIOError::new(path, "read max user watches", e))?;

	let value = contents.trim();
	value
		.parse()
		.map_err(|_| Error::InvalidQuota(value.to_string()))
}
