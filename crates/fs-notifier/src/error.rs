use std::{io, path::Path};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
	#[error("failed to initialize the watch backend: {0}")]
	Init(#[source] io::Error),
	#[error("failed to add watch <path='{}'>: {source}", .path.display())]
	AddWatch {
		path: Box<Path>,
		#[source]
		source: io::Error,
	},
	#[error("failed to remove watch: {0}")]
	RemoveWatch(#[source] io::Error),
	#[error("failed to read events: {0}")]
	ReadEvents(#[source] io::Error),
	#[error("failed to close the watch backend: {0}")]
	Close(#[source] io::Error),

	#[error("no watch registered <path='{}'>", .0.display())]
	NotFound(Box<Path>),
	#[error(
		"directory tree has more than {max} directories to watch <root='{}', found={found}>",
		.root.display()
	)]
	QuotaExceeded {
		root: Box<Path>,
		found: usize,
		max: usize,
	},
	#[error("unknown event flag: '{0}'")]
	UnknownFlag(String),
	#[error("invalid max watches value: '{0}'")]
	InvalidQuota(String),

	#[error("event handler failed: {0}")]
	Handler(#[source] Box<dyn std::error::Error + Send + Sync>),

	#[error(transparent)]
	FileIO(#[from] FileIOError),
}

impl Error {
	/// Wraps any failure raised by user code inside an event handler.
	pub fn handler(e: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
		Self::Handler(e.into())
	}

	/// Whether a watch or a directory walk failed because the path no longer exists, which
	/// happens when a directory is removed between being noticed and being watched.
	#[must_use]
	pub fn is_vanished(&self) -> bool {
		matches!(
			self,
			Self::AddWatch { source, .. } | Self::FileIO(FileIOError { source, .. })
				if source.kind() == io::ErrorKind::NotFound
		)
	}
}

/// Filesystem access made outside of the watch backend, like walking a tree or reading the
/// kernel's watch quota.
#[derive(Debug, Error)]
#[error("failed to {action} <path='{}'>: {source}", .path.display())]
pub struct FileIOError {
	pub path: Box<Path>,
	/// What was being done to `path`, in the infinitive.
	pub action: &'static str,
	#[source]
	pub source: io::Error,
}

impl FileIOError {
	pub fn new(path: impl AsRef<Path>, action: &'static str, source: io::Error) -> Self {
		Self {
			path: path.as_ref().into(),
			action,
			source,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn vanished_only_for_missing_paths() {
		let missing = Error::AddWatch {
			path: Path::new("/gone").into(),
			source: io::Error::from(io::ErrorKind::NotFound),
		};
		assert!(missing.is_vanished());

		let denied = Error::AddWatch {
			path: Path::new("/root").into(),
			source: io::Error::from(io::ErrorKind::PermissionDenied),
		};
		assert!(!denied.is_vanished());

		let walked = Error::from(FileIOError::new(
			"/gone/sub",
			"read directory",
			io::Error::from(io::ErrorKind::NotFound),
		));
		assert!(walked.is_vanished());

		assert!(!Error::RemoveWatch(io::Error::from(io::ErrorKind::NotFound)).is_vanished());
	}

	#[test]
	fn file_io_error_names_action_and_path() {
		let e = FileIOError::new(
			"/tmp/tree",
			"read directory",
			io::Error::from(io::ErrorKind::PermissionDenied),
		);
		assert!(e
			.to_string()
			.starts_with("failed to read directory <path='/tmp/tree'>: "));
	}
}
