//! Operating system watch facilities the [`Notifier`](crate::Notifier) runs on top of.

use crate::event::{EventKind, RawEvent};

use std::{fmt::Debug, hash::Hash, io, path::Path};

#[cfg(any(target_os = "linux", target_os = "android"))]
mod linux;

#[cfg(any(target_os = "linux", target_os = "android"))]
pub use linux::InotifyBackend;

#[cfg(test)]
pub(crate) mod mock;

/// Descriptor type handed out by a backend.
pub type Descriptor<B> = <B as WatchBackend>::Descriptor;

/// A watch-descriptor based notification facility.
///
/// Implementations only talk to the OS: they never keep track of which path a descriptor
/// belongs to, that bookkeeping is done by the notifier.
pub trait WatchBackend: 'static {
	/// Opaque handle for one active watch, unique among the watches currently alive.
	type Descriptor: Clone + Eq + Hash + Debug + 'static;

	/// Starts watching `path` for the given kinds of events.
	fn add_watch(&mut self, path: &Path, kinds: EventKind) -> io::Result<Self::Descriptor>;

	/// Stops a watch; fails if the descriptor is no longer valid.
	fn remove_watch(&mut self, wd: Self::Descriptor) -> io::Result<()>;

	/// Blocks until at least one event is available, then returns every event read at once.
	fn read_events(&mut self) -> io::Result<Vec<RawEvent<Self::Descriptor>>>;

	/// Releases the underlying OS resources.
	fn close(self) -> io::Result<()>
	where
		Self: Sized,
	{
		Ok(())
	}
}
