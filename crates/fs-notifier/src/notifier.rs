use crate::{
	backend::WatchBackend,
	event::{Event, EventKind},
	Error,
};

use std::{
	fmt,
	path::{Path, PathBuf},
};

use indexmap::IndexMap;
use tracing::{debug, trace, warn};

/// Receives the events of a watch.
///
/// The notifier is handed back in so a handler can add or remove watches, or stop the loop,
/// while it is being dispatched.
pub trait EventHandler<B: WatchBackend>: 'static {
	fn handle_event(
		&mut self,
		notifier: &mut Notifier<B>,
		event: &Event<B::Descriptor>,
	) -> Result<(), Error>;
}

impl<B, F> EventHandler<B> for F
where
	B: WatchBackend,
	F: FnMut(&mut Notifier<B>, &Event<B::Descriptor>) -> Result<(), Error> + 'static,
{
	fn handle_event(
		&mut self,
		notifier: &mut Notifier<B>,
		event: &Event<B::Descriptor>,
	) -> Result<(), Error> {
		(self)(notifier, event)
	}
}

pub struct WatchEntry<B: WatchBackend> {
	path: PathBuf,
	/// Taken out while the handler runs, so it can borrow the notifier mutably.
	handler: Option<Box<dyn EventHandler<B>>>,
	/// Dispatch cycle this entry was registered in.
	cycle: u64,
}

impl<B: WatchBackend> WatchEntry<B> {
	#[must_use]
	pub fn path(&self) -> &Path {
		&self.path
	}
}

impl<B: WatchBackend> fmt::Debug for WatchEntry<B> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("WatchEntry")
			.field("path", &self.path)
			.field("dispatching", &self.handler.is_none())
			.field("cycle", &self.cycle)
			.finish()
	}
}

/// Flat watcher: one handler per watched path, events dispatched from a blocking loop.
#[derive(Debug)]
pub struct Notifier<B: WatchBackend> {
	backend: B,
	watches: IndexMap<B::Descriptor, WatchEntry<B>>,
	cycle: u64,
	stop: bool,
}

#[cfg(any(target_os = "linux", target_os = "android"))]
impl Notifier<crate::InotifyBackend> {
	/// Creates a notifier on a fresh inotify instance.
	pub fn init() -> Result<Self, Error> {
		crate::InotifyBackend::new()
			.map(Self::new)
			.map_err(Error::Init)
	}
}

impl<B: WatchBackend> Notifier<B> {
	pub fn new(backend: B) -> Self {
		Self {
			backend,
			watches: IndexMap::new(),
			cycle: 0,
			stop: false,
		}
	}

	/// Starts watching `path`, sending every matching event to `handler`.
	///
	/// Nothing is registered if the backend refuses the watch.
	pub fn watch(
		&mut self,
		path: impl AsRef<Path>,
		kinds: EventKind,
		handler: impl EventHandler<B>,
	) -> Result<B::Descriptor, Error> {
		let path = path.as_ref();

		let wd = self
			.backend
			.add_watch(path, kinds)
			.map_err(|source| Error::AddWatch {
				path: path.into(),
				source,
			})?;

		let replaced = self.watches.insert(
			wd.clone(),
			WatchEntry {
				path: path.to_path_buf(),
				handler: Some(Box::new(handler)),
				cycle: self.cycle,
			},
		);

		if let Some(old) = replaced {
			debug!(?wd, old_path = %old.path.display(), "Watch descriptor reused, replacing entry;");
		}

		debug!(?wd, path = %path.display(), %kinds, "Added watch;");

		Ok(wd)
	}

	/// Removes the earliest registered watch on `path`.
	pub fn unwatch_by_path(&mut self, path: impl AsRef<Path>) -> Result<(), Error> {
		let path = path.as_ref();

		let wd = self
			.watches
			.iter()
			.find_map(|(wd, entry)| (entry.path == path).then(|| wd.clone()))
			.ok_or_else(|| Error::NotFound(path.into()))?;

		self.unwatch_by_wd(wd)
	}

	/// Removes the watch for `wd` from the table and from the backend.
	///
	/// The entry is dropped even when the backend refuses, as a refusal means the descriptor is
	/// already dead.
	pub fn unwatch_by_wd(&mut self, wd: B::Descriptor) -> Result<(), Error> {
		if let Some(entry) = self.watches.shift_remove(&wd) {
			debug!(?wd, path = %entry.path.display(), "Removing watch;");
		}

		self.backend.remove_watch(wd).map_err(Error::RemoveWatch)
	}

	/// Drops the table entry of a watch the OS already invalidated, without telling the backend.
	pub(crate) fn forget(&mut self, wd: &B::Descriptor) -> Option<PathBuf> {
		self.watches.shift_remove(wd).map(|entry| {
			debug!(?wd, path = %entry.path.display(), "Forgot watch invalidated by the OS;");
			entry.path
		})
	}

	/// Dispatches events until [`stop`](Self::stop) is called.
	///
	/// A stop request is only seen between cycles, so the batch being dispatched always finishes.
	pub fn run(&mut self) -> Result<(), Error> {
		self.stop = false;

		while !self.stop {
			self.process()?;
		}

		Ok(())
	}

	pub fn stop(&mut self) {
		self.stop = true;
	}

	/// Blocks for one batch of events and dispatches each of them to the handler of its watch.
	///
	/// Events for watches that are gone are dropped. Watches added while the batch is being
	/// dispatched only start receiving events from the next call.
	pub fn process(&mut self) -> Result<(), Error> {
		let batch = self.backend.read_events().map_err(Error::ReadEvents)?;

		self.cycle += 1;
		let cycle = self.cycle;

		for raw in batch {
			if raw.kinds.contains(EventKind::Q_OVERFLOW) {
				warn!("Event queue overflowed, some events were lost;");
			}

			let Some(entry) = self.watches.get_mut(&raw.wd) else {
				trace!(wd = ?raw.wd, kinds = %raw.kinds, "Dropping event for unknown watch;");
				continue;
			};

			if entry.cycle >= cycle {
				trace!(wd = ?raw.wd, "Dropping event for a watch added during this cycle;");
				continue;
			}

			let Some(mut handler) = entry.handler.take() else {
				trace!(wd = ?raw.wd, "Handler already running, dropping nested event;");
				continue;
			};

			let event = Event::from_raw(raw, entry.path.clone());

			let res = handler.handle_event(self, &event);

			// The handler may have removed its own entry, in which case it goes away with it
			if let Some(entry) = self.watches.get_mut(&event.wd) {
				if entry.handler.is_none() {
					entry.handler = Some(handler);
				}
			}

			res?;
		}

		Ok(())
	}

	/// Releases the backend, reporting any error the OS gives on close.
	pub fn close(self) -> Result<(), Error> {
		self.backend.close().map_err(Error::Close)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.watches.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.watches.is_empty()
	}

	#[must_use]
	pub fn contains(&self, wd: &B::Descriptor) -> bool {
		self.watches.contains_key(wd)
	}

	#[must_use]
	pub fn path_of(&self, wd: &B::Descriptor) -> Option<&Path> {
		self.watches.get(wd).map(WatchEntry::path)
	}

	/// Watched paths, in registration order.
	pub fn watched_paths(&self) -> impl Iterator<Item = &Path> {
		self.watches.values().map(WatchEntry::path)
	}
}
