//! Whole-tree coverage on top of the flat [`Notifier`].
//!
//! Every directory of a tree gets its own watch, all sharing the caller's handler through a
//! wrapping `TreeHandler`. The wrapper reads the structural events of the tree as they go by:
//! a directory created under a watched one is watched in turn, and a watched directory deleting
//! itself has its entry dropped, as the kernel already discarded the watch.

use crate::{
	backend::WatchBackend,
	config::{Config, SetupStrategy},
	error::FileIOError,
	event::{Event, EventKind},
	notifier::{EventHandler, Notifier},
	Error,
};

use std::{
	cell::RefCell,
	collections::VecDeque,
	fs, io,
	path::{Path, PathBuf},
	rc::Rc,
};

use tracing::{debug, trace};

/// Kinds the tree itself needs to see, whatever the caller asked for.
const STRUCTURAL_KINDS: EventKind = EventKind::CREATE.union(EventKind::DELETE_SELF);

/// A [`Notifier`] able to watch whole directory trees.
#[derive(Debug)]
pub struct RecursiveNotifier<B: WatchBackend> {
	notifier: Notifier<B>,
	config: Config,
}

#[cfg(any(target_os = "linux", target_os = "android"))]
impl RecursiveNotifier<crate::InotifyBackend> {
	pub fn init(config: Config) -> Result<Self, Error> {
		Notifier::<crate::InotifyBackend>::init()
			.map(|notifier| Self::with_notifier(notifier, config))
	}
}

impl<B: WatchBackend> RecursiveNotifier<B> {
	pub fn new(backend: B, config: Config) -> Self {
		Self::with_notifier(Notifier::new(backend), config)
	}

	pub const fn with_notifier(notifier: Notifier<B>, config: Config) -> Self {
		Self { notifier, config }
	}

	/// Watches `root` and, for as long as they exist, the directories below it.
	///
	/// `CREATE` and `DELETE_SELF` are always added to `kinds`. Every event matching `kinds` in the
	/// tree reaches `handler`, including the structural ones.
	pub fn rwatch(
		&mut self,
		root: impl AsRef<Path>,
		kinds: EventKind,
		handler: impl EventHandler<B>,
	) -> Result<(), Error> {
		rwatch(
			&mut self.notifier,
			self.config,
			root.as_ref(),
			kinds,
			&Rc::new(RefCell::new(handler)),
		)
	}

	pub fn watch(
		&mut self,
		path: impl AsRef<Path>,
		kinds: EventKind,
		handler: impl EventHandler<B>,
	) -> Result<B::Descriptor, Error> {
		self.notifier.watch(path, kinds, handler)
	}

	pub fn unwatch_by_path(&mut self, path: impl AsRef<Path>) -> Result<(), Error> {
		self.notifier.unwatch_by_path(path)
	}

	pub fn unwatch_by_wd(&mut self, wd: B::Descriptor) -> Result<(), Error> {
		self.notifier.unwatch_by_wd(wd)
	}

	pub fn run(&mut self) -> Result<(), Error> {
		self.notifier.run()
	}

	pub fn stop(&mut self) {
		self.notifier.stop();
	}

	pub fn process(&mut self) -> Result<(), Error> {
		self.notifier.process()
	}

	#[must_use]
	pub const fn config(&self) -> &Config {
		&self.config
	}

	#[must_use]
	pub const fn notifier(&self) -> &Notifier<B> {
		&self.notifier
	}

	pub fn notifier_mut(&mut self) -> &mut Notifier<B> {
		&mut self.notifier
	}

	#[must_use]
	pub fn into_notifier(self) -> Notifier<B> {
		self.notifier
	}
}

/// Wraps the caller's handler on every directory of a recursive watch.
struct TreeHandler<H> {
	kinds: EventKind,
	config: Config,
	handler: Rc<RefCell<H>>,
}

impl<B, H> EventHandler<B> for TreeHandler<H>
where
	B: WatchBackend,
	H: EventHandler<B>,
{
	fn handle_event(
		&mut self,
		notifier: &mut Notifier<B>,
		event: &Event<B::Descriptor>,
	) -> Result<(), Error> {
		if event.kinds.is_dir_creation() {
			if let Some(path) = event.child_path() {
				debug!(path = %path.display(), "Extending tree coverage to new directory;");

				match rwatch(notifier, self.config, &path, self.kinds, &self.handler) {
					Err(e) if e.is_vanished() => {
						trace!(path = %path.display(), "New directory vanished before being watched;");
					}
					res => res?,
				}
			}
		}

		if event.kinds.contains(EventKind::DELETE_SELF) {
			notifier.forget(&event.wd);
		}

		// Another directory of the same tree is already dispatching, from a nested `process()`
		let Ok(mut handler) = self.handler.try_borrow_mut() else {
			trace!(wd = ?event.wd, "Tree handler already running, dropping nested event;");
			return Ok(());
		};

		handler.handle_event(notifier, event)
	}
}

fn rwatch<B, H>(
	notifier: &mut Notifier<B>,
	config: Config,
	root: &Path,
	kinds: EventKind,
	handler: &Rc<RefCell<H>>,
) -> Result<(), Error>
where
	B: WatchBackend,
	H: EventHandler<B>,
{
	let kinds = if kinds.contains(EventKind::ALL_EVENTS) {
		kinds
	} else {
		kinds | STRUCTURAL_KINDS
	};

	let mut pending = match config.strategy {
		SetupStrategy::Lazy => VecDeque::from([root.to_path_buf()]),
		SetupStrategy::Eager => {
			let dirs = collect_dirs(root)?;
			if dirs.len() > config.max_user_watches {
				return Err(Error::QuotaExceeded {
					root: root.into(),
					found: dirs.len(),
					max: config.max_user_watches,
				});
			}
			dirs
		}
	};

	while let Some(path) = pending.pop_front() {
		let tree_handler = TreeHandler {
			kinds,
			config,
			handler: Rc::clone(handler),
		};

		match notifier.watch(&path, kinds, tree_handler) {
			Ok(_) => {}
			// Subdirectories may go away between the walk and their watch
			Err(e) if e.is_vanished() && path != root => {
				trace!(path = %path.display(), "Directory vanished during tree setup;");
			}
			Err(e) => return Err(e),
		}
	}

	Ok(())
}

/// Breadth-first list of `root` and every directory below it, without following symlinks.
fn collect_dirs(root: &Path) -> Result<VecDeque<PathBuf>, Error> {
	let mut dirs = VecDeque::from([root.to_path_buf()]);
	let mut next = 0;

	while let Some(dir) = dirs.get(next).cloned() {
		next += 1;

		let entries = match fs::read_dir(&dir) {
			Ok(entries) => entries,
			Err(e) if e.kind() == io::ErrorKind::NotFound && dir != root => {
				trace!(path = %dir.display(), "Directory vanished during tree walk;");
				continue;
			}
			Err(e) => return Err(FileIOError::new(&dir, "read directory", e).into()),
		};

		for entry in entries {
			let entry = entry.map_err(|e| FileIOError::new(&dir, "read directory entry", e))?;
			let is_dir = entry
				.file_type()
				.map_err(|e| FileIOError::new(entry.path(), "read file type", e))?
				.is_dir();

			if is_dir {
				dirs.push_back(entry.path());
			}
		}
	}

	debug!(root = %root.display(), count = dirs.len(), "Collected directory tree;");

	Ok(dirs)
}
