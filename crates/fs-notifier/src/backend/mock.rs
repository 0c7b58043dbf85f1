//! Scripted in-memory backend, so dispatch and recursion can be tested without touching the disk.

use crate::event::{EventKind, RawEvent};

use super::WatchBackend;

use std::{
	cell::RefCell,
	collections::{HashMap, HashSet, VecDeque},
	io,
	path::{Path, PathBuf},
	rc::Rc,
};

#[derive(Debug, Default)]
struct MockState {
	dirs: HashSet<PathBuf>,
	denied: HashSet<PathBuf>,
	next_wd: u32,
	live: HashMap<u32, PathBuf>,
	added: Vec<(PathBuf, EventKind)>,
	removed: Vec<u32>,
	batches: VecDeque<Vec<RawEvent<u32>>>,
}

/// Cloning gives another handle to the same state, so tests can keep one while the notifier owns
/// the other.
#[derive(Debug, Default, Clone)]
pub(crate) struct MockBackend {
	state: Rc<RefCell<MockState>>,
}

impl MockBackend {
	pub fn with_dirs<I, P>(dirs: I) -> Self
	where
		I: IntoIterator<Item = P>,
		P: Into<PathBuf>,
	{
		let backend = Self::default();
		backend
			.state
			.borrow_mut()
			.dirs
			.extend(dirs.into_iter().map(Into::into));
		backend
	}

	pub fn mkdir(&self, path: impl Into<PathBuf>) {
		self.state.borrow_mut().dirs.insert(path.into());
	}

	/// Makes watches on `path` fail with a permission error.
	pub fn deny(&self, path: impl Into<PathBuf>) {
		self.state.borrow_mut().denied.insert(path.into());
	}

	/// Removes the directory and, like the kernel does, silently drops the watch on it.
	pub fn rmdir(&self, path: impl AsRef<Path>) {
		let mut state = self.state.borrow_mut();
		state.dirs.remove(path.as_ref());
		state.live.retain(|_, watched| watched.as_path() != path.as_ref());
	}

	pub fn push_batch(&self, events: impl IntoIterator<Item = RawEvent<u32>>) {
		self.state
			.borrow_mut()
			.batches
			.push_back(events.into_iter().collect());
	}

	/// Paths handed to `add_watch`, successful or not, in call order.
	pub fn add_calls(&self) -> Vec<PathBuf> {
		self.state
			.borrow()
			.added
			.iter()
			.map(|(path, _)| path.clone())
			.collect()
	}

	pub fn kinds_requested_for(&self, path: impl AsRef<Path>) -> Option<EventKind> {
		self.state
			.borrow()
			.added
			.iter()
			.rev()
			.find(|(added, _)| added == path.as_ref())
			.map(|(_, kinds)| *kinds)
	}

	pub fn remove_calls(&self) -> Vec<u32> {
		self.state.borrow().removed.clone()
	}

	pub fn live_count(&self) -> usize {
		self.state.borrow().live.len()
	}

	pub fn is_live(&self, wd: u32) -> bool {
		self.state.borrow().live.contains_key(&wd)
	}
}

impl WatchBackend for MockBackend {
	type Descriptor = u32;

	fn add_watch(&mut self, path: &Path, kinds: EventKind) -> io::Result<u32> {
		let mut state = self.state.borrow_mut();
		state.added.push((path.to_path_buf(), kinds));

		if state.denied.contains(path) {
			return Err(io::Error::from(io::ErrorKind::PermissionDenied));
		}

		if !state.dirs.contains(path) {
			return Err(io::Error::from(io::ErrorKind::NotFound));
		}

		state.next_wd += 1;
		let wd = state.next_wd;
		state.live.insert(wd, path.to_path_buf());

		Ok(wd)
	}

	fn remove_watch(&mut self, wd: u32) -> io::Result<()> {
		let mut state = self.state.borrow_mut();
		state.removed.push(wd);

		state
			.live
			.remove(&wd)
			.map(|_| ())
			.ok_or_else(|| io::Error::from(io::ErrorKind::InvalidInput))
	}

	fn read_events(&mut self) -> io::Result<Vec<RawEvent<u32>>> {
		self.state.borrow_mut().batches.pop_front().ok_or_else(|| {
			io::Error::new(io::ErrorKind::UnexpectedEof, "no more scripted events")
		})
	}
}

pub(crate) fn raw(wd: u32, kinds: EventKind, name: Option<&str>) -> RawEvent<u32> {
	RawEvent {
		wd,
		kinds,
		cookie: 0,
		name: name.map(Into::into),
	}
}
