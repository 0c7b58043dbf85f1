use crate::Error;

use std::{
	ffi::{OsStr, OsString},
	fmt,
	path::{Path, PathBuf},
	str::FromStr,
};

use bitflags::bitflags;

bitflags! {
	/// Set of event kinds, used both as the filter of a watch and as the kinds carried by an event.
	///
	/// Bit values follow the kernel's `IN_*` constants.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
	pub struct EventKind: u32 {
		const ACCESS = 0x0000_0001;
		const MODIFY = 0x0000_0002;
		const ATTRIB = 0x0000_0004;
		const CLOSE_WRITE = 0x0000_0008;
		const CLOSE_NOWRITE = 0x0000_0010;
		const OPEN = 0x0000_0020;
		const MOVED_FROM = 0x0000_0040;
		const MOVED_TO = 0x0000_0080;
		const CREATE = 0x0000_0100;
		const DELETE = 0x0000_0200;
		const DELETE_SELF = 0x0000_0400;
		const MOVE_SELF = 0x0000_0800;

		const CLOSE = Self::CLOSE_WRITE.bits() | Self::CLOSE_NOWRITE.bits();
		const MOVE = Self::MOVED_FROM.bits() | Self::MOVED_TO.bits();
		const ALL_EVENTS = 0x0000_0fff;

		// Only ever reported by the backend, never requested.
		const UNMOUNT = 0x0000_2000;
		const Q_OVERFLOW = 0x0000_4000;
		const IGNORED = 0x0000_8000;
		const ISDIR = 0x4000_0000;

		// Options changing how a watch is installed.
		const ONLYDIR = 0x0100_0000;
		const DONT_FOLLOW = 0x0200_0000;
		const EXCL_UNLINK = 0x0400_0000;
		const MASK_ADD = 0x2000_0000;
		const ONESHOT = 0x8000_0000;
	}
}

impl EventKind {
	/// Whether this set describes a new directory showing up under a watched one.
	#[must_use]
	pub const fn is_dir_creation(self) -> bool {
		self.contains(Self::CREATE.union(Self::ISDIR))
	}

	/// Builds a set out of lowercase flag names, like `["create", "delete_self"]`.
	pub fn from_names<I, S>(names: I) -> Result<Self, Error>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		names
			.into_iter()
			.try_fold(Self::empty(), |kinds, name| Ok(kinds | name.as_ref().parse()?))
	}
}

impl FromStr for EventKind {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::from_name(&s.to_ascii_uppercase()).ok_or_else(|| Error::UnknownFlag(s.to_string()))
	}
}

impl fmt::Display for EventKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if self.contains(Self::ALL_EVENTS) {
			f.write_str("all_events")?;
			let rest = self.difference(Self::ALL_EVENTS);
			return if rest.is_empty() {
				Ok(())
			} else {
				write!(f, "|{rest}")
			};
		}

		// Composite names (close, move) are skipped in favor of their single bit parts.
		let mut first = true;
		for (name, kind) in self.iter_names() {
			if kind.bits().count_ones() != 1 {
				continue;
			}
			if !first {
				f.write_str("|")?;
			}
			first = false;
			f.write_str(&name.to_ascii_lowercase())?;
		}

		Ok(())
	}
}

/// An event as read from the backend, before being matched to its watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent<D> {
	pub wd: D,
	pub kinds: EventKind,
	/// Links a `MOVED_FROM` with its `MOVED_TO`, zero otherwise.
	pub cookie: u32,
	pub name: Option<OsString>,
}

/// An event dispatched to the handler of the watch that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event<D> {
	pub wd: D,
	pub kinds: EventKind,
	pub cookie: u32,
	/// Name of the affected child, when the event concerns an entry of the watched directory.
	pub name: Option<OsString>,
	/// Path recorded by the watch when this event was dispatched.
	pub watched_path: PathBuf,
}

impl<D> Event<D> {
	pub(crate) fn from_raw(raw: RawEvent<D>, watched_path: impl Into<PathBuf>) -> Self {
		let RawEvent {
			wd,
			kinds,
			cookie,
			name,
		} = raw;

		Self {
			wd,
			kinds,
			cookie,
			name,
			watched_path: watched_path.into(),
		}
	}

	#[must_use]
	pub fn name(&self) -> Option<&OsStr> {
		self.name.as_deref()
	}

	/// Full path of the affected child, or `None` when the event is about the watched path itself.
	#[must_use]
	pub fn child_path(&self) -> Option<PathBuf> {
		self.name().map(|name| self.watched_path.join(name))
	}

	#[must_use]
	pub fn watched_path(&self) -> &Path {
		&self.watched_path
	}
}
