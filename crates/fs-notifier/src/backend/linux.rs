//! inotify backed watch facility.

use crate::event::{EventKind, RawEvent};

use super::WatchBackend;

use std::{ffi::OsStr, io, path::Path};

use inotify::{Inotify, WatchDescriptor, WatchMask};
use tracing::trace;

/// Size of a `struct inotify_event` header plus the longest name the kernel may append to it.
const EVENT_SIZE: usize = 16 + 255 + 1;

/// How many maximum sized events fit in a single read.
const EVENTS_PER_READ: usize = 1024;

#[derive(Debug)]
pub struct InotifyBackend {
	inotify: Inotify,
	buffer: Vec<u8>,
}

impl InotifyBackend {
	pub fn new() -> io::Result<Self> {
		Ok(Self {
			inotify: Inotify::init()?,
			buffer: vec![0; EVENT_SIZE * EVENTS_PER_READ],
		})
	}
}

impl WatchBackend for InotifyBackend {
	type Descriptor = WatchDescriptor;

	fn add_watch(&mut self, path: &Path, kinds: EventKind) -> io::Result<Self::Descriptor> {
		// Our flag values are the kernel's own, so the mask carries over bit for bit.
		self.inotify
			.watches()
			.add(path, WatchMask::from_bits_truncate(kinds.bits()))
	}

	fn remove_watch(&mut self, wd: Self::Descriptor) -> io::Result<()> {
		self.inotify.watches().remove(wd)
	}

	fn read_events(&mut self) -> io::Result<Vec<RawEvent<Self::Descriptor>>> {
		let events = self
			.inotify
			.read_events_blocking(&mut self.buffer)?
			.map(|event| RawEvent {
				wd: event.wd,
				kinds: EventKind::from_bits_truncate(event.mask.bits()),
				cookie: event.cookie,
				name: event.name.map(OsStr::to_os_string),
			})
			.collect::<Vec<_>>();

		trace!(count = events.len(), "Read inotify events;");

		Ok(events)
	}

	fn close(self) -> io::Result<()> {
		self.inotify.close()
	}
}
