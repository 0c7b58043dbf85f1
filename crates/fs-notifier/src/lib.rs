//!
//! # File System Notifier
//!
//! Change notifications straight from a watch-descriptor facility (inotify on Linux and Android),
//! without any coalescing or debouncing in between.
//!
//! A [`Notifier`] owns a table of watches, each with its own handler, and dispatches every event
//! it reads to the handler of the watch that produced it. Handlers get the notifier back, so they
//! can add and remove watches, or stop the loop, while being dispatched.
//!
//! A [`RecursiveNotifier`] builds on it to keep a whole directory tree covered: directories
//! created inside the tree get watched as soon as their creation event comes in, and directories
//! deleting themselves are dropped from the table.
//!
//! ## Basic example
//!
//! ```no_run
//! use sd_fs_notifier::{
//!     backend::Descriptor, Config, Error, Event, EventKind, InotifyBackend, Notifier,
//!     RecursiveNotifier,
//! };
//!
//! fn on_event(
//!     notifier: &mut Notifier<InotifyBackend>,
//!     event: &Event<Descriptor<InotifyBackend>>,
//! ) -> Result<(), Error> {
//!     println!("{}: {:?}", event.kinds, event.child_path());
//!
//!     if event.kinds.contains(EventKind::DELETE_SELF) && notifier.is_empty() {
//!         notifier.stop();
//!     }
//!
//!     Ok(())
//! }
//!
//! fn main() -> Result<(), Error> {
//!     let mut notifier = RecursiveNotifier::<InotifyBackend>::init(Config::from_system()?)?;
//!
//!     notifier.rwatch("/tmp/inbox", EventKind::CLOSE_WRITE | EventKind::DELETE, on_event)?;
//!
//!     notifier.run()
//! }
//! ```

#![warn(
	clippy::all,
	clippy::pedantic,
	clippy::correctness,
	clippy::perf,
	clippy::style,
	clippy::suspicious,
	clippy::complexity,
	clippy::nursery,
	clippy::unwrap_used,
	unused_qualifications,
	rust_2018_idioms,
	trivial_casts,
	trivial_numeric_casts,
	unused_allocation,
	clippy::unnecessary_cast,
	clippy::cast_lossless,
	clippy::cast_possible_truncation,
	clippy::cast_possible_wrap,
	clippy::cast_precision_loss,
	clippy::cast_sign_loss,
	clippy::dbg_macro,
	clippy::deprecated_cfg_attr,
	clippy::separated_literal_suffix,
	deprecated
)]
#![forbid(deprecated_in_future)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

pub mod backend;
mod config;
mod error;
mod event;
mod notifier;
mod recursive;

#[cfg(any(target_os = "linux", target_os = "android"))]
pub use backend::InotifyBackend;
pub use backend::WatchBackend;
pub use config::{Config, SetupStrategy, DEFAULT_MAX_USER_WATCHES};
pub use error::{Error, FileIOError};
pub use event::{Event, EventKind, RawEvent};
pub use notifier::{EventHandler, Notifier, WatchEntry};
pub use recursive::RecursiveNotifier;
