//! # Events Module
//!
//! Progress reporting that does not tie the core to any UI.
//!
//! ## Design
//! The core emits events through channels; the CLI subscribes and drives a
//! progress bar. Events are plain serializable data so another front end can
//! consume them the same way.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Fingerprint(FingerprintEvent::Progress(p)) = event {
//!             println!("{}/{}", p.completed, p.total);
//!         }
//!     }
//! });
//!
//! scheduler.run_with_events(&paths, &sender);
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
