//! A bidirectional, lock-free SPSC channel pair for exchanging fixed-size
//! messages between exactly two threads.
//!
//! Each side of a [`PortalPair`] is an [`Endpoint`]: simultaneously a
//! producer toward its peer and a consumer from its peer, each direction
//! backed by its own single-producer/single-consumer ring buffer ([`Part`]).
//! Writes are batched and published with a single release-fenced store;
//! reads are zero-copy, handing back a borrowed slice straight into the
//! ring. A manual-reset [`Event`] per endpoint lets either side block until
//! woken rather than spin indefinitely, with a "charity wake" path so a
//! producer that hits backpressure can dislodge a sleeping consumer even
//! outside its normal notify path. A synchronous request/reply overlay
//! (`sync_query`/`sync_reply`) rides the same rings via a dedicated tag.
//!
//! This is a Rust take on the `portal` channel used in Mozilla's `rr` and
//! `Zoxc`'s scratch projects, redesigned around `Arc`-based shared ownership
//! instead of a manual once-across-the-pair free.
//!
//! # Example
//!
//! ```
//! use ringportal_rs::{Config, Endpoint, Message};
//!
//! let (a, b) = Endpoint::<Message>::pair(Config::default());
//!
//! a.write(Message::new([1, 2, 3, 4]));
//! a.notify();
//!
//! b.wait();
//! let batch = b.pending();
//! assert_eq!(batch.len(), 1);
//! b.read(batch.len()).unwrap();
//! ```

mod backoff;
mod config;
mod error;
mod event;
mod invariants;
mod message;
mod metrics;
mod part;
mod portal;

pub use backoff::Backoff;
pub use config::{Config, HIGH_THROUGHPUT_CONFIG, LOW_LATENCY_CONFIG};
pub use error::PortalError;
pub use event::Event;
pub use message::Message;
pub use metrics::{Metrics, MetricsSnapshot};
pub use portal::{Endpoint, PortalPair};

use part::Part;
