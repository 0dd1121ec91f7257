//! Fingerprint-addressed table cache for stockfeed.
//!
//! - [`Fingerprint`] - BLAKE3 key over a data kind and validated parameters
//! - [`Cache`] - TTL cache, memory in front of an optional [`DiskStore`]
//! - [`SingleFlight`] - at most one upstream call per fingerprint

#![doc(issue_tracker_base_url = "https://github.com/stockfeed/stockfeed/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod cache;
mod disk;
mod fingerprint;
mod flight;
mod memory;

pub use cache::Cache;
pub use disk::{DiskEntry, DiskStore};
pub use fingerprint::Fingerprint;
pub use flight::{FlightGuard, SingleFlight};
pub use memory::MemoryCache;
