//! hostwatch core - observation engine behind the admin dashboard
//!
//! Two independent halves share this crate:
//! - Live metrics: a periodic sampler reads host counters and fans each
//!   snapshot out to every connected viewer (lossy, never blocking)
//! - Log/state ingestion: raw log files and command listings are parsed
//!   into structured records, cached per source and queried with filters
//!
//! `ObservationEngine` is the composition root handed to the transport layer.

pub mod broadcast;
pub mod config;
pub mod engine;
pub mod error;
pub mod execution;
pub mod logs;
pub mod metrics;
pub mod model;
pub mod parser;

pub use broadcast::{Broadcaster, Subscription};
pub use config::EngineConfig;
pub use engine::ObservationEngine;
pub use error::{Error, Result};
pub use execution::{Listing, ListingSource, SystemListings};
pub use logs::LogStore;
pub use metrics::{HostProbe, MetricsSampler, SysinfoProbe};
pub use model::*;
