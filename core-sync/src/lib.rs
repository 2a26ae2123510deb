//! # Lyrics Crawl Module
//!
//! Walks a music library and fetches synced lyrics for the tracks that need
//! them.
//!
//! ## Overview
//!
//! This module manages one crawl, including:
//! - Walking a file or directory tree without recursion
//! - Gating each track on the failure ledger, the genre blacklist and an
//!   existing lyrics file
//! - Running the composite lyrics search and recording misses
//! - Tallying outcomes for the final report
//!
//! ## Components
//!
//! - **Traverser** (`traverser`): Stack-based walk in file-name order
//! - **Gating** (`gating`): `FetchKey` and `GenreBlacklist`
//! - **Failure Ledger** (`ledger`): Append-only record of lookups that found nothing
//! - **Fetch Orchestrator** (`orchestrator`): Per-file decision and fetch
//! - **Crawl Coordinator** (`coordinator`): Drives the walk and aggregates outcomes

pub mod coordinator;
pub mod error;
pub mod gating;
pub mod ledger;
pub mod orchestrator;
pub mod traverser;

pub use coordinator::{CrawlCoordinator, CrawlSummary};
pub use error::{Result, SyncError};
pub use gating::{FetchKey, GenreBlacklist};
pub use ledger::FailureLedger;
pub use orchestrator::{FetchOrchestrator, FetchOutcome, SkipReason};
pub use traverser::Traverser;
