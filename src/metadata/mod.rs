//! Metadata lookup for parsed media identities.
//!
//! # Module layout
//!
//! - [`provider`] -- Trait definition and shared data types.
//! - [`providers`] -- Concrete provider implementations (TMDB, OMDb).
//! - [`resolver`] -- Ordered multi-provider resolution with per-call timeouts.
//! - [`cache`] -- TTL cache in front of the resolver.
//! - [`matching`] -- Title normalization and candidate confidence.

pub mod cache;
pub mod matching;
pub mod provider;
pub mod providers;
pub mod resolver;

pub use provider::{
    Identity, LookupError, LookupFailure, LookupResult, MetadataProvider, MetadataRecord,
    MetadataResult, Resolution,
};
pub use resolver::MetadataResolver;
