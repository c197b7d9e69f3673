#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod hash_table;

/// Hasher builders used to compute the cached slot hashes.
///
/// This module provides the bit-pattern [`IdentityHasher`](hasher::IdentityHasher)
/// and the feature-dependent [`DefaultHashBuilder`](hasher::DefaultHashBuilder).
pub mod hasher;

/// Probe-length and slot-usage diagnostics.
#[cfg(feature = "stats")]
pub mod stats;

pub use alloc::collections::TryReserveError;

pub use hash_table::Cursor;
pub use hash_table::HashTable;
pub use hasher::DefaultHashBuilder;
pub use hasher::IdentityHashBuilder;
