//! Probabilistic username pre-filter.
//!
//! The filter answers "definitely not registered" or "possibly registered"
//! and lets registration reject likely duplicates without a storage round
//! trip. It never shrinks; removing a user does not clear its bits.

pub mod filter;

pub use filter::BloomFilter;
