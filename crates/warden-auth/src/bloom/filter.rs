//! Fixed-size bloom filter with FNV double hashing.

use std::f64::consts::LN_2;

use tokio::sync::RwLock;

use warden_core::error::AppError;
use warden_core::result::AppResult;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// A bloom filter over string items.
///
/// `add` takes the write lock and `test` the read lock, so concurrent
/// lookups never observe a half-set item.
#[derive(Debug)]
pub struct BloomFilter {
    bits: RwLock<Vec<u64>>,
    num_bits: u64,
    num_hashes: u32,
}

impl BloomFilter {
    /// Sizes a filter for `expected_items` at the target false-positive rate.
    ///
    /// `m = ceil(-n·ln p / (ln 2)²)` bits and `k = round(m/n · ln 2)` hash
    /// functions (at least one). A capacity of zero is treated as one.
    pub fn new(expected_items: usize, false_positive_rate: f64) -> AppResult<Self> {
        if !(false_positive_rate > 0.0 && false_positive_rate < 1.0) {
            return Err(AppError::validation(format!(
                "Bloom filter false-positive rate must be in (0, 1), got {false_positive_rate}"
            )));
        }

        let n = expected_items.max(1) as f64;
        let num_bits = (-n * false_positive_rate.ln() / (LN_2 * LN_2)).ceil().max(1.0) as u64;
        let num_hashes = ((num_bits as f64 / n) * LN_2).round().max(1.0) as u32;
        let words = num_bits.div_ceil(64) as usize;

        Ok(Self {
            bits: RwLock::new(vec![0; words]),
            num_bits,
            num_hashes,
        })
    }

    /// Number of bits in the filter (`m`).
    pub fn bit_count(&self) -> u64 {
        self.num_bits
    }

    /// Number of hash functions (`k`).
    pub fn hash_count(&self) -> u32 {
        self.num_hashes
    }

    /// Records `item` as present.
    pub async fn add(&self, item: &str) {
        let mut bits = self.bits.write().await;
        for pos in self.positions(item) {
            bits[(pos / 64) as usize] |= 1u64 << (pos % 64);
        }
    }

    /// Returns `false` if `item` was definitely never added, `true` if it
    /// possibly was.
    pub async fn test(&self, item: &str) -> bool {
        let bits = self.bits.read().await;
        self.positions(item)
            .all(|pos| bits[(pos / 64) as usize] & (1u64 << (pos % 64)) != 0)
    }

    fn positions(&self, item: &str) -> impl Iterator<Item = u64> + use<> {
        let bytes = item.as_bytes();
        let h1 = u64::from(fnv1a_32(bytes));
        let h2 = u64::from(fnv1_32(bytes) | 1);
        let m = self.num_bits;
        (0..u64::from(self.num_hashes)).map(move |i| h1.wrapping_add(i.wrapping_mul(h2)) % m)
    }
}

fn fnv1a_32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &b| {
        (hash ^ u32::from(b)).wrapping_mul(FNV_PRIME)
    })
}

fn fnv1_32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &b| {
        hash.wrapping_mul(FNV_PRIME) ^ u32::from(b)
    })
}
