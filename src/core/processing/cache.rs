//! Process-wide memo of finished pipeline runs, keyed by input content.
//!
//! The key is the SHA-256 digest of the raw upload bytes, so two uploads with
//! different names but identical bytes share an entry, and the same name with
//! different bytes does not. Computation always runs outside the lock; a
//! failed computation stores nothing.
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use sha2::{Digest, Sha256};
use tracing::{debug, trace};

use crate::error::Result;
use crate::types::ProcessingResult;

#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        CacheKey(Sha256::digest(bytes).into())
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // First 8 bytes are plenty for logs
        for b in &self.0[..8] {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<CacheKey, Arc<ProcessingResult>>,
    // Insertion order, for eviction when bounded
    order: VecDeque<CacheKey>,
}

pub struct ResultCache {
    state: Mutex<CacheState>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultCache {
    /// Unbounded cache.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Keeps at most `capacity` results, evicting the oldest insert first.
    /// A capacity of 0 means unbounded.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // Entries are only ever inserted whole, so a poisoned map is still consistent
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, bytes: &[u8]) -> Option<Arc<ProcessingResult>> {
        self.lock().entries.get(&CacheKey::from_bytes(bytes)).cloned()
    }

    pub fn contains(&self, bytes: &[u8]) -> bool {
        self.lock().entries.contains_key(&CacheKey::from_bytes(bytes))
    }

    /// Return the stored result for `bytes`, or run `compute` and store its
    /// output. The boolean is true on a cache hit.
    ///
    /// When two callers race on the same key, the first stored result wins and
    /// both receive it.
    pub fn get_or_try_insert_with<F>(
        &self,
        bytes: &[u8],
        compute: F,
    ) -> Result<(Arc<ProcessingResult>, bool)>
    where
        F: FnOnce(&[u8]) -> Result<ProcessingResult>,
    {
        let key = CacheKey::from_bytes(bytes);

        if let Some(hit) = self.lock().entries.get(&key).cloned() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Cache hit for {:?}", key);
            return Ok((hit, true));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!("Cache miss for {:?}, computing", key);
        let computed = Arc::new(compute(bytes)?);

        let mut state = self.lock();
        if let Some(existing) = state.entries.get(&key).cloned() {
            trace!("Entry for {:?} was stored concurrently, keeping the first", key);
            return Ok((existing, false));
        }
        state.entries.insert(key, computed.clone());
        state.order.push_back(key);

        if self.capacity > 0 {
            while state.entries.len() > self.capacity {
                let Some(oldest) = state.order.pop_front() else {
                    break;
                };
                state.entries.remove(&oldest);
                debug!("Evicted {:?}", oldest);
            }
        }

        Ok((computed, false))
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.order.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use image::{DynamicImage, RgbImage};
    use std::sync::atomic::AtomicUsize;

    fn result(width: u32) -> ProcessingResult {
        ProcessingResult {
            original: DynamicImage::ImageRgb8(RgbImage::new(width, 1)),
            processed: DynamicImage::ImageRgb8(RgbImage::new(width, 1)),
        }
    }

    #[test]
    fn second_call_is_a_hit() {
        let cache = ResultCache::new();
        let calls = AtomicUsize::new(0);
        let compute = |_: &[u8]| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(result(3))
        };

        let (first, hit) = cache.get_or_try_insert_with(b"abc", compute).unwrap();
        assert!(!hit);
        let (second, hit) = cache.get_or_try_insert_with(b"abc", compute).unwrap();
        assert!(hit);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1, entries: 1 });
    }

    #[test]
    fn key_is_content_not_identity() {
        let cache = ResultCache::new();
        let a = vec![1u8, 2, 3];
        let b = a.clone();
        cache.get_or_try_insert_with(&a, |_| Ok(result(1))).unwrap();
        let (_, hit) = cache.get_or_try_insert_with(&b, |_| Ok(result(2))).unwrap();
        assert!(hit);
        let (_, hit) = cache.get_or_try_insert_with(&[1, 2, 4], |_| Ok(result(2))).unwrap();
        assert!(!hit);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn failure_is_not_stored_and_retry_recomputes() {
        let cache = ResultCache::new();
        let err = cache
            .get_or_try_insert_with(b"bad", |_| Err(Error::decode("boom")))
            .unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        assert!(cache.is_empty());
        assert!(!cache.contains(b"bad"));

        let (_, hit) = cache.get_or_try_insert_with(b"bad", |_| Ok(result(5))).unwrap();
        assert!(!hit);
        assert!(cache.contains(b"bad"));
    }

    #[test]
    fn bounded_cache_evicts_oldest() {
        let cache = ResultCache::with_capacity(2);
        for key in [&b"one"[..], &b"two"[..], &b"three"[..]] {
            cache.get_or_try_insert_with(key, |_| Ok(result(1))).unwrap();
        }
        assert_eq!(cache.len(), 2);
        assert!(!cache.contains(b"one"));
        assert!(cache.contains(b"two"));
        assert!(cache.contains(b"three"));
    }

    #[test]
    fn concurrent_callers_share_one_entry() {
        let cache = Arc::new(ResultCache::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    let (res, _) = cache
                        .get_or_try_insert_with(b"same", |_| Ok(result(10 + i)))
                        .unwrap();
                    res.original.width()
                })
            })
            .collect();
        let widths: Vec<u32> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let stored = cache.get(b"same").unwrap().original.width();
        assert_eq!(cache.len(), 1);
        // Late finishers are handed the stored entry, not their own
        assert!(widths.iter().all(|w| (10..18).contains(w)));
        assert!(widths.contains(&stored));
    }

    #[test]
    fn clear_empties_the_cache() {
        let cache = ResultCache::new();
        cache.get_or_try_insert_with(b"x", |_| Ok(result(1))).unwrap();
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(b"x").is_none());
    }
}
