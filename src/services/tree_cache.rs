use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;

use crate::mindmap::TreeSnapshot;

pub const DEFAULT_TREE_CACHE_TTL: Duration = Duration::from_secs(30);

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    cached: Option<(Instant, Arc<TreeSnapshot>)>,
}

/// Time-bounded cache of flat lesson snapshots
///
/// Services invalidate a lesson after every committed mutation; the TTL only
/// bounds staleness against writers outside this process. A zero TTL disables
/// caching.
///
/// Every invalidation bumps the lesson's generation. A reader captures the
/// generation before it queries and [`TreeCache::put`] refuses the snapshot
/// when a write landed in between.
#[derive(Debug)]
pub struct TreeCache {
    ttl: Duration,
    slots: DashMap<String, Slot>,
}

impl Default for TreeCache {
    fn default() -> Self {
        Self::new(DEFAULT_TREE_CACHE_TTL)
    }
}

impl TreeCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: DashMap::new(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    pub fn get(&self, lesson_id: &str) -> Option<Arc<TreeSnapshot>> {
        if !self.is_enabled() {
            return None;
        }
        let mut slot = self.slots.get_mut(lesson_id)?;
        let fresh = slot
            .cached
            .as_ref()
            .filter(|(stored_at, _)| stored_at.elapsed() < self.ttl)
            .map(|(_, snapshot)| snapshot.clone());
        if fresh.is_none() {
            slot.cached = None;
        }
        fresh
    }

    /// Current write generation of a lesson, captured before reading it
    pub fn generation(&self, lesson_id: &str) -> u64 {
        self.slots
            .get(lesson_id)
            .map(|slot| slot.generation)
            .unwrap_or(0)
    }

    /// Store a snapshot read at `generation`; returns false when it is stale
    pub fn put(&self, lesson_id: &str, generation: u64, snapshot: Arc<TreeSnapshot>) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let mut slot = self.slots.entry(lesson_id.to_string()).or_default();
        if slot.generation != generation {
            debug!(
                "Dropped stale tree snapshot for lesson {} (generation {} != {})",
                lesson_id, generation, slot.generation
            );
            return false;
        }
        slot.cached = Some((Instant::now(), snapshot));
        true
    }

    pub fn invalidate(&self, lesson_id: &str) {
        let mut slot = self.slots.entry(lesson_id.to_string()).or_default();
        slot.generation = slot.generation.wrapping_add(1);
        if slot.cached.take().is_some() {
            debug!("Invalidated tree cache for lesson {}", lesson_id);
        }
    }

    pub fn invalidate_many<I, S>(&self, lesson_ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for id in lesson_ids {
            self.invalidate(id.as_ref());
        }
    }

    pub fn clear(&self) {
        for mut slot in self.slots.iter_mut() {
            slot.generation = slot.generation.wrapping_add(1);
            slot.cached = None;
        }
    }

    /// Number of lessons with a cached snapshot
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.cached.is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
