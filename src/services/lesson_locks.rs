use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = DashMap<String, Arc<Mutex<()>>>;

/// Per-lesson advisory locks serialising structural writes
///
/// Held for the whole read-check-write cycle of create, reparent and delete so
/// two requests in one process cannot both pass the cycle check. A lesson's
/// entry is dropped once its last holder and waiter are gone.
#[derive(Debug, Default)]
pub struct LessonLocks {
    locks: Arc<LockMap>,
}

/// Held lock on one lesson; releasing it prunes the idle entry
#[derive(Debug)]
pub struct LessonGuard {
    lesson_id: String,
    locks: Arc<LockMap>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl LessonGuard {
    pub fn lesson_id(&self) -> &str {
        &self.lesson_id
    }
}

impl Drop for LessonGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // The map holds the only remaining handle when nobody waits
        self.locks
            .remove_if(&self.lesson_id, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

impl LessonLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, lesson_id: &str) -> LessonGuard {
        let mutex = self
            .locks
            .entry(lesson_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = mutex.lock_owned().await;
        LessonGuard {
            lesson_id: lesson_id.to_string(),
            locks: self.locks.clone(),
            guard: Some(guard),
        }
    }

    /// Lock several lessons at once, always in sorted order
    pub async fn lock_many<I, S>(&self, lesson_ids: I) -> Vec<LessonGuard>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ids: Vec<String> = lesson_ids
            .into_iter()
            .map(|id| id.as_ref().to_string())
            .collect();
        ids.sort();
        ids.dedup();

        let mut guards = Vec::with_capacity(ids.len());
        for id in &ids {
            guards.push(self.lock(id).await);
        }
        guards
    }

    /// Lessons currently locked or waited on
    pub fn tracked_lessons(&self) -> usize {
        self.locks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_lesson_is_serialised() {
        let locks = Arc::new(LessonLocks::new());
        let guard = locks.lock("lesson-1").await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock("lesson-1").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
        assert_eq!(locks.tracked_lessons(), 0);
    }

    #[tokio::test]
    async fn different_lessons_do_not_block() {
        let locks = LessonLocks::new();
        let _a = locks.lock("lesson-a").await;
        let _b = tokio::time::timeout(Duration::from_millis(100), locks.lock("lesson-b"))
            .await
            .unwrap();
        assert_eq!(locks.tracked_lessons(), 2);
    }

    #[tokio::test]
    async fn lock_many_deduplicates() {
        let locks = LessonLocks::new();
        let guards = locks.lock_many(["b", "a", "b"]).await;
        assert_eq!(guards.len(), 2);
        assert_eq!(guards[0].lesson_id(), "a");
    }

    #[tokio::test]
    async fn released_lessons_are_pruned() {
        let locks = LessonLocks::new();
        for i in 0..50 {
            let _guard = locks.lock(&format!("lesson-{}", i)).await;
        }
        assert_eq!(locks.tracked_lessons(), 0);

        let guards = locks.lock_many(["x", "y"]).await;
        assert_eq!(locks.tracked_lessons(), 2);
        drop(guards);
        assert_eq!(locks.tracked_lessons(), 0);
    }

    #[tokio::test]
    async fn entry_survives_while_someone_waits() {
        let locks = Arc::new(LessonLocks::new());
        let first = locks.lock("lesson-1").await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock("lesson-1").await;
                tokio::time::sleep(Duration::from_millis(20)).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(first);
        assert_eq!(locks.tracked_lessons(), 1);

        waiter.await.unwrap();
        assert_eq!(locks.tracked_lessons(), 0);
    }
}
