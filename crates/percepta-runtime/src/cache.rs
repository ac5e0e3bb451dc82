//! [`SensorStreamCache`] – the latest synchronized frame pair.
//!
//! The cache slot and the run-exclusivity lock are the *same* mutex, so the
//! busy check and the lock acquisition are one atomic `try_lock` instead of
//! two separate boolean tests that could race.
//!
//! Write policy is drop-if-busy: a frame arriving while a detection run
//! holds the lock is silently discarded, leaving the last *confirmed* frame
//! in place (not the last *arrived* one).  The stream-arrival path never
//! blocks.

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use percepta_types::SensorFrame;

/// Shared cache handle.  Clone it cheaply; all clones share the slot.
#[derive(Clone, Debug, Default)]
pub struct SensorStreamCache {
    slot: Arc<Mutex<Option<SensorFrame>>>,
}

impl SensorStreamCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `frame` as the latest value, unless a run currently holds the
    /// exclusive lock — then the update is dropped.
    ///
    /// Returns whether the frame was stored.  Never blocks.
    pub fn offer(&self, frame: SensorFrame) -> bool {
        match self.slot.try_lock() {
            Ok(mut guard) => {
                *guard = Some(frame);
                true
            }
            Err(_) => {
                debug!("sensor frame dropped: a detection run holds the data lock");
                false
            }
        }
    }

    /// Atomically test-and-acquire the exclusive run lock.
    ///
    /// `None` means another run already holds it (the busy condition).  The
    /// returned guard keeps the lock for its whole lifetime and is released
    /// on drop, on every exit path.
    pub fn try_acquire(&self) -> Option<FrameGuard> {
        self.slot.clone().try_lock_owned().ok().map(FrameGuard)
    }
}

/// Exclusive access to the cached frame for the duration of one run.
#[derive(Debug)]
pub struct FrameGuard(OwnedMutexGuard<Option<SensorFrame>>);

impl FrameGuard {
    /// The cached frame, if any has been confirmed.
    pub fn frame(&self) -> Option<&SensorFrame> {
        self.0.as_ref()
    }

    /// Invalidate the cached frame so the next run needs fresh data.
    pub fn clear(&mut self) {
        *self.0 = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use percepta_types::{CameraImage, OrganizedCloud};

    fn frame(tag: u32) -> SensorFrame {
        SensorFrame {
            image: CameraImage {
                width: tag,
                height: 1,
                data: vec![],
                stamp: Utc::now(),
            },
            cloud: OrganizedCloud {
                width: tag,
                height: 1,
                points: vec![None; tag as usize],
                frame_id: "camera_link".to_string(),
                stamp: Utc::now(),
            },
        }
    }

    #[test]
    fn empty_cache_acquires_with_no_frame() {
        let cache = SensorStreamCache::new();
        let guard = cache.try_acquire().unwrap();
        assert!(guard.frame().is_none());
    }

    #[test]
    fn offer_then_acquire_sees_latest_frame() {
        let cache = SensorStreamCache::new();
        assert!(cache.offer(frame(1)));
        assert!(cache.offer(frame(2)));
        let guard = cache.try_acquire().unwrap();
        assert_eq!(guard.frame().unwrap().image.width, 2);
    }

    #[test]
    fn offer_is_dropped_while_lock_held() {
        let cache = SensorStreamCache::new();
        assert!(cache.offer(frame(1)));

        let guard = cache.try_acquire().unwrap();
        // Update arrives mid-run: dropped, last confirmed frame stays.
        assert!(!cache.offer(frame(2)));
        assert_eq!(guard.frame().unwrap().image.width, 1);

        drop(guard);
        let guard = cache.try_acquire().unwrap();
        assert_eq!(guard.frame().unwrap().image.width, 1);
    }

    #[test]
    fn second_acquire_fails_while_guard_lives() {
        let cache = SensorStreamCache::new();
        let guard = cache.try_acquire().unwrap();
        assert!(cache.try_acquire().is_none());
        drop(guard);
        assert!(cache.try_acquire().is_some());
    }

    #[test]
    fn clear_invalidates_the_frame() {
        let cache = SensorStreamCache::new();
        cache.offer(frame(1));
        let mut guard = cache.try_acquire().unwrap();
        guard.clear();
        drop(guard);
        let guard = cache.try_acquire().unwrap();
        assert!(guard.frame().is_none());
    }
}
