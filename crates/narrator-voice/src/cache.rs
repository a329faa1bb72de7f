//! In-memory audio cache with single-flight fetches.
//!
//! A key is fetched at most once at a time: concurrent callers for an
//! in-flight key await the same shared future and receive the same handle
//! (or the same failure). Failures are never cached. Entries live until
//! [`AudioCache::clear`].

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use narrator_core::{ClipPath, ProviderId};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::audio::AudioClip;
use crate::error::VoiceError;
use crate::output::AudioOutput;

// ── Keys ───────────────────────────────────────────────────────────

/// Stable cache key.
///
/// Keys carry the endpoint the audio came from, so audio fetched from one
/// server is never served after the endpoint changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for a pre-recorded clip.
    pub fn clip(
        provider: ProviderId,
        endpoint: &str,
        voice: &str,
        language: &str,
        path: &ClipPath,
    ) -> Self {
        Self(format!("{provider}@{endpoint}:{voice}:{language}:{path}"))
    }

    /// Key for synthesized text, addressed by a SHA-256 of the text.
    pub fn text(provider: ProviderId, endpoint: &str, voice: &str, text: &str) -> Self {
        let digest = Sha256::digest(text.as_bytes());
        let mut hex = String::with_capacity(digest.len() * 2);
        for byte in digest {
            use fmt::Write as _;
            let _ = write!(hex, "{byte:02x}");
        }
        Self(format!("{provider}@{endpoint}:{voice}:{hex}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Cache ──────────────────────────────────────────────────────────

type SharedFetch = Shared<BoxFuture<'static, Option<AudioClip>>>;

#[derive(Debug, Clone)]
struct CacheEntry {
    clip: AudioClip,
    acquired_at: DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
    ready: HashMap<CacheKey, CacheEntry>,
    in_flight: HashMap<CacheKey, SharedFetch>,
    /// Bumped by `clear`; fetches started before a clear do not insert.
    epoch: u64,
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Audio cache shared by all providers of a session.
#[derive(Default)]
pub struct AudioCache {
    inner: Arc<Mutex<Inner>>,
    output: Mutex<Option<Arc<dyn AudioOutput>>>,
}

impl AudioCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the output that `clear` must silence before releasing audio.
    pub fn attach_output(&self, output: Arc<dyn AudioOutput>) {
        *self
            .output
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(output);
    }

    /// Cached audio for a key, if present.
    pub fn get(&self, key: &CacheKey) -> Option<AudioClip> {
        lock(&self.inner).ready.get(key).map(|e| e.clip.clone())
    }

    /// When the cached audio for a key was acquired.
    pub fn acquired_at(&self, key: &CacheKey) -> Option<DateTime<Utc>> {
        lock(&self.inner).ready.get(key).map(|e| e.acquired_at)
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        lock(&self.inner).ready.contains_key(key)
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).ready.len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.inner).ready.is_empty()
    }

    /// Return the cached audio for `key`, or run `producer` to get it.
    ///
    /// `producer` is only called when the key is neither cached nor in
    /// flight; it must return a lazy future. Failures are logged, not
    /// cached, and reported as `None` to every waiting caller.
    pub async fn fetch_or_synthesize<F, Fut>(&self, key: CacheKey, producer: F) -> Option<AudioClip>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<AudioClip, VoiceError>> + Send + 'static,
    {
        let fetch = {
            let mut inner = lock(&self.inner);
            if let Some(entry) = inner.ready.get(&key) {
                return Some(entry.clip.clone());
            }
            if let Some(pending) = inner.in_flight.get(&key) {
                debug!(key = %key, "Joining in-flight fetch");
                pending.clone()
            } else {
                let fetch = Self::tracked(Arc::clone(&self.inner), key.clone(), inner.epoch, producer());
                inner.in_flight.insert(key, fetch.clone());
                fetch
            }
        };
        fetch.await
    }

    /// Wrap a producer future so that its own completion updates the
    /// cache, independent of which caller happens to poll it.
    fn tracked<Fut>(inner: Arc<Mutex<Inner>>, key: CacheKey, epoch: u64, produce: Fut) -> SharedFetch
    where
        Fut: Future<Output = Result<AudioClip, VoiceError>> + Send + 'static,
    {
        async move {
            let result = produce.await;
            let mut guard = lock(&inner);
            let current = guard.epoch == epoch;
            if current {
                guard.in_flight.remove(&key);
            }
            match result {
                Ok(clip) => {
                    if current {
                        guard.ready.insert(
                            key,
                            CacheEntry {
                                clip: clip.clone(),
                                acquired_at: Utc::now(),
                            },
                        );
                    }
                    Some(clip)
                }
                Err(e) => {
                    drop(guard);
                    if e.is_not_ready() {
                        debug!(key = %key, error = %e, "Audio fetch skipped");
                    } else {
                        warn!(key = %key, error = %e, "Audio fetch failed");
                    }
                    None
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Drop every entry and in-flight fetch.
    ///
    /// Silences the attached output first so nothing keeps playing audio
    /// that is being released.
    pub fn clear(&self) {
        let output = self
            .output
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(output) = output {
            output.stop();
        }

        let mut inner = lock(&self.inner);
        let released = inner.ready.len();
        inner.ready.clear();
        inner.in_flight.clear();
        inner.epoch += 1;
        debug!(released, "Audio cache cleared");
    }
}
