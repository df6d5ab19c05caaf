use std::collections::HashSet;
use std::sync::mpsc;

use crate::{
    assets::{
        cache::{ImageCache, ImageKey},
        datauri::ImageSource,
        decode::{DecodedImage, decode_source},
    },
    foundation::error::{ThumbError, ThumbResult},
};

struct Completion {
    key: ImageKey,
    result: ThumbResult<DecodedImage>,
}

/// Background image decoding.
///
/// [`DecodeQueue::request`] returns immediately; the decode runs on the queue's rayon pool and its
/// result only reaches the [`ImageCache`] when the owner calls [`DecodeQueue::drain`]
/// (non-blocking) or [`DecodeQueue::wait`] (blocking) on its own thread. The cache itself is never
/// touched off the owning thread. There is no cancellation and no timeout.
pub struct DecodeQueue {
    tx: mpsc::Sender<Completion>,
    rx: mpsc::Receiver<Completion>,
    in_flight: HashSet<ImageKey>,
    threads: Option<usize>,
    pool: Option<rayon::ThreadPool>,
}

impl Default for DecodeQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl DecodeQueue {
    /// A queue whose pool uses rayon's default thread count.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            in_flight: HashSet::new(),
            threads: None,
            pool: None,
        }
    }

    /// A queue decoding on at most `threads` workers.
    pub fn with_threads(threads: usize) -> ThumbResult<Self> {
        if threads == 0 {
            return Err(ThumbError::validation("decode threads must be >= 1"));
        }
        Ok(Self {
            threads: Some(threads),
            ..Self::new()
        })
    }

    /// Start decoding `source` unless it is already cached or in flight.
    ///
    /// Returns whether a new decode was started.
    pub fn request(&mut self, source: &ImageSource, cache: &ImageCache) -> bool {
        let key = ImageKey::of(source);
        if cache.contains(key) || self.in_flight.contains(&key) {
            return false;
        }

        let tx = self.tx.clone();
        let source = source.clone();
        match self.pool() {
            Ok(pool) => pool.spawn(move || {
                let result = decode_source(&source);
                // The receiver outlives every job unless the queue was dropped mid-decode.
                let _ = tx.send(Completion { key, result });
            }),
            Err(err) => {
                tracing::warn!(key = key.as_u64(), error = %err, "could not start decode pool");
                return false;
            }
        }

        tracing::debug!(key = key.as_u64(), "image decode requested");
        self.in_flight.insert(key);
        true
    }

    /// The worker pool, built on first use.
    fn pool(&mut self) -> ThumbResult<&rayon::ThreadPool> {
        if self.pool.is_none() {
            let mut builder = rayon::ThreadPoolBuilder::new()
                .thread_name(|i| format!("thumbkit-decode-{i}"));
            if let Some(n) = self.threads {
                builder = builder.num_threads(n);
            }
            let pool = builder
                .build()
                .map_err(|e| ThumbError::decode(format!("failed to build decode pool: {e}")))?;
            self.pool = Some(pool);
        }
        self.pool
            .as_ref()
            .ok_or_else(|| ThumbError::decode("decode pool missing"))
    }

    /// Number of decodes started but not yet applied to a cache.
    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }

    /// Apply every finished decode to `cache` without blocking.
    ///
    /// Returns the keys that were newly inserted. Failed decodes are logged and dropped, leaving
    /// the image absent.
    pub fn drain(&mut self, cache: &mut ImageCache) -> Vec<ImageKey> {
        let mut done = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            self.apply(completion, cache, &mut done);
        }
        done
    }

    /// Block until every in-flight decode has completed, then apply them.
    pub fn wait(&mut self, cache: &mut ImageCache) -> Vec<ImageKey> {
        let mut done = Vec::new();
        while !self.in_flight.is_empty() {
            let Ok(completion) = self.rx.recv() else {
                break;
            };
            self.apply(completion, cache, &mut done);
        }
        done
    }

    fn apply(&mut self, completion: Completion, cache: &mut ImageCache, done: &mut Vec<ImageKey>) {
        self.in_flight.remove(&completion.key);
        match completion.result {
            Ok(image) => {
                if cache.insert(completion.key, image) {
                    done.push(completion.key);
                }
            }
            Err(err) => {
                tracing::warn!(key = completion.key.as_u64(), error = %err, "image decode failed");
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/queue.rs"]
mod tests;
