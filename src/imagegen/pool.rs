use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use super::{ImageEvent, ImageGenError, ImageGenerator, ImageHandle, ImageRequest};

struct Job {
    request: ImageRequest,
    attempt: u32,
}

struct Completion {
    job: Job,
    result: Result<Vec<(u64, ImageHandle)>, ImageGenError>,
}

/// Bounded set of worker threads running an [`ImageGenerator`].
///
/// At most `max_workers` requests run at once; the rest wait in FIFO order.
/// Completions come back over a channel and are drained by [`poll`](Self::poll)
/// without blocking. A failed request is retried until it has been attempted
/// `max_attempts` times.
pub struct ImagePool {
    generator: Arc<dyn ImageGenerator>,
    max_workers: usize,
    max_attempts: u32,
    waiting: VecDeque<Job>,
    in_flight: usize,
    sender: flume::Sender<Completion>,
    receiver: flume::Receiver<Completion>,
}

impl ImagePool {
    pub fn new(generator: Arc<dyn ImageGenerator>, max_workers: usize, max_attempts: u32) -> Self {
        let (sender, receiver) = flume::unbounded();
        Self {
            generator,
            max_workers: max_workers.max(1),
            max_attempts: max_attempts.max(1),
            waiting: VecDeque::new(),
            in_flight: 0,
            sender,
            receiver,
        }
    }

    /// Queue a request and start it if a worker is free.
    pub fn submit(&mut self, request: ImageRequest) {
        self.waiting.push_back(Job {
            request,
            attempt: 1,
        });
        self.dispatch();
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn waiting(&self) -> usize {
        self.waiting.len()
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight == 0 && self.waiting.is_empty()
    }

    /// Collect finished requests without blocking.
    pub fn poll(&mut self) -> Vec<ImageEvent> {
        let mut events = Vec::new();
        while let Ok(completion) = self.receiver.try_recv() {
            self.complete(completion, &mut events);
        }
        self.dispatch();
        events
    }

    /// Block until every request has finished or `timeout` elapses.
    pub fn wait_idle(&mut self, timeout: Duration) -> Vec<ImageEvent> {
        let deadline = Instant::now() + timeout;
        let mut events = self.poll();
        while !self.is_idle() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(completion) => {
                    self.complete(completion, &mut events);
                    self.dispatch();
                }
                Err(_) => {
                    log::warn!(
                        "gave up waiting on {} running and {} queued image requests",
                        self.in_flight,
                        self.waiting.len()
                    );
                    break;
                }
            }
        }
        events
    }

    fn complete(&mut self, completion: Completion, events: &mut Vec<ImageEvent>) {
        self.in_flight -= 1;
        let Completion { job, result } = completion;
        match result {
            Ok(images) => {
                log::info!("generated {} images", images.len());
                events.push(ImageEvent::Ready { images });
            }
            Err(error) if job.attempt < self.max_attempts => {
                log::warn!(
                    "image request {:?} failed on attempt {}: {error}, retrying",
                    job.request.image_ids(),
                    job.attempt
                );
                self.waiting.push_back(Job {
                    request: job.request,
                    attempt: job.attempt + 1,
                });
            }
            Err(error) => {
                log::warn!(
                    "image request {:?} failed after {} attempts: {error}",
                    job.request.image_ids(),
                    job.attempt
                );
                events.push(ImageEvent::Failed {
                    image_ids: job.request.image_ids(),
                    attempts: job.attempt,
                    error,
                });
            }
        }
    }

    fn dispatch(&mut self) {
        while self.in_flight < self.max_workers {
            let Some(job) = self.waiting.pop_front() else {
                break;
            };
            let generator = Arc::clone(&self.generator);
            let sender = self.sender.clone();
            // Receiver lives as long as the pool; a send error only means it was dropped.
            thread::spawn(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(|| generator.generate(&job.request)))
                    .unwrap_or(Err(ImageGenError::WorkerPanicked));
                let _ = sender.send(Completion { job, result });
            });
            self.in_flight += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imagegen::RequestTile;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn request(first_id: u64) -> ImageRequest {
        ImageRequest {
            members: (0..3)
                .map(|i| RequestTile {
                    image_id: first_id + i,
                    x: 0.1 * i as f64,
                    z: 0.0,
                })
                .collect(),
            world: Vec::new(),
        }
    }

    /// Fails the first `failures` calls, then succeeds.
    struct Flaky {
        failures: usize,
        calls: AtomicUsize,
    }

    impl ImageGenerator for Flaky {
        fn generate(&self, request: &ImageRequest) -> Result<Vec<(u64, ImageHandle)>, ImageGenError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(ImageGenError::MissingOutput {
                    path: format!("call{call}").into(),
                });
            }
            Ok(request
                .members
                .iter()
                .map(|t| (t.image_id, ImageHandle::new(format!("tile{}.png", t.image_id))))
                .collect())
        }
    }

    /// Records the peak number of concurrent calls.
    struct Counting {
        active: AtomicUsize,
        peak: Mutex<usize>,
    }

    impl ImageGenerator for Counting {
        fn generate(&self, request: &ImageRequest) -> Result<Vec<(u64, ImageHandle)>, ImageGenError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            {
                let mut peak = self.peak.lock().unwrap();
                *peak = (*peak).max(now);
            }
            thread::sleep(Duration::from_millis(20));
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(request
                .members
                .iter()
                .map(|t| (t.image_id, ImageHandle::new("x.png")))
                .collect())
        }
    }

    struct Panicking;

    impl ImageGenerator for Panicking {
        fn generate(&self, _: &ImageRequest) -> Result<Vec<(u64, ImageHandle)>, ImageGenError> {
            panic!("generator blew up");
        }
    }

    #[test]
    fn test_retry_once_then_succeed() {
        let generator = Arc::new(Flaky {
            failures: 1,
            calls: AtomicUsize::new(0),
        });
        let mut pool = ImagePool::new(generator.clone(), 1, 2);
        pool.submit(request(1));
        let events = pool.wait_idle(Duration::from_secs(10));
        assert_eq!(events.len(), 1);
        match &events[0] {
            ImageEvent::Ready { images } => {
                assert_eq!(images.iter().map(|i| i.0).collect::<Vec<_>>(), [1, 2, 3]);
            }
            other => panic!("expected success, got {other:?}"),
        }
        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
        assert!(pool.is_idle());
    }

    #[test]
    fn test_permanent_failure_after_max_attempts() {
        let generator = Arc::new(Flaky {
            failures: usize::MAX,
            calls: AtomicUsize::new(0),
        });
        let mut pool = ImagePool::new(generator.clone(), 2, 2);
        pool.submit(request(10));
        let events = pool.wait_idle(Duration::from_secs(10));
        assert_eq!(events.len(), 1);
        match &events[0] {
            ImageEvent::Failed {
                image_ids,
                attempts,
                ..
            } => {
                assert_eq!(image_ids, &[10, 11, 12]);
                assert_eq!(*attempts, 2);
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_worker_cap_is_respected() {
        let generator = Arc::new(Counting {
            active: AtomicUsize::new(0),
            peak: Mutex::new(0),
        });
        let mut pool = ImagePool::new(generator.clone(), 2, 1);
        for i in 0..6 {
            pool.submit(request(i * 3));
        }
        assert_eq!(pool.in_flight(), 2);
        assert_eq!(pool.waiting(), 4);
        let events = pool.wait_idle(Duration::from_secs(10));
        assert_eq!(events.len(), 6);
        assert!(*generator.peak.lock().unwrap() <= 2);
    }

    #[test]
    fn test_panicking_worker_reports_failure() {
        let mut pool = ImagePool::new(Arc::new(Panicking), 1, 1);
        pool.submit(request(0));
        let events = pool.wait_idle(Duration::from_secs(10));
        assert!(matches!(
            events.as_slice(),
            [ImageEvent::Failed {
                error: ImageGenError::WorkerPanicked,
                ..
            }]
        ));
    }

    #[test]
    fn test_poll_does_not_block() {
        let generator = Arc::new(Counting {
            active: AtomicUsize::new(0),
            peak: Mutex::new(0),
        });
        let mut pool = ImagePool::new(generator, 1, 1);
        pool.submit(request(0));
        // Still sleeping inside the worker
        assert!(pool.poll().is_empty());
        assert!(!pool.is_idle());
        pool.wait_idle(Duration::from_secs(10));
    }
}
