use std::sync::Arc;
use std::thread;

use anyhow::{anyhow, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::debug;

use crate::data::{FeedPage, FeedService, PageRequest};
use crate::session::Generation;

pub struct FetchResult {
    pub generation: Generation,
    pub result: Result<FeedPage>,
}

struct Job {
    generation: Generation,
    request: PageRequest,
}

/// Runs feed fetches off the caller's thread. Results come back in request
/// order on [`Fetcher::results`], tagged with the generation they were
/// issued for.
pub struct Fetcher {
    jobs: Sender<Job>,
    stop: Sender<()>,
    results: Receiver<FetchResult>,
    handle: Option<thread::JoinHandle<()>>,
}

impl Fetcher {
    pub fn new(feed: Arc<dyn FeedService>) -> Self {
        let (job_tx, job_rx) = unbounded::<Job>();
        let (stop_tx, stop_rx) = unbounded::<()>();
        let (result_tx, result_rx) = unbounded::<FetchResult>();

        let handle = thread::spawn(move || worker(feed, job_rx, stop_rx, result_tx));

        Self {
            jobs: job_tx,
            stop: stop_tx,
            results: result_rx,
            handle: Some(handle),
        }
    }

    /// Queues a fetch. Fails only when the worker thread has gone away.
    pub fn request(&self, generation: Generation, request: PageRequest) -> Result<()> {
        self.jobs
            .send(Job {
                generation,
                request,
            })
            .map_err(|_| anyhow!("feed fetcher stopped"))
    }

    pub fn results(&self) -> &Receiver<FetchResult> {
        &self.results
    }

    fn shutdown(&mut self) {
        let _ = self.stop.send(());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Fetcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker(
    feed: Arc<dyn FeedService>,
    jobs: Receiver<Job>,
    stop: Receiver<()>,
    results: Sender<FetchResult>,
) {
    loop {
        crossbeam_channel::select! {
            recv(stop) -> _ => break,
            recv(jobs) -> msg => {
                let Ok(job) = msg else { break };
                debug!(
                    generation = job.generation.value(),
                    after = ?job.request.after,
                    "fetching feed page"
                );
                let result = feed.fetch_page(&job.request);
                if results
                    .send(FetchResult {
                        generation: job.generation,
                        result,
                    })
                    .is_err()
                {
                    break;
                }
            }
        }
    }
}
