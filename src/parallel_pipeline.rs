// THEORY:
// Data loaders augment many samples at once. `ParallelPipeline` fans a batch
// of samples out over a fixed pool of tokio worker tasks that all share one
// read-only `PairedPipeline`, and gathers the results back in submission
// order.
//
// Key architectural principles:
// 1.  **Shared Registry, Private State**: Workers hold an `Arc` of the same
//     pipeline. Everything mutable (resolution maps, the random generator)
//     is created per sample inside the worker, so no locks are needed.
// 2.  **Reproducible Randomness**: Each sample's generator is seeded from the
//     pool's base seed and the sample id. The output of a batch therefore does
//     not depend on which worker happened to run which sample, or on how many
//     workers there are.
// 3.  **Round-Robin Dispatch**: A single dispatcher task hands tasks to the
//     workers in turn, and each task carries a oneshot channel for its reply.
// 4.  **All or Nothing**: A batch either comes back complete and in order, or
//     the first failing sample's error is returned.

use crate::config::PipelineConfig;
use crate::core_modules::keyed_collection::KeyedCollection;
use crate::error::{AugmentError, Result};
use crate::pipeline::PairedPipeline;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

const SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// One training sample travelling through the worker pool.
#[derive(Debug, Clone)]
pub struct Sample {
    /// Caller-chosen id; also selects the sample's random stream.
    pub id: u64,
    pub input: KeyedCollection,
    pub target: KeyedCollection,
}

impl Sample {
    pub fn new(id: u64, input: KeyedCollection, target: KeyedCollection) -> Self {
        Self { id, input, target }
    }
}

struct AugmentTask {
    sample: Sample,
    result_sender: oneshot::Sender<Result<Sample>>,
}

/// Seed of the generator used for sample `id`.
pub fn sample_seed(base_seed: u64, id: u64) -> u64 {
    base_seed ^ id.wrapping_mul(SEED_MIX)
}

pub struct WorkerPool {
    task_sender: mpsc::UnboundedSender<AugmentTask>,
    workers: Vec<tokio::task::JoinHandle<()>>,
    dispatcher: tokio::task::JoinHandle<()>,
}

impl WorkerPool {
    /// Spawns `worker_count` workers (at least one). Must be called from
    /// within a tokio runtime.
    pub fn new(pipeline: Arc<PairedPipeline>, worker_count: usize, base_seed: u64) -> Self {
        let worker_count = worker_count.max(1);
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<AugmentTask>();

        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..worker_count)
            .map(|_| mpsc::unbounded_channel::<AugmentTask>())
            .unzip();

        let dispatcher = tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                if let Err(mpsc::error::SendError(task)) = worker_senders[worker_idx].send(task) {
                    let _ = task.result_sender.send(Err(AugmentError::WorkerUnavailable));
                }
                worker_idx = (worker_idx + 1) % worker_count;
            }
        });

        let mut workers = Vec::with_capacity(worker_count);
        for mut worker_receiver in worker_receivers {
            let worker_pipeline = Arc::clone(&pipeline);
            let worker = tokio::spawn(async move {
                while let Some(task) = worker_receiver.recv().await {
                    let result = Self::process_sample(&worker_pipeline, task.sample, base_seed);
                    let _ = task.result_sender.send(result);
                }
            });
            workers.push(worker);
        }

        info!(workers = worker_count, base_seed, "augmentation worker pool started");
        Self {
            task_sender,
            workers,
            dispatcher,
        }
    }

    fn process_sample(pipeline: &PairedPipeline, sample: Sample, base_seed: u64) -> Result<Sample> {
        let mut rng = StdRng::seed_from_u64(sample_seed(base_seed, sample.id));
        let (input, target) = pipeline.transform(sample.input, sample.target, &mut rng)?;
        Ok(Sample {
            id: sample.id,
            input,
            target,
        })
    }

    pub async fn augment(&self, sample: Sample) -> Result<Sample> {
        let (result_sender, result_receiver) = oneshot::channel();
        self.task_sender
            .send(AugmentTask { sample, result_sender })
            .map_err(|_| AugmentError::WorkerUnavailable)?;

        result_receiver.await.map_err(|_| AugmentError::WorkerUnavailable)?
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Closes the task queue and waits for every worker to drain.
    pub async fn shutdown(self) {
        drop(self.task_sender);
        let _ = self.dispatcher.await;
        for worker in self.workers {
            let _ = worker.await;
        }
        debug!("augmentation worker pool stopped");
    }
}

pub struct ParallelPipeline {
    worker_pool: WorkerPool,
    next_id: AtomicU64,
}

impl ParallelPipeline {
    pub fn new(pipeline: PairedPipeline, workers: usize, base_seed: u64) -> Self {
        Self {
            worker_pool: WorkerPool::new(Arc::new(pipeline), workers, base_seed),
            next_id: AtomicU64::new(0),
        }
    }

    /// Builds the pipeline from `config`. Without a configured seed a random
    /// one is drawn, and batches are then not reproducible across runs.
    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        let pipeline = config.build()?;
        let workers = config.workers.unwrap_or_else(num_cpus::get);
        let seed = config.seed.unwrap_or_else(rand::random);
        Ok(Self::new(pipeline, workers, seed))
    }

    pub fn worker_count(&self) -> usize {
        self.worker_pool.worker_count()
    }

    /// Augments every sample; results come back in submission order.
    pub async fn augment_batch(&self, samples: Vec<Sample>) -> Result<Vec<Sample>> {
        let started = Instant::now();
        let pending = samples.into_iter().map(|sample| self.worker_pool.augment(sample));
        let augmented = futures::future::try_join_all(pending).await?;
        info!(
            samples = augmented.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "augmented batch"
        );
        Ok(augmented)
    }

    /// Augments one (input, target) pair under the next free sample id.
    pub async fn augment(
        &self,
        input: KeyedCollection,
        target: KeyedCollection,
    ) -> Result<(KeyedCollection, KeyedCollection)> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let sample = self.worker_pool.augment(Sample::new(id, input, target)).await?;
        Ok((sample.input, sample.target))
    }

    pub async fn shutdown(self) {
        self.worker_pool.shutdown().await;
    }
}
