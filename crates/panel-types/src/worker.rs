//! Worker pool for blocking CPU work (password hashing, token signing).
//!
//! Two lanes: `Interactive` jobs sit on a request path and are always taken
//! first, `Background` jobs are picked up only by the shared workers.

use flume::{Receiver, Sender};
use futures::channel::oneshot;
use std::{sync::Arc, thread};

use crate::prelude::*;

type Job = Box<dyn FnOnce() + Send>;
type JobQueue = Arc<Receiver<Job>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lane {
	Interactive,
	Background,
}

#[derive(Debug)]
pub struct WorkerPool {
	interactive: Sender<Job>,
	background: Sender<Job>,
}

impl WorkerPool {
	/// `dedicated` threads serve only interactive jobs, `shared` threads serve both lanes
	pub fn new(dedicated: usize, shared: usize) -> Self {
		let (interactive, rx_interactive) = flume::unbounded();
		let (background, rx_background) = flume::unbounded();

		let rx_interactive: JobQueue = Arc::new(rx_interactive);
		let rx_background: JobQueue = Arc::new(rx_background);

		for _ in 0..dedicated {
			let queues = [Arc::clone(&rx_interactive)];
			thread::spawn(move || worker_loop(&queues));
		}
		for _ in 0..shared {
			let queues = [Arc::clone(&rx_interactive), Arc::clone(&rx_background)];
			thread::spawn(move || worker_loop(&queues));
		}
		debug!("Worker pool started: {} dedicated, {} shared", dedicated, shared);

		Self { interactive, background }
	}

	/// Queue a closure on a lane, the returned future resolves to its result
	pub fn spawn<F, T>(&self, lane: Lane, f: F) -> impl Future<Output = PnResult<T>> + use<F, T>
	where
		F: FnOnce() -> T + Send + 'static,
		T: Send + 'static,
	{
		let (res_tx, res_rx) = oneshot::channel();

		let job: Job = Box::new(move || {
			let _ignore = res_tx.send(f());
		});

		let queue = match lane {
			Lane::Interactive => &self.interactive,
			Lane::Background => &self.background,
		};
		if queue.send(job).is_err() {
			error!("Failed to send job to {:?} worker queue", lane);
		}

		async move {
			res_rx.await.map_err(|_| {
				error!("Worker dropped result channel (task may have panicked)");
				Error::Internal("worker task failed".into())
			})
		}
	}

	pub fn run_immed<F, T>(&self, f: F) -> impl Future<Output = PnResult<T>> + use<F, T>
	where
		F: FnOnce() -> T + Send + 'static,
		T: Send + 'static,
	{
		self.spawn(Lane::Interactive, f)
	}

	/// Like `run_immed`, for closures returning `PnResult<T>`
	pub fn try_run_immed<F, T>(&self, f: F) -> impl Future<Output = PnResult<T>> + use<F, T>
	where
		F: FnOnce() -> PnResult<T> + Send + 'static,
		T: Send + 'static,
	{
		let fut = self.spawn(Lane::Interactive, f);
		async move { fut.await? }
	}

	pub fn run<F, T>(&self, f: F) -> impl Future<Output = PnResult<T>> + use<F, T>
	where
		F: FnOnce() -> T + Send + 'static,
		T: Send + 'static,
	{
		self.spawn(Lane::Background, f)
	}
}

fn worker_loop(queues: &[JobQueue]) {
	loop {
		// Earlier queues first, without blocking
		let job = queues.iter().find_map(|rx| rx.try_recv().ok());

		let job = match job {
			Some(job) => job,
			None => {
				let mut selector = flume::Selector::new();
				for rx in queues {
					selector = selector.recv(rx, |res| res);
				}
				match selector.wait() {
					Ok(job) => job,
					Err(flume::RecvError::Disconnected) => return,
				}
			}
		};

		if let Err(e) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(job)) {
			error!("Worker thread caught panic: {:?}", e);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_runs_on_both_lanes() {
		let pool = WorkerPool::new(1, 1);
		assert_eq!(pool.run_immed(|| 2 + 2).await.unwrap(), 4);
		assert_eq!(pool.run(|| "bg").await.unwrap(), "bg");
	}

	#[tokio::test]
	async fn test_try_run_flattens_errors() {
		let pool = WorkerPool::new(1, 0);
		let res: PnResult<()> = pool.try_run_immed(|| Err(Error::Parse)).await;
		assert!(matches!(res, Err(Error::Parse)));
	}
}

// vim: ts=4
