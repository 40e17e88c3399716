//! Single-thread ownership of the document provider.
//!
//! Host object models are not safe for concurrent access. A [`DocumentHost`]
//! creates the provider on a dedicated OS thread and executes submitted
//! closures there, strictly one after another. Async code (provider fetches,
//! background search) stays on the tokio runtime and hands document work to
//! the host with [`DocumentHost::run`].
//!
//! One closure is one logical operation: nested calls inside it are plain
//! method calls on the same `&mut dyn DocumentProvider`, and no other closure
//! can observe the document until it returns. This gives mutating operations
//! their prune → mutate → persist atomicity without a reentrant lock.
//!
//! # Examples
//!
//! ```rust,no_run
//! use zpcite_cli::document::{DocumentHost, DocumentProvider, MemoryDocument};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let host = DocumentHost::spawn(|| Ok(MemoryDocument::with_pages(2))).await?;
//! let pages = host.run(|doc| doc.pages()).await??;
//! assert_eq!(pages.len(), 2);
//! # Ok(())
//! # }
//! ```

use super::{DocumentProvider, HostError};
use crate::core::ZpError;
use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

type Job = Box<dyn FnOnce(&mut dyn DocumentProvider) + Send>;

/// Handle to the thread owning the document provider.
pub struct DocumentHost {
    sender: Option<mpsc::UnboundedSender<Job>>,
    thread: Option<JoinHandle<()>>,
}

impl DocumentHost {
    /// Start the owning thread and build the provider on it with `factory`.
    ///
    /// Returns the factory's error if the provider cannot be created.
    pub async fn spawn<F, D>(factory: F) -> Result<Self, ZpError>
    where
        F: FnOnce() -> Result<D, HostError> + Send + 'static,
        D: DocumentProvider + 'static,
    {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();
        let (ready_tx, ready_rx) = oneshot::channel::<Result<(), HostError>>();

        let thread = std::thread::Builder::new()
            .name("zpcite-document".to_string())
            .spawn(move || {
                let mut doc = match factory() {
                    Ok(doc) => {
                        let _ = ready_tx.send(Ok(()));
                        doc
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                while let Some(job) = receiver.blocking_recv() {
                    job(&mut doc);
                }
                debug!("Document host thread stopped");
            })?;

        ready_rx.await.map_err(|_| ZpError::HostUnavailable)??;

        Ok(Self {
            sender: Some(sender),
            thread: Some(thread),
        })
    }

    /// Run `operation` on the owning thread and return its result.
    pub async fn run<R, F>(&self, operation: F) -> Result<R, ZpError>
    where
        F: FnOnce(&mut dyn DocumentProvider) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job: Job = Box::new(move |doc| {
            let _ = reply_tx.send(operation(doc));
        });

        self.sender
            .as_ref()
            .ok_or(ZpError::HostUnavailable)?
            .send(job)
            .map_err(|_| ZpError::HostUnavailable)?;

        reply_rx.await.map_err(|_| ZpError::HostUnavailable)
    }
}

impl Drop for DocumentHost {
    fn drop(&mut self) {
        // Closing the channel ends the thread loop once queued jobs are done.
        self.sender.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
