use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;
use tracing::{debug, error, warn};

use ventq_core::{ResultSummary, Task};
use ventq_protocol::{qio, AssignResponse, Message, MessageCodec, ProtocolError};

/// Filesystem identity of the two queues, derived from the coordinator's own
/// pid so concurrent runs on the same host cannot collide.
#[derive(Debug, Clone)]
pub struct QueueIdentity {
    pub task_queue: PathBuf,
    pub result_queue: PathBuf,
}

impl QueueIdentity {
    pub fn for_pid(pid: u32) -> Self {
        Self::in_dir(&std::env::temp_dir(), pid)
    }

    pub fn in_dir(dir: &Path, pid: u32) -> Self {
        QueueIdentity {
            task_queue: dir.join(format!("vq-tasks-{}.sock", pid)),
            result_queue: dir.join(format!("vq-results-{}.sock", pid)),
        }
    }

    /// Remove any queue remnants. Safe to call when nothing exists.
    pub fn destroy(&self) -> io::Result<()> {
        for path in [&self.task_queue, &self.result_queue] {
            match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

/// Write end of the task queue.
///
/// Workers connect to the socket and claim tasks; each claim is answered
/// with one task popped from a channel of exactly `capacity` slots, so a
/// send blocks while `capacity` tasks are issued but unconsumed.
///
/// `close` gives up only the sender. The endpoint keeps accepting readers
/// and handing out buffered tasks until the queue is dropped, so a worker
/// that connects late still drains the sentinel it is owed.
pub struct TaskQueue {
    tx: Option<mpsc::Sender<Task>>,
    serve: JoinHandle<()>,
}

impl TaskQueue {
    pub fn create(path: &Path, capacity: usize) -> anyhow::Result<Self> {
        let listener = UnixListener::bind(path)
            .with_context(|| format!("creating task queue {}", path.display()))?;

        let (tx, rx) = mpsc::channel(capacity);
        let rx = Arc::new(Mutex::new(rx));
        let serve = tokio::spawn(accept_claims(listener, rx));

        Ok(TaskQueue { tx: Some(tx), serve })
    }

    /// Enqueue one task, blocking while the queue is full.
    pub async fn send(&self, task: Task) -> anyhow::Result<()> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("task queue write end is closed"))?;
        tx.send(task)
            .await
            .map_err(|_| anyhow::anyhow!("task queue is no longer served"))
    }

    /// Close the write end. Readers drain whatever is buffered; a claim on
    /// the emptied queue is answered by dropping the connection.
    pub fn close(&mut self) {
        self.tx.take();
    }
}

impl Drop for TaskQueue {
    fn drop(&mut self) {
        self.serve.abort();
    }
}

async fn accept_claims(listener: UnixListener, rx: Arc<Mutex<mpsc::Receiver<Task>>>) {
    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                tokio::spawn(serve_claims(stream, Arc::clone(&rx)));
            }
            Err(e) => {
                error!("Task queue accept failed: {}", e);
                return;
            }
        }
    }
}

async fn serve_claims(stream: UnixStream, rx: Arc<Mutex<mpsc::Receiver<Task>>>) {
    let mut framed = Framed::new(stream, MessageCodec);

    loop {
        let claim = match qio::receive(&mut framed).await {
            Ok(Message::Claim(claim)) => claim,
            Ok(other) => {
                warn!(
                    "Unexpected message on task queue: {:?}",
                    other.message_type()
                );
                return;
            }
            Err(ProtocolError::QueueClosed) => return,
            Err(e) => {
                warn!("Task queue receive failed: {}", e);
                return;
            }
        };

        // Competing pop: whichever reader locks first gets the next task.
        let task = rx.lock().await.recv().await;
        let Some(task) = task else {
            // Write end closed and drained; dropping the connection tells
            // the reader the queue is gone.
            debug!("Task queue drained, releasing worker {}", claim.worker_id);
            return;
        };

        let assign = Message::Assign(AssignResponse { task });
        if let Err(e) = qio::send(&mut framed, assign).await {
            error!("Failed to hand task to worker {}: {}", claim.worker_id, e);
            return;
        }
    }
}

/// Read end of the result queue. Capacity equals the worker count, which is
/// the most messages the termination protocol ever puts on it.
pub struct ResultQueue {
    rx: mpsc::Receiver<ResultSummary>,
    serve: JoinHandle<()>,
}

impl ResultQueue {
    pub fn create(path: &Path, capacity: usize) -> anyhow::Result<Self> {
        let listener = UnixListener::bind(path)
            .with_context(|| format!("creating result queue {}", path.display()))?;

        let (tx, rx) = mpsc::channel(capacity);
        let serve = tokio::spawn(accept_reports(listener, tx));

        Ok(ResultQueue { rx, serve })
    }

    /// Receive one summary, giving up after `limit`.
    ///
    /// `None` means no result arrived in time; the slot is skipped, not
    /// retried.
    pub async fn receive(&mut self, limit: Duration) -> Option<ResultSummary> {
        match tokio::time::timeout(limit, self.rx.recv()).await {
            Ok(summary) => summary,
            Err(_) => None,
        }
    }
}

impl Drop for ResultQueue {
    fn drop(&mut self) {
        self.serve.abort();
    }
}

async fn accept_reports(listener: UnixListener, tx: mpsc::Sender<ResultSummary>) {
    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                tokio::spawn(collect_reports(stream, tx.clone()));
            }
            Err(e) => {
                error!("Result queue accept failed: {}", e);
                return;
            }
        }
    }
}

async fn collect_reports(stream: UnixStream, tx: mpsc::Sender<ResultSummary>) {
    let mut framed = Framed::new(stream, MessageCodec);

    loop {
        match qio::receive(&mut framed).await {
            Ok(Message::Report(report)) => {
                if tx.send(report.summary).await.is_err() {
                    return;
                }
            }
            Ok(other) => {
                warn!(
                    "Unexpected message on result queue: {:?}",
                    other.message_type()
                );
                return;
            }
            Err(ProtocolError::QueueClosed) => return,
            Err(e) => {
                warn!("Result queue receive failed: {}", e);
                return;
            }
        }
    }
}
