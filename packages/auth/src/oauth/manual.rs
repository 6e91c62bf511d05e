// ABOUTME: Fallback reader for authorization codes pasted by the operator
// ABOUTME: Reads lines from stdin on a detached thread (or any async stream) and forwards the first code

use std::{
    io::{self, BufRead},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
};
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    sync::mpsc,
    task::JoinHandle,
};
use tracing::{debug, info, warn};
use url::Url;

enum Worker {
    Task(JoinHandle<()>),
    Thread(Arc<AtomicBool>),
}

/// Concurrent reader for a manually entered authorization code
pub struct ManualCodeReader {
    worker: Worker,
}

impl ManualCodeReader {
    /// Read from the process's standard input
    pub fn spawn_stdin() -> (Self, mpsc::Receiver<String>) {
        Self::spawn_blocking(io::BufReader::new(io::stdin()))
    }

    /// Read a blocking source on a detached OS thread.
    ///
    /// A read in progress cannot be interrupted, so the thread is never
    /// joined: after `cancel` it exits on its next line or end of input
    /// without delivering anything. Runtime shutdown and process exit do
    /// not wait for it.
    pub fn spawn_blocking<R>(input: R) -> (Self, mpsc::Receiver<String>)
    where
        R: BufRead + Send + 'static,
    {
        let (code_tx, code_rx) = mpsc::channel(1);
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);

        let spawned = thread::Builder::new()
            .name("gcal-manual-code".to_string())
            .spawn(move || read_code_blocking(input, code_tx, flag));
        if let Err(e) = spawned {
            // The sender went down with the closure, so the receiver just closes
            warn!("Failed to start manual input reader: {}", e);
        }

        (
            Self {
                worker: Worker::Thread(cancelled),
            },
            code_rx,
        )
    }

    /// Spawn the reader as a task on the current runtime. At most one code
    /// is delivered on the returned receiver; end of input delivers nothing.
    pub fn spawn<R>(input: R) -> (Self, mpsc::Receiver<String>)
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let (code_tx, code_rx) = mpsc::channel(1);
        let handle = tokio::spawn(read_code(input, code_tx));
        (
            Self {
                worker: Worker::Task(handle),
            },
            code_rx,
        )
    }

    /// Stop waiting for input
    pub fn cancel(self) {
        match self.worker {
            Worker::Task(handle) => handle.abort(),
            Worker::Thread(cancelled) => cancelled.store(true, Ordering::SeqCst),
        }
    }
}

async fn read_code<R>(mut input: R, code_tx: mpsc::Sender<String>)
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    loop {
        line.clear();
        match input.read_line(&mut line).await {
            Ok(0) => {
                debug!("Manual input closed without a code");
                return;
            }
            Ok(_) => {
                if deliver(&line, &code_tx) {
                    return;
                }
            }
            Err(e) => {
                warn!("Failed to read manual input: {}", e);
                return;
            }
        }
    }
}

fn read_code_blocking<R>(mut input: R, code_tx: mpsc::Sender<String>, cancelled: Arc<AtomicBool>)
where
    R: BufRead,
{
    let mut line = String::new();
    loop {
        line.clear();
        let read = input.read_line(&mut line);
        if cancelled.load(Ordering::SeqCst) {
            debug!("Manual input reader cancelled");
            return;
        }
        match read {
            Ok(0) => {
                debug!("Manual input closed without a code");
                return;
            }
            Ok(_) => {
                if deliver(&line, &code_tx) {
                    return;
                }
            }
            Err(e) => {
                warn!("Failed to read manual input: {}", e);
                return;
            }
        }
    }
}

/// Forward the code in `line`, if any. Returns true once a code was seen.
fn deliver(line: &str, code_tx: &mpsc::Sender<String>) -> bool {
    let Some(code) = extract_code(line) else {
        return false;
    };
    info!("✅ Received authorization code via manual input");
    if code_tx.try_send(code).is_err() {
        debug!("Manual code arrived after the session ended");
    }
    true
}

/// Accept either the bare code or the full redirect URL it was copied from
pub fn extract_code(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(url) = Url::parse(trimmed) {
        if matches!(url.scheme(), "http" | "https") {
            return url
                .query_pairs()
                .find(|(key, _)| key == "code")
                .map(|(_, value)| value.into_owned())
                .filter(|code| !code.is_empty());
        }
    }

    Some(trimmed.to_string())
}
