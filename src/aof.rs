//! Append-only persistence of mutating commands.
//!
//! Every record is the RESP encoding of one request array, written in the
//! order the commands were applied. The file carries no header or index, so it
//! stays readable as a plain concatenation of frames. At startup the whole
//! file is replayed through the command table before any client is served.

use std::{
    future::Future,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use thiserror::Error;
use tokio::{
    fs::{self, File, OpenOptions},
    io::AsyncWriteExt,
    sync::Mutex,
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{
    commands::{CommandError, CommandHandler, CommandTable, DispatchError},
    key_value_store::Store,
    resp::{RespError, RespValue},
};

/// How often buffered writes are forced to stable storage.
pub const SYNC_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Error, Debug)]
pub enum AofError {
    #[error("failed to open append-only file {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write to append-only file: {0}")]
    Write(std::io::Error),
    #[error("failed to sync append-only file: {0}")]
    Sync(std::io::Error),
    #[error("append-only file sync task failed: {0}")]
    SyncTask(#[from] tokio::task::JoinError),
    #[error("failed to read append-only file: {0}")]
    Read(std::io::Error),
    #[error("corrupt append-only file at byte {offset}: {source}")]
    Corrupt { offset: usize, source: RespError },
    #[error("invalid command in append-only file at byte {offset}: {source}")]
    InvalidRecord { offset: usize, source: CommandError },
    #[error("append-only file at byte {offset}: {source}")]
    UnknownRecord {
        offset: usize,
        source: DispatchError,
    },
}

#[derive(Debug)]
pub struct Aof {
    path: PathBuf,
    file: Mutex<File>,
}

impl Aof {
    /// Opens the log at `path`, creating it (and its directory) if needed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, AofError> {
        let path = path.as_ref().to_path_buf();
        let open_error = |source: std::io::Error| AofError::Open {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(open_error)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(open_error)?;

        debug!("Opened append-only file {}", path.display());

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the encoded request to the end of the log.
    pub async fn append(&self, request: &RespValue) -> Result<(), AofError> {
        let encoded = request.encode();

        let mut file_guard = self.file.lock().await;
        file_guard.write_all(&encoded).await.map_err(AofError::Write)?;
        file_guard.flush().await.map_err(AofError::Write)?;

        Ok(())
    }

    /// Forces everything written so far to stable storage.
    pub async fn sync(&self) -> Result<(), AofError> {
        let file_guard = self.file.lock().await;
        file_guard.sync_all().await.map_err(AofError::Sync)
    }

    /// Flushes and syncs the file ahead of shutdown.
    pub async fn close(&self) -> Result<(), AofError> {
        let mut file_guard = self.file.lock().await;
        file_guard.flush().await.map_err(AofError::Write)?;
        file_guard.sync_all().await.map_err(AofError::Sync)?;

        info!("Closed append-only file {}", self.path.display());
        Ok(())
    }

    /// Decodes every record in the file, from the beginning.
    ///
    /// Reaching the end of the file between records is the normal way out;
    /// anything left over that does not decode is reported as corruption.
    pub async fn read_all(&self) -> Result<Vec<(usize, RespValue)>, AofError> {
        let contents = {
            let _file_guard = self.file.lock().await;
            fs::read(&self.path).await.map_err(AofError::Read)?
        };

        let mut records = Vec::new();
        let mut offset = 0;

        while offset < contents.len() {
            let (value, consumed) = RespValue::decode(&contents[offset..])
                .map_err(|source| AofError::Corrupt { offset, source })?;

            records.push((offset, value));
            offset += consumed;
        }

        Ok(records)
    }

    /// Calls `apply` on every record in log order and returns how many there
    /// were. Nothing is applied unless the whole file decodes.
    pub async fn replay_all<F, Fut>(&self, mut apply: F) -> Result<usize, AofError>
    where
        F: FnMut(usize, RespValue) -> Fut,
        Fut: Future<Output = Result<(), AofError>>,
    {
        let records = self.read_all().await?;
        let count = records.len();

        for (offset, record) in records {
            apply(offset, record).await?;
        }

        Ok(count)
    }

    /// Starts the background task that syncs the file every `period`.
    pub fn spawn_sync_task(self: &Arc<Self>, period: Duration) -> AofSyncTask {
        let aof = Arc::clone(self);

        AofSyncTask::spawn(period, move || {
            let aof = Arc::clone(&aof);
            async move { aof.sync().await }
        })
    }
}

/// Handle to the periodic sync task started by [`Aof::spawn_sync_task`].
#[derive(Debug)]
pub struct AofSyncTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl AofSyncTask {
    /// Runs `sync` every `period` until stopped. A failed sync is logged and
    /// tried again on the next tick, so the task only ends through
    /// [`AofSyncTask::stop`].
    pub fn spawn<F, Fut>(period: Duration, mut sync: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), AofError>> + Send + 'static,
    {
        let token = CancellationToken::new();
        let cancelled = token.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            let mut failing = false;

            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => return,
                    _ = interval.tick() => match sync().await {
                        Ok(()) if failing => {
                            info!("Append-only file sync recovered");
                            failing = false;
                        }
                        Ok(()) => {}
                        Err(err) => {
                            error!("Append-only file sync failed, retrying: {}", err);
                            failing = true;
                        }
                    }
                }
            }
        });

        Self { token, handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stops the task and waits for it to exit.
    pub async fn stop(self) -> Result<(), AofError> {
        self.token.cancel();
        self.handle.await?;

        Ok(())
    }
}

/// Rebuilds `store` from the log by running every record through `table`.
pub async fn replay(aof: &Aof, table: &CommandTable, store: &dyn Store) -> Result<usize, AofError> {
    let count = aof
        .replay_all(|offset, record| async move {
            let command_handler = CommandHandler::new(record)
                .map_err(|source| AofError::InvalidRecord { offset, source })?;

            let response = table
                .dispatch(&command_handler, store)
                .await
                .map_err(|source| AofError::UnknownRecord { offset, source })?;

            if let RespValue::Error(message) = response {
                debug!("Replayed record at byte {} failed: {}", offset, message);
            }

            Ok::<(), AofError>(())
        })
        .await?;

    info!(
        "Replayed {} commands from {}",
        count,
        aof.path().display()
    );

    Ok(count)
}
