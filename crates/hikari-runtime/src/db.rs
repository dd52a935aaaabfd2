use std::path::Path;

use tokio::sync::{mpsc, oneshot};

use hikari_core::error::HikariError;
use hikari_core::storage::{CoverRecord, HeaderRecord, Storage};

/// Async handle to the image index, which lives on its own thread.
#[derive(Clone)]
pub struct IndexHandle {
    tx: mpsc::UnboundedSender<IndexCommand>,
}

enum IndexCommand {
    GetCover {
        owner_id: i64,
        source_kind: String,
        index: i64,
        reply: oneshot::Sender<Result<Option<CoverRecord>, HikariError>>,
    },
    UpsertCover {
        record: CoverRecord,
        reply: oneshot::Sender<Result<(), HikariError>>,
    },
    GetHeader {
        mid: i64,
        reply: oneshot::Sender<Result<Option<HeaderRecord>, HikariError>>,
    },
    UpsertHeader {
        record: HeaderRecord,
        reply: oneshot::Sender<Result<(), HikariError>>,
    },
}

impl IndexHandle {
    pub fn open(path: &Path) -> Result<Self, HikariError> {
        Self::spawn(Storage::open(path)?)
    }

    /// Index backed by an in-memory database.
    pub fn open_memory() -> Result<Self, HikariError> {
        Self::spawn(Storage::open_memory()?)
    }

    fn spawn(storage: Storage) -> Result<Self, HikariError> {
        let (tx, rx) = mpsc::unbounded_channel();

        std::thread::Builder::new()
            .name("image-index".into())
            .spawn(move || actor_loop(storage, rx))?;

        Ok(Self { tx })
    }

    pub async fn get_cover(
        &self,
        owner_id: i64,
        source_kind: &str,
        index: i64,
    ) -> Result<Option<CoverRecord>, HikariError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(IndexCommand::GetCover {
            owner_id,
            source_kind: source_kind.to_string(),
            index,
            reply,
        });
        rx.await.unwrap_or(Err(HikariError::IndexClosed))
    }

    pub async fn upsert_cover(&self, record: CoverRecord) -> Result<(), HikariError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(IndexCommand::UpsertCover { record, reply });
        rx.await.unwrap_or(Err(HikariError::IndexClosed))
    }

    pub async fn get_header(&self, mid: i64) -> Result<Option<HeaderRecord>, HikariError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(IndexCommand::GetHeader { mid, reply });
        rx.await.unwrap_or(Err(HikariError::IndexClosed))
    }

    pub async fn upsert_header(&self, record: HeaderRecord) -> Result<(), HikariError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(IndexCommand::UpsertHeader { record, reply });
        rx.await.unwrap_or(Err(HikariError::IndexClosed))
    }
}

fn actor_loop(storage: Storage, mut rx: mpsc::UnboundedReceiver<IndexCommand>) {
    while let Some(cmd) = rx.blocking_recv() {
        match cmd {
            IndexCommand::GetCover {
                owner_id,
                source_kind,
                index,
                reply,
            } => {
                let _ = reply.send(storage.get_cover(owner_id, &source_kind, index));
            }
            IndexCommand::UpsertCover { record, reply } => {
                let _ = reply.send(storage.upsert_cover(&record));
            }
            IndexCommand::GetHeader { mid, reply } => {
                let _ = reply.send(storage.get_header(mid));
            }
            IndexCommand::UpsertHeader { record, reply } => {
                let _ = reply.send(storage.upsert_header(&record));
            }
        }
    }
    tracing::debug!("Image index actor stopped");
}
