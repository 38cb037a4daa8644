// src/service.rs - Note service task
//
// The service owns a NoteStore on a single tokio task. Callers hold a cheap
// cloneable handle and talk to the task over a channel, so every command
// runs to completion before the next one starts. The same loop sleeps until
// the autosave deadline and performs the debounced write.
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use log::{debug, error, info, trace};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

use crate::{
    read_import_file, status_counts, write_export, Config, ImportReport, JsonFileSlot, Note,
    NoteError, NotePatch, NoteStore, Persistence, Result, SaveStatus, StatusCounts, ViewConfig,
};

#[derive(Debug)]
pub enum NoteCommand {
    Create {
        reply: oneshot::Sender<Note>,
    },
    Update {
        id: String,
        patch: NotePatch,
        reply: oneshot::Sender<bool>,
    },
    SoftDelete {
        id: String,
        reply: oneshot::Sender<bool>,
    },
    Restore {
        id: String,
        reply: oneshot::Sender<bool>,
    },
    Purge {
        id: String,
        reply: oneshot::Sender<bool>,
    },
    AddTag {
        id: String,
        tag: String,
        reply: oneshot::Sender<bool>,
    },
    RemoveTag {
        id: String,
        tag: String,
        reply: oneshot::Sender<bool>,
    },
    Select {
        id: String,
        reply: oneshot::Sender<bool>,
    },
    Get {
        id: String,
        reply: oneshot::Sender<Option<Note>>,
    },
    Selected {
        reply: oneshot::Sender<Option<Note>>,
    },
    View {
        config: ViewConfig,
        reply: oneshot::Sender<Vec<Note>>,
    },
    Vocabulary {
        reply: oneshot::Sender<BTreeSet<String>>,
    },
    Counts {
        reply: oneshot::Sender<StatusCounts>,
    },
    Import {
        payload: String,
        reply: oneshot::Sender<Result<ImportReport>>,
    },
    Export {
        dir: PathBuf,
        reply: oneshot::Sender<Result<PathBuf>>,
    },
    SaveNow {
        reply: oneshot::Sender<Result<()>>,
    },
    Status {
        reply: oneshot::Sender<SaveStatus>,
    },
    /// Flush any pending autosave and stop the task
    Shutdown {
        reply: oneshot::Sender<Result<()>>,
    },
}

/// Handle to a running note service.
#[derive(Debug, Clone)]
pub struct NoteService {
    /// Channel to send commands to the service task
    command_tx: mpsc::Sender<NoteCommand>,

    /// Where exports go unless told otherwise
    export_dir: PathBuf,
}

impl NoteService {
    /// Opens the JSON file slot described by `config` and starts the service.
    pub fn open(config: &Config) -> Result<(Self, JoinHandle<()>)> {
        config.validate()?;
        let slot = JsonFileSlot::new(config.slot_path());
        info!("Opening note service on {}", slot.path().display());
        let store = NoteStore::open(slot, config);
        Ok(Self::spawn(store, config))
    }

    /// Starts the service task over an already opened store.
    pub fn spawn<P>(store: NoteStore<P>, config: &Config) -> (Self, JoinHandle<()>)
    where
        P: Persistence + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::channel(32);
        let task = tokio::spawn(run(store, command_rx));

        let service = Self {
            command_tx,
            export_dir: config.export_dir.clone(),
        };
        (service, task)
    }

    pub async fn create(&self) -> Result<Note> {
        self.request(|reply| NoteCommand::Create { reply }).await
    }

    pub async fn update(&self, id: &str, patch: NotePatch) -> Result<bool> {
        let id = id.to_string();
        self.request(|reply| NoteCommand::Update { id, patch, reply })
            .await
    }

    pub async fn soft_delete(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.request(|reply| NoteCommand::SoftDelete { id, reply })
            .await
    }

    pub async fn restore(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.request(|reply| NoteCommand::Restore { id, reply }).await
    }

    pub async fn purge(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.request(|reply| NoteCommand::Purge { id, reply }).await
    }

    pub async fn add_tag(&self, id: &str, tag: &str) -> Result<bool> {
        let (id, tag) = (id.to_string(), tag.to_string());
        self.request(|reply| NoteCommand::AddTag { id, tag, reply })
            .await
    }

    pub async fn remove_tag(&self, id: &str, tag: &str) -> Result<bool> {
        let (id, tag) = (id.to_string(), tag.to_string());
        self.request(|reply| NoteCommand::RemoveTag { id, tag, reply })
            .await
    }

    pub async fn select(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.request(|reply| NoteCommand::Select { id, reply }).await
    }

    pub async fn get(&self, id: &str) -> Result<Option<Note>> {
        let id = id.to_string();
        self.request(|reply| NoteCommand::Get { id, reply }).await
    }

    /// Like [`NoteService::get`], but a missing note is an error.
    pub async fn require(&self, id: &str) -> Result<Note> {
        self.get(id).await?.ok_or_else(|| NoteError::NotFound {
            id: id.to_string(),
        })
    }

    pub async fn selected(&self) -> Result<Option<Note>> {
        self.request(|reply| NoteCommand::Selected { reply }).await
    }

    pub async fn view(&self, config: ViewConfig) -> Result<Vec<Note>> {
        self.request(|reply| NoteCommand::View { config, reply })
            .await
    }

    pub async fn vocabulary(&self) -> Result<BTreeSet<String>> {
        self.request(|reply| NoteCommand::Vocabulary { reply }).await
    }

    pub async fn counts(&self) -> Result<StatusCounts> {
        self.request(|reply| NoteCommand::Counts { reply }).await
    }

    /// Replaces the whole collection with the notes in `payload`.
    pub async fn import(&self, payload: String) -> Result<ImportReport> {
        self.request(|reply| NoteCommand::Import { payload, reply })
            .await?
    }

    /// Reads `path` without blocking the service, then imports it.
    pub async fn import_file(&self, path: &Path) -> Result<ImportReport> {
        let payload = read_import_file(path).await?;
        self.import(payload).await
    }

    /// Writes a dated export file into the configured export directory.
    pub async fn export(&self) -> Result<PathBuf> {
        self.export_to(&self.export_dir).await
    }

    pub async fn export_to(&self, dir: &Path) -> Result<PathBuf> {
        let dir = dir.to_path_buf();
        self.request(|reply| NoteCommand::Export { dir, reply })
            .await?
    }

    pub async fn save_now(&self) -> Result<()> {
        self.request(|reply| NoteCommand::SaveNow { reply }).await?
    }

    pub async fn status(&self) -> Result<SaveStatus> {
        self.request(|reply| NoteCommand::Status { reply }).await
    }

    /// Flushes pending edits and stops the service task.
    pub async fn shutdown(&self) -> Result<()> {
        info!("Note service stopping...");
        self.request(|reply| NoteCommand::Shutdown { reply }).await?
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> NoteCommand,
    ) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.command_tx
            .send(make(reply_tx))
            .await
            .map_err(|e| NoteError::ServiceStopped {
                message: format!("Failed to send command: {}", e),
            })?;

        reply_rx.await.map_err(|e| NoteError::ServiceStopped {
            message: format!("No reply from note service: {}", e),
        })
    }
}

async fn run<P: Persistence>(mut store: NoteStore<P>, mut command_rx: mpsc::Receiver<NoteCommand>) {
    info!("Note service started with {} notes", store.len());

    loop {
        let deadline = store.autosave_deadline();

        tokio::select! {
            _ = time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                store.flush_if_due(Instant::now());
            }
            command = command_rx.recv() => match command {
                Some(NoteCommand::Shutdown { reply }) => {
                    let outcome = flush_pending(&mut store);
                    let _ = reply.send(outcome);
                    break;
                }
                Some(command) => handle(&mut store, command),
                None => {
                    debug!("All service handles dropped");
                    if let Err(e) = flush_pending(&mut store) {
                        error!("Final autosave failed: {}", e);
                    }
                    break;
                }
            }
        }
    }

    info!("Note service stopped");
}

fn flush_pending<P: Persistence>(store: &mut NoteStore<P>) -> Result<()> {
    if store.autosave_deadline().is_some() {
        debug!("Flushing pending autosave before stopping");
        store.save_now()
    } else {
        Ok(())
    }
}

/// Runs one command against the store. A dropped reply channel just means
/// the caller stopped waiting.
fn handle<P: Persistence>(store: &mut NoteStore<P>, command: NoteCommand) {
    trace!("Handling command: {:?}", command);
    match command {
        NoteCommand::Create { reply } => {
            let _ = reply.send(store.create());
        }
        NoteCommand::Update { id, patch, reply } => {
            let _ = reply.send(store.update(&id, patch));
        }
        NoteCommand::SoftDelete { id, reply } => {
            let _ = reply.send(store.soft_delete(&id));
        }
        NoteCommand::Restore { id, reply } => {
            let _ = reply.send(store.restore(&id));
        }
        NoteCommand::Purge { id, reply } => {
            let _ = reply.send(store.purge(&id));
        }
        NoteCommand::AddTag { id, tag, reply } => {
            let _ = reply.send(store.add_tag(&id, &tag));
        }
        NoteCommand::RemoveTag { id, tag, reply } => {
            let _ = reply.send(store.remove_tag(&id, &tag));
        }
        NoteCommand::Select { id, reply } => {
            let _ = reply.send(store.select(&id));
        }
        NoteCommand::Get { id, reply } => {
            let _ = reply.send(store.get(&id).cloned());
        }
        NoteCommand::Selected { reply } => {
            let _ = reply.send(store.selected().cloned());
        }
        NoteCommand::View { config, reply } => {
            let view = store.view(&config).into_iter().cloned().collect();
            let _ = reply.send(view);
        }
        NoteCommand::Vocabulary { reply } => {
            let _ = reply.send(store.vocabulary());
        }
        NoteCommand::Counts { reply } => {
            let _ = reply.send(status_counts(store.notes()));
        }
        NoteCommand::Import { payload, reply } => {
            let outcome = store.import(&payload);
            if let Err(e) = &outcome {
                error!("Import rejected: {}", e);
            }
            let _ = reply.send(outcome);
        }
        NoteCommand::Export { dir, reply } => {
            let _ = reply.send(write_export(&dir, store.notes()));
        }
        NoteCommand::SaveNow { reply } => {
            let _ = reply.send(store.save_now());
        }
        NoteCommand::Status { reply } => {
            let _ = reply.send(store.status().clone());
        }
        NoteCommand::Shutdown { reply } => {
            let _ = reply.send(Ok(()));
        }
    }
}
