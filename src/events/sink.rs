use crate::{
    constants::ICON_PLACEHOLDER,
    events::model::{LogEvent, LogLevel},
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

#[async_trait]
pub trait LogSink: Send + Sync {
    async fn handle(&self, event: &LogEvent);
    async fn flush(&self) {}
}

pub struct ConsoleSink {
    level_filter: Option<LogLevel>,
}
impl ConsoleSink {
    pub fn new(level_filter: Option<LogLevel>) -> Self {
        Self { level_filter }
    }
}

#[async_trait]
impl LogSink for ConsoleSink {
    async fn handle(&self, event: &LogEvent) {
        let meta = event.meta();
        if let Some(min) = self.level_filter {
            if meta.level < min {
                return;
            }
        }
        match event {
            LogEvent::Network(n) => {
                println!(
                    "{}NET action={} addr={:?} detail={:?} corr={:?}",
                    ICON_PLACEHOLDER, n.action, n.addr, n.detail, n.meta.corr_id
                );
            }
            LogEvent::System(s) => {
                println!(
                    "{}SYS action={} detail={:?} corr={:?}",
                    ICON_PLACEHOLDER, s.action, s.detail, s.meta.corr_id
                );
            }
        }
    }
}

/// Size-based rotation settings for [`JsonFileSink`].
#[derive(Debug, Clone, Copy)]
pub struct Rotation {
    pub max_bytes: u64,
    /// Rotated files kept as `<name>.1` .. `<name>.N`; 0 disables rotation.
    pub keep: u32,
}

struct JsonFileState {
    file: Option<tokio::fs::File>,
    written: u64,
}

/// Appends one JSON object per event to a file.
pub struct JsonFileSink {
    path: PathBuf,
    rotation: Rotation,
    state: tokio::sync::Mutex<JsonFileState>,
}

impl JsonFileSink {
    pub async fn open<P: Into<PathBuf>>(path: P, rotation: Rotation) -> std::io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let file = open_append(&path).await?;
        let written = file.metadata().await.map(|m| m.len()).unwrap_or(0);
        Ok(Self {
            path,
            rotation,
            state: tokio::sync::Mutex::new(JsonFileState {
                file: Some(file),
                written,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn backup_path(&self, idx: u32) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{}", idx));
        PathBuf::from(name)
    }

    async fn rotate(&self, state: &mut JsonFileState) -> std::io::Result<()> {
        state.file = None;
        for idx in (1..self.rotation.keep).rev() {
            let from = self.backup_path(idx);
            if tokio::fs::metadata(&from).await.is_ok() {
                tokio::fs::rename(&from, self.backup_path(idx + 1)).await?;
            }
        }
        tokio::fs::rename(&self.path, self.backup_path(1)).await?;
        state.file = Some(open_append(&self.path).await?);
        state.written = 0;
        Ok(())
    }
}

async fn open_append(path: &Path) -> std::io::Result<tokio::fs::File> {
    tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
}

#[async_trait]
impl LogSink for JsonFileSink {
    async fn handle(&self, event: &LogEvent) {
        let Ok(mut json) = serde_json::to_string(event) else {
            return;
        };
        json.push('\n');
        let mut state = self.state.lock().await;
        if self.rotation.keep > 0 && state.written >= self.rotation.max_bytes {
            // Keep appending to the current file if rotation fails.
            if self.rotate(&mut state).await.is_err() && state.file.is_none() {
                state.file = open_append(&self.path).await.ok();
            }
        }
        if let Some(file) = state.file.as_mut() {
            if file.write_all(json.as_bytes()).await.is_ok() {
                state.written += json.len() as u64;
            }
        }
    }

    async fn flush(&self) {
        let mut state = self.state.lock().await;
        if let Some(file) = state.file.as_mut() {
            let _ = file.flush().await;
            let _ = file.sync_all().await;
        }
    }
}
