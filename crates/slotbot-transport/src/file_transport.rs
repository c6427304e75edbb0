use crate::transport_trait::{OutboundMessage, Transport};
use async_trait::async_trait;
use slotbot_core::{ConversationRef, ConversationSlotState, TransportError};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;

struct FilePaths {
    transcript: PathBuf,
    state_dir: PathBuf,
}

/// Appends sent messages to a transcript file and keeps one TOML state file
/// per conversation under `state_dir`.
pub struct FileTransport {
    paths: Mutex<Option<FilePaths>>,
    send_count: AtomicUsize,
    outbox_tx: mpsc::UnboundedSender<OutboundMessage>,
    outbox_rx: Mutex<Option<mpsc::UnboundedReceiver<OutboundMessage>>>,
}

impl FileTransport {
    pub fn new() -> Self {
        let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();
        Self {
            paths: Mutex::new(None),
            send_count: AtomicUsize::new(0),
            outbox_tx,
            outbox_rx: Mutex::new(Some(outbox_rx)),
        }
    }

    pub fn send_count(&self) -> usize {
        self.send_count.load(Ordering::Relaxed)
    }

    /// `<channel>_<conversation>.toml`, each part percent-encoded so that `_`
    /// only ever appears as the separator.
    fn state_path(state_dir: &Path, conversation: &ConversationRef) -> PathBuf {
        state_dir.join(format!(
            "{}_{}.toml",
            encode_file_component(&conversation.channel_id),
            encode_file_component(&conversation.conversation_id)
        ))
    }
}

impl Default for FileTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn encode_file_component(raw: &str) -> String {
    let mut encoded = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}

fn required_path(config: &toml::Value, key: &str) -> Result<PathBuf, TransportError> {
    config
        .get(key)
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
        .ok_or_else(|| TransportError::InitializationFailed(format!("missing '{key}' in config")))
}

#[async_trait]
impl Transport for FileTransport {
    fn name(&self) -> &str {
        "file"
    }

    async fn initialize(&mut self, config: toml::Value) -> Result<(), TransportError> {
        let transcript = required_path(&config, "path")?;
        let state_dir = required_path(&config, "state_dir")?;
        std::fs::create_dir_all(&state_dir)
            .map_err(|e| TransportError::InitializationFailed(e.to_string()))?;

        let paths = self
            .paths
            .get_mut()
            .map_err(|_| TransportError::InitializationFailed("paths poisoned".to_string()))?;
        *paths = Some(FilePaths {
            transcript,
            state_dir,
        });
        Ok(())
    }

    async fn send(
        &self,
        conversation: &ConversationRef,
        text: &str,
    ) -> Result<(), TransportError> {
        {
            let guard = self
                .paths
                .lock()
                .map_err(|_| TransportError::SendFailed("paths poisoned".to_string()))?;
            let paths = guard
                .as_ref()
                .ok_or_else(|| TransportError::SendFailed("not initialized".to_string()))?;

            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&paths.transcript)
                .map_err(|e| TransportError::SendFailed(e.to_string()))?;

            writeln!(file, "[{}] {}", conversation.key(), text)
                .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        }

        self.send_count.fetch_add(1, Ordering::Relaxed);
        let _ = self.outbox_tx.send(OutboundMessage {
            conversation: conversation.clone(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn load_state(
        &self,
        conversation: &ConversationRef,
    ) -> Result<ConversationSlotState, TransportError> {
        let path = {
            let guard = self
                .paths
                .lock()
                .map_err(|_| TransportError::StateLoadFailed("paths poisoned".to_string()))?;
            let paths = guard
                .as_ref()
                .ok_or_else(|| TransportError::StateLoadFailed("not initialized".to_string()))?;
            Self::state_path(&paths.state_dir, conversation)
        };

        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content)
                .map_err(|e| TransportError::StateLoadFailed(format!("{}: {e}", path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(ConversationSlotState::default())
            }
            Err(e) => Err(TransportError::StateLoadFailed(e.to_string())),
        }
    }

    async fn save_state(
        &self,
        conversation: &ConversationRef,
        state: &ConversationSlotState,
    ) -> Result<(), TransportError> {
        let path = {
            let guard = self
                .paths
                .lock()
                .map_err(|_| TransportError::StateSaveFailed("paths poisoned".to_string()))?;
            let paths = guard
                .as_ref()
                .ok_or_else(|| TransportError::StateSaveFailed("not initialized".to_string()))?;
            Self::state_path(&paths.state_dir, conversation)
        };

        let content =
            toml::to_string(state).map_err(|e| TransportError::StateSaveFailed(e.to_string()))?;

        // Write then rename so a reader never sees a half-written record.
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, content).map_err(|e| TransportError::StateSaveFailed(e.to_string()))?;
        std::fs::rename(&tmp, &path).map_err(|e| TransportError::StateSaveFailed(e.to_string()))?;
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        self.paths.lock().map(|p| p.is_some()).unwrap_or(false)
    }

    fn take_outbox_receiver(&mut self) -> Option<mpsc::UnboundedReceiver<OutboundMessage>> {
        self.outbox_rx.get_mut().ok().and_then(|rx| rx.take())
    }

    async fn shutdown(&self) -> Result<(), TransportError> {
        Ok(())
    }
}
