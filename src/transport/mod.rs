//! Voice transport abstraction
//!
//! The bridge never owns the conference connection outright: it writes audio
//! frames through a [`VoiceLink`] and observes raw inbound audio through an
//! explicit registration point — construction hands back the receiving end of
//! a channel carrying every tunneled-audio payload the link sees. Dropping
//! the link (or losing the connection) closes that channel, which is the
//! disconnect signal downstream; the link's own handling of non-audio
//! traffic is untouched throughout.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use crate::protocol::{ENVELOPE_HEADER_LEN, TUNNEL_AUDIO, wrap_tunnel};
use crate::{Error, Result};

/// Sanity cap on a single enveloped frame
const MAX_FRAME_LEN: usize = 1 << 20;

/// Capacity of the inbound audio observer channel
const AUDIO_CHANNEL_CAPACITY: usize = 256;

/// A connection into the voice conference
#[async_trait]
pub trait VoiceLink: Send + Sync {
    /// Get the link name
    fn name(&self) -> &'static str;

    /// Connect to the conference server
    async fn connect(&self) -> Result<()>;

    /// Disconnect, releasing the audio observer channel
    async fn disconnect(&self) -> Result<()>;

    /// Write one audio frame to the wire
    async fn send_audio(&self, frame: &[u8]) -> Result<()>;

    /// Check if connected
    fn is_connected(&self) -> bool;
}

/// Voice link over a plain TCP control connection carrying the
/// tunneled-audio envelope
pub struct TcpTunnel {
    addr: String,
    writer: Mutex<Option<OwnedWriteHalf>>,
    pending_tx: StdMutex<Option<mpsc::Sender<Vec<u8>>>>,
    read_task: StdMutex<Option<JoinHandle<()>>>,
    connected: Arc<AtomicBool>,
}

impl TcpTunnel {
    /// Create a tunnel for `addr` along with the raw-audio observer.
    ///
    /// The receiver yields the payload of every tunneled-audio envelope read
    /// from the wire and closes when the connection ends, however it ends.
    #[must_use]
    pub fn with_receiver(addr: String) -> (Self, mpsc::Receiver<Vec<u8>>) {
        let (tx, rx) = mpsc::channel(AUDIO_CHANNEL_CAPACITY);
        let tunnel = Self {
            addr,
            writer: Mutex::new(None),
            pending_tx: StdMutex::new(Some(tx)),
            read_task: StdMutex::new(None),
            connected: Arc::new(AtomicBool::new(false)),
        };
        (tunnel, rx)
    }
}

#[async_trait]
impl VoiceLink for TcpTunnel {
    fn name(&self) -> &'static str {
        "tcp-tunnel"
    }

    async fn connect(&self) -> Result<()> {
        let audio_tx = self
            .pending_tx
            .lock()
            .expect("pending_tx lock")
            .take()
            .ok_or_else(|| Error::Transport("tunnel already connected once".to_string()))?;

        let stream = TcpStream::connect(&self.addr)
            .await
            .map_err(|e| Error::Transport(format!("connect {}: {e}", self.addr)))?;
        let (read_half, write_half) = stream.into_split();

        *self.writer.lock().await = Some(write_half);
        self.connected.store(true, Ordering::SeqCst);

        let task = tokio::spawn(read_loop(read_half, audio_tx, Arc::clone(&self.connected)));
        *self.read_task.lock().expect("read_task lock") = Some(task);

        tracing::info!(addr = %self.addr, "voice tunnel connected");
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.connected.store(false, Ordering::SeqCst);
        if let Some(task) = self.read_task.lock().expect("read_task lock").take() {
            // Aborting drops the observer sender, so the frame receiver sees
            // end-of-stream and downstream winds down.
            task.abort();
        }
        *self.writer.lock().await = None;
        tracing::info!("voice tunnel disconnected");
        Ok(())
    }

    async fn send_audio(&self, frame: &[u8]) -> Result<()> {
        let envelope = wrap_tunnel(frame);
        let mut writer = self.writer.lock().await;
        let writer = writer
            .as_mut()
            .ok_or_else(|| Error::Transport("tunnel not connected".to_string()))?;

        writer
            .write_all(&envelope)
            .await
            .map_err(|e| Error::Transport(format!("write: {e}")))?;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// Read envelopes off the wire, forwarding tunneled audio to the observer.
///
/// Ends on connection close, oversized frames, or the observer going away;
/// errors never propagate past this task.
async fn read_loop(
    mut reader: OwnedReadHalf,
    audio_tx: mpsc::Sender<Vec<u8>>,
    connected: Arc<AtomicBool>,
) {
    let mut header = [0u8; ENVELOPE_HEADER_LEN];

    loop {
        if let Err(e) = reader.read_exact(&mut header).await {
            tracing::info!(error = %e, "voice tunnel closed by peer");
            break;
        }

        let tag = u16::from_be_bytes([header[0], header[1]]);
        let len = u32::from_be_bytes([header[2], header[3], header[4], header[5]]) as usize;

        if len > MAX_FRAME_LEN {
            tracing::warn!(len, "oversized frame on voice tunnel, closing");
            break;
        }

        let mut payload = vec![0u8; len];
        if let Err(e) = reader.read_exact(&mut payload).await {
            tracing::info!(error = %e, "voice tunnel closed mid-frame");
            break;
        }

        if tag == TUNNEL_AUDIO {
            if audio_tx.send(payload).await.is_err() {
                tracing::debug!("audio observer dropped, stopping tunnel reads");
                break;
            }
        }
        // Non-audio traffic belongs to the host's control handling.
    }

    connected.store(false, Ordering::SeqCst);
}
