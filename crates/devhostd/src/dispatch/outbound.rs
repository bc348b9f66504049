//! Single outbound channel shared by responses and events.

use std::io;

use devhost_protocol::{OutboundMessage, encode_frame};
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Tracing target for the writer. Records under this target are never
/// forwarded over the protocol, otherwise a failing writer would feed itself.
pub(crate) const OUTBOUND_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::outbound");

/// Errors raised by the writer task.
#[derive(Debug, Error)]
pub enum WriterError {
    /// Writing to the output stream failed.
    #[error("failed to write protocol frame: {0}")]
    Io(#[from] io::Error),
    /// The writer task panicked or was cancelled.
    #[error("writer task failed: {message}")]
    Task {
        /// Join error description.
        message: String,
    },
}

/// Cloneable handle for queueing outbound messages.
#[derive(Debug, Clone)]
pub struct Outbound {
    sender: mpsc::UnboundedSender<OutboundMessage>,
}

impl Outbound {
    /// Creates a handle together with the receiving half of its channel.
    ///
    /// The writer drains the receiver in production; tests inspect it
    /// directly.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Queues a message. Messages sent after the writer has finished are
    /// dropped.
    pub fn send(&self, message: impl Into<OutboundMessage>) {
        if self.sender.send(message.into()).is_err() {
            debug!(target: OUTBOUND_TARGET, "outbound channel closed; message dropped");
        }
    }
}

/// Task that serialises queued messages as frames onto a byte stream.
#[derive(Debug)]
pub struct OutboundWriter;

impl OutboundWriter {
    /// Spawns the writer over `output`, returning the queueing handle and the
    /// handle used to flush and stop the writer.
    pub fn spawn<W>(output: W) -> (Outbound, WriterHandle)
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (outbound, receiver) = Outbound::channel();
        let (close, close_requested) = oneshot::channel();
        let task = tokio::spawn(write_loop(receiver, close_requested, output));
        (outbound, WriterHandle { close, task })
    }
}

/// Handle that stops the writer once everything queued so far is written.
#[derive(Debug)]
pub struct WriterHandle {
    close: oneshot::Sender<()>,
    task: JoinHandle<Result<(), WriterError>>,
}

impl WriterHandle {
    /// Stops accepting messages, writes everything already queued, and waits
    /// for the writer to exit.
    ///
    /// # Errors
    ///
    /// Returns an error if writing failed or the writer task died.
    pub async fn finish(self) -> Result<(), WriterError> {
        // The writer may already have exited after an I/O failure.
        let _ = self.close.send(());
        match self.task.await {
            Ok(result) => result,
            Err(error) => Err(WriterError::Task {
                message: error.to_string(),
            }),
        }
    }
}

async fn write_loop<W>(
    mut receiver: mpsc::UnboundedReceiver<OutboundMessage>,
    mut close_requested: oneshot::Receiver<()>,
    mut output: W,
) -> Result<(), WriterError>
where
    W: AsyncWrite + Unpin,
{
    loop {
        tokio::select! {
            message = receiver.recv() => match message {
                Some(message) => write_message(&mut output, &message).await?,
                None => break,
            },
            _ = &mut close_requested => {
                receiver.close();
                while let Some(message) = receiver.recv().await {
                    write_message(&mut output, &message).await?;
                }
                break;
            }
        }
    }
    output.flush().await?;
    Ok(())
}

async fn write_message<W>(output: &mut W, message: &OutboundMessage) -> Result<(), WriterError>
where
    W: AsyncWrite + Unpin,
{
    let mut line = match encode_frame(message) {
        Ok(line) => line,
        Err(error) => {
            warn!(target: OUTBOUND_TARGET, %error, "failed to encode outbound message");
            return Ok(());
        }
    };
    line.push('\n');
    output.write_all(line.as_bytes()).await?;
    output.flush().await?;
    Ok(())
}
