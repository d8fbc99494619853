//! [`SignalTransport`] over a line-oriented byte stream.

use std::path::Path;

use homewire_app::ports::{Frame, SignalTransport};
use homewire_domain::error::HomewireError;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::sync::Mutex;

use crate::error::OokError;
use crate::frame::parse_frame;

/// Radio link reading frames from `R` and writing dumps to `W`.
pub struct LineLink<R, W> {
    lines: Mutex<Lines<BufReader<R>>>,
    writer: Mutex<W>,
}

/// A [`LineLink`] bound to a serial device.
pub type SerialLink = LineLink<tokio::fs::File, tokio::fs::File>;

impl<R, W> LineLink<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            lines: Mutex::new(BufReader::new(reader).lines()),
            writer: Mutex::new(writer),
        }
    }
}

impl SerialLink {
    /// Open `path` for reading and writing.
    ///
    /// # Errors
    ///
    /// Returns [`OokError::Open`] if the device cannot be opened.
    pub fn open(path: &Path) -> Result<Self, OokError> {
        let open_error = |source| OokError::Open {
            path: path.to_path_buf(),
            source,
        };
        let device = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(open_error)?;
        let writer = device.try_clone().map_err(open_error)?;
        tracing::info!(device = %path.display(), "serial link opened");
        Ok(Self::new(
            tokio::fs::File::from_std(device),
            tokio::fs::File::from_std(writer),
        ))
    }
}

impl<R, W> SignalTransport for LineLink<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn next_frame(&self) -> Result<Option<Frame>, HomewireError> {
        let mut lines = self.lines.lock().await;
        while let Some(line) = lines.next_line().await.map_err(OokError::from)? {
            if line.trim().is_empty() {
                continue;
            }
            match parse_frame(&line) {
                Some(frame) => return Ok(Some(frame)),
                None => tracing::debug!(line = %line.trim(), "ignoring line"),
            }
        }
        Ok(None)
    }

    async fn transmit(&self, dump: &str) -> Result<(), HomewireError> {
        let mut writer = self.writer.lock().await;
        writer
            .write_all(format!("{dump}\n").as_bytes())
            .await
            .map_err(OokError::from)?;
        writer.flush().await.map_err(OokError::from)?;
        tracing::debug!(dump, "dump transmitted");
        Ok(())
    }
}
