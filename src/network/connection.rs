// src/network/connection.rs

use std::io;
use std::net::SocketAddr;

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{watch, Mutex};

/// Buffered read side handed from the handshake to the receive loop.
pub type LineReader = BufReader<OwnedReadHalf>;

/// Write side of an established peer stream plus its close signal.
///
/// Shared between the registry entry and the router through an `Arc`; the read
/// side is owned by the receive loop and released when `close` fires.
#[derive(Debug)]
pub struct Connection {
    remote_addr: SocketAddr,
    writer: Mutex<Option<OwnedWriteHalf>>,
    closed: watch::Sender<bool>,
}

impl Connection {
    /// Split a stream into its shared write side and the buffered read side.
    pub fn split(stream: TcpStream) -> io::Result<(Connection, LineReader)> {
        let remote_addr = stream.peer_addr()?;
        let (read_half, write_half) = stream.into_split();
        let (closed, _) = watch::channel(false);
        let conn = Connection {
            remote_addr,
            writer: Mutex::new(Some(write_half)),
            closed,
        };
        Ok((conn, BufReader::new(read_half)))
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Receiver that flips to `true` once the connection is closed.
    pub fn close_signal(&self) -> watch::Receiver<bool> {
        self.closed.subscribe()
    }

    /// Write one line, appending exactly one `\n`.
    ///
    /// A write still pending when `close` fires is abandoned and the write
    /// half released, so a peer that stopped reading cannot keep it open.
    pub async fn send_line(&self, line: &str) -> io::Result<()> {
        let mut closed = self.closed.subscribe();
        let mut guard = self.writer.lock().await;
        if self.is_closed() {
            guard.take();
        }
        let writer = guard
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "connection closed"))?;
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
        let result = tokio::select! {
            res = writer.write_all(&buf) => res,
            _ = closed.changed() => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "connection closed during write",
            )),
        };
        // close() could not take the half while we held it.
        if self.is_closed() {
            guard.take();
        }
        result
    }

    /// Idempotent, never awaits. Wakes the receive loop and any pending write,
    /// and drops the write half (a pending write drops it on its way out).
    pub fn close(&self) {
        self.closed.send_replace(true);
        if let Ok(mut guard) = self.writer.try_lock() {
            guard.take();
        }
    }
}
