//! Connections carrying protocol frames to the engine process.
//!
//! A frame is one serialized [`Envelope`](crate::messages::Envelope);
//! framing on the wire is newline-delimited JSON, one envelope per line.
//! Connection lifecycle is owned here: the [`ConnectionPool`] keeps one
//! long-lived connection per project root, and the client and resolver only
//! borrow connections, never open or close them.

use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Write};
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::config::EngineConfig;

/// A bidirectional frame transport to an engine process.
pub trait Connection {
    /// Send one request frame.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the transport fails.
    fn send(&mut self, frame: &[u8]) -> io::Result<()>;

    /// Block until the next response frame arrives.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the transport fails, times out,
    /// or is closed by the peer.
    fn receive(&mut self) -> io::Result<Vec<u8>>;
}

impl<C: Connection + ?Sized> Connection for &mut C {
    fn send(&mut self, frame: &[u8]) -> io::Result<()> {
        (**self).send(frame)
    }

    fn receive(&mut self) -> io::Result<Vec<u8>> {
        (**self).receive()
    }
}

/// Blocking TCP transport speaking newline-delimited JSON frames.
///
/// The read side carries the timeout from [`EngineConfig`], so a hung engine
/// surfaces as a timed-out read instead of blocking the caller forever.
#[derive(Debug)]
pub struct TcpConnection {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl TcpConnection {
    /// Open a connection to the engine described by `config`.
    ///
    /// # Errors
    ///
    /// Returns the connect or socket-configuration error when the engine
    /// cannot be reached.
    pub fn connect(config: &EngineConfig) -> io::Result<Self> {
        let stream = TcpStream::connect((config.host.as_str(), config.port))?;
        stream.set_read_timeout(Some(config.request_timeout()))?;
        let reader = BufReader::new(stream.try_clone()?);
        Ok(Self {
            reader,
            writer: stream,
        })
    }
}

impl Connection for TcpConnection {
    fn send(&mut self, frame: &[u8]) -> io::Result<()> {
        self.writer.write_all(frame)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }

    fn receive(&mut self) -> io::Result<Vec<u8>> {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line)?;
        if read == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "engine closed the connection",
            ));
        }
        Ok(line.into_bytes())
    }
}

/// Cache of one engine connection per project root.
///
/// Handed-out connections are wrapped in a mutex so concurrent callers
/// serialize their request/response cycles; the protocol correlates only by
/// message id and supports at most one outstanding request per connection.
#[derive(Debug)]
pub struct ConnectionPool {
    config: EngineConfig,
    connections: Mutex<HashMap<PathBuf, Arc<Mutex<TcpConnection>>>>,
}

impl ConnectionPool {
    /// Create an empty pool connecting with `config`.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            connections: Mutex::new(HashMap::new()),
        }
    }

    /// The pooled connection for `project_root`, opening one on first use.
    ///
    /// # Errors
    ///
    /// Returns the connection error when the engine cannot be reached.
    pub fn connection_for(&self, project_root: &Path) -> io::Result<Arc<Mutex<TcpConnection>>> {
        let mut connections = self
            .connections
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(existing) = connections.get(project_root) {
            return Ok(Arc::clone(existing));
        }
        let connection = Arc::new(Mutex::new(TcpConnection::connect(&self.config)?));
        connections.insert(project_root.to_path_buf(), Arc::clone(&connection));
        Ok(connection)
    }

    /// Drop the pooled connection for `project_root`, forcing the next
    /// [`connection_for`](Self::connection_for) call to reconnect.
    pub fn evict(&self, project_root: &Path) {
        self.connections
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .remove(project_root);
    }
}
