//! Port selection and the port discovery file.
//!
//! The service tries a window of consecutive ports and binds the first one
//! that accepts an exclusive bind. The port actually bound is written, as
//! bare decimal text, to a well-known file so an out-of-band launcher can
//! find it.

use std::fs;
use std::io;
use std::net::TcpListener;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Result, ServerError};

/// Bind the first free port in `start ..start + width` on `host`.
///
/// At least one port is tried and the window is truncated at `u16::MAX`.
/// A port held by another listener is skipped.
///
/// # Errors
///
/// Returns [`ServerError::PortsExhausted`] if no port in the window binds.
pub fn bind_first_available(host: &str, start: u16, width: u16) -> Result<TcpListener> {
    let mut last = start;
    for offset in 0..width.max(1) {
        let Some(port) = start.checked_add(offset) else {
            break;
        };
        last = port;
        match TcpListener::bind((host, port)) {
            Ok(listener) => {
                info!(host, port, attempts = offset + 1, "Bound listener");
                return Ok(listener);
            }
            Err(e) => debug!(host, port, error = %e, "Port unavailable"),
        }
    }
    Err(ServerError::PortsExhausted {
        host: host.to_string(),
        first: start,
        last,
    })
}

/// The published port discovery file. Removed by [`PortFile::remove`].
#[derive(Debug)]
pub struct PortFile {
    path: PathBuf,
}

impl PortFile {
    /// Write `port` to `path`, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::PortFile`] if the file cannot be written.
    pub fn publish(path: impl Into<PathBuf>, port: u16) -> Result<Self> {
        let path = path.into();
        let write = || -> io::Result<()> {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, port.to_string())
        };
        write().map_err(|source| ServerError::PortFile {
            path: path.clone(),
            source,
        })?;
        info!(path = %path.display(), port, "Published port file");
        Ok(Self { path })
    }

    /// Where the file lives.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file. A file already gone counts as removed.
    pub fn remove(self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Removed port file");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to remove port file");
                Err(e)
            }
        }
    }
}

/// Read back a port published by [`PortFile::publish`].
///
/// # Errors
///
/// Returns an I/O error if the file is missing or does not hold a port.
pub fn read_port_file(path: &Path) -> io::Result<u16> {
    fs::read_to_string(path)?
        .trim()
        .parse()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
