use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::{fs, io, thread};

use crate::KdcConfig;

/// Public key file content, as found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyKeyMaterial {
    path: PathBuf,
    pem: Vec<u8>,
}

impl VerifyKeyMaterial {
    pub fn new(path: impl Into<PathBuf>, pem: Vec<u8>) -> Self {
        Self { path: path.into(), pem }
    }

    pub fn from_file(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let pem = fs::read(&path)?;

        Ok(Self { path, pem })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pem(&self) -> &[u8] {
        &self.pem
    }
}

/// How the verification key of an issuer was looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResolution {
    /// The decoder does not verify signatures
    NotRequired,
    /// Neither an explicit key file nor a key directory is configured
    NoDirectory,
    Explicit(PathBuf),
    /// Found by scanning the key directory; `candidates` holds the other matching files.
    Scanned { path: PathBuf, candidates: Vec<PathBuf> },
    NotFound,
    LoadFailed { path: Option<PathBuf>, reason: String },
    TimedOut,
}

impl KeyResolution {
    /// Returns true when a key file was located but could not be used.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::LoadFailed { .. } | Self::TimedOut)
    }
}

/// Upper bound on lookup threads alive at once, abandoned ones included.
pub const MAX_PENDING_KEY_LOOKUPS: usize = 16;

static PENDING_KEY_LOOKUPS: LookupLimiter = LookupLimiter::new(MAX_PENDING_KEY_LOOKUPS);

/// Counts lookup threads that have not returned yet.
#[derive(Debug)]
pub struct LookupLimiter {
    pending: AtomicUsize,
    capacity: usize,
}

impl LookupLimiter {
    pub const fn new(capacity: usize) -> Self {
        Self {
            pending: AtomicUsize::new(0),
            capacity,
        }
    }

    /// Reserves a slot, or returns `None` when `capacity` lookups are already pending.
    pub fn try_acquire(&self) -> Option<LookupPermit<'_>> {
        self.pending
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |pending| {
                (pending < self.capacity).then_some(pending + 1)
            })
            .ok()
            .map(|_| LookupPermit { limiter: self })
    }

    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }
}

/// A reserved lookup slot, released on drop.
#[derive(Debug)]
pub struct LookupPermit<'a> {
    limiter: &'a LookupLimiter,
}

impl Drop for LookupPermit<'_> {
    fn drop(&mut self) {
        self.limiter.pending.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Locates and reads the verification key of `issuer`.
///
/// The explicit `verify_key_files` entry wins. Otherwise the key directory is scanned for regular
/// files whose name contains the issuer, and the first one in file name order is used.
///
/// The lookup runs on a helper thread and is abandoned after the configured key scan timeout.
/// An abandoned thread keeps running until its file system call returns, and holds one of the
/// [`MAX_PENDING_KEY_LOOKUPS`] slots until then. Lookups are refused while no slot is free.
pub fn resolve_verify_key(config: &KdcConfig, issuer: &str) -> (KeyResolution, Option<VerifyKeyMaterial>) {
    let explicit = config.verify_key_file(issuer).map(Path::to_path_buf);
    let directory = config.verify_key_directory().map(Path::to_path_buf);

    if explicit.is_none() && directory.is_none() {
        return (KeyResolution::NoDirectory, None);
    }

    let Some(permit) = PENDING_KEY_LOOKUPS.try_acquire() else {
        warn!(issuer, limit = MAX_PENDING_KEY_LOOKUPS, "Too many pending verification key lookups");

        return (
            KeyResolution::LoadFailed {
                path: None,
                reason: "too many pending verification key lookups".to_owned(),
            },
            None,
        );
    };

    let (sender, receiver) = mpsc::channel();
    let issuer_owned = issuer.to_owned();

    let spawned = thread::Builder::new()
        .name("verify-key-lookup".to_owned())
        .spawn(move || {
            let _permit = permit;

            // The receiver is gone when the lookup timed out.
            let _ = sender.send(lookup(explicit, directory, &issuer_owned));
        });

    if let Err(e) = spawned {
        return (
            KeyResolution::LoadFailed {
                path: None,
                reason: format!("failed to spawn the lookup thread: {e}"),
            },
            None,
        );
    }

    match receiver.recv_timeout(config.key_scan_timeout()) {
        Ok(resolved) => resolved,
        Err(mpsc::RecvTimeoutError::Timeout) => (KeyResolution::TimedOut, None),
        Err(mpsc::RecvTimeoutError::Disconnected) => (
            KeyResolution::LoadFailed {
                path: None,
                reason: "lookup thread terminated without a result".to_owned(),
            },
            None,
        ),
    }
}

fn lookup(
    explicit: Option<PathBuf>,
    directory: Option<PathBuf>,
    issuer: &str,
) -> (KeyResolution, Option<VerifyKeyMaterial>) {
    if let Some(path) = explicit {
        return load(path, KeyResolution::Explicit);
    }

    let Some(directory) = directory else {
        return (KeyResolution::NoDirectory, None);
    };

    let mut matches = match scan(&directory, issuer) {
        Ok(matches) => matches,
        Err(e) => {
            return (
                KeyResolution::LoadFailed {
                    path: Some(directory),
                    reason: e.to_string(),
                },
                None,
            )
        }
    };

    if matches.is_empty() {
        return (KeyResolution::NotFound, None);
    }

    matches.sort();
    let chosen = matches.remove(0);

    load(chosen, |path| KeyResolution::Scanned {
        path,
        candidates: matches,
    })
}

fn scan(directory: &Path, issuer: &str) -> io::Result<Vec<PathBuf>> {
    let mut matches = Vec::new();

    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_file() && entry.file_name().to_string_lossy().contains(issuer) {
            matches.push(path);
        }
    }

    Ok(matches)
}

fn load(
    path: PathBuf,
    resolution: impl FnOnce(PathBuf) -> KeyResolution,
) -> (KeyResolution, Option<VerifyKeyMaterial>) {
    match VerifyKeyMaterial::from_file(&path) {
        Ok(material) => (resolution(path), Some(material)),
        Err(e) => (
            KeyResolution::LoadFailed {
                path: Some(path),
                reason: e.to_string(),
            },
            None,
        ),
    }
}
