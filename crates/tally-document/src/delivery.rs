//! # Client-Side Delivery
//!
//! Hands a generated [`Artifact`] to a user agent, either as a download or
//! as a print job in a viewer.
//!
//! ## Print Flow
//! ```text
//!  create_reference ──► open_viewer ──► loaded() ──► wait print_delay ──► print()
//!        │                  │              │
//!        │                  │ None         │ no signal within load_timeout
//!        │                  ▼              ▼
//!        │            Err(Blocked)   Err(ViewerTimeout)
//!        │
//!        └─ TransientRef dropped on EVERY exit (success, error, cancelled
//!           future). Released immediately, or after `release_grace` once a
//!           viewer holds the reference. Runtime shutdown during the grace
//!           period releases early.
//! ```
//!
//! A blocked viewer is a delivery failure; the document itself was produced.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DeliveryError, DeliveryResult};
use crate::export::Artifact;

// =============================================================================
// Agent Interfaces
// =============================================================================

/// A short-lived reference to artifact bytes held by the user agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransientHandle {
    pub id: Uuid,
    /// Agent-specific locator (file path, object URL).
    pub location: String,
}

/// The environment that receives documents.
#[async_trait]
pub trait UserAgent: Send + Sync + 'static {
    type Viewer: Viewer;

    async fn create_reference(&self, artifact: &Artifact) -> DeliveryResult<TransientHandle>;

    /// Must not block for long; it runs from `Drop`.
    fn release_reference(&self, handle: &TransientHandle);

    async fn trigger_download(&self, handle: &TransientHandle, filename: &str) -> DeliveryResult<()>;

    /// `None` when the agent refuses to open a viewer.
    async fn open_viewer(&self, handle: &TransientHandle) -> DeliveryResult<Option<Self::Viewer>>;
}

/// An opened document viewer.
#[async_trait]
pub trait Viewer: Send {
    /// Resolves once the document has loaded.
    async fn loaded(&mut self) -> DeliveryResult<()>;

    async fn print(&mut self) -> DeliveryResult<()>;
}

// =============================================================================
// Transient Reference Guard
// =============================================================================

/// Owns a transient reference and releases it when dropped.
pub struct TransientRef<A: UserAgent> {
    agent: Arc<A>,
    handle: TransientHandle,
    release_after: Option<Duration>,
}

impl<A: UserAgent> TransientRef<A> {
    pub async fn create(agent: &Arc<A>, artifact: &Artifact) -> DeliveryResult<Self> {
        let handle = agent.create_reference(artifact).await?;
        debug!(id = %handle.id, "Transient reference created");
        Ok(TransientRef {
            agent: Arc::clone(agent),
            handle,
            release_after: None,
        })
    }

    pub fn handle(&self) -> &TransientHandle {
        &self.handle
    }

    /// Defers the release, so a viewer still holding the reference can
    /// finish with it.
    pub fn release_after(&mut self, grace: Duration) {
        self.release_after = Some(grace);
    }
}

impl<A: UserAgent> Drop for TransientRef<A> {
    fn drop(&mut self) {
        let pending = PendingRelease {
            agent: Arc::clone(&self.agent),
            handle: self.handle.clone(),
        };
        match (self.release_after, tokio::runtime::Handle::try_current()) {
            // The task owns the release: it fires after the grace period, or
            // when the runtime drops the task first.
            (Some(grace), Ok(runtime)) => {
                runtime.spawn(async move {
                    tokio::time::sleep(grace).await;
                    drop(pending);
                });
            }
            _ => drop(pending),
        }
    }
}

/// Releases its reference when dropped.
struct PendingRelease<A: UserAgent> {
    agent: Arc<A>,
    handle: TransientHandle,
}

impl<A: UserAgent> Drop for PendingRelease<A> {
    fn drop(&mut self) {
        self.agent.release_reference(&self.handle);
        debug!(id = %self.handle.id, "Transient reference released");
    }
}

// =============================================================================
// Delivery
// =============================================================================

/// Timing of the print flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrintSettings {
    /// Upper bound on waiting for the viewer's load signal.
    pub load_timeout: Duration,
    /// Pause between load and print, so the viewer can paint.
    pub print_delay: Duration,
    /// How long the reference outlives the call once a viewer holds it.
    pub release_grace: Duration,
}

impl Default for PrintSettings {
    fn default() -> Self {
        PrintSettings {
            load_timeout: Duration::from_secs(15),
            print_delay: Duration::from_secs(1),
            release_grace: Duration::from_secs(60),
        }
    }
}

/// Saves the artifact through the agent under `artifact.filename`.
pub async fn deliver_download<A: UserAgent>(agent: &Arc<A>, artifact: &Artifact) -> DeliveryResult<()> {
    let reference = TransientRef::create(agent, artifact).await?;
    agent.trigger_download(reference.handle(), &artifact.filename).await?;
    info!(filename = %artifact.filename, bytes = artifact.bytes.len(), "Download delivered");
    Ok(())
}

/// Opens the artifact in a viewer and prints it once loaded.
pub async fn deliver_print<A: UserAgent>(
    agent: &Arc<A>,
    artifact: &Artifact,
    settings: PrintSettings,
) -> DeliveryResult<()> {
    let mut reference = TransientRef::create(agent, artifact).await?;

    let mut viewer = match agent.open_viewer(reference.handle()).await? {
        Some(viewer) => viewer,
        None => {
            warn!(filename = %artifact.filename, "Viewer blocked; print not started");
            return Err(DeliveryError::Blocked);
        }
    };
    reference.release_after(settings.release_grace);

    match tokio::time::timeout(settings.load_timeout, viewer.loaded()).await {
        Ok(loaded) => loaded?,
        Err(_) => {
            warn!(timeout = ?settings.load_timeout, "Viewer did not load");
            return Err(DeliveryError::ViewerTimeout(settings.load_timeout));
        }
    }

    tokio::time::sleep(settings.print_delay).await;
    viewer.print().await?;
    info!(filename = %artifact.filename, "Print started");
    Ok(())
}

// =============================================================================
// Spool Agent (filesystem)
// =============================================================================

/// Filesystem user agent.
///
/// References are spool files, downloads are copies into `downloads_dir`,
/// and printing drops the file into a print-queue directory. Without a
/// queue directory the viewer is refused, like a blocked popup.
#[derive(Debug, Clone)]
pub struct SpoolAgent {
    spool_dir: PathBuf,
    downloads_dir: PathBuf,
    print_queue: Option<PathBuf>,
}

impl SpoolAgent {
    pub fn new(spool_dir: impl Into<PathBuf>, downloads_dir: impl Into<PathBuf>) -> Self {
        SpoolAgent {
            spool_dir: spool_dir.into(),
            downloads_dir: downloads_dir.into(),
            print_queue: None,
        }
    }

    pub fn with_print_queue(mut self, dir: impl Into<PathBuf>) -> Self {
        self.print_queue = Some(dir.into());
        self
    }
}

#[async_trait]
impl UserAgent for SpoolAgent {
    type Viewer = SpoolViewer;

    async fn create_reference(&self, artifact: &Artifact) -> DeliveryResult<TransientHandle> {
        tokio::fs::create_dir_all(&self.spool_dir).await?;
        let id = Uuid::new_v4();
        let extension = Path::new(&artifact.filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin");
        let path = self.spool_dir.join(format!("{}.{}", id, extension));
        tokio::fs::write(&path, &artifact.bytes).await?;
        Ok(TransientHandle {
            id,
            location: path.to_string_lossy().into_owned(),
        })
    }

    fn release_reference(&self, handle: &TransientHandle) {
        if let Err(e) = std::fs::remove_file(&handle.location) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(location = %handle.location, error = %e, "Failed to remove spool file");
            }
        }
    }

    async fn trigger_download(&self, handle: &TransientHandle, filename: &str) -> DeliveryResult<()> {
        let name = Path::new(filename)
            .file_name()
            .ok_or_else(|| DeliveryError::Agent(format!("invalid filename: {}", filename)))?;
        tokio::fs::create_dir_all(&self.downloads_dir).await?;
        tokio::fs::copy(&handle.location, self.downloads_dir.join(name)).await?;
        Ok(())
    }

    async fn open_viewer(&self, handle: &TransientHandle) -> DeliveryResult<Option<SpoolViewer>> {
        Ok(self.print_queue.as_ref().map(|queue| SpoolViewer {
            source: PathBuf::from(&handle.location),
            queue: queue.clone(),
            loaded: false,
        }))
    }
}

/// Viewer over a spool file.
#[derive(Debug)]
pub struct SpoolViewer {
    source: PathBuf,
    queue: PathBuf,
    loaded: bool,
}

#[async_trait]
impl Viewer for SpoolViewer {
    async fn loaded(&mut self) -> DeliveryResult<()> {
        let meta = tokio::fs::metadata(&self.source).await?;
        if meta.len() == 0 {
            return Err(DeliveryError::Agent("document is empty".to_string()));
        }
        self.loaded = true;
        Ok(())
    }

    async fn print(&mut self) -> DeliveryResult<()> {
        if !self.loaded {
            return Err(DeliveryError::Agent("document not loaded".to_string()));
        }
        let name = self
            .source
            .file_name()
            .ok_or_else(|| DeliveryError::Agent("spool file has no name".to_string()))?;
        tokio::fs::create_dir_all(&self.queue).await?;
        tokio::fs::copy(&self.source, self.queue.join(name)).await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
