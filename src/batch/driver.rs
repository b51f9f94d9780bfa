//! Batch driver implementation.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::TileError;
use crate::source::ImageSource;
use crate::tile::{GridSpec, Tile, TileEngine};

// =============================================================================
// Job and Report Types
// =============================================================================

/// An ordered queue of images sharing one grid spec.
#[derive(Debug, Clone)]
pub struct BatchJob {
    /// Image identifiers, processed in this order
    pub images: Vec<String>,

    /// Grid applied to every image; `name_prefix` is the fallback prefix for
    /// identifiers without a usable file stem
    pub spec: GridSpec,
}

impl BatchJob {
    pub fn new(images: Vec<String>, spec: GridSpec) -> Self {
        Self { images, spec }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Progress after an image finished (successfully or not).
#[derive(Debug, Clone, PartialEq)]
pub struct BatchProgress {
    pub completed: usize,
    pub total: usize,

    /// Identifier of the image that just finished
    pub current: String,

    /// Whether that image produced tiles
    pub succeeded: bool,
}

impl BatchProgress {
    /// Completed fraction in `0.0..=1.0`. An empty batch counts as done.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }

    pub fn percent(&self) -> f64 {
        self.fraction() * 100.0
    }
}

/// An image that was skipped and why.
#[derive(Debug, Clone)]
pub struct BatchFailure {
    pub image_id: String,
    pub error: TileError,
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Tiles of every successful image, image by image in queue order
    pub tiles: Vec<Tile>,

    /// Images that were skipped, in queue order
    pub failures: Vec<BatchFailure>,

    /// Number of images that were attempted
    pub images_processed: usize,

    /// Number of images that produced tiles
    pub images_succeeded: usize,

    /// Whether the batch was stopped before the queue was exhausted
    pub cancelled: bool,
}

impl BatchReport {
    /// Whether every image in the queue produced tiles.
    pub fn is_complete_success(&self) -> bool {
        !self.cancelled && self.failures.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.tiles.iter().map(Tile::byte_size).sum()
    }
}

// =============================================================================
// Prefix Derivation
// =============================================================================

/// Tile name prefix for an image identifier.
///
/// Uses the file name up to its first `.`; falls back to `fallback` when that
/// is empty.
pub fn derive_prefix(image_id: &str, fallback: &str) -> String {
    let file_name = Path::new(image_id)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(image_id);

    let stem = file_name.split('.').next().unwrap_or_default().trim();
    if stem.is_empty() {
        fallback.to_string()
    } else {
        stem.to_string()
    }
}

/// Hands out prefixes, suffixing repeats so names stay unique in a batch.
///
/// A generated `stem-N` is itself reserved, so a later image whose stem is
/// literally `stem-N` gets a further suffix instead of sharing it.
#[derive(Debug, Default)]
struct PrefixAllocator {
    taken: HashSet<String>,

    /// Next suffix to try per base stem
    next_suffix: HashMap<String, usize>,
}

impl PrefixAllocator {
    fn allocate(&mut self, prefix: String) -> String {
        if self.taken.insert(prefix.clone()) {
            return prefix;
        }

        let mut suffix = self.next_suffix.get(&prefix).copied().unwrap_or(2);
        loop {
            let candidate = format!("{}-{}", prefix, suffix);
            suffix += 1;
            if self.taken.insert(candidate.clone()) {
                self.next_suffix.insert(prefix, suffix);
                return candidate;
            }
        }
    }
}

// =============================================================================
// Batch Driver
// =============================================================================

/// Runs the tile engine over a queue of images.
///
/// # Type Parameters
///
/// * `S` - Where images are loaded from (e.g., the filesystem)
///
/// # Example
///
/// ```ignore
/// use image_tiler::batch::{BatchDriver, BatchJob};
/// use image_tiler::source::FsImageSource;
/// use image_tiler::tile::GridSpec;
///
/// let driver = BatchDriver::new(FsImageSource::new());
/// let job = BatchJob::new(vec!["a.png".into(), "b.jpg".into()], GridSpec::new(2, 2));
///
/// let report = driver
///     .run_with_progress(&job, &cancel, |p| println!("{:.0}%", p.percent()))
///     .await?;
/// ```
pub struct BatchDriver<S: ImageSource> {
    source: Arc<S>,
    engine: TileEngine,
}

impl<S: ImageSource> BatchDriver<S> {
    /// Create a driver with a default engine.
    pub fn new(source: S) -> Self {
        Self::with_engine(source, TileEngine::new())
    }

    pub fn with_engine(source: S, engine: TileEngine) -> Self {
        Self {
            source: Arc::new(source),
            engine,
        }
    }

    /// Create a driver around a source shared with other components.
    pub fn with_shared_source(source: Arc<S>, engine: TileEngine) -> Self {
        Self { source, engine }
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    pub fn engine(&self) -> &TileEngine {
        &self.engine
    }

    /// Run the batch without progress reporting.
    pub async fn run(
        &self,
        job: &BatchJob,
        cancel: &CancellationToken,
    ) -> Result<BatchReport, TileError> {
        self.run_with_progress(job, cancel, |_| {}).await
    }

    /// Run the batch, calling `on_progress` after every image.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::InvalidSpec`] if the shared grid has zero rows or
    /// columns. Every other failure is recorded in the report.
    pub async fn run_with_progress<F>(
        &self,
        job: &BatchJob,
        cancel: &CancellationToken,
        mut on_progress: F,
    ) -> Result<BatchReport, TileError>
    where
        F: FnMut(&BatchProgress),
    {
        job.spec.validate()?;

        let total = job.len();
        let mut report = BatchReport::default();
        let mut prefixes = PrefixAllocator::default();

        info!(images = total, "Starting batch");

        for image_id in &job.images {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let prefix = prefixes.allocate(derive_prefix(image_id, &job.spec.name_prefix));
            let spec = job.spec.clone().with_prefix(prefix);

            debug!(
                image = image_id.as_str(),
                prefix = spec.name_prefix.as_str(),
                "Processing {}/{}",
                report.images_processed + 1,
                total
            );

            let succeeded = match self.process_image(image_id, &spec, cancel).await {
                Ok(tiles) => {
                    report.tiles.extend(tiles);
                    report.images_succeeded += 1;
                    true
                }
                Err(TileError::Cancelled) => {
                    report.cancelled = true;
                    break;
                }
                Err(error) => {
                    warn!(image = image_id.as_str(), "Skipping image: {}", error);
                    report.failures.push(BatchFailure {
                        image_id: image_id.clone(),
                        error,
                    });
                    false
                }
            };

            report.images_processed += 1;
            on_progress(&BatchProgress {
                completed: report.images_processed,
                total,
                current: image_id.clone(),
                succeeded,
            });
        }

        info!(
            images = report.images_processed,
            failed = report.failures.len(),
            tiles = report.tiles.len(),
            cancelled = report.cancelled,
            "Batch finished"
        );

        Ok(report)
    }

    /// Load, decode and partition a single image.
    async fn process_image(
        &self,
        image_id: &str,
        spec: &GridSpec,
        cancel: &CancellationToken,
    ) -> Result<Vec<Tile>, TileError> {
        let data = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TileError::Cancelled),
            data = self.source.load(image_id) => data?,
        };

        self.engine
            .partition_bytes(image_id, data, spec, cancel)
            .await
    }
}

// =============================================================================
// Tests
// =============================================================================
