use crate::{
    ast::CompilationUnit, config::ExtractorConfig, errors::ExtractError,
    metrics::ExtractorMetrics,
};
use factgraph::{EntityId, FactModel};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Information about a successfully traversed compilation unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitInfo<D> {
    /// Path of the unit
    pub path: PathBuf,

    /// Class entities declared in this unit, including nested and anonymous ones
    pub classes: Vec<EntityId>,

    /// Method entities declared or synthesized in this unit
    pub methods: Vec<EntityId>,

    /// Entities created while traversing this unit
    pub entities_created: usize,

    /// Associations created while traversing this unit
    pub associations_created: usize,

    /// Number of invocations handed to the deferred resolution engine
    pub deferred_count: usize,

    /// Deferred invocation records; moved into [`ProjectInfo::deferred`] by
    /// [`FactExtractor::extract_units`]
    pub deferred: Vec<D>,

    /// Time taken to traverse this unit
    #[serde(with = "duration_serde")]
    pub time: Duration,

    /// Number of lines in the unit
    pub line_count: usize,

    /// Unit size in bytes
    pub byte_count: usize,
}

// Helper module for serializing Duration
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis: u64 = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

impl<D> UnitInfo<D> {
    /// Empty information for a unit at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            classes: Vec::new(),
            methods: Vec::new(),
            entities_created: 0,
            associations_created: 0,
            deferred_count: 0,
            deferred: Vec::new(),
            time: Duration::ZERO,
            line_count: 0,
            byte_count: 0,
        }
    }

    /// Number of classes and methods declared in the unit
    pub fn declaration_count(&self) -> usize {
        self.classes.len() + self.methods.len()
    }
}

/// Outcome counts of a deferred resolution pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionSummary {
    /// Records processed
    pub attempted: usize,

    /// Records narrowed to exactly one candidate
    pub unique: usize,

    /// Records left with several candidates
    pub ambiguous: usize,

    /// Records left without any candidate
    pub unresolved: usize,

    /// Invocation associations created from resolved records
    pub linked: usize,
}

/// Aggregate information about an extracted project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInfo<D> {
    /// Information about each successfully traversed unit
    pub units: Vec<UnitInfo<D>>,

    /// Units that failed or were aborted (path, error message)
    pub failed_units: Vec<(PathBuf, String)>,

    /// Whether the run stopped early on a cancellation request
    pub cancelled: bool,

    /// Deferred invocation records of every traversed unit, for diagnostics
    pub deferred: Vec<D>,

    /// Outcome of the deferred resolution pass
    pub resolution: ResolutionSummary,

    /// Total time for the whole run
    #[serde(with = "duration_serde")]
    pub total_time: Duration,
}

impl<D> Default for ProjectInfo<D> {
    fn default() -> Self {
        Self {
            units: Vec::new(),
            failed_units: Vec::new(),
            cancelled: false,
            deferred: Vec::new(),
            resolution: ResolutionSummary::default(),
            total_time: Duration::ZERO,
        }
    }
}

impl<D> ProjectInfo<D> {
    /// Total number of units processed (success + failure)
    pub fn total_units(&self) -> usize {
        self.units.len() + self.failed_units.len()
    }

    /// Success rate (0.0 to 1.0)
    pub fn success_rate(&self) -> f64 {
        if self.total_units() == 0 {
            0.0
        } else {
            self.units.len() as f64 / self.total_units() as f64
        }
    }

    /// Total classes across all traversed units
    pub fn total_classes(&self) -> usize {
        self.units.iter().map(|u| u.classes.len()).sum()
    }

    /// Total methods across all traversed units
    pub fn total_methods(&self) -> usize {
        self.units.iter().map(|u| u.methods.len()).sum()
    }

    /// Record a traversed unit, moving its deferred records to the project list
    pub fn push_unit(&mut self, mut unit: UnitInfo<D>) {
        self.deferred.append(&mut unit.deferred);
        self.units.push(unit);
    }
}

/// Progress and cancellation signal consulted between compilation units
///
/// Nothing is checked while a unit is being traversed; a cancelled run keeps
/// everything extracted up to that point.
pub trait ProgressMonitor: Sync {
    /// Whether the run should stop before the next unit
    fn is_cancelled(&self) -> bool {
        false
    }

    /// Called after each unit, successful or not
    fn unit_done(&self, _path: &Path, _done: usize, _total: usize) {}
}

/// A monitor that never cancels and ignores progress
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressMonitor for NoProgress {}

/// A monitor backed by an atomic flag that another thread can raise
#[derive(Debug, Default)]
pub struct CancellationFlag {
    cancelled: AtomicBool,
}

impl CancellationFlag {
    /// Create a lowered flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation before the next unit
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

impl ProgressMonitor for CancellationFlag {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Core trait that all fact extractors must implement
///
/// An extractor traverses compilation units into a [`FactModel`], handing
/// invocations it cannot resolve on the spot to a deferred pass that runs
/// once every unit has been traversed.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to support parallel extraction.
pub trait FactExtractor: Send + Sync {
    /// Deferred invocation record produced by this extractor
    type Deferred: Send;

    /// Returns the language identifier (lowercase, e.g., "java")
    fn language(&self) -> &str;

    /// Returns supported file extensions (e.g., [".java"])
    fn file_extensions(&self) -> &[&str];

    /// Lower source text into a compilation unit without touching any model
    fn lower(&self, source: &str, file_path: &Path) -> Result<CompilationUnit, ExtractError>;

    /// Traverse one compilation unit into the model
    ///
    /// Deferred records are returned unresolved in [`UnitInfo::deferred`].
    ///
    /// # Errors
    /// Returns `ExtractError` if the unit had to be aborted because of an
    /// invariant violation. Entities created before the abort stay in the model.
    fn extract_unit(
        &self,
        unit: &CompilationUnit,
        model: &mut FactModel,
    ) -> Result<UnitInfo<Self::Deferred>, ExtractError>;

    /// Resolve deferred records against a complete model and link the results
    fn resolve_deferred(
        &self,
        model: &mut FactModel,
        deferred: &mut [Self::Deferred],
    ) -> Result<ResolutionSummary, ExtractError>;

    /// Traverse several units, then run the deferred pass
    ///
    /// Default implementation traverses units sequentially. A failing unit is
    /// recorded in [`ProjectInfo::failed_units`] and never fails the run.
    fn extract_units(
        &self,
        units: &[CompilationUnit],
        model: &mut FactModel,
        progress: &dyn ProgressMonitor,
    ) -> Result<ProjectInfo<Self::Deferred>, ExtractError> {
        extract_units_sequential(self, units, model, progress)
    }

    /// Lower and traverse source text
    ///
    /// Deferred records are returned unresolved; call
    /// [`FactExtractor::resolve_deferred`] once every unit is in the model.
    fn parse_source(
        &self,
        source: &str,
        file_path: &Path,
        model: &mut FactModel,
    ) -> Result<UnitInfo<Self::Deferred>, ExtractError> {
        let unit = self.lower(source, file_path)?;
        self.extract_unit(&unit, model)
    }

    /// Read, lower and traverse a file
    fn parse_file(
        &self,
        path: &Path,
        model: &mut FactModel,
    ) -> Result<UnitInfo<Self::Deferred>, ExtractError> {
        let source = self.read_source(path)?;
        self.parse_source(&source, path, model)
    }

    /// Read, lower and traverse several files, then run the deferred pass
    ///
    /// Files that cannot be read or lowered are reported as failed units.
    fn parse_files(
        &self,
        paths: &[PathBuf],
        model: &mut FactModel,
        progress: &dyn ProgressMonitor,
    ) -> Result<ProjectInfo<Self::Deferred>, ExtractError> {
        let mut units = Vec::with_capacity(paths.len());
        let mut failed = Vec::new();
        for path in paths {
            match self
                .read_source(path)
                .and_then(|source| self.lower(&source, path))
            {
                Ok(unit) => units.push(unit),
                Err(e) => {
                    warn!("Skipping {}: {e}", path.display());
                    failed.push((path.clone(), e.to_string()));
                }
            }
        }

        let mut project = self.extract_units(&units, model, progress)?;
        project.failed_units.extend(failed);
        Ok(project)
    }

    /// Read a file, enforcing the configured size limit
    fn read_source(&self, path: &Path) -> Result<String, ExtractError> {
        let metadata =
            std::fs::metadata(path).map_err(|e| ExtractError::IoError(path.to_path_buf(), e))?;
        let size = metadata.len() as usize;
        if size > self.config().max_file_size {
            return Err(ExtractError::FileTooLarge(path.to_path_buf(), size));
        }
        std::fs::read_to_string(path).map_err(|e| ExtractError::IoError(path.to_path_buf(), e))
    }

    /// Check if this extractor can handle the given file
    ///
    /// Default implementation checks file extension.
    fn can_parse(&self, path: &Path) -> bool {
        if let Some(ext) = path.extension() {
            let ext_str = format!(".{}", ext.to_string_lossy());
            self.file_extensions().contains(&ext_str.as_str())
        } else {
            false
        }
    }

    /// Get extractor configuration
    fn config(&self) -> &ExtractorConfig;

    /// Get accumulated metrics
    fn metrics(&self) -> ExtractorMetrics;

    /// Reset metrics
    ///
    /// Clears accumulated metrics. Useful for benchmarking.
    fn reset_metrics(&mut self);
}

/// Traverse units one after the other, then run the deferred pass
///
/// This is the default [`FactExtractor::extract_units`]; extractors that
/// override it can fall back to this function.
pub fn extract_units_sequential<E: FactExtractor + ?Sized>(
    extractor: &E,
    units: &[CompilationUnit],
    model: &mut FactModel,
    progress: &dyn ProgressMonitor,
) -> Result<ProjectInfo<E::Deferred>, ExtractError> {
    let start = Instant::now();
    let mut project = ProjectInfo::default();
    let total = units.len();

    for (index, unit) in units.iter().enumerate() {
        if progress.is_cancelled() {
            info!("Extraction cancelled after {index} of {total} units");
            project.cancelled = true;
            break;
        }
        match extractor.extract_unit(unit, model) {
            Ok(info) => project.push_unit(info),
            Err(e) => {
                warn!("Failed to extract {}: {e}", unit.path);
                project
                    .failed_units
                    .push((PathBuf::from(&unit.path), e.to_string()));
            }
        }
        progress.unit_done(Path::new(&unit.path), index + 1, total);
    }

    if extractor.config().resolve_deferred && !project.cancelled {
        project.resolution = extractor.resolve_deferred(model, &mut project.deferred)?;
    }
    project.total_time = start.elapsed();
    Ok(project)
}
