//! Implementation of the FactExtractor trait for Java

use factgraph::FactModel;
use factgraph_parser_api::{
    extract_units_sequential, CompilationUnit, ExtractError, ExtractorConfig, ExtractorMetrics,
    FactExtractor, ProgressMonitor, ProjectInfo, ResolutionSummary, UnitInfo,
};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::deferred::{self, UnresolvedMethodInvocation};
use crate::extractor;
use crate::syntax;

/// Java fact extractor implementing the FactExtractor trait
pub struct JavaFactExtractor {
    config: ExtractorConfig,
    metrics: Mutex<ExtractorMetrics>,
}

impl JavaFactExtractor {
    pub fn new() -> Self {
        Self::with_config(ExtractorConfig::default())
    }

    pub fn with_config(config: ExtractorConfig) -> Self {
        Self {
            config,
            metrics: Mutex::new(ExtractorMetrics::default()),
        }
    }

    fn update_metrics(
        &self,
        result: Result<&UnitInfo<UnresolvedMethodInvocation>, ()>,
        duration: Duration,
    ) {
        let mut metrics = self.metrics.lock().unwrap_or_else(PoisonError::into_inner);
        metrics.units_attempted += 1;
        metrics.total_time += duration;
        match result {
            Ok(info) => {
                metrics.units_succeeded += 1;
                metrics.total_entities += info.entities_created;
                metrics.total_associations += info.associations_created;
                metrics.deferred_invocations += info.deferred_count;
            }
            Err(()) => metrics.units_failed += 1,
        }
    }

    /// Traverse units on a rayon pool, one unit holding the model at a time
    fn extract_units_parallel(
        &self,
        units: &[CompilationUnit],
        model: &mut FactModel,
        progress: &dyn ProgressMonitor,
    ) -> Result<ProjectInfo<UnresolvedMethodInvocation>, ExtractError> {
        use rayon::prelude::*;

        let start = Instant::now();
        let total = units.len();
        let done = AtomicUsize::new(0);
        let model_mutex = Mutex::new(&mut *model);

        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(num_threads) = self.config.parallel_workers {
            builder = builder.num_threads(num_threads);
        }
        let pool = builder
            .build()
            .map_err(|e| ExtractError::ThreadPool(e.to_string()))?;

        let results: Vec<Option<Result<_, (PathBuf, String)>>> = pool.install(|| {
            units
                .par_iter()
                .map(|unit| {
                    if progress.is_cancelled() {
                        return None;
                    }
                    let result = {
                        let mut model =
                            model_mutex.lock().unwrap_or_else(PoisonError::into_inner);
                        self.extract_unit(unit, &mut model)
                    };
                    let path = Path::new(&unit.path);
                    progress.unit_done(path, done.fetch_add(1, Ordering::SeqCst) + 1, total);
                    Some(result.map_err(|e| {
                        warn!("Failed to extract {}: {e}", unit.path);
                        (path.to_path_buf(), e.to_string())
                    }))
                })
                .collect()
        });
        drop(model_mutex);

        let mut project = ProjectInfo::default();
        for result in results {
            match result {
                Some(Ok(info)) => project.push_unit(info),
                Some(Err(failure)) => project.failed_units.push(failure),
                None => project.cancelled = true,
            }
        }
        if project.cancelled {
            info!(
                "Extraction cancelled after {} of {total} units",
                project.total_units()
            );
        }

        if self.config.resolve_deferred && !project.cancelled {
            project.resolution = self.resolve_deferred(model, &mut project.deferred)?;
        }
        project.total_time = start.elapsed();
        Ok(project)
    }
}

impl Default for JavaFactExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FactExtractor for JavaFactExtractor {
    type Deferred = UnresolvedMethodInvocation;

    fn language(&self) -> &str {
        "java"
    }

    fn file_extensions(&self) -> &[&str] {
        &[".java"]
    }

    fn lower(&self, source: &str, file_path: &Path) -> Result<CompilationUnit, ExtractError> {
        syntax::lower(source, file_path, &self.config)
    }

    fn extract_unit(
        &self,
        unit: &CompilationUnit,
        model: &mut FactModel,
    ) -> Result<UnitInfo<Self::Deferred>, ExtractError> {
        let start = Instant::now();
        let result = extractor::extract(unit, model, &self.config);
        self.update_metrics(result.as_ref().map_err(|_| ()), start.elapsed());
        result
    }

    fn resolve_deferred(
        &self,
        model: &mut FactModel,
        deferred: &mut [Self::Deferred],
    ) -> Result<ResolutionSummary, ExtractError> {
        let summary = deferred::resolve_and_link(model, deferred, &self.config)?;
        let mut metrics = self.metrics.lock().unwrap_or_else(PoisonError::into_inner);
        metrics.resolved_invocations += summary.unique;
        metrics.ambiguous_invocations += summary.ambiguous;
        Ok(summary)
    }

    fn extract_units(
        &self,
        units: &[CompilationUnit],
        model: &mut FactModel,
        progress: &dyn ProgressMonitor,
    ) -> Result<ProjectInfo<Self::Deferred>, ExtractError> {
        if self.config.parallel {
            self.extract_units_parallel(units, model, progress)
        } else {
            extract_units_sequential(self, units, model, progress)
        }
    }

    fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    fn metrics(&self) -> ExtractorMetrics {
        self.metrics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn reset_metrics(&mut self) {
        *self.metrics.lock().unwrap_or_else(PoisonError::into_inner) = ExtractorMetrics::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language() {
        let extractor = JavaFactExtractor::new();
        assert_eq!(extractor.language(), "java");
    }

    #[test]
    fn test_file_extensions() {
        let extractor = JavaFactExtractor::new();
        assert_eq!(extractor.file_extensions(), &[".java"]);
    }

    #[test]
    fn test_can_parse() {
        let extractor = JavaFactExtractor::new();
        assert!(extractor.can_parse(Path::new("Main.java")));
        assert!(extractor.can_parse(Path::new("src/com/example/App.java")));
        assert!(!extractor.can_parse(Path::new("main.py")));
        assert!(!extractor.can_parse(Path::new("Main.class")));
    }

    #[test]
    fn test_metrics_track_units() {
        let mut extractor = JavaFactExtractor::new();
        let mut model = FactModel::new();
        extractor
            .parse_source("class A { void m() {} }", Path::new("A.java"), &mut model)
            .unwrap();
        assert!(extractor
            .parse_source("class B {", Path::new("B.java"), &mut model)
            .is_err());

        let metrics = extractor.metrics();
        assert_eq!(metrics.units_attempted, 1);
        assert_eq!(metrics.units_succeeded, 1);
        assert!(metrics.total_entities > 0);

        extractor.reset_metrics();
        assert_eq!(extractor.metrics().units_attempted, 0);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sources = [
            ("A.java", "class A { void run() { new B().go(); } }"),
            ("B.java", "class B { void go() {} }"),
            ("C.java", "class C extends B { void go() { super.go(); } }"),
        ];
        let units: Vec<CompilationUnit> = sources
            .iter()
            .map(|(path, source)| {
                syntax::lower(source, Path::new(path), &ExtractorConfig::default()).unwrap()
            })
            .collect();

        let sequential = JavaFactExtractor::new();
        let mut expected = FactModel::new();
        let first = sequential
            .extract_units(&units, &mut expected, &factgraph_parser_api::NoProgress)
            .unwrap();

        let parallel = JavaFactExtractor::with_config(
            ExtractorConfig::default()
                .with_parallel(true)
                .with_parallel_workers(2),
        );
        let mut actual = FactModel::new();
        let second = parallel
            .extract_units(&units, &mut actual, &factgraph_parser_api::NoProgress)
            .unwrap();

        assert_eq!(first.units.len(), 3);
        assert_eq!(second.units.len(), 3);
        assert_eq!(expected.entity_count(), actual.entity_count());
        assert_eq!(expected.association_count(), actual.association_count());
        assert_eq!(first.resolution, second.resolution);
    }
}
