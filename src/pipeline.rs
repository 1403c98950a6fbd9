//! End-to-end runs composing the reader, grouper, relation extractor and
//! exon walk.

use std::fmt;
use std::path::Path;

use crate::group::Groups;
use crate::reader::{Reader, ReaderError};
use crate::record::ExonSet;
use crate::relation::{extract_relations, RelationSet};
use crate::walk::{classify, report_all, ExonReport, SeedWalk, WalkOptions};
use crate::writer::WriterError;

/// Result alias for pipeline runs.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors surfaced by a pipeline run.
#[derive(Debug)]
pub enum PipelineError {
    /// Reading an input table failed.
    Reader(ReaderError),
    /// Writing an output failed.
    Writer(WriterError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Reader(err) => write!(f, "{err}"),
            PipelineError::Writer(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Reader(err) => Some(err),
            PipelineError::Writer(err) => Some(err),
        }
    }
}

impl From<ReaderError> for PipelineError {
    fn from(err: ReaderError) -> Self {
        PipelineError::Reader(err)
    }
}

impl From<WriterError> for PipelineError {
    fn from(err: WriterError) -> Self {
        PipelineError::Writer(err)
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Writer(WriterError::Io(err))
    }
}

/// Reads an exon table from `path`, compressed or not.
pub fn load_exons<P: AsRef<Path>>(path: P) -> PipelineResult<ExonSet> {
    let path = path.as_ref();
    let exons = Reader::from_path(path)?.read_exons()?;
    log::info!("read {} exon records from {}", exons.len(), path.display());
    Ok(exons)
}

/// Prior knowledge about an original annotation set.
#[derive(Debug, Clone, Default)]
pub struct ExonInfo {
    /// Connected components of the original patterns.
    pub groups: Groups,
    /// Relations between patterns of different groups.
    pub relations: RelationSet,
}

/// Groups the patterns of `exons`, then extracts the relations the groups do
/// not already explain.
pub fn exon_info(exons: &ExonSet) -> ExonInfo {
    let groups = Groups::from_exons(exons);
    let relations = extract_relations(exons, groups.lookup());

    log::info!("groups {} ({} pairs)", groups.len(), groups.pair_count());
    log::info!("rels {}", relations.len());

    ExonInfo { groups, relations }
}

/// Walks and their filtered reports.
#[derive(Debug, Clone, Default)]
pub struct WalkRun {
    /// One walk per distinct seed id.
    pub walks: Vec<SeedWalk>,
    /// Unexplained exons of every walk, walk by walk.
    pub reports: Vec<ExonReport>,
}

/// Walks a converted annotation set against the knowledge of the original.
///
/// Converted records missing basic fields, and partial structural-variant
/// fragments, are dropped before walking.
pub fn walk_converted(mut converted: ExonSet, info: &ExonInfo, options: &WalkOptions) -> WalkRun {
    converted.retain_walkable();

    let walks = classify(
        &converted,
        info.groups.lookup(),
        &info.relations,
        options,
    );
    let reports = report_all(&walks, &converted, options);

    log::info!(
        "{} walks, {} unexplained exons reported",
        walks.len(),
        reports.len()
    );

    WalkRun { walks, reports }
}

/// Loads both tables and runs the full walk.
pub fn run_walk<P, Q>(converted: P, original: Q, options: &WalkOptions) -> PipelineResult<WalkRun>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let original = load_exons(original)?;
    let info = exon_info(&original);
    let converted = load_exons(converted)?;

    Ok(walk_converted(converted, &info, options))
}
