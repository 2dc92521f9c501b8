//! Resumable segmentation over a `data/<species>/` tree.
//!
//! ```text
//! data/
//!   .status/                      one status record per species
//!   <species>/
//!     <species>_TER_merged.gff3   annotation
//!     fasta/                      one FASTA file per chromosome
//!     seq/                        output, one FASTA file per region
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{error, info, warn};

use crate::annotation::AnnotationTable;
use crate::error::{Error, Result};
use crate::pipeline::{SegmentStats, segment_files};
use crate::sink::DirectorySink;
use crate::status::{Status, StatusStore};

pub const DEFAULT_ANNOTATION_SUFFIX: &str = "_TER_merged.gff3";
pub const STATUS_DIR: &str = ".status";

/// Paths for one species directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeciesLayout {
    pub name: String,
    pub root: PathBuf,
    annotation_suffix: String,
}

impl SpeciesLayout {
    pub fn new(data_dir: &Path, name: &str, annotation_suffix: &str) -> Self {
        Self {
            name: name.to_string(),
            root: data_dir.join(name),
            annotation_suffix: annotation_suffix.to_string(),
        }
    }

    pub fn annotation_path(&self) -> PathBuf {
        self.root.join(format!("{}{}", self.name, self.annotation_suffix))
    }

    pub fn fasta_dir(&self) -> PathBuf {
        self.root.join("fasta")
    }

    pub fn seq_dir(&self) -> PathBuf {
        self.root.join("seq")
    }

    /// Chromosome FASTA files, sorted by file name.
    pub fn fasta_files(&self) -> Result<Vec<PathBuf>> {
        sorted_entries(&self.fasta_dir(), |path| path.is_file())
    }
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub threads: usize,
    pub annotation_suffix: String,
    /// Return species left running by an earlier, interrupted run to pending.
    pub reset_stale: bool,
    /// Only process these species. Empty means all.
    pub species: Vec<String>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            threads: 1,
            annotation_suffix: DEFAULT_ANNOTATION_SUFFIX.to_string(),
            reset_stale: false,
            species: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub processed: Vec<String>,
    /// Species already done or running elsewhere.
    pub skipped: Vec<String>,
    pub failed: Vec<(String, Error)>,
    pub stats: SegmentStats,
}

/// Segment one species: read its annotation, then cut regions out of every
/// chromosome file into `seq/`.
pub fn run_species(layout: &SpeciesLayout, threads: usize) -> Result<SegmentStats> {
    let start = Instant::now();
    let table = AnnotationTable::from_path(layout.annotation_path())?;
    let index = table.index();
    let files = layout.fasta_files()?;
    info!(
        "Species {}: {} intervals on {} chromosomes, {} FASTA files",
        layout.name,
        index.num_intervals(),
        index.chromosomes().count(),
        files.len()
    );

    let sink = DirectorySink::new(layout.seq_dir())?;
    let stats = segment_files(&files, &index, &sink, threads)?;
    if sink.duplicates() > 0 {
        warn!(
            "Species {}: {} regions overwritten by duplicate annotation rows",
            layout.name,
            sink.duplicates()
        );
    }
    info!(
        "Species {} processed in {:.2?}: {} regions, {} out of range, {} malformed",
        layout.name,
        start.elapsed(),
        stats.regions,
        stats.out_of_range,
        stats.malformed
    );
    Ok(stats)
}

/// Segment every species under `data_dir` that is not yet done.
///
/// A species is claimed (marked running) before it is processed, marked done
/// on success, and put back to pending on failure so the next run retries it.
/// A failing species does not stop the batch.
pub fn run_batch(data_dir: &Path, options: &BatchOptions) -> Result<BatchSummary> {
    let store = StatusStore::open(data_dir.join(STATUS_DIR))?;
    if options.reset_stale {
        for key in store.reset_running()? {
            warn!("Species {key} was left running; reset to pending");
        }
    }

    let mut summary = BatchSummary::default();
    for name in species_names(data_dir)? {
        if !options.species.is_empty() && !options.species.contains(&name) {
            continue;
        }
        if !store.try_claim(&name)? {
            info!("Species {name} is {}, skipping", store.get(&name)?);
            summary.skipped.push(name);
            continue;
        }

        let layout = SpeciesLayout::new(data_dir, &name, &options.annotation_suffix);
        match run_species(&layout, options.threads) {
            Ok(stats) => {
                store.set(&name, Status::Done)?;
                summary.stats += stats;
                summary.processed.push(name);
            }
            Err(e) => {
                error!("Species {name} failed: {e}");
                store.set(&name, Status::Pending)?;
                summary.failed.push((name, e));
            }
        }
    }
    Ok(summary)
}

/// Species directories under `data_dir`, sorted. Hidden entries are ignored.
pub fn species_names(data_dir: &Path) -> Result<Vec<String>> {
    Ok(sorted_entries(data_dir, |path| path.is_dir())?
        .into_iter()
        .filter_map(|path| Some(path.file_name()?.to_str()?.to_string()))
        .filter(|name| !name.starts_with('.'))
        .collect())
}

fn sorted_entries(dir: &Path, keep: impl Fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(Error::io(dir))? {
        let path = entry.map_err(Error::io(dir))?.path();
        if keep(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}
