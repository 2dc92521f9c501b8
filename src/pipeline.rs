use std::ops::AddAssign;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Instant;

use log::{debug, info, warn};

use crate::annotation::IntervalIndex;
use crate::error::Result;
use crate::fasta::ChromosomeReader;
use crate::interval::AnnotationInterval;
use crate::segment::{ChromosomeSequence, extract};
use crate::sink::RegionSink;

/// Counters for one or more segmented chromosomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentStats {
    /// Chromosomes that had at least one interval.
    pub chromosomes: usize,
    /// Chromosomes read from FASTA without any interval.
    pub unmatched_chromosomes: usize,
    pub regions: usize,
    pub out_of_range: usize,
    pub malformed: usize,
}

impl AddAssign for SegmentStats {
    fn add_assign(&mut self, rhs: Self) {
        self.chromosomes += rhs.chromosomes;
        self.unmatched_chromosomes += rhs.unmatched_chromosomes;
        self.regions += rhs.regions;
        self.out_of_range += rhs.out_of_range;
        self.malformed += rhs.malformed;
    }
}

/// Cut all `intervals` of `chromosome` and hand them to `sink`.
pub fn segment_chromosome<S: RegionSink + ?Sized>(
    chromosome: &ChromosomeSequence,
    intervals: &[AnnotationInterval],
    sink: &S,
) -> Result<SegmentStats> {
    let mut stats = SegmentStats {
        chromosomes: 1,
        ..Default::default()
    };
    let mut segments = extract(chromosome, intervals);
    for region in segments.by_ref() {
        sink.write_region(&region)?;
        stats.regions += 1;
    }
    for rejection in segments.rejected() {
        if rejection.reason.is_malformed() {
            stats.malformed += 1;
            warn!("Rejected {}: {}", rejection.interval.name(), rejection.reason);
        } else {
            stats.out_of_range += 1;
            debug!("Skipped {}: {}", rejection.interval.name(), rejection.reason);
        }
    }
    Ok(stats)
}

/// Segment every record of one FASTA file.
///
/// Records are read one at a time and dropped once their intervals are
/// written, so memory stays bounded by the largest chromosome.
pub fn segment_file<S: RegionSink + ?Sized>(
    path: &Path,
    index: &IntervalIndex,
    sink: &S,
) -> Result<SegmentStats> {
    let mut stats = SegmentStats::default();
    for chromosome in ChromosomeReader::from_path(path)? {
        let chromosome = chromosome?;
        let Some(intervals) = index.get(&chromosome.id) else {
            debug!("No intervals for {} in {}", chromosome.id, path.display());
            stats.unmatched_chromosomes += 1;
            continue;
        };
        let start = Instant::now();
        let chromosome_stats = segment_chromosome(&chromosome, intervals, sink)?;
        info!(
            "Chromosome {} ({} bp): {} regions in {:.2?}",
            chromosome.id,
            chromosome.len(),
            chromosome_stats.regions,
            start.elapsed()
        );
        stats += chromosome_stats;
    }
    Ok(stats)
}

/// Segment many FASTA files with `threads` workers.
///
/// Workers pull the next file index from a shared counter, so each file is
/// read by exactly one worker. After the first error no new files are
/// started, and that error is returned.
pub fn segment_files<S: RegionSink + ?Sized>(
    paths: &[PathBuf],
    index: &IntervalIndex,
    sink: &S,
    threads: usize,
) -> Result<SegmentStats> {
    let threads = threads.clamp(1, paths.len().max(1));
    let next_file = AtomicUsize::new(0);
    let failed = AtomicBool::new(false);

    std::thread::scope(|s| {
        let workers: Vec<_> = (0..threads)
            .map(|_| {
                s.spawn(|| -> Result<SegmentStats> {
                    let mut stats = SegmentStats::default();
                    while !failed.load(Ordering::Relaxed) {
                        let idx = next_file.fetch_add(1, Ordering::Relaxed);
                        let Some(path) = paths.get(idx) else {
                            break;
                        };
                        match segment_file(path, index, sink) {
                            Ok(file_stats) => stats += file_stats,
                            Err(e) => {
                                failed.store(true, Ordering::Relaxed);
                                return Err(e);
                            }
                        }
                    }
                    Ok(stats)
                })
            })
            .collect();

        let mut total = SegmentStats::default();
        let mut first_error = None;
        for worker in workers {
            match worker.join() {
                Ok(Ok(stats)) => total += stats,
                Ok(Err(e)) => {
                    first_error.get_or_insert(e);
                }
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(total),
        }
    })
}
