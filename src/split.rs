use std::collections::{BTreeSet, HashSet};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{debug, info, warn};

use crate::error::{Error, Result};
use crate::fasta::{ChromosomeReader, write_record};
use crate::sink::checked_file_stem;

/// What [`split_genome`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitSummary {
    /// Chromosome files written, in genome order.
    pub written: Vec<PathBuf>,
    /// Records not named in `keep`.
    pub skipped: usize,
    /// Records whose id was already written.
    pub duplicates: usize,
    /// Ids in `keep` that never appeared in the genome.
    pub missing: Vec<String>,
}

/// Write every record of `genome` to `<out_dir>/<id>.fasta`.
///
/// With `keep`, only records whose id is in the set are written. Ids are
/// compared exactly, so `chr1` never picks up `chr10`. If an id occurs more
/// than once, the first record wins.
pub fn split_genome(
    genome: impl AsRef<Path>,
    keep: Option<&BTreeSet<String>>,
    out_dir: impl AsRef<Path>,
) -> Result<SplitSummary> {
    let genome = genome.as_ref();
    let out_dir = out_dir.as_ref();
    fs::create_dir_all(out_dir).map_err(Error::io(out_dir))?;

    let mut summary = SplitSummary::default();
    let mut written_ids = HashSet::new();
    for chromosome in ChromosomeReader::from_path(genome)? {
        let chromosome = chromosome?;
        if keep.is_some_and(|keep| !keep.contains(&chromosome.id)) {
            debug!("Skipping {}: not in annotation", chromosome.id);
            summary.skipped += 1;
            continue;
        }
        if !written_ids.insert(chromosome.id.clone()) {
            warn!(
                "{} occurs more than once in {}; keeping the first record",
                chromosome.id,
                genome.display()
            );
            summary.duplicates += 1;
            continue;
        }

        let start = Instant::now();
        let path = out_dir.join(format!("{}.fasta", checked_file_stem(&chromosome.id)?));
        let file = File::create(&path).map_err(Error::io(&path))?;
        let mut writer = BufWriter::new(file);
        write_record(&mut writer, &chromosome.header(), &chromosome.residues)?;
        writer.flush().map_err(Error::io(&path))?;
        info!(
            "Wrote {} ({} bp) in {:.2?}",
            path.display(),
            chromosome.len(),
            start.elapsed()
        );
        summary.written.push(path);
    }

    if let Some(keep) = keep {
        summary.missing = keep
            .iter()
            .filter(|id| !written_ids.contains(*id))
            .cloned()
            .collect();
        for id in &summary.missing {
            warn!("{id} is annotated but missing from {}", genome.display());
        }
    }
    Ok(summary)
}
