use std::path::PathBuf;

use anyhow::bail;
use chromseg::batch::{BatchOptions, DEFAULT_ANNOTATION_SUFFIX, run_batch};

#[derive(clap::Parser, Clone)]
pub struct RunArgs {
    /// Data directory with one sub-directory per species.
    #[arg(short = 'd', long, default_value = "data")]
    data: PathBuf,

    /// Number of threads per species. All CPUs by default.
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Annotation file name after the species name.
    #[arg(long, default_value = DEFAULT_ANNOTATION_SUFFIX)]
    annotation_suffix: String,

    /// Retry species left running by an interrupted run.
    #[arg(long)]
    reset_stale: bool,

    /// Only process this species. May be repeated.
    #[arg(short = 's', long)]
    species: Vec<String>,
}

impl RunArgs {
    pub fn run(self) -> anyhow::Result<()> {
        let options = BatchOptions {
            threads: self.threads.unwrap_or_else(num_cpus::get),
            annotation_suffix: self.annotation_suffix,
            reset_stale: self.reset_stale,
            species: self.species,
        };
        let summary = run_batch(&self.data, &options)?;

        eprintln!(
            "Processed {} species ({} regions), skipped {}, failed {}",
            summary.processed.len(),
            summary.stats.regions,
            summary.skipped.len(),
            summary.failed.len()
        );
        if !summary.failed.is_empty() {
            let names: Vec<_> = summary.failed.iter().map(|(name, _)| name.as_str()).collect();
            bail!("{} species failed: {}", names.len(), names.join(", "));
        }
        Ok(())
    }
}
