use std::path::PathBuf;

use anyhow::Context;
use log::info;
use chromseg::pipeline::segment_files;
use chromseg::{AnnotationTable, DirectorySink};

#[derive(clap::Parser, Clone)]
pub struct SegmentArgs {
    /// Annotation table with the regions to cut.
    #[arg(short = 'a', long)]
    annotation: PathBuf,

    /// Directory for the per-region files.
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Number of threads to use, one FASTA file per thread at a time. All CPUs by default.
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    // Positional
    /// FASTA files holding the chromosomes: one genome, or one file per chromosome.
    #[arg(required = true)]
    paths: Vec<PathBuf>,
}

impl SegmentArgs {
    pub fn run(self) -> anyhow::Result<()> {
        let table = AnnotationTable::from_path(&self.annotation)
            .with_context(|| format!("reading annotation {}", self.annotation.display()))?;
        let index = table.index();
        let sink = DirectorySink::new(&self.output)?;
        let threads = self.threads.unwrap_or_else(num_cpus::get);

        let stats = segment_files(&self.paths, &index, &sink, threads)?;

        eprintln!(
            "Wrote {} regions from {} chromosomes to {}",
            stats.regions,
            stats.chromosomes,
            self.output.display()
        );
        info!(
            "Skipped {} out-of-range and {} malformed intervals, {} chromosomes had no intervals, {} names repeated",
            stats.out_of_range,
            stats.malformed,
            stats.unmatched_chromosomes,
            sink.duplicates()
        );
        Ok(())
    }
}
