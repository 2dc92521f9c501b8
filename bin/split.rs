use std::path::PathBuf;

use anyhow::Context;
use chromseg::AnnotationTable;
use chromseg::split::split_genome;

#[derive(clap::Parser, Clone)]
pub struct SplitArgs {
    /// Genome assembly in FASTA format. May be compressed.
    #[arg(short = 'g', long)]
    genome: PathBuf,

    /// Annotation table; only chromosomes it mentions are written.
    #[arg(short = 'a', long)]
    annotation: Option<PathBuf>,

    /// Directory for the per-chromosome files.
    #[arg(short = 'o', long)]
    output: PathBuf,
}

impl SplitArgs {
    pub fn run(self) -> anyhow::Result<()> {
        let keep = match &self.annotation {
            Some(path) => Some(
                AnnotationTable::from_path(path)
                    .with_context(|| format!("reading annotation {}", path.display()))?
                    .chromosomes(),
            ),
            None => None,
        };

        let summary = split_genome(&self.genome, keep.as_ref(), &self.output)
            .with_context(|| format!("splitting {}", self.genome.display()))?;

        eprintln!(
            "Wrote {} chromosomes to {} ({} skipped, {} duplicate, {} missing)",
            summary.written.len(),
            self.output.display(),
            summary.skipped,
            summary.duplicates,
            summary.missing.len()
        );
        Ok(())
    }
}
