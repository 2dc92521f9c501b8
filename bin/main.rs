mod run;
mod segment;
mod split;

use clap::Parser;
use run::RunArgs;
use segment::SegmentArgs;
use split::SplitArgs;

#[derive(clap::Parser)]
#[command(author, version, about)]
enum Args {
    /// Split a genome FASTA into one file per chromosome.
    ///
    /// With an annotation, only chromosomes named in it are written.
    Split(SplitArgs),
    /// Cut annotated regions out of FASTA files, one output file per region.
    Segment(SegmentArgs),
    /// Segment every species under a data directory, skipping finished ones.
    Run(RunArgs),
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::init();

    match args {
        Args::Split(split_args) => split_args.run(),
        Args::Segment(segment_args) => segment_args.run(),
        Args::Run(run_args) => run_args.run(),
    }
}
