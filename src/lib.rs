//! Cut annotated regions out of genome assemblies.
//!
//! The core is [`extract`]: given one chromosome and a list of 1-based
//! inclusive intervals, it lazily yields one [`ExtractedRegion`] per interval
//! that fits in the chromosome. Everything else streams chromosomes from FASTA
//! files into it and writes the regions out, one FASTA file per region.
//!
//! ```
//! use chromseg::{AnnotationInterval, ChromosomeSequence, extract};
//!
//! let chr = ChromosomeSequence::new("chr1", "ACGTACGTAC");
//! let intervals = [
//!     AnnotationInterval::new("chr1", 1, 4),
//!     AnnotationInterval::new("chr1", 8, 11),
//! ];
//! let regions: Vec<_> = extract(&chr, &intervals).collect();
//! assert_eq!(regions.len(), 1);
//! assert_eq!(regions[0].name(), "chr1_1_4");
//! assert_eq!(regions[0].sequence, b"ACGT");
//! ```

pub mod annotation;
pub mod batch;
mod error;
pub mod fasta;
mod interval;
pub mod pipeline;
mod segment;
pub mod sink;
pub mod split;
pub mod status;

pub use annotation::{AnnotationRecord, AnnotationTable, IntervalIndex};
pub use error::{Error, Result};
pub use interval::{AnnotationInterval, IntervalError};
pub use pipeline::SegmentStats;
pub use segment::{ChromosomeSequence, ExtractedRegion, Rejection, Segments, extract};
pub use sink::{DirectorySink, MemorySink, RegionSink};
