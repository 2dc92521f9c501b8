use crate::interval::{AnnotationInterval, IntervalError};

/// The full residue string of one chromosome, header line stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChromosomeSequence {
    /// First whitespace-delimited token of the FASTA header.
    pub id: String,
    /// Rest of the header, if any.
    pub description: Option<String>,
    pub residues: Vec<u8>,
}

impl ChromosomeSequence {
    pub fn new(id: impl Into<String>, residues: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.into(),
            description: None,
            residues: residues.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    /// The header as it would be written back: id plus description.
    pub fn header(&self) -> String {
        match &self.description {
            Some(description) => format!("{} {}", self.id, description),
            None => self.id.clone(),
        }
    }
}

/// One annotated region cut out of a chromosome.
///
/// Borrows from the chromosome, so it lives only as long as the chromosome
/// stays loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractedRegion<'a> {
    pub chromosome: &'a str,
    /// 1-based inclusive start.
    pub start: usize,
    /// 1-based inclusive end.
    pub end: usize,
    /// `residues[start - 1..end]`
    pub sequence: &'a [u8],
}

impl ExtractedRegion<'_> {
    /// Output name, `{chromosome}_{start}_{end}`.
    pub fn name(&self) -> String {
        format!("{}_{}_{}", self.chromosome, self.start, self.end)
    }
}

/// An interval that matched the chromosome but produced no region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejection<'a> {
    pub interval: &'a AnnotationInterval,
    pub reason: IntervalError,
}

/// Lazily cut the regions named by `intervals` out of `chromosome`.
///
/// Intervals on other chromosomes are ignored, so the input does not need to
/// be grouped or sorted. Out-of-range and malformed intervals are skipped and
/// collected in [`Segments::rejected`]. Repeated intervals are yielded once
/// per occurrence, in input order.
pub fn extract<'a, I>(
    chromosome: &'a ChromosomeSequence,
    intervals: I,
) -> Segments<'a, I::IntoIter>
where
    I: IntoIterator<Item = &'a AnnotationInterval>,
{
    Segments {
        chromosome,
        intervals: intervals.into_iter(),
        rejected: Vec::new(),
    }
}

/// Iterator returned by [`extract`].
pub struct Segments<'a, I> {
    chromosome: &'a ChromosomeSequence,
    intervals: I,
    rejected: Vec<Rejection<'a>>,
}

impl<'a, I> Segments<'a, I> {
    /// Intervals skipped so far.
    pub fn rejected(&self) -> &[Rejection<'a>] {
        &self.rejected
    }
}

impl<'a, I> Iterator for Segments<'a, I>
where
    I: Iterator<Item = &'a AnnotationInterval>,
{
    type Item = ExtractedRegion<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let chromosome = self.chromosome;
        for interval in self.intervals.by_ref() {
            if interval.chromosome != chromosome.id {
                continue;
            }
            match interval.checked_range(chromosome.len()) {
                Ok(range) => {
                    return Some(ExtractedRegion {
                        chromosome: &chromosome.id,
                        start: range.start + 1,
                        end: range.end,
                        sequence: &chromosome.residues[range],
                    });
                }
                Err(reason) => self.rejected.push(Rejection { interval, reason }),
            }
        }
        None
    }
}
