use std::ops::Range;

/// A 1-based, inclusive `[start, end]` range on a named chromosome.
///
/// Coordinates are stored exactly as they appear in the annotation table,
/// zero and negative values included. Nothing is validated on construction;
/// see [`AnnotationInterval::checked_range`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnnotationInterval {
    pub chromosome: String,
    /// 1-based inclusive start.
    pub start: i64,
    /// 1-based inclusive end.
    pub end: i64,
}

/// Why an interval could not be cut out of its chromosome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IntervalError {
    /// `start` or `end` lies past the last residue.
    #[error("interval {start}..={end} exceeds chromosome length {len}")]
    OutOfRange { start: i64, end: i64, len: usize },
    /// `start` is below 1, or `end` comes before `start`.
    #[error("malformed interval {start}..={end}")]
    Malformed { start: i64, end: i64 },
}

impl IntervalError {
    pub fn is_malformed(&self) -> bool {
        matches!(self, IntervalError::Malformed { .. })
    }
}

impl AnnotationInterval {
    pub fn new(chromosome: impl Into<String>, start: i64, end: i64) -> Self {
        Self {
            chromosome: chromosome.into(),
            start,
            end,
        }
    }

    /// Number of residues covered, or 0 for a malformed interval.
    pub fn len(&self) -> usize {
        if self.start < 1 || self.end < self.start {
            0
        } else {
            (self.end - self.start + 1) as usize
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Output name of the region, `{chromosome}_{start}_{end}`.
    pub fn name(&self) -> String {
        format!("{}_{}_{}", self.chromosome, self.start, self.end)
    }

    /// The 0-based half-open range of this interval in a sequence of `len` residues.
    ///
    /// The length check comes first and is strict: `end == len` is fine,
    /// `end == len + 1` is out of range. Only intervals that fit are then
    /// checked for being well-formed.
    pub fn checked_range(&self, len: usize) -> Result<Range<usize>, IntervalError> {
        let (start, end) = (self.start, self.end);
        let last = i64::try_from(len).unwrap_or(i64::MAX);
        if start > last || end > last {
            return Err(IntervalError::OutOfRange { start, end, len });
        }
        if start < 1 || end < start {
            return Err(IntervalError::Malformed { start, end });
        }
        // 1 <= start <= end <= len
        Ok(start as usize - 1..end as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_is_zero_based_half_open() {
        let iv = AnnotationInterval::new("chr1", 1, 4);
        assert_eq!(iv.checked_range(10), Ok(0..4));
        let iv = AnnotationInterval::new("chr1", 5, 10);
        assert_eq!(iv.checked_range(10), Ok(4..10));
    }

    #[test]
    fn end_at_length_is_kept() {
        let iv = AnnotationInterval::new("chr1", 10, 10);
        assert_eq!(iv.checked_range(10), Ok(9..10));
    }

    #[test]
    fn one_past_the_end_is_out_of_range() {
        let iv = AnnotationInterval::new("chr1", 8, 11);
        assert_eq!(
            iv.checked_range(10),
            Err(IntervalError::OutOfRange {
                start: 8,
                end: 11,
                len: 10
            })
        );
        let iv = AnnotationInterval::new("chr1", 11, 11);
        assert!(matches!(
            iv.checked_range(10),
            Err(IntervalError::OutOfRange { .. })
        ));
    }

    #[test]
    fn malformed_intervals() {
        let zero = AnnotationInterval::new("chr1", 0, 3);
        assert_eq!(
            zero.checked_range(10),
            Err(IntervalError::Malformed { start: 0, end: 3 })
        );
        let reversed = AnnotationInterval::new("chr1", 6, 2);
        assert!(reversed.checked_range(10).unwrap_err().is_malformed());
        assert!(reversed.is_empty());
    }

    #[test]
    fn negative_coordinates_are_malformed() {
        let iv = AnnotationInterval::new("chr1", -3, 4);
        assert_eq!(
            iv.checked_range(10),
            Err(IntervalError::Malformed { start: -3, end: 4 })
        );
        assert_eq!(iv.name(), "chr1_-3_4");
        assert!(iv.is_empty());
        let iv = AnnotationInterval::new("chr1", -5, -2);
        assert!(iv.checked_range(10).unwrap_err().is_malformed());
    }

    #[test]
    fn out_of_range_wins_over_malformed() {
        // Reversed, but the start is already past the end of the sequence.
        let iv = AnnotationInterval::new("chr1", 20, 3);
        assert!(!iv.checked_range(10).unwrap_err().is_malformed());
    }

    #[test]
    fn name_and_len() {
        let iv = AnnotationInterval::new("NC_003070.9", 3, 5);
        assert_eq!(iv.name(), "NC_003070.9_3_5");
        assert_eq!(iv.len(), 3);
    }
}
