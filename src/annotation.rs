//! Loader for GFF3-like annotation tables.
//!
//! Columns are `Chr, SourceAnnotation, COS, Start, End, Score, Strand, Phase,
//! Attributes`, tab-separated. Lines starting with `#` are comments, and a
//! `##FASTA` directive ends the table.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::debug;

use crate::error::{Error, Result};
use crate::interval::AnnotationInterval;

const NUM_COLUMNS: usize = 9;

/// Strand column of an annotation row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strand {
    Forward,
    Reverse,
    #[default]
    Unknown,
}

impl FromStr for Strand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+" => Ok(Strand::Forward),
            "-" => Ok(Strand::Reverse),
            "." | "?" => Ok(Strand::Unknown),
            _ => Err(format!("invalid strand {s:?}")),
        }
    }
}

/// One data row of the annotation table.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationRecord {
    pub chromosome: String,
    pub source: String,
    /// Feature type, the third column.
    pub feature: String,
    /// As written in the file; values below 1 are kept and rejected at
    /// segmentation time, not here.
    pub start: i64,
    pub end: i64,
    pub score: Option<f64>,
    pub strand: Strand,
    pub phase: Option<u8>,
    /// Raw `key=value;...` attribute column.
    pub attributes: String,
}

impl AnnotationRecord {
    pub fn interval(&self) -> AnnotationInterval {
        AnnotationInterval::new(self.chromosome.clone(), self.start, self.end)
    }

    /// Value of the first `key=value` pair with this key.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }
}

impl FromStr for AnnotationRecord {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < NUM_COLUMNS {
            return Err(format!(
                "expected {NUM_COLUMNS} tab-separated columns, found {}",
                fields.len()
            ));
        }
        let coordinate = |name: &str, value: &str| {
            value
                .trim()
                .parse::<i64>()
                .map_err(|e| format!("invalid {name} {value:?}: {e}"))
        };
        let score = match fields[5].trim() {
            "." => None,
            s => Some(s.parse::<f64>().map_err(|e| format!("invalid score {s:?}: {e}"))?),
        };
        let phase = match fields[7].trim() {
            "." => None,
            p => Some(p.parse::<u8>().map_err(|e| format!("invalid phase {p:?}: {e}"))?),
        };

        Ok(AnnotationRecord {
            chromosome: fields[0].to_string(),
            source: fields[1].to_string(),
            feature: fields[2].to_string(),
            start: coordinate("start", fields[3])?,
            end: coordinate("end", fields[4])?,
            score,
            strand: fields[6].trim().parse()?,
            phase,
            attributes: fields[8..].join("\t"),
        })
    }
}

/// All rows of one annotation file, in file order.
#[derive(Debug, Clone, Default)]
pub struct AnnotationTable {
    pub records: Vec<AnnotationRecord>,
}

impl AnnotationTable {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(Error::io(path))?;
        Self::from_reader(BufReader::new(file), path)
    }

    /// Parse a table from any buffered reader. `origin` is only used in error messages.
    pub fn from_reader(reader: impl BufRead, origin: impl AsRef<Path>) -> Result<Self> {
        let origin = origin.as_ref();
        let mut records = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(Error::io(origin))?;
            let line = line.trim_end_matches(['\r', '\n']);
            if line.starts_with("##FASTA") {
                break;
            }
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }
            let record = line.parse().map_err(|reason| Error::Annotation {
                path: PathBuf::from(origin),
                line: idx + 1,
                reason,
            })?;
            records.push(record);
        }
        debug!("Read {} annotation rows from {}", records.len(), origin.display());
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct chromosome ids, sorted.
    pub fn chromosomes(&self) -> BTreeSet<String> {
        self.records.iter().map(|r| r.chromosome.clone()).collect()
    }

    /// Group intervals by chromosome, keeping file order within each chromosome.
    pub fn index(&self) -> IntervalIndex {
        self.records.iter().map(AnnotationRecord::interval).collect()
    }
}

/// Intervals grouped by chromosome id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntervalIndex {
    by_chromosome: BTreeMap<String, Vec<AnnotationInterval>>,
}

impl IntervalIndex {
    pub fn get(&self, chromosome: &str) -> Option<&[AnnotationInterval]> {
        self.by_chromosome.get(chromosome).map(Vec::as_slice)
    }

    pub fn chromosomes(&self) -> impl Iterator<Item = &str> {
        self.by_chromosome.keys().map(String::as_str)
    }

    /// Total number of intervals.
    pub fn num_intervals(&self) -> usize {
        self.by_chromosome.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_chromosome.is_empty()
    }
}

impl FromIterator<AnnotationInterval> for IntervalIndex {
    fn from_iter<T: IntoIterator<Item = AnnotationInterval>>(iter: T) -> Self {
        let mut by_chromosome: BTreeMap<String, Vec<AnnotationInterval>> = BTreeMap::new();
        for interval in iter {
            by_chromosome
                .entry(interval.chromosome.clone())
                .or_default()
                .push(interval);
        }
        Self { by_chromosome }
    }
}
