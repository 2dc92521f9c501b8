use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use log::warn;

use crate::error::{Error, Result};
use crate::fasta::write_record;
use crate::segment::ExtractedRegion;

/// Destination for extracted regions.
///
/// Takes `&self` so one sink can be shared by all workers of a run.
pub trait RegionSink: Sync {
    fn write_region(&self, region: &ExtractedRegion<'_>) -> Result<()>;
}

/// Reject names that could leave the output directory.
pub fn checked_file_stem(name: &str) -> Result<&str> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Err(Error::UnsafeName(name.to_string()));
    }
    Ok(name)
}

/// Writes each region to `<dir>/{chromosome}_{start}_{end}.fasta`.
///
/// A name written twice in the same run is overwritten by the later region,
/// with a warning.
pub struct DirectorySink {
    dir: PathBuf,
    seen: Mutex<HashSet<String>>,
    duplicates: AtomicUsize,
}

impl DirectorySink {
    /// Create the sink, creating `dir` if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(Error::io(&dir))?;
        Ok(Self {
            dir,
            seen: Mutex::new(HashSet::new()),
            duplicates: AtomicUsize::new(0),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of regions that replaced an earlier region of the same name.
    pub fn duplicates(&self) -> usize {
        self.duplicates.load(Ordering::Relaxed)
    }

    /// Path a region with this name is written to.
    pub fn path_for(&self, name: &str) -> Result<PathBuf> {
        Ok(self.dir.join(format!("{}.fasta", checked_file_stem(name)?)))
    }
}

impl RegionSink for DirectorySink {
    fn write_region(&self, region: &ExtractedRegion<'_>) -> Result<()> {
        let name = region.name();
        let path = self.path_for(&name)?;

        let first = self
            .seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.clone());
        if !first {
            self.duplicates.fetch_add(1, Ordering::Relaxed);
            warn!("Region {name} occurs more than once; overwriting {}", path.display());
        }

        let file = File::create(&path).map_err(Error::io(&path))?;
        let mut writer = BufWriter::new(file);
        write_record(&mut writer, &name, region.sequence)?;
        writer.flush().map_err(Error::io(&path))?;
        Ok(())
    }
}

/// Keeps `(name, residues)` pairs in memory, in arrival order.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_records(self) -> Vec<(String, Vec<u8>)> {
        self.records
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl RegionSink for MemorySink {
    fn write_region(&self, region: &ExtractedRegion<'_>) -> Result<()> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((region.name(), region.sequence.to_vec()));
        Ok(())
    }
}
