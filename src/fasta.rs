use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use needletail::FastxReader;
use needletail::errors::ParseErrorKind;
use needletail::parser::{LineEnding, write_fasta};

use crate::error::{Error, Result};
use crate::segment::ChromosomeSequence;

/// Streams one [`ChromosomeSequence`] per FASTA record.
///
/// Only the current record is held in memory. Compressed input is detected
/// by needletail. An empty input gives no records instead of an error.
pub struct ChromosomeReader {
    reader: Option<Box<dyn FastxReader>>,
}

impl ChromosomeReader {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(Error::io(path))?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read + Send + 'static>(reader: R) -> Result<Self> {
        match needletail::parse_fastx_reader(reader) {
            Ok(reader) => Ok(Self {
                reader: Some(reader),
            }),
            Err(e) if matches!(e.kind, ParseErrorKind::EmptyFile) => Ok(Self { reader: None }),
            Err(e) => Err(e.into()),
        }
    }
}

impl Iterator for ChromosomeReader {
    type Item = Result<ChromosomeSequence>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.reader.as_mut()?.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(e.into())),
        };
        let (id, description) = split_header(record.id());
        Some(Ok(ChromosomeSequence {
            id,
            description,
            residues: record.seq().into_owned(),
        }))
    }
}

/// Split a raw header into its identifier (first whitespace-delimited token)
/// and the remaining description.
pub fn split_header(header: &[u8]) -> (String, Option<String>) {
    let header = String::from_utf8_lossy(header);
    let header = header.trim();
    match header.split_once(char::is_whitespace) {
        Some((id, rest)) => {
            let rest = rest.trim();
            (id.to_string(), (!rest.is_empty()).then(|| rest.to_string()))
        }
        None => (header.to_string(), None),
    }
}

/// Write `>header\nresidues\n`.
pub fn write_record(writer: &mut dyn Write, header: &str, residues: &[u8]) -> Result<()> {
    write_fasta(header.as_bytes(), residues, writer, LineEnding::Unix)?;
    Ok(())
}
