use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Defines the interface for reading line-oriented tool files.
///
/// Implementors parse a format into its record type. The path-based
/// convenience method opens and buffers the file before delegating to
/// [`RecordFile::read_from`].
pub trait RecordFile {
    /// The parsed contents of one file.
    type Records;

    /// The error type for I/O and parse failures.
    type Error: Error + From<io::Error>;

    /// Reads records from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or the content violates the format.
    fn read_from(reader: &mut impl BufRead) -> Result<Self::Records, Self::Error>;

    /// Reads records from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self::Records, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }
}
