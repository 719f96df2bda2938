use crate::core::models::framework::Framework;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Defines the interface for reading periodic framework structures.
///
/// Implementors handle format-specific parsing; the provided path helper
/// takes care of opening the file and naming unnamed structures.
pub trait FrameworkFile {
    /// The error type for I/O and parse failures.
    type Error: Error + From<io::Error>;

    /// Reads a framework from a buffered reader.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or I/O operations encounter issues.
    fn read_from(reader: &mut impl BufRead) -> Result<Framework, Self::Error>;

    /// Reads a framework from a file path.
    ///
    /// If the file does not name its structure, the file stem is used.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Framework, Self::Error> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let framework = Self::read_from(&mut reader)?;

        if framework.name().is_empty() {
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            return Ok(framework.with_name(stem));
        }
        Ok(framework)
    }
}
