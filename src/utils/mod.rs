//! Small filesystem and text helpers shared across modules.

pub mod verbosity;

use color_eyre::eyre::{eyre, ContextCompat, Report, Result, WrapErr};
use color_eyre::Help;
use std::borrow::Cow;
use std::fmt::Debug;
use std::path::Path;

/// Get delimiter based on file extension.
///
/// ## Arguments
///
/// - `path` - File path.
///
/// ## Examples
///
/// - `.tsv` => `\t`
/// - `.txt` => `\t`
/// - `.csv` => `,`
///
/// Note that `.txt` is assumed to be tab-delimited!
///
/// ```rust
/// use hicflow::utils::get_delimiter;
///
/// assert_eq!(get_delimiter(&"samples.tsv")?, '\t');
/// assert_eq!(get_delimiter(&"samples.csv")?, ',');
/// assert_eq!(get_delimiter(&"samples.txt")?, '\t');
/// assert!(get_delimiter(&"samples").is_err());
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn get_delimiter<P>(path: &P) -> Result<char, Report>
where
    P: AsRef<Path> + Debug + ?Sized,
{
    let ext = path
        .as_ref()
        .extension()
        .wrap_err_with(|| format!("Failed to get file extension: {path:?}"))?
        .to_str()
        .wrap_err_with(|| format!("Failed to convert file extension to str: {path:?}"))?;
    // convert extension to the expected delimiter
    match ext {
        "tsv" | "txt" => Ok('\t'),
        "csv" => Ok(','),
        _ext => {
            Err(eyre!("Unknown file extension: {_ext:?}").suggestion("Options: tsv, csv, or txt"))
        }
    }
}

/// Create the parent directory of a file path, if it doesn't exist yet.
///
/// ```rust
/// let dir = tempfile::tempdir()?;
/// let path = dir.path().join("hdf5/pig1/1000000/matrix.h5");
/// hicflow::utils::create_parent_dir(&path)?;
/// assert!(dir.path().join("hdf5/pig1/1000000").is_dir());
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
pub fn create_parent_dir<P>(path: &P) -> Result<(), Report>
where
    P: AsRef<Path> + Debug + ?Sized,
{
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .wrap_err_with(|| format!("Failed to create directory: {parent:?}"))?;
        }
    }
    Ok(())
}

/// Quote a word for a POSIX shell, only when it contains special characters.
///
/// ```rust
/// use hicflow::utils::shell_quote;
///
/// assert_eq!(shell_quote("hdf5/pig1/matrix.h5"), "hdf5/pig1/matrix.h5");
/// assert_eq!(shell_quote("*_R{1,2}.fastq.gz"), "'*_R{1,2}.fastq.gz'");
/// assert_eq!(shell_quote("it's"), r#"'it'\''s'"#);
/// assert_eq!(shell_quote(""), "''");
/// ```
pub fn shell_quote(word: &str) -> Cow<'_, str> {
    let safe = |c: char| c.is_ascii_alphanumeric() || "_-./:=,+@%".contains(c);
    if !word.is_empty() && word.chars().all(safe) {
        Cow::Borrowed(word)
    } else {
        Cow::Owned(format!("'{}'", word.replace('\'', r#"'\''"#)))
    }
}
