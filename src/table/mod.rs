//! Create and manipulate the [Table].

#[cfg(test)]
mod tests;

use crate::utils;
use color_eyre::eyre::{eyre, Report, Result, WrapErr};
use color_eyre::Help;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fmt::Display;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// A row-based table of generic data.
///
/// # Examples
///
/// ```
/// use hicflow::Table;
///
/// let mut table = Table::new();
/// table.headers = vec!["sample", "protocol", "matrixprefix"];
/// table.add_row(vec!["pig1", "DpnII", "data/pig1_DpnII_trio_"])?;
///
/// println!("{}", table.to_markdown());
/// # Ok::<(), color_eyre::eyre::Report>(())
/// ```
///
/// | sample | protocol |     matrixprefix      |
/// |--------|----------|-----------------------|
/// |  pig1  |  DpnII   | data/pig1_DpnII_trio_ |
///
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Table<T> {
    /// Names of the table columns.
    pub headers: Vec<T>,
    /// Rows of table values.
    pub rows: Vec<Vec<T>>,
    /// Optional file path for where the table was read from.
    pub path: Option<PathBuf>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Table<T> {
    /// Create a new table with empty headers and rows.
    pub fn new() -> Self {
        Table { headers: Vec::new(), rows: Vec::new(), path: None }
    }
}

/// Methods for when the table data can be viewed and displayed as a string.
impl<T> Table<T>
where
    T: AsRef<str> + Display,
{
    /// Add a new row to the table.
    ///
    /// The row must have one value per header.
    ///
    /// ```
    /// use hicflow::Table;
    ///
    /// let mut table = Table::new();
    /// table.headers = vec!["1", "2", "3"];
    /// table.add_row(vec!["A", "B", "C"])?;
    /// assert!(table.add_row(vec!["D", "E"]).is_err());
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn add_row(&mut self, row: Vec<T>) -> Result<(), Report> {
        let (new, ex) = (row.len(), self.headers.len());
        if ex != new {
            return Err(eyre!("New row size ({new}) does not match the table headers ({ex})."));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Returns a new table with an additional column.
    ///
    /// The original table is left untouched.
    ///
    /// # Arguments
    ///
    /// * `header` - Name of the new column.
    /// * `column` - One value per existing row.
    ///
    /// ```
    /// use hicflow::Table;
    ///
    /// let mut table = Table::new();
    /// table.headers = vec!["sample", "protocol"];
    /// table.add_row(vec!["pig1", "DpnII"])?;
    ///
    /// let runs = table.with_column("runs", vec!["run1,run2"])?;
    /// assert_eq!(runs.get("runs", 0)?, &"run1,run2");
    /// assert_eq!(table.headers.len(), 2);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn with_column(&self, header: T, column: Vec<T>) -> Result<Table<T>, Report>
    where
        T: Clone,
    {
        let (ex, new) = (self.rows.len(), column.len());
        if ex != new {
            return Err(eyre!("New column size ({new}) does not match existing table ({ex})."));
        }

        let mut table = self.clone();
        table.headers.push(header);
        table.rows.iter_mut().zip(column).for_each(|(row, value)| row.push(value));
        Ok(table)
    }

    /// Get table value at a particular column and row index.
    ///
    /// # Arguments
    ///
    /// * `header` - Column name.
    /// * `row` - Row index (0-based).
    pub fn get(&self, header: &str, row: usize) -> Result<&T, Report> {
        let header_i = self.get_header_index(header)?;
        let row = self.get_row(row)?;
        Ok(&row[header_i])
    }

    /// Return a vector of table values in a column.
    ///
    /// ```
    /// use hicflow::Table;
    ///
    /// let mut table = Table::new();
    /// table.headers = vec!["1", "2", "3"];
    /// table.add_row(vec!["A", "B", "C"])?;
    /// table.add_row(vec!["D", "E", "F"])?;
    ///
    /// assert_eq!(table.get_column("3")?, vec![&"C", &"F"]);
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn get_column(&self, header: &str) -> Result<Vec<&T>, Report> {
        let header_i = self.get_header_index(header)?;
        Ok(self.rows.iter().map(|row| &row[header_i]).collect())
    }

    /// Return a vector of table values in a row.
    pub fn get_row(&self, i: usize) -> Result<&[T], Report> {
        self.rows.get(i).map(|row| row.as_slice()).ok_or_else(|| eyre!("Row ({i}) does not exist in the table."))
    }

    /// Get the column index (0-based) correponding to the header.
    pub fn get_header_index(&self, header: &str) -> Result<usize, Report> {
        self.headers.iter().position(|h| h.as_ref() == header).ok_or_else(|| {
            eyre!("Column '{header}' was not found in table: {:?}.", self.path)
                .suggestion(format!("Available columns: {}", self.headers.iter().join(", ")))
        })
    }

    /// Write table to file.
    ///
    /// # Arguments
    ///
    /// * `path` - File path.
    /// * `delim` - Optional delimiter. Otherwise, will be identified based on path suffix (.tsv or .csv).
    pub fn write<P>(&self, path: &P, delim: Option<char>) -> Result<(), Report>
    where
        P: AsRef<Path> + std::fmt::Debug,
    {
        // if not provided, lookup delimiter from file extension
        let delim = match delim {
            Some(c) => c,
            None => utils::get_delimiter(path)?,
        }
        .to_string();

        utils::create_parent_dir(path)?;
        let mut file =
            File::create(path).wrap_err_with(|| format!("Unable to create file: {path:?}"))?;

        // write headers
        let line = format!("{}\n", self.headers.iter().join(&delim));
        file.write_all(line.as_bytes())
            .wrap_err_with(|| format!("Unable to write table headers: {line}"))?;

        // write regular rows
        for row in &self.rows {
            let line = format!("{}\n", row.iter().join(&delim));
            file.write_all(line.as_bytes())
                .wrap_err_with(|| format!("Unable to write table rows: {line}"))?;
        }

        Ok(())
    }

    /// Convert table to markdown format.
    pub fn to_markdown(&self) -> String {
        // get the maximum width of each column
        let col_widths = self
            .headers
            .iter()
            .enumerate()
            .map(|(col_i, header)| {
                // +2 to add space on either side
                self.rows
                    .iter()
                    .map(|row| row[col_i].as_ref().len())
                    .chain(std::iter::once(header.as_ref().len()))
                    .max()
                    .unwrap_or_default()
                    + 2
            })
            .collect_vec();

        let mut markdown = String::from("|");
        // frame in between headers and rows
        let mut header_frame = String::from("|");

        // Create the header line
        for (header, col_width) in self.headers.iter().zip(col_widths.iter()) {
            markdown.push_str(&format!("{:^width$}|", header.as_ref(), width = col_width));
            header_frame.push_str(&format!("{}|", "-".repeat(*col_width)));
        }
        markdown.push('\n');
        markdown.push_str(&header_frame);
        markdown.push('\n');

        // Create the row lines
        for row in &self.rows {
            markdown.push('|');
            for (value, col_width) in row.iter().zip(col_widths.iter()) {
                markdown.push_str(&format!("{:^width$}|", value.as_ref(), width = col_width));
            }
            markdown.push('\n');
        }

        markdown
    }
}

impl Table<String> {
    /// Read a TSV or CSV file into a Table.
    ///
    /// The first line holds the headers, blank lines are skipped, and every other line
    /// must have one value per header.
    ///
    /// # Arguments
    ///
    /// * `path` - File path.
    /// * `delim` - Optional delimiter. Otherwise, will be identified based on path suffix (.tsv or .csv).
    ///
    /// # Examples
    ///
    /// ```
    /// use hicflow::Table;
    /// use std::io::Write;
    /// use tempfile::NamedTempFile;
    ///
    /// let mut file = NamedTempFile::new()?;
    /// writeln!(file, "sample\tprotocol\nduroc\tArima")?;
    /// let table = Table::read(file.path(), Some('\t'))?;
    /// assert_eq!(table.get("protocol", 0)?, "Arima");
    /// # Ok::<(), color_eyre::eyre::Report>(())
    /// ```
    pub fn read<P>(path: &P, delim: Option<char>) -> Result<Table<String>, Report>
    where
        P: AsRef<Path> + std::fmt::Debug + ?Sized,
    {
        let path = path.as_ref();
        let mut table = Table::new();

        // if not provided, lookup delimiter from file extension
        let delim = match delim {
            Some(c) => c,
            None => utils::get_delimiter(&path)?,
        };

        // attempt to open the file path
        let file = File::open(path).wrap_err_with(|| eyre!("Failed to read file: {path:?}"))?;

        // read and parse lines
        for (line_i, line) in BufReader::new(file).lines().enumerate() {
            let line = line.wrap_err_with(|| eyre!("Failed to read line {} of {path:?}", line_i + 1))?;
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let row = line.split(delim).map(|v| v.trim().to_string()).collect_vec();
            // if headers are empty, this is the first line, write headers
            if table.headers.is_empty() {
                table.headers = row;
            }
            // otherwise regular row
            else {
                table.add_row(row).wrap_err_with(|| {
                    eyre!("Malformed row on line {} of {path:?}", line_i + 1)
                })?;
            }
        }

        table.path = Some(path.to_path_buf());

        Ok(table)
    }
}

impl<T> Table<T>
where
    T: ToString,
{
    /// Create a new table with all values converted to owned String.
    pub fn to_string_values(&self) -> Table<String> {
        Table {
            headers: self.headers.iter().map(|s| s.to_string()).collect(),
            rows: self.rows.iter().map(|row| row.iter().map(|s| s.to_string()).collect()).collect(),
            path: self.path.clone(),
        }
    }
}
