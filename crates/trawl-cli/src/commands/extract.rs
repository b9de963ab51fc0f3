//! Extract command implementation.
//!
//! Lists every leaf of a nested archive.

use std::io::Write;

use serde::Serialize;
use trawl_archive::ExtractedFile;

use crate::cli::ExtractArgs;
use crate::error::CliError;
use crate::import::load_archive;
use crate::output::{OutputFormat, TableDisplay, human_size};

/// Handler for the extract command.
#[derive(Debug, Default)]
pub struct ExtractCommand;

impl ExtractCommand {
    /// Creates a new extract command handler.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Executes the extract command.
    ///
    /// # Errors
    ///
    /// Returns error if the archive cannot be read or decoded.
    pub fn execute<W: Write>(
        &self,
        out: &mut W,
        format: &OutputFormat,
        args: &ExtractArgs,
    ) -> Result<(), CliError> {
        let files = load_archive(&args.archive)?;
        let listing = ExtractListing {
            archive: args.archive.display().to_string(),
            total_bytes: files.iter().map(|f| f.size).sum(),
            files,
        };
        format.write(out, &listing)
    }
}

/// Extraction result for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractListing {
    /// Archive path as given.
    pub archive: String,
    /// Sum of leaf sizes.
    pub total_bytes: usize,
    /// Every leaf, in archive order.
    pub files: Vec<ExtractedFile>,
}

impl TableDisplay for ExtractListing {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        for file in &self.files {
            let kind = if file.text_like { "text" } else { "binary" };
            writeln!(writer, "{:>10}  {:<6}  {}", human_size(file.size), kind, file.path)?;
        }
        writeln!(writer)?;
        writeln!(
            writer,
            "{} files, {} ({})",
            self.files.len(),
            human_size(self.total_bytes),
            self.archive
        )?;
        Ok(())
    }
}
