// CSV export of a filtered view.

use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use hoopscope_core::SeasonKey;

use crate::filter::TableView;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to create {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
}

/// File name offered for a season download.
pub fn default_file_name(season: SeasonKey) -> String {
    format!("nba_stats_{season}.csv")
}

/// Write the view as comma-separated UTF-8 with a header row. Returns the
/// number of data rows written.
pub fn write_csv<W: Write>(view: &TableView<'_>, writer: W) -> Result<usize, ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(view.table().column_names())?;
    let mut written = 0;
    for row in view.rows() {
        wtr.write_record(row.cells().iter().map(|c| c.to_string()))?;
        written += 1;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(written)
}

/// Write the view to `path`, replacing any existing file.
pub fn export_to_file(view: &TableView<'_>, path: &Path) -> Result<usize, ExportError> {
    let file = std::fs::File::create(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let written = write_csv(view, std::io::BufWriter::new(file))?;
    info!(path = %path.display(), rows = written, "exported CSV");
    Ok(written)
}
