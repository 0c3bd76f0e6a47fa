//! Optional compression of finished dumps

use crate::config::CompressionKind;
use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Compress `source` next to itself
///
/// Returns the archive path, or `None` when compression is disabled, the kind
/// is unsupported, the source is missing, or writing the archive failed.
/// Absence of compression never fails a backup.
pub fn compress_file(source: &Path, kind: CompressionKind) -> Option<PathBuf> {
    match kind {
        CompressionKind::None => return None,
        CompressionKind::Unsupported => {
            warn!("Unsupported compression type, keeping the raw dump");
            return None;
        }
        CompressionKind::Zip => {}
    }

    if !source.exists() {
        error!("Source file does not exist: {:?}", source);
        return None;
    }

    match create_zip_file(source) {
        Ok(archive) => {
            info!("Compressed {:?} into {:?}", source, archive);
            Some(archive)
        }
        Err(e) => {
            error!("Failed to compress file {:?}: {:#}", source, e);
            None
        }
    }
}

/// Write a deflate zip holding `source` under its own file name
fn create_zip_file(source: &Path) -> Result<PathBuf> {
    let archive_path = source.with_extension("zip");
    let entry_name = source
        .file_name()
        .context("Source has no file name")?
        .to_string_lossy()
        .into_owned();

    let archive_file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&archive_path)
        .with_context(|| format!("Failed to create archive {:?}", archive_path))?;

    let written = write_archive(archive_file, source, &entry_name);
    if written.is_err() {
        // Don't leave a truncated archive behind for retention to pick up
        let _ = std::fs::remove_file(&archive_path);
    }
    written?;

    Ok(archive_path)
}

fn write_archive(archive_file: File, source: &Path, entry_name: &str) -> Result<()> {
    let mut input = BufReader::new(
        File::open(source).with_context(|| format!("Failed to open {:?}", source))?,
    );

    let mut writer = ZipWriter::new(archive_file);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .large_file(true);

    writer
        .start_file(entry_name, options)
        .context("Failed to start archive entry")?;
    io::copy(&mut input, &mut writer).context("Failed to write archive entry")?;
    writer.finish().context("Failed to finalize archive")?;

    Ok(())
}
