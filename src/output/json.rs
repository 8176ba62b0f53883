//! JSON document reader and writer.
//!
//! Reads artifacts and trace documents, writes trace and graph documents.

use super::graph_export::GraphDocument;
use crate::trace::Trace;
use crate::utils::error::OutputError;
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Write any serializable document to a JSON file
///
/// **Public** - shared by the trace and graph writers
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
pub fn write_json<T: Serialize>(
    document: &T,
    output_path: impl AsRef<Path>,
    pretty: bool,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    validate_output_path(output_path)?;

    // Create parent directories if needed
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let mut writer = BufWriter::new(file);

    let written = if pretty {
        serde_json::to_writer_pretty(&mut writer, document)
    } else {
        serde_json::to_writer(&mut writer, document)
    };
    written.map_err(OutputError::SerializationFailed)?;
    writer.flush().map_err(OutputError::WriteFailed)?;

    info!(
        "Wrote {} ({} bytes)",
        output_path.display(),
        calculate_file_size(output_path)
    );

    Ok(())
}

/// Read any JSON document
///
/// # Errors
/// * `OutputError::WriteFailed` - File read error (reusing WriteFailed for I/O)
/// * `OutputError::SerializationFailed` - JSON parse error
pub fn read_json<T: DeserializeOwned>(input_path: impl AsRef<Path>) -> Result<T, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading {}", input_path.display());

    let file = File::open(input_path).map_err(OutputError::WriteFailed)?;
    serde_json::from_reader(BufReader::new(file)).map_err(OutputError::SerializationFailed)
}

pub fn write_trace(trace: &Trace, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    write_json(trace, output_path, false)
}

pub fn read_trace(input_path: impl AsRef<Path>) -> Result<Trace, OutputError> {
    let trace: Trace = read_json(input_path)?;
    debug!(
        "Trace loaded: {} with {} requests",
        trace.url,
        trace.request_track.events.len()
    );
    Ok(trace)
}

pub fn write_graph(document: &GraphDocument, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    write_json(document, output_path, true)
}

pub fn read_graph(input_path: impl AsRef<Path>) -> Result<GraphDocument, OutputError> {
    read_json(input_path)
}

/// Validate that output path is writable
///
/// **Private** - internal validation
fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    // Check if we're trying to overwrite a directory
    if path.exists() && path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

/// Calculate file size in bytes
///
/// **Private** - internal utility
fn calculate_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}
