use std::{
    fs, io,
    io::Write,
    path::{Path, PathBuf},
};

use roxmltree::{Document, ParsingOptions};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::{common::row_writer, error::ConvertError, record::ChatRecord};

/// [ConversionSummary] reports what a finished conversion wrote.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConversionSummary {
    /// Number of data rows written after the header.
    pub records: usize,
}

/// Converts the XML export at `xml_path` into a CSV file at `csv_path`.
///
/// The rows are staged in a temporary file next to `csv_path` which only
/// replaces it once every record has been written. On failure an existing
/// file at `csv_path` is left untouched.
pub fn convert<P, Q>(xml_path: P, csv_path: Q) -> Result<ConversionSummary, ConvertError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let xml_path = xml_path.as_ref();
    let csv_path = csv_path.as_ref();
    info!(
        input = %xml_path.display(),
        output = %csv_path.display(),
        "converting transcripts"
    );

    let staging_dir = match csv_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged =
        staging_file(staging_dir, csv_path).map_err(|source| ConvertError::CreateOutput {
            path: csv_path.to_path_buf(),
            source,
        })?;

    // dropping `staged` on an error path removes the temporary file
    let summary = convert_to_writer(xml_path, &mut staged)?;
    staged.as_file().sync_all()?;
    staged.persist(csv_path)?;

    info!(records = summary.records, output = %csv_path.display(), "conversion finished");
    Ok(summary)
}

/// Creates the temporary file that later replaces `target`. It takes over
/// the permissions of an existing `target`, otherwise it is created like a
/// plain new file (0666 minus the umask) instead of tempfile's private 0600.
fn staging_file(dir: &Path, target: &Path) -> io::Result<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".xml_transcripts_csv").suffix(".tmp");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = match fs::metadata(target) {
            Ok(metadata) => metadata.permissions(),
            Err(_) => fs::Permissions::from_mode(0o666),
        };
        builder.permissions(permissions);
    }
    #[cfg(not(unix))]
    let _ = target;

    builder.tempfile_in(dir)
}

/// Reads the XML export at `xml_path` and writes the CSV to `writer`.
pub fn convert_to_writer<P, W>(xml_path: P, writer: W) -> Result<ConversionSummary, ConvertError>
where
    P: AsRef<Path>,
    W: Write,
{
    let xml_path = xml_path.as_ref();
    let xml = fs::read_to_string(xml_path).map_err(|source| ConvertError::Read {
        path: PathBuf::from(xml_path),
        source,
    })?;
    convert_document(&xml, writer)
}

/// Parses `xml` and writes the header row followed by one row per `Record`
/// element of the document root, in document order.
pub fn convert_document<W: Write>(xml: &str, writer: W) -> Result<ConversionSummary, ConvertError> {
    // exports may carry a DOCTYPE, entities declared there are expanded
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let document = Document::parse_with_options(xml, options)?;

    let mut csv_writer = row_writer(writer);
    csv_writer.write_record(ChatRecord::HEADERS)?;

    let mut summary = ConversionSummary::default();
    for node in document
        .root_element()
        .children()
        .filter(|node| node.has_tag_name("Record"))
    {
        let record = ChatRecord::from_node(node);
        debug!(
            record_id = record.record_id.as_str(),
            messages = record.message_count.0,
            "converted record"
        );
        csv_writer.serialize(&record)?;
        summary.records += 1;
    }
    csv_writer.flush()?;

    Ok(summary)
}
