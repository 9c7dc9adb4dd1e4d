//! CSV ingestion
//!
//! Validates an uploaded batch (exactly five files, `.csv` extension, one file per
//! required entity, per-file size limit) and parses each file into header-keyed rows.

use csv::ReaderBuilder;
use rolemine_common::models::{DataSummary, EntityKind, EntitySummary, Row};
use rolemine_common::{Error, Result, ValidationError};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// Number of files a batch must contain
pub const REQUIRED_FILE_COUNT: usize = 5;

/// One uploaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub contents: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }

    /// Read a file from disk, keeping only its file name
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::validation("files", format!("Not a file: {}", path.display())))?;
        let contents = std::fs::read(path)?;
        Ok(Self { name, contents })
    }

    pub fn size(&self) -> u64 {
        self.contents.len() as u64
    }
}

/// Validated batch: exactly one file per entity kind
#[derive(Debug, Clone, Default)]
pub struct UploadSet {
    files: BTreeMap<EntityKind, UploadFile>,
}

impl UploadSet {
    pub fn iter(&self) -> impl Iterator<Item = (EntityKind, &UploadFile)> {
        self.files.iter().map(|(kind, file)| (*kind, file))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Validate a batch and key it by entity kind
pub fn validate_batch(files: Vec<UploadFile>, max_file_size: u64) -> Result<UploadSet> {
    if files.len() != REQUIRED_FILE_COUNT {
        return Err(Error::validation(
            "files",
            format!(
                "Please upload exactly {} CSV files. You uploaded {} files.",
                REQUIRED_FILE_COUNT,
                files.len()
            ),
        ));
    }

    if let Some(file) = files
        .iter()
        .find(|f| !f.name.to_ascii_lowercase().ends_with(".csv"))
    {
        return Err(Error::validation(
            "files",
            format!("All files must be CSV files ({} is not).", file.name),
        ));
    }

    let mut set = UploadSet::default();
    let mut unexpected = Vec::new();

    for file in files {
        match EntityKind::from_file_name(&file.name) {
            Some(kind) => {
                if let Some(existing) = set.files.get(&kind) {
                    return Err(Error::validation(
                        "files",
                        format!(
                            "{} and {} both provide {}",
                            existing.name,
                            file.name,
                            kind.label()
                        ),
                    ));
                }
                set.files.insert(kind, file);
            }
            None => unexpected.push(file.name),
        }
    }

    let missing: Vec<&str> = EntityKind::ALL
        .iter()
        .filter(|kind| !set.files.contains_key(kind))
        .map(|kind| kind.file_name())
        .collect();
    if !missing.is_empty() {
        let mut message = format!("Missing required files: {}", missing.join(", "));
        if !unexpected.is_empty() {
            message.push_str(&format!(" (unexpected: {})", unexpected.join(", ")));
        }
        return Err(Error::validation("files", message));
    }

    if let Some(file) = set.files.values().find(|f| f.size() > max_file_size) {
        return Err(Error::validation(
            "files",
            format!(
                "{} exceeds the {}MB file size limit.",
                file.name,
                max_file_size / (1024 * 1024)
            ),
        ));
    }

    debug!(files = set.len(), "Upload batch validated");
    Ok(set)
}

/// Parse one CSV file; the first row is the header
pub fn parse_csv(file: &UploadFile) -> Result<EntitySummary> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file.contents.as_slice());

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| parse_error(file, e))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| parse_error(file, e))?;
        if record.iter().all(str::is_empty) {
            continue;
        }

        let row: Row = columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                let value = record.get(i).unwrap_or_default();
                (column.clone(), serde_json::Value::String(value.to_string()))
            })
            .collect();
        rows.push(row);

        if row_idx > 0 && row_idx % 10_000 == 0 {
            debug!(file = %file.name, rows = row_idx, "Parsing CSV");
        }
    }

    Ok(EntitySummary::from_rows(columns, rows))
}

fn parse_error(file: &UploadFile, e: csv::Error) -> Error {
    Error::Validation(ValidationError::new(
        "files",
        format!("{}: CSV parse error: {}", file.name, e),
    ))
}

/// Parse every file of a validated batch into a data summary
pub fn summarize(set: &UploadSet) -> Result<DataSummary> {
    let mut summary = DataSummary::new();
    for (kind, file) in set.iter() {
        let entity = parse_csv(file)?;
        info!(
            entity = %kind,
            rows = entity.count,
            columns = entity.columns.len(),
            "Parsed {}",
            file.name
        );
        summary.insert(kind, entity);
    }
    summary.validate()?;
    Ok(summary)
}

/// Read every regular file in a directory as an upload batch
pub fn load_directory(dir: &Path) -> Result<Vec<UploadFile>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(UploadFile::from_path(&path)?);
        }
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolemine_common::config::DEFAULT_MAX_FILE_SIZE_BYTES;

    fn batch() -> Vec<UploadFile> {
        vec![
            UploadFile::new("users.csv", "id,username\n1,john.doe\n2,jane.smith\n"),
            UploadFile::new("ou.csv", "id,name\n1,IT Department\n"),
            UploadFile::new("applications.csv", "id,name\n1,Email System\n2,HR Portal\n3,CRM\n"),
            UploadFile::new("entitlements.csv", "id,name,application\n1,Email Access,Email System\n"),
            UploadFile::new("assignment.csv", "user,entitlement\njohn.doe,Email Access\n"),
        ]
    }

    fn field_message(err: Error) -> String {
        match err {
            Error::Validation(v) => {
                assert_eq!(v.field, "files");
                v.message
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_batch_sizes_rejected() {
        for n in [0, 1, 4, 6, 10] {
            let files: Vec<UploadFile> = (0..n)
                .map(|i| UploadFile::new(format!("f{}.csv", i), "a\n1\n"))
                .collect();
            let message = field_message(validate_batch(files, DEFAULT_MAX_FILE_SIZE_BYTES).unwrap_err());
            assert!(message.contains("exactly 5"), "n={} message={}", n, message);
        }
    }

    #[test]
    fn test_non_csv_rejected() {
        let mut files = batch();
        files[2] = UploadFile::new("applications.xlsx", "x");
        let message = field_message(validate_batch(files, DEFAULT_MAX_FILE_SIZE_BYTES).unwrap_err());
        assert!(message.contains("must be CSV"));
    }

    #[test]
    fn test_missing_required_file_named() {
        let mut files = batch();
        files[4] = UploadFile::new("roles.csv", "a\n");
        let message = field_message(validate_batch(files, DEFAULT_MAX_FILE_SIZE_BYTES).unwrap_err());
        assert!(message.contains("assignment.csv"));
        assert!(message.contains("roles.csv"));
    }

    #[test]
    fn test_duplicate_alias_rejected() {
        let mut files = batch();
        files[0] = UploadFile::new("ous.csv", "id\n");
        let message = field_message(validate_batch(files, DEFAULT_MAX_FILE_SIZE_BYTES).unwrap_err());
        assert!(message.contains("both provide"));
    }

    #[test]
    fn test_oversized_file_rejected() {
        let mut files = batch();
        files[1] = UploadFile::new("ou.csv", vec![b'a'; 2048]);
        let message = field_message(validate_batch(files, 1024).unwrap_err());
        assert!(message.starts_with("ou.csv exceeds"));
    }

    #[test]
    fn test_summary_counts_match_rows() {
        let set = validate_batch(batch(), DEFAULT_MAX_FILE_SIZE_BYTES).unwrap();
        let summary = summarize(&set).unwrap();

        assert_eq!(summary.len(), 5);
        for (_, entity) in summary.iter() {
            assert_eq!(entity.count, entity.data.len());
        }
        let apps = summary.get(EntityKind::Applications).unwrap();
        assert_eq!(apps.count, 3);
        assert_eq!(apps.columns, vec!["id", "name"]);
        assert_eq!(apps.data[1]["name"], "HR Portal");
    }

    #[test]
    fn test_parse_skips_blank_rows_and_pads_short_rows() {
        let file = UploadFile::new("users.csv", "id,username,email\n1,john\n\n,,\n2,jane,j@x.com\n");
        let entity = parse_csv(&file).unwrap();
        assert_eq!(entity.count, 2);
        assert_eq!(entity.data[0]["email"], "");
        assert_eq!(entity.data[1]["email"], "j@x.com");
    }

    #[test]
    fn test_invalid_utf8_is_validation_error() {
        let file = UploadFile::new("users.csv", vec![b'i', b'd', b'\n', 0xff, 0xfe, b'\n']);
        let message = field_message(parse_csv(&file).unwrap_err());
        assert!(message.starts_with("users.csv: CSV parse error"));
    }
}
