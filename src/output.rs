//! CSV and JSON output helpers shared by the store, the collection log and the
//! interval export.

use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::path::Path;
use tracing::debug;

/// Logs any serializable value as pretty-printed JSON at debug level.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    debug!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Creates the parent directory of `path` if it has one.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    Ok(())
}

/// Appends rows to a CSV file, writing the header only when the file is new
/// or empty. Returns the number of rows written.
pub fn append_records<T: Serialize>(path: &Path, rows: &[T]) -> Result<usize> {
    ensure_parent_dir(path)?;
    let needs_header = fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    debug!(path = %path.display(), needs_header, rows = rows.len(), "Appending CSV records");

    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut writer = WriterBuilder::new()
        .has_headers(needs_header) // IMPORTANT when appending
        .from_writer(file);

    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(rows.len())
}

/// Writes rows to a fresh CSV file, replacing any previous content.
pub fn write_records<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::path::PathBuf;

    #[derive(Serialize)]
    struct Row {
        timestamp: u32,
        label: Option<String>,
    }

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    #[test]
    fn test_print_json_does_not_panic() {
        print_json(&Row {
            timestamp: 1,
            label: None,
        })
        .unwrap();
    }

    #[test]
    fn test_append_records_creates_file_and_dirs() {
        let dir = temp_path("subway_monitor_test_output_dirs");
        let _ = fs::remove_dir_all(&dir);
        let path = dir.join("nested/rows.csv");

        append_records(&path, &[Row { timestamp: 1, label: None }]).unwrap();

        assert!(path.exists());
        let content = fs::read_to_string(&path).unwrap();
        assert!(!content.is_empty());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_append_records_writes_header_once() {
        let path = temp_path("subway_monitor_test_header.csv");
        let _ = fs::remove_file(&path);

        let rows = [
            Row { timestamp: 1, label: Some("a".into()) },
            Row { timestamp: 2, label: None },
        ];
        assert_eq!(append_records(&path, &rows).unwrap(), 2);
        append_records(&path, &rows[..1]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header_count = content.lines().filter(|l| l.contains("timestamp")).count();
        assert_eq!(header_count, 1);
        // 1 header + 3 data rows
        assert_eq!(content.lines().count(), 4);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_records_replaces_content() {
        let path = temp_path("subway_monitor_test_write.csv");
        let _ = fs::remove_file(&path);

        write_records(&path, &[Row { timestamp: 1, label: None }, Row { timestamp: 2, label: None }]).unwrap();
        write_records(&path, &[Row { timestamp: 3, label: None }]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.contains('3'));

        fs::remove_file(&path).unwrap();
    }
}
