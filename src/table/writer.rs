//! Raw review table output.

use crate::models::RawReview;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Column names of the raw table, in the order `RawReview` serializes them.
pub const RAW_COLUMNS: [&str; 11] = [
    "reviewId",
    "userName",
    "content",
    "score",
    "thumbsUpCount",
    "reviewCreatedVersion",
    "at",
    "replyContent",
    "repliedAt",
    "appVersion",
    "Platform",
];

/// Write collected reviews to a CSV file, creating parent directories.
///
/// Returns the number of rows written.
pub fn write_raw_reviews<'a, I>(path: &Path, reviews: I) -> Result<usize>
where
    I: IntoIterator<Item = &'a RawReview>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create table: {}", path.display()))?;

    let mut written = 0;
    for review in reviews {
        writer
            .serialize(review)
            .with_context(|| format!("Failed to write review {}", review.review_id))?;
        written += 1;
    }

    // The header is only emitted with the first record; keep the schema
    // when nothing was collected.
    if written == 0 {
        writer
            .write_record(RAW_COLUMNS)
            .with_context(|| format!("Failed to write header: {}", path.display()))?;
    }

    writer
        .flush()
        .with_context(|| format!("Failed to flush table: {}", path.display()))?;

    info!("Wrote {} reviews to {}", written, path.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Platform;
    use crate::table::{load_table, TableKind};
    use tempfile::TempDir;

    fn raw(id: &str, platform: Platform, score: u8, at: &str) -> RawReview {
        RawReview {
            review_id: id.to_string(),
            user_name: "someone".to_string(),
            content: "multi\nline, with comma".to_string(),
            score,
            thumbs_up_count: 7,
            review_created_version: Some("1.2.3".to_string()),
            at: at.to_string(),
            reply_content: None,
            replied_at: None,
            app_version: None,
            platform: Some(platform),
        }
    }

    #[test]
    fn test_written_table_loads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("raw").join("reviews_raw.csv");

        let reviews = vec![
            raw("a", Platform::Facebook, 5, "2024-01-01 10:00:00"),
            raw("b", Platform::Snapchat, 2, "2024-01-02 11:00:00"),
        ];

        let written = write_raw_reviews(&path, &reviews).unwrap();
        assert_eq!(written, 2);

        let header = std::fs::read_to_string(&path).unwrap();
        assert!(header.starts_with(&RAW_COLUMNS.join(",")));

        let table = load_table(&path, TableKind::Cleaned).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.rejected().is_empty());
        assert_eq!(table.events()[1].platform, Platform::Snapchat);
        assert_eq!(table.events()[1].engagement_count, 7);
    }

    #[test]
    fn test_empty_write_produces_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.csv");

        let written = write_raw_reviews(&path, &Vec::new()).unwrap();
        assert_eq!(written, 0);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.trim_end(), RAW_COLUMNS.join(","));

        let table = load_table(&path, TableKind::Cleaned).unwrap();
        assert!(table.events().is_empty());
        assert!(table.rejected().is_empty());
    }
}
