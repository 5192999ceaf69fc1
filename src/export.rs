use crate::models::AssignmentRecord;
use anyhow::{Context, Result};
use chrono::Utc;
use std::path::PathBuf;

/// Export scraped assignments to a timestamped CSV file
pub fn export_to_csv(records: &[AssignmentRecord], course_id: &str) -> Result<PathBuf> {
    if records.is_empty() {
        anyhow::bail!("No assignments to export");
    }

    // Generate filename with timestamp
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let filename = format!("assignments_{}_{}.csv", course_id, timestamp);
    let filepath = PathBuf::from(&filename);

    let mut wtr = csv::Writer::from_path(&filepath).context("Failed to create CSV file")?;

    wtr.write_record(["assignment_name", "project", "due", "unlock"])
        .context("Failed to write CSV headers")?;

    for record in records {
        let due = record.due.map(|d| d.to_rfc3339()).unwrap_or_default();
        let unlock = record.reminder.map(|d| d.to_rfc3339()).unwrap_or_default();

        wtr.write_record([
            record.assignment_name.as_str(),
            record.project.as_str(),
            due.as_str(),
            unlock.as_str(),
        ])
        .context("Failed to write CSV record")?;
    }

    wtr.flush().context("Failed to flush CSV writer")?;

    Ok(filepath)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::TIMEZONE;
    use chrono::TimeZone;

    #[test]
    fn test_export_csv() {
        let records = vec![
            AssignmentRecord {
                course_name: "CPSC 221".to_string(),
                assignment_name: "Project 1 - HW1".to_string(),
                project: "Project 1".to_string(),
                due: Some(TIMEZONE.with_ymd_and_hms(2026, 4, 25, 23, 59, 0).unwrap()),
                reminder: None,
            },
            AssignmentRecord {
                course_name: "CPSC 221".to_string(),
                assignment_name: "Project 1 - HW2".to_string(),
                project: "Project 1".to_string(),
                due: None,
                reminder: None,
            },
        ];

        let filepath = export_to_csv(&records, "cpsc221").unwrap();
        assert!(filepath.exists());

        let contents = std::fs::read_to_string(&filepath).unwrap();
        assert!(contents.starts_with("assignment_name,project,due,unlock"));
        assert!(contents.contains("Project 1 - HW1"));

        // Clean up
        std::fs::remove_file(filepath).ok();
    }

    #[test]
    fn test_export_empty_records_fails() {
        assert!(export_to_csv(&[], "cpsc221").is_err());
    }
}
