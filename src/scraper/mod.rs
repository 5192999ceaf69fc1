//! Extraction of assignment records from a PrairieLearn assessments page.
//!
//! The page is one flat `<tbody>` whose rows interleave group headings with
//! assessment rows; deadlines appear either as an inline credit summary or
//! inside a popover's graduated-credit sub-table, in two different date
//! formats. Everything here is a pure function over the fetched markup.

pub mod deadline;
pub mod groups;

use crate::models::AssignmentRecord;
use chrono::DateTime;
use chrono_tz::Tz;
use html_scraper::{ElementRef, Html, Selector};

/// All scraped timestamps are localized to the institution's timezone,
/// regardless of any offset markers embedded in the source strings.
pub const TIMEZONE: Tz = chrono_tz::America::Vancouver;

/// Flattened text content of an element, trimmed.
pub(crate) fn cell_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// Extract assignment records from an assessments page.
///
/// Returns `None` when the assessments table (or its body) is missing
/// entirely, so the caller can tell "page did not render" apart from a table
/// with no assignments. Malformed rows and unparseable dates never abort the
/// scan; they degrade to skipped rows or absent dates.
pub fn scrape_assessments(
    html: &str,
    course_name: &str,
    now: DateTime<Tz>,
) -> Option<Vec<AssignmentRecord>> {
    let document = Html::parse_document(html);
    let table_sel = Selector::parse(r#"table[aria-label="Assessments"]"#).unwrap();
    let tbody_sel = Selector::parse("tbody").unwrap();
    let cell_sel = Selector::parse("td.align-middle").unwrap();
    let link_sel = Selector::parse("a").unwrap();

    let table = document.select(&table_sel).next()?;
    let tbody = table.select(&tbody_sel).next()?;

    let mut records = Vec::new();

    for group in groups::group_rows(tbody) {
        for &row in &group.rows {
            let cells: Vec<ElementRef> = row.select(&cell_sel).collect();
            // group_rows only admits rows with at least two data cells
            let name_cell = cells[1];
            let name = match name_cell.select(&link_sel).next() {
                Some(link) => cell_text(link),
                None => cell_text(name_cell),
            };

            let (due, reminder) = deadline::resolve(row, now);

            records.push(AssignmentRecord {
                course_name: course_name.to_string(),
                assignment_name: format!("{} - {}", group.name, name),
                project: group.name.clone(),
                due,
                reminder,
            });
        }
    }

    Some(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Tz> {
        TIMEZONE.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    fn page(rows: &str) -> String {
        format!(
            r#"<html><body><table aria-label="Assessments"><tbody>{}</tbody></table></body></html>"#,
            rows
        )
    }

    fn heading(name: &str) -> String {
        format!(
            r#"<tr><th data-testid="assessment-group-heading">{}</th></tr>"#,
            name
        )
    }

    fn member(name: &str, credit: &str) -> String {
        format!(
            r##"<tr><td class="align-middle">1</td><td class="align-middle"><a href="#">{}</a></td><td class="align-middle">{}</td></tr>"##,
            name, credit
        )
    }

    #[test]
    fn inline_deadline_end_to_end() {
        let html = page(&format!(
            "{}{}",
            heading("Project 1"),
            member("HW1", "100% until 23:59, Sat, Apr 25")
        ));
        let now = at(2026, 4, 1, 12, 0);

        let records = scrape_assessments(&html, "CPSC 221", now).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].course_name, "CPSC 221");
        assert_eq!(records[0].assignment_name, "Project 1 - HW1");
        assert_eq!(records[0].project, "Project 1");
        assert_eq!(records[0].due, Some(at(2026, 4, 25, 23, 59)));
        assert_eq!(records[0].reminder, None);
    }

    #[test]
    fn missing_table_reported_to_caller() {
        assert!(scrape_assessments("<html><body></body></html>", "CPSC 221", at(2026, 1, 1, 0, 0)).is_none());
    }

    #[test]
    fn table_with_no_rows_yields_zero_records() {
        let records = scrape_assessments(&page(""), "CPSC 221", at(2026, 1, 1, 0, 0)).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn popover_consulted_when_inline_has_no_deadline() {
        let row = r##"<tr>
            <td class="align-middle">1</td>
            <td class="align-middle"><a href="#">Quiz 3</a></td>
            <td class="align-middle">None
                <button class="btn btn-xs btn-ghost" data-bs-content='<table><tr><th>Credit</th><th>Start</th><th>End</th></tr><tr><td>100%</td><td>2026-01-19 08:00:00-08</td><td>2026-04-25 23:59:59-08</td></tr></table>'>?</button>
            </td>
        </tr>"##;
        let html = page(&format!("{}{}", heading("Quizzes"), row));
        let now = at(2026, 4, 1, 12, 0);

        let records = scrape_assessments(&html, "CPSC 221", now).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].assignment_name, "Quizzes - Quiz 3");
        assert_eq!(
            records[0].due,
            Some(TIMEZONE.with_ymd_and_hms(2026, 4, 25, 23, 59, 59).unwrap())
        );
        assert_eq!(records[0].reminder, Some(at(2026, 1, 19, 8, 0)));
    }

    #[test]
    fn name_falls_back_to_cell_text_without_link() {
        let row = r#"<tr><td class="align-middle">1</td><td class="align-middle">Reading 2</td></tr>"#;
        let html = page(&format!("{}{}", heading("Readings"), row));

        let records = scrape_assessments(&html, "CPSC 221", at(2026, 1, 1, 0, 0)).unwrap();

        assert_eq!(records[0].assignment_name, "Readings - Reading 2");
        assert_eq!(records[0].due, None);
        assert_eq!(records[0].reminder, None);
    }

    #[test]
    fn records_preserve_document_order_across_groups() {
        let html = page(&format!(
            "{}{}{}{}{}",
            heading("Project 1"),
            member("HW1", "None"),
            member("HW2", "None"),
            heading("Project 2"),
            member("HW3", "None"),
        ));

        let records = scrape_assessments(&html, "CPSC 221", at(2026, 1, 1, 0, 0)).unwrap();

        let names: Vec<&str> = records.iter().map(|r| r.assignment_name.as_str()).collect();
        assert_eq!(
            names,
            ["Project 1 - HW1", "Project 1 - HW2", "Project 2 - HW3"]
        );
    }
}
