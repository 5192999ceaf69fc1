use html_scraper::{ElementRef, Selector};

/// One named assessment group and its member rows, in document order.
#[derive(Debug, Clone)]
pub struct AssessmentGroup<'a> {
    pub name: String,
    pub rows: Vec<ElementRef<'a>>,
}

/// Partition the table body's flat row sequence into assessment groups.
///
/// The table is not nested: group headings are ordinary `<tr>`s carrying a
/// marker `<th>`, and every row after a heading belongs to it until the next
/// heading appears. Single linear pass; the only state is the currently open
/// group. Rows before the first heading are ignored, member rows with fewer
/// than two data cells are decorative filler and skipped, and a heading with
/// zero member rows still yields an (empty) group.
pub fn group_rows(tbody: ElementRef<'_>) -> Vec<AssessmentGroup<'_>> {
    let tr_sel = Selector::parse("tr").unwrap();
    let heading_sel = Selector::parse(r#"th[data-testid="assessment-group-heading"]"#).unwrap();
    let cell_sel = Selector::parse("td.align-middle").unwrap();

    let mut groups = Vec::new();
    let mut current: Option<AssessmentGroup> = None;

    for row in tbody.select(&tr_sel) {
        if let Some(heading) = row.select(&heading_sel).next() {
            if let Some(finished) = current.take() {
                groups.push(finished);
            }
            current = Some(AssessmentGroup {
                name: super::cell_text(heading),
                rows: Vec::new(),
            });
            continue;
        }

        let group = match current.as_mut() {
            Some(g) => g,
            None => continue,
        };

        if row.select(&cell_sel).count() < 2 {
            continue;
        }

        group.rows.push(row);
    }

    if let Some(finished) = current.take() {
        groups.push(finished);
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use html_scraper::Html;

    fn document(rows: &str) -> Html {
        Html::parse_document(&format!(
            "<html><body><table><tbody>{}</tbody></table></body></html>",
            rows
        ))
    }

    fn tbody_of(html: &Html) -> ElementRef<'_> {
        let sel = Selector::parse("tbody").unwrap();
        html.select(&sel).next().unwrap()
    }

    fn heading(name: &str) -> String {
        format!(
            r#"<tr><th data-testid="assessment-group-heading">{}</th></tr>"#,
            name
        )
    }

    fn member(name: &str) -> String {
        format!(
            r#"<tr><td class="align-middle">1</td><td class="align-middle">{}</td></tr>"#,
            name
        )
    }

    fn row_names(group: &AssessmentGroup<'_>) -> Vec<String> {
        group.rows.iter().map(|r| super::super::cell_text(*r)).collect()
    }

    #[test]
    fn one_group_per_heading_in_order() {
        let html = document(&format!(
            "{}{}{}{}{}",
            heading("Project 1"),
            member("HW1"),
            heading("Project 2"),
            member("HW2"),
            member("HW3"),
        ));

        let groups = group_rows(tbody_of(&html));

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "Project 1");
        assert_eq!(groups[0].rows.len(), 1);
        assert_eq!(groups[1].name, "Project 2");
        assert_eq!(groups[1].rows.len(), 2);
        assert_eq!(row_names(&groups[1]), ["1HW2", "1HW3"]);
    }

    #[test]
    fn empty_group_is_preserved() {
        let html = document(&format!(
            "{}{}{}",
            heading("Empty"),
            heading("Full"),
            member("HW1"),
        ));

        let groups = group_rows(tbody_of(&html));

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "Empty");
        assert!(groups[0].rows.is_empty());
        assert_eq!(groups[1].rows.len(), 1);
    }

    #[test]
    fn rows_before_first_heading_are_ignored() {
        let html = document(&format!("{}{}{}", member("stray"), heading("P1"), member("HW1")));

        let groups = group_rows(tbody_of(&html));

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].rows.len(), 1);
    }

    #[test]
    fn rows_with_too_few_cells_are_skipped() {
        let decorative = r#"<tr><td class="align-middle" colspan="4">loading…</td></tr>"#;
        let html = document(&format!(
            "{}{}{}{}",
            heading("P1"),
            member("HW1"),
            decorative,
            member("HW2"),
        ));

        let groups = group_rows(tbody_of(&html));

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].rows.len(), 2);
    }

    #[test]
    fn member_rows_concatenate_to_original_subsequence() {
        let html = document(&format!(
            "{}{}{}{}{}{}",
            heading("A"),
            member("r1"),
            member("r2"),
            heading("B"),
            member("r3"),
            member("r4"),
        ));

        let groups = group_rows(tbody_of(&html));

        let all: Vec<String> = groups.iter().flat_map(|g| row_names(g)).collect();
        assert_eq!(all, ["1r1", "1r2", "1r3", "1r4"]);
    }

    #[test]
    fn no_headings_means_no_groups() {
        let html = document(&member("HW1"));
        assert!(group_rows(tbody_of(&html)).is_empty());
    }
}
