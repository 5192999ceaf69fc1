use super::{cell_text, TIMEZONE};
use crate::models::DeadlineTier;
use chrono::{DateTime, Datelike, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use html_scraper::{ElementRef, Html, Selector};
use regex::Regex;
use std::sync::LazyLock;

static TZ_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(?(PST|PDT)\)?").unwrap());
static OFFSET_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[+-]\d{2}$").unwrap());
static UNTIL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)%\s+until\s+(.+)").unwrap());
static STARTING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)%\s+starting from\s+(.+)").unwrap());

/// Resolve the operative due and unlock dates for one assessment row.
///
/// The inline credit summary (third data cell) takes precedence; the popover
/// is only consulted when the inline text yields no deadline, and its unlock
/// date is only used when the inline text yields no unlock either. A row can
/// legitimately resolve to neither.
pub fn resolve(row: ElementRef<'_>, now: DateTime<Tz>) -> (Option<DateTime<Tz>>, Option<DateTime<Tz>>) {
    let cell_sel = Selector::parse("td.align-middle").unwrap();
    let cells: Vec<ElementRef> = row.select(&cell_sel).collect();

    let (mut due, mut unlock) = match cells.get(2) {
        Some(cell) => parse_available_credit(&cell_text(*cell), now.year()),
        None => (None, None),
    };

    if due.is_none() {
        if let Some(payload) = popover_payload(row) {
            let (popover_due, popover_unlock) = parse_popover(&payload, now);
            due = popover_due;
            if unlock.is_none() {
                unlock = popover_unlock;
            }
        }
    }

    (due, unlock)
}

/// Parse the inline "Available credit" text, e.g.
/// "100% until 23:59, Sat, Apr 25" or "100% starting from 08:00, Mon, Jan 19".
/// Returns (due, unlock).
pub fn parse_available_credit(text: &str, year: i32) -> (Option<DateTime<Tz>>, Option<DateTime<Tz>>) {
    let text = text.trim();
    if text.is_empty() || text == "None" {
        return (None, None);
    }

    let due = UNTIL_RE
        .captures(text)
        .and_then(|caps| parse_date(&caps[2], year));
    let unlock = STARTING_RE
        .captures(text)
        .and_then(|caps| parse_date(&caps[2], year));

    (due, unlock)
}

/// The popover's HTML fragment, stored as an attribute on a ghost button.
fn popover_payload(row: ElementRef<'_>) -> Option<String> {
    let button_sel = Selector::parse("button.btn.btn-xs.btn-ghost").unwrap();
    row.select(&button_sel)
        .next()
        .and_then(|button| button.value().attr("data-bs-content"))
        .map(str::to_string)
}

/// Walk the popover's graduated-credit sub-table and pick the operative dates.
///
/// The due date is the earliest full-credit (100%) deadline that has not yet
/// passed; lower tiers and elapsed tiers never win. The unlock date is the
/// last parseable one across all tiers, since later tiers carry extension
/// unlocks.
pub fn parse_popover(payload: &str, now: DateTime<Tz>) -> (Option<DateTime<Tz>>, Option<DateTime<Tz>>) {
    let fragment = Html::parse_fragment(payload);
    let tr_sel = Selector::parse("tr").unwrap();
    let td_sel = Selector::parse("td").unwrap();

    let mut best_due: Option<DateTime<Tz>> = None;
    let mut last_unlock: Option<DateTime<Tz>> = None;

    // First row is the column header
    for row in fragment.select(&tr_sel).skip(1) {
        let cells: Vec<String> = row.select(&td_sel).map(cell_text).collect();
        if cells.len() < 3 {
            continue;
        }

        let tier = DeadlineTier {
            credit: parse_credit(&cells[0]),
            unlock_at: parse_date(&cells[1], now.year()),
            due_at: parse_date(&cells[2], now.year()),
        };

        if let Some(unlock) = tier.unlock_at {
            last_unlock = Some(unlock);
        }

        if tier.credit == Some(100) {
            if let Some(due) = tier.due_at {
                if due >= now && best_due.map_or(true, |best| due < best) {
                    best_due = Some(due);
                }
            }
        }
    }

    (best_due, last_unlock)
}

fn parse_credit(text: &str) -> Option<u32> {
    text.trim()
        .strip_suffix('%')
        .and_then(|digits| digits.trim().parse().ok())
}

/// Parse one of the page's two date formats into an institutional-local
/// timestamp. Unrecognized text is a soft miss, never an error.
pub fn parse_date(text: &str, year: i32) -> Option<DateTime<Tz>> {
    let text = text.trim();
    if text.is_empty() || text == "—" {
        return None;
    }

    // Strip timezone abbreviation markers, parenthesized or bare
    let cleaned = TZ_MARKER_RE.replace_all(text, "");
    let cleaned = cleaned.trim();

    // ISO form from popover cells, e.g. "2026-04-25 23:59:59-08". The numeric
    // offset is dropped, not applied: the civil time is already institutional
    // local time.
    let iso = OFFSET_SUFFIX_RE.replace(cleaned, "");
    if let Ok(naive) = NaiveDateTime::parse_from_str(iso.as_ref(), "%Y-%m-%d %H:%M:%S") {
        return TIMEZONE.from_local_datetime(&naive).earliest();
    }

    // Human form, e.g. "23:59, Sat, Apr 25". The source omits the year, so
    // the caller supplies the year implied by "now".
    let with_year = format!("{} {}", cleaned, year);
    if let Ok(naive) = NaiveDateTime::parse_from_str(&with_year, "%H:%M, %a, %b %d %Y") {
        return TIMEZONE.from_local_datetime(&naive).earliest();
    }

    None
}
