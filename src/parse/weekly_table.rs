use std::collections::BTreeMap;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Html};

use super::is_menu_item;
use crate::static_selector;

/// Header cells carry a parenthesized weekday letter, e.g. "2월 26일(월)".
/// Both the ASCII and fullwidth parenthesis forms appear on the board.
fn weekday_marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("[（(]([월화수목금])[）)]").expect("regex should be valid"))
}

fn header_date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{1,2})월\s*(\d{1,2})일").expect("regex should be valid"))
}

/// A row must resolve at least this many distinct dates to count as the
/// header. Keeps notice tables with a stray date from being mistaken for
/// the menu grid.
const MIN_DATED_COLUMNS: usize = 3;
/// The date header always sits near the top of the grid.
const HEADER_SEARCH_ROWS: usize = 3;

/// One post's menu grid: concrete dates mapped to the dishes listed under
/// them, in table order.
///
/// Keys are real dates built from header text and a reference year, never
/// bare weekday labels. A stale post still pinned to the board therefore
/// misses the requested date instead of answering for the wrong week.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WeeklyTable {
    days: BTreeMap<NaiveDate, Vec<String>>,
}

impl WeeklyTable {
    /// Extracts the menu grid from a post detail page.
    ///
    /// Candidate tables inside the article body (or the whole document
    /// when the body wrapper is missing) are tried in document order; the
    /// first one with an acceptable date header wins. Yields an empty
    /// table when nothing qualifies.
    #[must_use]
    pub fn from_post_html(document: &Html, reference_year: i32) -> Self {
        static_selector!(ARTICLE_SELECTOR <- "div.artclView");
        static_selector!(TABLE_SELECTOR <- "table");

        let container = document
            .select(&ARTICLE_SELECTOR)
            .next()
            .unwrap_or_else(|| document.root_element());
        for table in container.select(&TABLE_SELECTOR) {
            let rows = snapshot_rows(table);
            // a menu grid has at least a header row and one data row
            if rows.len() < 2 {
                continue;
            }
            if let Some(parsed) = Self::from_rows(&rows, reference_year) {
                return parsed;
            }
        }
        Self::default()
    }

    /// Builds the grid from plain row snapshots.
    ///
    /// One of the first three rows must map at least [`MIN_DATED_COLUMNS`]
    /// distinct dates, else `None`. Every row below the header contributes
    /// its dated cells, split on line breaks and run through
    /// [`is_menu_item`]. Header dates stay present even when no items
    /// survive. When two columns share a date the later column wins.
    #[must_use]
    pub fn from_rows(rows: &[Vec<String>], reference_year: i32) -> Option<Self> {
        let (header_idx, columns) = rows
            .iter()
            .take(HEADER_SEARCH_ROWS)
            .enumerate()
            .find_map(|(idx, row)| Some((idx, dated_columns(row, reference_year)?)))?;

        let mut days: BTreeMap<NaiveDate, Vec<String>> =
            columns.keys().map(|&date| (date, Vec::new())).collect();
        for row in &rows[header_idx + 1..] {
            for (date, &column) in &columns {
                let Some(cell) = row.get(column) else {
                    continue;
                };
                let items = days.get_mut(date).expect("initialized from same keys");
                items.extend(
                    cell.split('\n')
                        .map(str::trim)
                        .filter(|piece| is_menu_item(piece))
                        .map(str::to_owned),
                );
            }
        }
        Some(Self { days })
    }

    #[must_use]
    pub fn get(&self, date: NaiveDate) -> Option<&[String]> {
        self.days.get(&date).map(Vec::as_slice)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.days.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// Maps each date found in a header row to its column index. `None` when
/// fewer than [`MIN_DATED_COLUMNS`] distinct dates resolve.
fn dated_columns(row: &[String], reference_year: i32) -> Option<BTreeMap<NaiveDate, usize>> {
    let mut columns = BTreeMap::new();
    for (idx, cell) in row.iter().enumerate() {
        if let Some(date) = parse_header_date(cell, reference_year) {
            columns.insert(date, idx);
        }
    }
    (columns.len() >= MIN_DATED_COLUMNS).then_some(columns)
}

/// Reads "M월 D일" out of a header cell, gated on the weekday marker.
/// Dates that do not exist in the reference year leave the cell undated.
fn parse_header_date(text: &str, reference_year: i32) -> Option<NaiveDate> {
    if !weekday_marker_regex().is_match(text) {
        return None;
    }
    let caps = header_date_regex().captures(text)?;
    let month = caps[1].parse().ok()?;
    let day = caps[2].parse().ok()?;
    NaiveDate::from_ymd_opt(reference_year, month, day)
}

/// Flattens a `<table>` into trimmed cell text, one string per cell with
/// text nodes joined by line breaks. Downstream logic works on these
/// snapshots instead of the DOM.
fn snapshot_rows(table: ElementRef) -> Vec<Vec<String>> {
    static_selector!(ROW_SELECTOR <- "tr");
    static_selector!(CELL_SELECTOR <- "th, td");
    table
        .select(&ROW_SELECTOR)
        .map(|row| {
            row.select(&CELL_SELECTOR)
                .map(|cell| {
                    cell.text()
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .collect::<Vec<_>>()
                        .join("\n")
                })
                .collect()
        })
        .collect()
}
