use crate::dto::HistoryRow;
use crate::time::format_timestamp_time;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

pub const ROWS_PER_PAGE_OPTIONS: [usize; 3] = [5, 10, 25];
pub const DEFAULT_ROWS_PER_PAGE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Date,
    Time,
    Type,
    Result,
    Duration,
    Regarding,
    Owner,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(SortKey::Date),
            "time" => Ok(SortKey::Time),
            "type" => Ok(SortKey::Type),
            "result" => Ok(SortKey::Result),
            "duration" => Ok(SortKey::Duration),
            "regarding" => Ok(SortKey::Regarding),
            "owner" => Ok(SortKey::Owner),
            other => Err(format!(
                "invalid sort key {other}: expected date|time|type|result|duration|regarding|owner"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableQuery {
    pub sort: SortKey,
    pub order: SortOrder,
    pub page: usize,
    pub rows_per_page: usize,
}

impl Default for TableQuery {
    fn default() -> Self {
        Self {
            sort: SortKey::Date,
            order: SortOrder::Desc,
            page: 0,
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePage<'a> {
    pub rows: Vec<&'a HistoryRow>,
    pub total: usize,
    pub page: usize,
    pub rows_per_page: usize,
}

impl TablePage<'_> {
    pub fn page_count(&self) -> usize {
        if self.total == 0 {
            return 1;
        }
        self.total.div_ceil(self.rows_per_page)
    }
}

pub fn compare_rows(a: &HistoryRow, b: &HistoryRow, key: SortKey) -> Ordering {
    let (fa, fb) = (&a.fields, &b.fields);
    match key {
        SortKey::Date => fa.occurred_at.cmp(&fb.occurred_at),
        SortKey::Time => format_timestamp_time(fa.occurred_at)
            .cmp(&format_timestamp_time(fb.occurred_at)),
        SortKey::Type => fa.kind.label().cmp(fb.kind.label()),
        SortKey::Result => fa.result.cmp(&fb.result),
        SortKey::Duration => fa.duration_minutes.cmp(&fb.duration_minutes),
        SortKey::Regarding => fa.regarding.cmp(&fb.regarding),
        SortKey::Owner => {
            let owner_a = fa.owner.as_ref().map(|owner| owner.name.as_str());
            let owner_b = fb.owner.as_ref().map(|owner| owner.name.as_str());
            owner_a.cmp(&owner_b)
        }
    }
}

/// Sorts (stable, ties keep list order) and slices one page. Out of range
/// rows-per-page values fall back to the default; pages past the end clamp to
/// the last page.
pub fn paginate<'a>(rows: Vec<&'a HistoryRow>, query: TableQuery) -> TablePage<'a> {
    let mut rows = rows;
    rows.sort_by(|a, b| {
        let ordering = compare_rows(a, b, query.sort);
        match query.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });

    let rows_per_page = if ROWS_PER_PAGE_OPTIONS.contains(&query.rows_per_page) {
        query.rows_per_page
    } else {
        DEFAULT_ROWS_PER_PAGE
    };
    let total = rows.len();
    let last_page = total.saturating_sub(1) / rows_per_page;
    let page = query.page.min(last_page);
    let start = page * rows_per_page;
    let rows = rows.into_iter().skip(start).take(rows_per_page).collect();

    TablePage {
        rows,
        total,
        page,
        rows_per_page,
    }
}
