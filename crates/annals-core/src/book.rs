use crate::domain::HistoryId;
use crate::dto::HistoryRow;
use crate::filter::{matches, HistoryFilter};
use crate::view::{paginate, TablePage, TableQuery};

/// The locally held history list that saved rows are merged back into.
#[derive(Debug, Clone, Default)]
pub struct HistoryBook {
    rows: Vec<HistoryRow>,
}

impl HistoryBook {
    pub fn new(rows: Vec<HistoryRow>) -> Self {
        let mut book = Self::default();
        for row in rows {
            match book.rows.iter_mut().find(|existing| existing.id() == row.id()) {
                Some(existing) => *existing = row,
                None => book.rows.push(row),
            }
        }
        book
    }

    pub fn rows(&self) -> &[HistoryRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: &HistoryId) -> Option<&HistoryRow> {
        self.rows.iter().find(|row| row.id() == id)
    }

    /// Replaces the row with the same history id in place, or prepends a new one.
    pub fn merge(&mut self, row: HistoryRow) {
        match self.rows.iter_mut().find(|existing| existing.id() == row.id()) {
            Some(existing) => *existing = row,
            None => self.rows.insert(0, row),
        }
    }

    pub fn remove(&mut self, id: &HistoryId) -> Option<HistoryRow> {
        let index = self.rows.iter().position(|row| row.id() == id)?;
        Some(self.rows.remove(index))
    }

    pub fn filtered<'a>(
        &'a self,
        filter: &'a HistoryFilter,
    ) -> impl Iterator<Item = &'a HistoryRow> {
        self.rows.iter().filter(move |row| matches(filter, row))
    }

    pub fn page(&self, filter: &HistoryFilter, query: TableQuery) -> TablePage<'_> {
        let rows = self.rows.iter().filter(|row| matches(filter, row)).collect();
        paginate(rows, query)
    }
}
