use crate::error::{BrowserError, Result};
use crate::filter::filter_records;
use crate::models::{Category, SeatRecord};
use crate::query::Query;
use crate::sorter::sort_view;
use crate::view::{Direction, View};
use std::collections::BTreeSet;

/// One user's browsing state: the read-only full set, the curated view and
/// the query that produced it.
pub struct Session {
    full_set: Vec<SeatRecord>,
    view: View,
    last_query: Option<Query>,
}

impl Session {
    pub fn new(full_set: Vec<SeatRecord>) -> Self {
        let view = View::new(sort_view(full_set.clone(), None));
        Self {
            full_set,
            view,
            last_query: None,
        }
    }

    pub fn full_set(&self) -> &[SeatRecord] {
        &self.full_set
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn active_category(&self) -> Option<Category> {
        self.last_query.as_ref().and_then(|q| q.category)
    }

    pub fn search(&mut self, query: Query) {
        let rows = sort_view(filter_records(&self.full_set, &query), query.category);
        tracing::info!(rows = rows.len(), "search complete");
        self.view.replace(rows);
        self.last_query = Some(query);
    }

    pub fn reset(&mut self) {
        self.view.replace(sort_view(self.full_set.clone(), None));
        self.last_query = None;
    }

    /// Re-apply the grouped rank order to the current (possibly hand-edited) view.
    pub fn sort_by_rank(&mut self) -> Result<()> {
        let category = self.active_category().ok_or(BrowserError::CategoryRequired)?;
        let rows = self.view.take_rows();
        self.view.replace(sort_view(rows, Some(category)));
        Ok(())
    }

    pub fn move_row(&mut self, index: usize, direction: Direction) -> bool {
        self.view.move_row(index, direction)
    }

    pub fn remove_row(&mut self, index: usize) -> Option<SeatRecord> {
        self.view.remove_row(index)
    }

    /// Distinct branch codes present in the data, sorted
    pub fn branch_codes(&self) -> Vec<String> {
        distinct(self.full_set.iter().map(|r| r.branch_code.as_str()))
    }

    pub fn district_codes(&self) -> Vec<String> {
        distinct(self.full_set.iter().map(|r| r.dist_code.as_str()))
    }
}

fn distinct<'a>(codes: impl Iterator<Item = &'a str>) -> Vec<String> {
    codes
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
