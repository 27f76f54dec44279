use tracker_types::TimelineRecord;
use tracker_types::api::{FilterState, SortConfig, TimelineQuery};

use crate::filter::Filters;
use crate::sort::{self, Page};

/// State of the timeline table: filters, search box, sort column and page.
/// Any change to what is shown sends the reader back to page 1; page numbers
/// are clamped here, at the edge, not in the paginator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub filters: FilterState,
    pub search: String,
    pub sort: SortConfig,
    page: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            filters: FilterState::default(),
            search: String::new(),
            sort: SortConfig::default(),
            page: 1,
        }
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a view from a `GET /timelines/view` query.
    pub fn from_query(query: &TimelineQuery) -> Self {
        let mut view = Self {
            filters: query.filters(),
            search: query.search.clone(),
            ..Self::default()
        };
        if let Some(key) = query.sort.as_deref().filter(|k| !k.is_empty()) {
            view.sort.key = key.to_string();
        }
        if let Some(dir) = query.dir {
            view.sort.direction = dir;
        }
        view.page = query.page.unwrap_or(1);
        view
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn toggle_sort(&mut self, key: &str) {
        self.sort = sort::toggle_sort(&self.sort, key);
        self.page = 1;
    }

    pub fn set_filters(&mut self, filters: FilterState) {
        self.filters = filters;
        self.page = 1;
    }

    pub fn reset_filters(&mut self) {
        self.set_filters(FilterState::default());
    }

    pub fn set_search(&mut self, term: &str) {
        self.search = term.to_string();
        self.page = 1;
    }

    /// Move to `page`, clamped to the pages that exist for `total` rows.
    pub fn set_page(&mut self, page: usize, total: usize) -> usize {
        self.page = clamp_page(page, total);
        self.page
    }

    pub fn next_page(&mut self, total: usize) -> usize {
        self.set_page(self.page.saturating_add(1), total)
    }

    pub fn prev_page(&mut self, total: usize) -> usize {
        self.set_page(self.page.saturating_sub(1), total)
    }

    /// Filtered and sorted rows, before paging.
    pub fn visible<'a>(&self, records: &'a [TimelineRecord]) -> Vec<&'a TimelineRecord> {
        let filtered = Filters::new(&self.filters, &self.search).apply(records);
        sort::sort_records(filtered, &self.sort)
    }

    pub fn render<'a>(&self, records: &'a [TimelineRecord]) -> Page<'a> {
        let visible = self.visible(records);
        let page = clamp_page(self.page, visible.len());
        sort::paginate(&visible, page)
    }
}

fn clamp_page(page: usize, total: usize) -> usize {
    page.clamp(1, sort::page_count(total).max(1))
}
