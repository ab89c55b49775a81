//! Paged view over an ordered dataset
//!
//! Owns the backing items, a named set of AND-composed predicate filters,
//! and a clamped page cursor. The filtered view is recomputed eagerly on
//! every data or filter mutation, so page computations always read a
//! consistent view. Every mutation returns the cursor to page 1.

/// A named, individually enablable predicate.
struct Filter<T> {
    id: String,
    predicate: Box<dyn Fn(&T) -> bool + Send + Sync>,
    enabled: bool,
}

/// Windowed, filterable view over an ordered set of records.
///
/// `page_count` is always at least 1, even for an empty view: there is
/// one (empty) page, never an out-of-range cursor.
pub struct PagedView<T> {
    items: Vec<T>,
    filters: Vec<Filter<T>>,
    /// Indices into `items`, in display order.
    view: Vec<usize>,
    page_size: usize,
    page: usize,
}

impl<T> Default for PagedView<T> {
    fn default() -> Self {
        Self::new(10)
    }
}

impl<T> PagedView<T> {
    pub fn new(page_size: usize) -> Self {
        PagedView {
            items: Vec::new(),
            filters: Vec::new(),
            view: Vec::new(),
            page_size,
            page: 1,
        }
    }

    /// Replace the backing data wholesale and return to page 1.
    pub fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
        self.rebuild_view();
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Add or replace the filter registered under `id`.
    pub fn add_filter(
        &mut self,
        id: impl Into<String>,
        predicate: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) {
        let id = id.into();
        let filter = Filter {
            id: id.clone(),
            predicate: Box::new(predicate),
            enabled: true,
        };
        match self.filters.iter_mut().find(|f| f.id == id) {
            Some(existing) => *existing = filter,
            None => self.filters.push(filter),
        }
        self.rebuild_view();
    }

    /// Remove the filter registered under `id`. Unknown ids are a no-op
    /// apart from the view recompute.
    pub fn remove_filter(&mut self, id: &str) {
        self.filters.retain(|f| f.id != id);
        self.rebuild_view();
    }

    /// Enable or disable a filter without dropping it.
    pub fn set_filter_enabled(&mut self, id: &str, enabled: bool) {
        if let Some(filter) = self.filters.iter_mut().find(|f| f.id == id) {
            filter.enabled = enabled;
        }
        self.rebuild_view();
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.rebuild_view();
    }

    /// Change the page size and re-clamp the cursor.
    pub fn set_page_size(&mut self, size: usize) {
        self.page_size = size;
        self.page = self.clamp(self.page);
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Move to `page`, clamped to `[1, page_count]`.
    pub fn go_to_page(&mut self, page: usize) {
        self.page = self.clamp(page);
    }

    pub fn next_page(&mut self) {
        self.go_to_page(self.page + 1);
    }

    pub fn previous_page(&mut self) {
        self.go_to_page(self.page.saturating_sub(1));
    }

    /// Sort the active view in place and return to page 1. The backing
    /// item order is untouched; only the projection reorders.
    pub fn sort(&mut self, mut compare: impl FnMut(&T, &T) -> std::cmp::Ordering) {
        let items = &self.items;
        self.view.sort_by(|&a, &b| compare(&items[a], &items[b]));
        self.page = 1;
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_count(&self) -> usize {
        let size = self.page_size.max(1);
        (self.view.len().div_ceil(size)).max(1)
    }

    /// Number of records surviving the enabled filters.
    pub fn view_len(&self) -> usize {
        self.view.len()
    }

    /// Records on the current page:
    /// `[page_size * (page - 1), page_size * page)` intersected with the
    /// view bounds.
    pub fn visible_slice(&self) -> Vec<&T> {
        self.page_items(self.page)
    }

    /// Records on an arbitrary page (clamped), without moving the cursor.
    /// Lets a caller prefetch the next page's records ahead of navigation.
    pub fn page_items(&self, page: usize) -> Vec<&T> {
        let page = self.clamp(page);
        let start = (self.page_size * (page - 1)).min(self.view.len());
        let end = (self.page_size * page).min(self.view.len());
        self.view[start..end]
            .iter()
            .map(|&i| &self.items[i])
            .collect()
    }

    fn clamp(&self, page: usize) -> usize {
        page.clamp(1, self.page_count())
    }

    fn rebuild_view(&mut self) {
        let filters = &self.filters;
        self.view = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| {
                filters
                    .iter()
                    .all(|f| !f.enabled || (f.predicate)(item))
            })
            .map(|(i, _)| i)
            .collect();
        self.page = 1;
    }
}
