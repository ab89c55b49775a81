//! Paged-view scenarios driven the way a list widget would drive them:
//! load, filter, sort, navigate, resize.

use glint::page::PagedView;

#[derive(Debug, Clone, PartialEq)]
struct Row {
    name: &'static str,
    stars: u32,
    archived: bool,
}

fn repos() -> Vec<Row> {
    vec![
        Row { name: "anvil", stars: 120, archived: false },
        Row { name: "bramble", stars: 4, archived: true },
        Row { name: "cinder", stars: 310, archived: false },
        Row { name: "dray", stars: 0, archived: false },
        Row { name: "ember", stars: 77, archived: true },
        Row { name: "flint", stars: 9, archived: false },
        Row { name: "gorse", stars: 230, archived: false },
        Row { name: "heath", stars: 15, archived: true },
        Row { name: "iris", stars: 52, archived: false },
        Row { name: "juniper", stars: 3, archived: false },
        Row { name: "kestrel", stars: 880, archived: false },
    ]
}

fn names(view: &PagedView<Row>) -> Vec<&'static str> {
    view.visible_slice().iter().map(|r| r.name).collect()
}

#[test]
fn browse_filter_sort_flow() {
    let mut view = PagedView::new(4);
    view.set_items(repos());
    assert_eq!(view.page_count(), 3);
    assert_eq!(names(&view), ["anvil", "bramble", "cinder", "dray"]);

    view.next_page();
    assert_eq!(names(&view), ["ember", "flint", "gorse", "heath"]);

    // Filters AND together and reset to page 1.
    view.add_filter("active", |r: &Row| !r.archived);
    view.add_filter("starred", |r: &Row| r.stars > 0);
    assert_eq!(view.page(), 1);
    assert_eq!(view.view_len(), 7);
    assert_eq!(view.page_count(), 2);
    assert_eq!(names(&view), ["anvil", "cinder", "flint", "gorse"]);

    // Sorting reorders the projection only.
    view.sort(|a, b| b.stars.cmp(&a.stars));
    assert_eq!(names(&view), ["kestrel", "cinder", "gorse", "anvil"]);
    assert_eq!(view.items()[0].name, "anvil");

    // Dropping one filter readmits archived rows but keeps the other.
    view.remove_filter("active");
    assert_eq!(view.view_len(), 10);
    assert!(view.visible_slice().iter().all(|r| r.stars > 0));
}

#[test]
fn page_cursor_clamps_at_both_ends() {
    let mut view = PagedView::new(4);
    view.set_items(repos());

    view.go_to_page(99);
    assert_eq!(view.page(), 3);
    assert_eq!(names(&view), ["iris", "juniper", "kestrel"]);

    view.next_page();
    assert_eq!(view.page(), 3);

    view.go_to_page(0);
    assert_eq!(view.page(), 1);
    view.previous_page();
    assert_eq!(view.page(), 1);
}

#[test]
fn shrinking_data_reclamps_the_cursor() {
    let mut view = PagedView::new(4);
    view.set_items(repos());
    view.go_to_page(3);

    // A stricter filter shrinks the view below the cursor.
    view.add_filter("popular", |r: &Row| r.stars >= 100);
    assert_eq!(view.view_len(), 4);
    assert_eq!(view.page(), 1);
    assert_eq!(view.page_count(), 1);

    // Empty view still reports one page with no rows.
    view.add_filter("popular", |r: &Row| r.stars >= 100_000);
    assert_eq!(view.page_count(), 1);
    assert!(view.visible_slice().is_empty());
}

#[test]
fn resizing_pages_keeps_the_cursor_valid() {
    let mut view = PagedView::new(2);
    view.set_items(repos());
    view.go_to_page(6);
    assert_eq!(view.page(), 6);

    view.set_page_size(10);
    assert_eq!(view.page_count(), 2);
    assert_eq!(view.page(), 2);
    assert_eq!(names(&view), ["kestrel"]);

    // Zero behaves as one row per page.
    view.set_page_size(0);
    assert_eq!(view.page_count(), 11);
}

#[test]
fn prefetching_a_page_does_not_move_the_cursor() {
    let mut view = PagedView::new(4);
    view.set_items(repos());

    let ahead: Vec<_> = view.page_items(2).iter().map(|r| r.name).collect();
    assert_eq!(ahead, ["ember", "flint", "gorse", "heath"]);
    assert_eq!(view.page(), 1);
}

#[test]
fn replacing_a_filter_by_id_uses_the_new_predicate() {
    let mut view = PagedView::new(10);
    view.set_items(repos());

    view.add_filter("cut", |r: &Row| r.stars > 50);
    assert_eq!(view.view_len(), 6);

    view.add_filter("cut", |r: &Row| r.stars > 500);
    assert_eq!(view.view_len(), 1);
    assert_eq!(names(&view), ["kestrel"]);

    view.set_filter_enabled("cut", false);
    assert_eq!(view.view_len(), 11);
    view.set_filter_enabled("cut", true);
    assert_eq!(view.view_len(), 1);
}
