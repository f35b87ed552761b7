use api_types::{Page, PageQuery};
use engine::PageRequest;

use crate::server::ServerState;

pub fn request(query: &PageQuery, state: &ServerState) -> PageRequest {
    PageRequest::new(query.page.unwrap_or(1), state.page_size)
}

/// Wraps an engine page into the `{count, next, previous, results}`
/// envelope, linking neighbours under `base`.
pub fn envelope<T, U>(page: engine::Page<T>, base: &str, view: impl FnMut(T) -> U) -> Page<U> {
    let next = page
        .has_next()
        .then(|| format!("{base}?page={}", page.page + 1));
    let previous = page
        .has_previous()
        .then(|| format!("{base}?page={}", page.page - 1));

    Page {
        count: page.count,
        next,
        previous,
        results: page.items.into_iter().map(view).collect(),
    }
}
