//! Walking every page of a collection.
//!
//! The walker drives a single-page fetch in a loop, feeding each returned
//! cursor back as the next offset. It is sequential by construction: page
//! `n + 1` cannot be requested before page `n` has named its offset.

use tracing::debug;

use crate::error::ApiError;
use crate::options::{NextPage, Options};

/// Page size requested by [`walk_pages`].
pub const PAGE_SIZE: u32 = 100;

/// Collect every item of a paged collection.
///
/// Each iteration prepends `{limit: PAGE_SIZE, offset: <cursor>}` to the
/// caller's `options`, so the walker controls paging while the caller's
/// field selection still applies. The walk ends when `fetch` returns no
/// cursor; empty pages that still carry a cursor do not stop it.
///
/// The first error aborts the walk and is returned as-is; items gathered so
/// far are dropped. With `max_pages` set, a cursor still present after that
/// many pages fails with `ApiError::Logic` instead of looping on.
pub fn walk_pages<T, F>(options: &[Options], max_pages: Option<usize>, mut fetch: F) -> Result<Vec<T>, ApiError>
where
    F: FnMut(&[Options]) -> Result<(Vec<T>, Option<NextPage>), ApiError>,
{
    let mut all = Vec::new();
    let mut cursor = Some(NextPage::default());
    let mut pages = 0usize;

    while let Some(next) = cursor {
        if max_pages.is_some_and(|max| pages >= max) {
            return Err(ApiError::Logic(format!(
                "collection still has more pages after {pages} pages"
            )));
        }

        let mut page_options = Vec::with_capacity(options.len() + 1);
        page_options.push(Options::page(PAGE_SIZE, next.offset));
        page_options.extend_from_slice(options);

        let (items, next_page) = fetch(&page_options)?;
        pages += 1;
        debug!(page = pages, items = items.len(), more = next_page.is_some(), "fetched page");

        all.extend(items);
        cursor = next_page;
    }

    Ok(all)
}
