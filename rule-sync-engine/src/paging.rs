//! Reading paged store queries to completion

use rule_sync_storage::{Page, PageRequest, StorageError};
use std::future::Future;

/// Read every page of a paged query
pub async fn fetch_all<T, F, Fut>(per_page: u32, mut fetch: F) -> Result<Vec<T>, StorageError>
where
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = Result<Page<T>, StorageError>>,
{
    let mut request = PageRequest::first(per_page);
    let mut items = Vec::new();
    loop {
        let page = fetch(request).await?;
        let more = page.has_more();
        items.extend(page.items);
        if !more {
            return Ok(items);
        }
        request = request.next();
    }
}
