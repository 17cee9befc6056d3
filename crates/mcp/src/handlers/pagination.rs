use std::future::Future;

use serde::Serialize;
use serde_json::{Value, json};
use temporal_mcp_api::TemporalError;
use temporal_mcp_types::{ListPage, Page};

use super::arguments::MAX_PAGE_LIMIT;
use crate::types::ToolError;

/// Walks token-paged results and returns up to `take` items after the first `skip`.
///
/// `fetch` receives the continuation token of the previous page (`None` first)
/// and the page size to request.
pub(crate) async fn collect_window<T, F, Fut>(skip: usize, take: usize, mut fetch: F) -> Result<Vec<T>, TemporalError>
where
    F: FnMut(usize, Option<String>) -> Fut,
    Fut: Future<Output = Result<ListPage<T>, TemporalError>>,
{
    let page_size = skip.saturating_add(take).clamp(1, MAX_PAGE_LIMIT as usize);
    let mut collected = Vec::with_capacity(take.min(page_size));
    let mut seen = 0usize;
    let mut token = None;
    while collected.len() < take {
        let ListPage { items, next_page_token } = fetch(page_size, token.take()).await?;
        for item in items {
            if seen >= skip {
                collected.push(item);
                if collected.len() == take {
                    break;
                }
            }
            seen += 1;
        }
        match next_page_token {
            Some(next) => token = Some(next),
            None => break,
        }
    }
    Ok(collected)
}

/// Fetches the `skip`/`limit` window plus one lookahead item.
pub(crate) async fn fetch_page<T, F, Fut>(skip: usize, limit: usize, fetch: F) -> Result<Page<T>, ToolError>
where
    F: FnMut(usize, Option<String>) -> Fut,
    Fut: Future<Output = Result<ListPage<T>, TemporalError>>,
{
    let collected = collect_window(skip, limit.saturating_add(1), fetch).await?;
    Ok(Page::from_lookahead(collected, skip, limit))
}

/// Reply shape of the listing tools; `items_key` names the item array.
pub(crate) fn page_payload<T: Serialize>(items_key: &str, page: &Page<T>) -> Result<Value, ToolError> {
    let items = serde_json::to_value(&page.items).map_err(|error| ToolError::platform(format!("failed to encode {items_key}: {error}")))?;
    Ok(json!({
        items_key: items,
        "count": page.count,
        "skip": page.skip,
        "limit": page.limit,
        "has_more": page.has_more,
        "next_skip": page.next_skip,
    }))
}
