use serde::{Deserialize, Serialize};

/// One page as returned by the cluster, continued through an opaque token.
#[derive(Debug, Clone, PartialEq)]
pub struct ListPage<T> {
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

impl<T> ListPage<T> {
    pub fn new(items: Vec<T>, next_page_token: Option<String>) -> Self {
        Self {
            items,
            next_page_token: next_page_token.filter(|token| !token.is_empty()),
        }
    }

    pub fn is_last(&self) -> bool {
        self.next_page_token.is_none()
    }
}

/// Offset window handed back to tool callers.
///
/// `next_skip` is present exactly when `has_more` is true, so a caller can
/// walk the full listing by feeding it back as `skip`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub count: usize,
    pub skip: usize,
    pub limit: usize,
    pub has_more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_skip: Option<usize>,
}

impl<T> Page<T> {
    /// Builds a window from up to `limit + 1` items collected after skipping `skip`.
    ///
    /// The extra item only signals that more data exists and is dropped.
    pub fn from_lookahead(mut collected: Vec<T>, skip: usize, limit: usize) -> Self {
        let has_more = collected.len() > limit;
        collected.truncate(limit);
        let count = collected.len();
        Self {
            items: collected,
            count,
            skip,
            limit,
            has_more,
            next_skip: has_more.then_some(skip + count),
        }
    }
}
