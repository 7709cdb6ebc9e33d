//! Cursor pagination.

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::error::GraphqlClientError;

/// Cursor-based page info as returned by the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Whether there is another page.
    pub has_next_page: bool,
    /// Cursor for the next page; ignored when `has_next_page` is false.
    #[serde(default)]
    pub end_cursor: Option<String>,
}

/// One fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorPage<T> {
    /// Items in the page.
    pub items: Vec<T>,
    /// Pagination info.
    pub page_info: PageInfo,
}

/// A failed paginated fetch, with everything fetched before the failure.
#[derive(Debug, Error)]
#[error("pagination error after {pages} page(s): {source}")]
pub struct PaginationError<T> {
    /// Items from the pages that succeeded, in page order.
    pub partial: Vec<T>,
    /// Number of pages that succeeded.
    pub pages: usize,
    /// Underlying client error.
    #[source]
    pub source: GraphqlClientError,
}

impl<T> From<GraphqlClientError> for PaginationError<T> {
    fn from(source: GraphqlClientError) -> Self {
        Self {
            partial: Vec::new(),
            pages: 0,
            source,
        }
    }
}

impl<T> PaginationError<T> {
    /// Drop the partial items and keep the cause.
    #[must_use]
    pub fn into_source(self) -> GraphqlClientError {
        self.source
    }
}

/// Drive `fetch_page` until the API reports no further page.
///
/// The first call receives `None`; later calls receive the previous page's
/// `endCursor`. Pages are fetched strictly one after another. There is no
/// page-count limit.
pub async fn paginate_cursor<T, F, Fut>(mut fetch_page: F) -> Result<Vec<T>, PaginationError<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<CursorPage<T>, GraphqlClientError>>,
{
    let mut out = Vec::new();
    let mut cursor = None;
    let mut pages = 0_usize;

    loop {
        let page = match fetch_page(cursor.take()).await {
            Ok(page) => page,
            Err(source) => {
                return Err(PaginationError {
                    partial: out,
                    pages,
                    source,
                });
            }
        };
        pages += 1;
        out.extend(page.items);
        debug!(pages, items = out.len(), "fetched page");

        if !page.page_info.has_next_page {
            break;
        }
        match page.page_info.end_cursor {
            Some(next) => cursor = Some(next),
            None => {
                return Err(PaginationError {
                    partial: out,
                    pages,
                    source: GraphqlClientError::Protocol {
                        message: "page reported hasNextPage without an endCursor".to_string(),
                    },
                });
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn page(items: Vec<u32>, next: Option<&str>) -> CursorPage<u32> {
        CursorPage {
            items,
            page_info: PageInfo {
                has_next_page: next.is_some(),
                end_cursor: next.map(str::to_string),
            },
        }
    }

    #[tokio::test]
    async fn forwards_cursors_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);

        let items = paginate_cursor(move |cursor: Option<String>| {
            seen_clone.lock().expect("lock").push(cursor.clone());
            async move {
                Ok::<_, GraphqlClientError>(match cursor.as_deref() {
                    None => page(vec![1, 2], Some("c1")),
                    Some("c1") => page(vec![3], Some("c2")),
                    _ => page(vec![4], None),
                })
            }
        })
        .await
        .expect("pagination");

        assert_eq!(items, vec![1, 2, 3, 4]);
        assert_eq!(
            *seen.lock().expect("lock"),
            vec![None, Some("c1".to_string()), Some("c2".to_string())]
        );
    }

    #[tokio::test]
    async fn failure_returns_partial_items() {
        let calls = Arc::new(Mutex::new(0_u32));
        let calls_clone = Arc::clone(&calls);

        let err = paginate_cursor(move |_cursor| {
            let call = {
                let mut calls = calls_clone.lock().expect("lock");
                *calls += 1;
                *calls
            };
            async move {
                if call == 1 {
                    Ok(page(vec![10, 11], Some("c1")))
                } else {
                    Err(GraphqlClientError::Decode("truncated".to_string()))
                }
            }
        })
        .await
        .expect_err("second page fails");

        assert_eq!(err.partial, vec![10, 11]);
        assert_eq!(err.pages, 1);
        assert!(matches!(err.source, GraphqlClientError::Decode(_)));
        assert!(err.to_string().contains("truncated"));
    }

    #[tokio::test]
    async fn end_cursor_is_ignored_on_the_last_page() {
        let items = paginate_cursor(|cursor: Option<String>| async move {
            assert!(cursor.is_none());
            Ok::<_, GraphqlClientError>(CursorPage {
                items: vec![1],
                page_info: PageInfo {
                    has_next_page: false,
                    end_cursor: Some("stale".to_string()),
                },
            })
        })
        .await
        .expect("single page");

        assert_eq!(items, vec![1]);
    }

    #[tokio::test]
    async fn missing_cursor_with_next_page_is_a_protocol_error() {
        let err = paginate_cursor(|_cursor: Option<String>| async move {
            Ok::<_, GraphqlClientError>(CursorPage {
                items: vec![1],
                page_info: PageInfo {
                    has_next_page: true,
                    end_cursor: None,
                },
            })
        })
        .await
        .expect_err("protocol error");

        assert_eq!(err.partial, vec![1]);
        assert!(matches!(err.source, GraphqlClientError::Protocol { .. }));
    }

    #[test]
    fn page_info_decodes_camel_case() {
        let info: PageInfo = serde_json::from_value(serde_json::json!({
            "hasNextPage": true,
            "startCursor": "a",
            "endCursor": "b"
        }))
        .expect("page info");
        assert!(info.has_next_page);
        assert_eq!(info.end_cursor.as_deref(), Some("b"));
    }
}
