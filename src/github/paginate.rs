//! Cursor pagination.
//!
//! [`fetch_all`] drains a [`PageSource`] from the first page until the source
//! reports no further pages. A page that claims `has_next_page` but carries no
//! cursor also ends the loop, so a malformed response cannot spin forever (the
//! remaining pages, if any, are silently dropped).

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, warn};

/// One page of results plus the cursor to continue from.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

impl<T> Page<T> {
    /// The last page.
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            has_next_page: false,
            end_cursor: None,
        }
    }

    /// A page followed by more pages after `cursor`.
    pub fn with_next(items: Vec<T>, cursor: impl Into<String>) -> Self {
        Self {
            items,
            has_next_page: true,
            end_cursor: Some(cursor.into()),
        }
    }

    /// Cursor for the next request, or `None` when pagination is over.
    fn next_cursor(&self) -> Option<&str> {
        if !self.has_next_page {
            return None;
        }
        self.end_cursor.as_deref().filter(|c| !c.is_empty())
    }
}

/// Something that can be asked for the page after a cursor.
#[async_trait]
pub trait PageSource {
    type Item: Send;

    /// `after` is `None` for the first page.
    async fn fetch_page(&mut self, after: Option<&str>) -> Result<Page<Self::Item>>;
}

/// Fetch every page in order and concatenate the items.
///
/// The first error aborts the whole fetch; items read before it are discarded.
pub async fn fetch_all<S>(source: &mut S) -> Result<Vec<S::Item>>
where
    S: PageSource + Send,
{
    let mut all = Vec::new();
    let mut after: Option<String> = None;
    let mut page_no = 0usize;

    loop {
        page_no += 1;
        let page = source.fetch_page(after.as_deref()).await?;
        debug!(
            page = page_no,
            items = page.items.len(),
            has_next = page.has_next_page,
            "fetched page"
        );

        let next = page.next_cursor().map(str::to_owned);
        if next.is_none() && page.has_next_page {
            warn!(page = page_no, "page claims more results but has no cursor; stopping");
        }
        all.extend(page.items);

        match next {
            Some(cursor) => after = Some(cursor),
            None => break,
        }
    }

    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    /// Serves pre-built pages and records the cursors it was asked for.
    struct ScriptedSource {
        pages: Vec<Result<Page<u32>>>,
        requested: Vec<Option<String>>,
    }

    impl ScriptedSource {
        fn new(pages: Vec<Result<Page<u32>>>) -> Self {
            Self {
                pages,
                requested: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl PageSource for ScriptedSource {
        type Item = u32;

        async fn fetch_page(&mut self, after: Option<&str>) -> Result<Page<u32>> {
            self.requested.push(after.map(str::to_owned));
            if self.pages.is_empty() {
                anyhow::bail!("no more scripted pages");
            }
            self.pages.remove(0)
        }
    }

    fn split_into_pages(items: &[u32], sizes: &[usize]) -> Vec<Result<Page<u32>>> {
        let mut pages = Vec::new();
        let mut start = 0;
        for (i, size) in sizes.iter().enumerate() {
            let end = (start + size).min(items.len());
            let chunk = items[start..end].to_vec();
            start = end;
            if i + 1 == sizes.len() {
                pages.push(Ok(Page::last(chunk)));
            } else {
                pages.push(Ok(Page::with_next(chunk, format!("cursor-{}", i))));
            }
        }
        pages
    }

    #[tokio::test]
    async fn test_single_page() {
        let mut source = ScriptedSource::new(vec![Ok(Page::last(vec![1, 2, 3]))]);
        let all = fetch_all(&mut source).await.unwrap();
        assert_eq!(all, vec![1, 2, 3]);
        assert_eq!(source.requested, vec![None]);
    }

    #[tokio::test]
    async fn test_cursor_is_forwarded() {
        let mut source = ScriptedSource::new(vec![
            Ok(Page::with_next(vec![1], "abc")),
            Ok(Page::with_next(vec![2], "def")),
            Ok(Page::last(vec![3])),
        ]);
        let all = fetch_all(&mut source).await.unwrap();
        assert_eq!(all, vec![1, 2, 3]);
        assert_eq!(
            source.requested,
            vec![None, Some("abc".to_string()), Some("def".to_string())]
        );
    }

    #[tokio::test]
    async fn test_random_page_splits_keep_every_item_in_order() {
        let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);
        for _ in 0..50 {
            let total = rng.random_range(0..200u32);
            let items: Vec<u32> = (0..total).collect();
            let page_count = rng.random_range(1..12usize);
            let mut sizes: Vec<usize> = (0..page_count)
                .map(|_| rng.random_range(0..40usize))
                .collect();
            // the last page takes whatever is left
            let assigned: usize = sizes[..page_count - 1].iter().sum();
            sizes[page_count - 1] = (total as usize).saturating_sub(assigned);

            let mut source = ScriptedSource::new(split_into_pages(&items, &sizes));
            let all = fetch_all(&mut source).await.unwrap();
            assert_eq!(all, items);
            assert_eq!(source.requested.len(), page_count);
        }
    }

    #[tokio::test]
    async fn test_has_next_without_cursor_stops() {
        let mut source = ScriptedSource::new(vec![
            Ok(Page {
                items: vec![1, 2],
                has_next_page: true,
                end_cursor: None,
            }),
            Ok(Page::last(vec![99])),
        ]);
        let all = fetch_all(&mut source).await.unwrap();
        assert_eq!(all, vec![1, 2]);
        assert_eq!(source.requested.len(), 1);
    }

    #[tokio::test]
    async fn test_has_next_with_empty_cursor_stops() {
        let mut source = ScriptedSource::new(vec![
            Ok(Page::with_next(vec![1], "")),
            Ok(Page::last(vec![99])),
        ]);
        let all = fetch_all(&mut source).await.unwrap();
        assert_eq!(all, vec![1]);
        assert_eq!(source.requested.len(), 1);
    }

    #[tokio::test]
    async fn test_cursor_ignored_when_no_next_page() {
        let mut source = ScriptedSource::new(vec![
            Ok(Page {
                items: vec![1],
                has_next_page: false,
                end_cursor: Some("dangling".to_string()),
            }),
            Ok(Page::last(vec![99])),
        ]);
        let all = fetch_all(&mut source).await.unwrap();
        assert_eq!(all, vec![1]);
    }

    #[tokio::test]
    async fn test_mid_pagination_error_fails_whole_fetch() {
        let mut source = ScriptedSource::new(vec![
            Ok(Page::with_next(vec![1, 2], "next")),
            Err(anyhow::anyhow!("network down")),
        ]);
        let err = fetch_all(&mut source).await.unwrap_err();
        assert_eq!(err.to_string(), "network down");
        assert_eq!(source.requested.len(), 2);
    }
}
