use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use super::client::{gh_graphql, FieldValue, RepoRef};
use super::paginate::{fetch_all, Page, PageSource};

const THREADS_QUERY: &str = r#"query($owner:String!, $name:String!, $number:Int!, $after:String) {
  repository(owner:$owner, name:$name) {
    pullRequest(number:$number) {
      reviewThreads(first:100, after:$after) {
        pageInfo { hasNextPage endCursor }
        nodes {
          id
          isResolved
          isOutdated
          path
          line
          originalLine
          startLine
          originalStartLine
          comments(first:100) {
            nodes {
              id
              body
              createdAt
              url
              author { login }
            }
          }
        }
      }
    }
  }
}"#;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub login: String,
}

/// A single review comment. Immutable once fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    #[serde(default)]
    pub body: String,
    /// Timestamp as returned by the API, shown verbatim
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub url: String,
    /// 削除済み ("ghost") アカウントは `null` で返るので空の login として扱う
    #[serde(default, deserialize_with = "null_as_default")]
    pub author: Author,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Comment {
    pub fn author_name(&self) -> &str {
        if self.author.login.is_empty() {
            "unknown"
        } else {
            &self.author.login
        }
    }

    pub fn permalink(&self) -> Option<&str> {
        Some(self.url.as_str()).filter(|u| !u.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentConnection {
    #[serde(default)]
    pub nodes: Vec<Comment>,
}

/// A review thread in server order, oldest comment first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    pub id: String,
    pub is_resolved: bool,
    #[serde(default)]
    pub is_outdated: bool,
    /// Empty for threads without a file
    #[serde(default)]
    pub path: String,
    pub line: Option<u32>,
    pub original_line: Option<u32>,
    pub start_line: Option<u32>,
    pub original_start_line: Option<u32>,
    #[serde(default)]
    pub comments: CommentConnection,
}

impl Thread {
    pub fn comments(&self) -> &[Comment] {
        &self.comments.nodes
    }

    pub fn status_label(&self) -> &'static str {
        if self.is_resolved {
            "resolved"
        } else {
            "unresolved"
        }
    }

    /// `path:start-end`, `path:line`, `path:original_line` or just `path`.
    ///
    /// `None` for threads without a file.
    pub fn locator(&self) -> Option<String> {
        if self.path.is_empty() {
            return None;
        }
        let location = match (self.start_line, self.line, self.original_line) {
            (Some(start), Some(line), _) if start != line => Some(format!("{}-{}", start, line)),
            (_, Some(line), _) => Some(line.to_string()),
            (_, None, Some(original)) => Some(original.to_string()),
            _ => None,
        };
        Some(match location {
            Some(location) => format!("{}:{}", self.path, location),
            None => self.path.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ThreadsData {
    repository: Option<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepositoryNode {
    pull_request: Option<PullRequestNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PullRequestNode {
    review_threads: ReviewThreadConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReviewThreadConnection {
    page_info: PageInfo,
    #[serde(default)]
    nodes: Vec<Thread>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

impl ThreadsData {
    fn into_page(self) -> Result<Page<Thread>> {
        let Some(repository) = self.repository else {
            anyhow::bail!("repository not found");
        };
        let Some(pull_request) = repository.pull_request else {
            anyhow::bail!("pull request not found");
        };
        let threads = pull_request.review_threads;
        Ok(Page {
            items: threads.nodes,
            has_next_page: threads.page_info.has_next_page,
            end_cursor: threads.page_info.end_cursor,
        })
    }
}

/// Review threads of one pull request, fetched page by page through `gh`.
pub struct GhThreadSource {
    host: String,
    repo: RepoRef,
    pr_number: u32,
}

impl GhThreadSource {
    pub fn new(host: &str, repo: &RepoRef, pr_number: u32) -> Self {
        Self {
            host: host.to_string(),
            repo: repo.clone(),
            pr_number,
        }
    }
}

#[async_trait]
impl PageSource for GhThreadSource {
    type Item = Thread;

    async fn fetch_page(&mut self, after: Option<&str>) -> Result<Page<Thread>> {
        let number = self.pr_number.to_string();
        let mut fields = vec![
            ("owner", FieldValue::String(&self.repo.owner)),
            ("name", FieldValue::String(&self.repo.name)),
            ("number", FieldValue::Raw(&number)),
        ];
        if let Some(after) = after {
            fields.push(("after", FieldValue::String(after)));
        }
        let data: ThreadsData = gh_graphql(&self.host, THREADS_QUERY, &fields).await?;
        data.into_page()
    }
}

/// Fetch every review thread of a pull request.
pub async fn fetch_all_threads(host: &str, repo: &RepoRef, pr_number: u32) -> Result<Vec<Thread>> {
    let mut source = GhThreadSource::new(host, repo, pr_number);
    let threads = fetch_all(&mut source).await?;
    info!(repo = %repo, pr = pr_number, count = threads.len(), "fetched review threads");
    Ok(threads)
}
