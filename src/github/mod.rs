mod client;
pub mod mutation;
pub mod paginate;
pub mod threads;

use thiserror::Error;

pub use client::{
    env_host, gh_command, gh_graphql, resolve_pr_number, resolve_repo, FieldValue, RepoRef,
    DEFAULT_HOST,
};
pub use mutation::{reply_to_thread, set_thread_resolved, ResolvedState};
pub use paginate::{fetch_all, Page, PageSource};
pub use threads::{fetch_all_threads, Author, Comment, CommentConnection, GhThreadSource, Thread};

/// Errors carried by a GraphQL response envelope
#[derive(Debug, Error)]
pub enum GraphQlError {
    #[error("graphql error: {0}")]
    Api(String),
    #[error("graphql response missing data")]
    MissingData,
}
