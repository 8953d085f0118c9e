use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::info;

use super::client::{gh_graphql, FieldValue};

const REPLY_MUTATION: &str = r#"mutation($threadId:ID!, $body:String!) {
  addPullRequestReviewThreadReply(input:{pullRequestReviewThreadId:$threadId, body:$body}) {
    comment { id }
  }
}"#;

const RESOLVE_MUTATION: &str =
    "mutation($threadId:ID!) { resolveReviewThread(input:{threadId:$threadId}) { thread { id isResolved } } }";

const UNRESOLVE_MUTATION: &str =
    "mutation($threadId:ID!) { unresolveReviewThread(input:{threadId:$threadId}) { thread { id isResolved } } }";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReplyData {
    add_pull_request_review_thread_reply: ReplyPayload,
}

#[derive(Debug, Deserialize)]
struct ReplyPayload {
    comment: CommentId,
}

#[derive(Debug, Deserialize)]
struct CommentId {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ThreadPayload {
    thread: ResolvedState,
}

/// Thread state returned by resolve/unresolve
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedState {
    pub id: String,
    pub is_resolved: bool,
}

/// Post a reply to a review thread, returning the new comment id
pub async fn reply_to_thread(host: &str, thread_id: &str, body: &str) -> Result<String> {
    let data: ReplyData = gh_graphql(
        host,
        REPLY_MUTATION,
        &[
            ("threadId", FieldValue::String(thread_id)),
            ("body", FieldValue::String(body)),
        ],
    )
    .await?;
    let id = data.add_pull_request_review_thread_reply.comment.id;
    info!(thread = thread_id, comment = %id, "replied to thread");
    Ok(id)
}

/// Resolve or unresolve a review thread
pub async fn set_thread_resolved(
    host: &str,
    thread_id: &str,
    resolved: bool,
) -> Result<ResolvedState> {
    let (op, mutation) = if resolved {
        ("resolveReviewThread", RESOLVE_MUTATION)
    } else {
        ("unresolveReviewThread", UNRESOLVE_MUTATION)
    };
    let mut data: HashMap<String, ThreadPayload> =
        gh_graphql(host, mutation, &[("threadId", FieldValue::String(thread_id))]).await?;
    let payload = data.remove(op).context("missing mutation response")?;
    info!(
        thread = %payload.thread.id,
        resolved = payload.thread.is_resolved,
        "thread state changed"
    );
    Ok(payload.thread)
}
