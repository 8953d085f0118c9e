use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::process::Command;

use super::GraphQlError;

pub const DEFAULT_HOST: &str = "github.com";

/// Execute gh CLI command and return stdout
/// Uses spawn_blocking to avoid blocking the tokio runtime
pub async fn gh_command(args: &[&str]) -> Result<String> {
    let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();

    tokio::task::spawn_blocking(move || {
        let output = Command::new("gh")
            .args(&args)
            .output()
            .context("Failed to execute gh CLI - is it installed?")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("gh command failed: {}", stderr.trim());
        }

        String::from_utf8(output.stdout).context("gh output contains invalid UTF-8")
    })
    .await
    .context("spawn_blocking task panicked")?
}

/// Field type for gh api command
pub enum FieldValue<'a> {
    /// String field (-f)
    String(&'a str),
    /// Raw/typed field (-F) - for integers, booleans, null
    Raw(&'a str),
}

#[derive(Debug, Deserialize)]
struct GraphQlEnvelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlMessage>,
}

#[derive(Debug, Deserialize)]
struct GraphQlMessage {
    #[serde(default)]
    message: String,
}

/// Build the argument list for `gh api graphql`.
pub(crate) fn graphql_args(
    host: &str,
    query: &str,
    fields: &[(&str, FieldValue<'_>)],
) -> Vec<String> {
    let mut args = vec![
        "api".to_string(),
        "graphql".to_string(),
        "--hostname".to_string(),
        host.to_string(),
        "-f".to_string(),
        format!("query={}", query),
    ];
    for (key, value) in fields {
        match value {
            FieldValue::String(v) => {
                args.push("-f".to_string());
                args.push(format!("{}={}", key, v));
            }
            FieldValue::Raw(v) => {
                args.push("-F".to_string());
                args.push(format!("{}={}", key, v));
            }
        }
    }
    args
}

/// Decode a GraphQL response envelope into `T`.
///
/// A non-empty `errors` array wins over any partial `data`.
pub(crate) fn decode_graphql<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let envelope: GraphQlEnvelope<T> =
        serde_json::from_str(raw).context("Failed to parse GraphQL response as JSON")?;
    if !envelope.errors.is_empty() {
        let messages: Vec<String> = envelope
            .errors
            .into_iter()
            .map(|e| e.message)
            .filter(|m| !m.is_empty())
            .collect();
        return Err(GraphQlError::Api(messages.join("; ")).into());
    }
    envelope.data.ok_or_else(|| GraphQlError::MissingData.into())
}

/// Execute a GraphQL query or mutation through `gh api graphql`
pub async fn gh_graphql<T: DeserializeOwned>(
    host: &str,
    query: &str,
    fields: &[(&str, FieldValue<'_>)],
) -> Result<T> {
    let args = graphql_args(host, query, fields);
    let args_refs: Vec<&str> = args.iter().map(|s| s.as_str()).collect();
    let output = gh_command(&args_refs).await?;
    decode_graphql(&output)
}

/// `GH_HOST` when set to something non-blank
pub fn env_host() -> Option<String> {
    std::env::var("GH_HOST")
        .ok()
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
}

/// Owner/name pair of a repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    /// Parse `owner/name`. Exactly one slash, both halves non-empty.
    pub fn parse(repo: &str) -> Result<Self> {
        let repo = repo.trim();
        let mut parts = repo.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => Ok(Self {
                owner: owner.to_string(),
                name: name.to_string(),
            }),
            _ => anyhow::bail!("invalid repo {:?} (expected owner/name)", repo),
        }
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RepoView {
    name_with_owner: String,
}

#[derive(Debug, Deserialize)]
struct PrView {
    number: u32,
}

/// Resolve the repository: explicit `--repo` value, or `gh repo view` for the current checkout
pub async fn resolve_repo(repo: Option<&str>) -> Result<RepoRef> {
    if let Some(repo) = repo.filter(|r| !r.trim().is_empty()) {
        return RepoRef::parse(repo);
    }
    let output = gh_command(&["repo", "view", "--json", "nameWithOwner"])
        .await
        .context("failed to resolve repo")?;
    let view: RepoView =
        serde_json::from_str(&output).context("Failed to parse gh repo view response")?;
    if view.name_with_owner.is_empty() {
        anyhow::bail!("gh repo view returned empty nameWithOwner");
    }
    RepoRef::parse(&view.name_with_owner)
}

/// Resolve the PR number: explicit `--pr` value, or the PR of the current branch
///
/// gh は `-R` 指定時に PR 引数を要求するため、カレントのチェックアウトに対して問い合わせる
pub async fn resolve_pr_number(pr: Option<u32>) -> Result<u32> {
    if let Some(pr) = pr.filter(|n| *n > 0) {
        return Ok(pr);
    }
    let output = gh_command(&["pr", "view", "--json", "number"])
        .await
        .context("--pr is required (and could not be derived from current checkout)")?;
    let view: PrView =
        serde_json::from_str(&output).context("Failed to parse gh pr view response")?;
    Ok(view.number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use serial_test::serial;

    #[test]
    fn test_repo_ref_parse() {
        let repo = RepoRef::parse("octo/hello").unwrap();
        assert_eq!(repo.owner, "octo");
        assert_eq!(repo.name, "hello");
        assert_eq!(repo.to_string(), "octo/hello");

        assert!(RepoRef::parse("octo").is_err());
        assert!(RepoRef::parse("octo/hello/extra").is_err());
        assert!(RepoRef::parse("/hello").is_err());
        assert!(RepoRef::parse("octo/").is_err());
    }

    #[test]
    fn test_graphql_args_field_kinds() {
        let args = graphql_args(
            "github.com",
            "query { viewer { login } }",
            &[("owner", FieldValue::String("42")), ("number", FieldValue::Raw("7"))],
        );
        assert_eq!(
            args,
            vec![
                "api",
                "graphql",
                "--hostname",
                "github.com",
                "-f",
                "query=query { viewer { login } }",
                "-f",
                "owner=42",
                "-F",
                "number=7",
            ]
        );
    }

    #[test]
    fn test_decode_graphql_data() {
        let value: Value = decode_graphql(r#"{"data": {"ok": true}}"#).unwrap();
        assert_eq!(value["ok"], Value::Bool(true));
    }

    #[test]
    fn test_decode_graphql_errors_are_joined() {
        let err = decode_graphql::<Value>(
            r#"{"data": null, "errors": [{"message": "first"}, {"message": ""}, {"message": "second"}]}"#,
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "graphql error: first; second");
    }

    #[test]
    fn test_decode_graphql_missing_data() {
        let err = decode_graphql::<Value>(r#"{"errors": []}"#).unwrap_err();
        assert_eq!(err.to_string(), "graphql response missing data");
    }

    #[test]
    #[serial]
    fn test_env_host() {
        let orig = std::env::var("GH_HOST").ok();

        std::env::set_var("GH_HOST", "  ghe.example.com ");
        assert_eq!(env_host().as_deref(), Some("ghe.example.com"));
        std::env::set_var("GH_HOST", "   ");
        assert_eq!(env_host(), None);
        std::env::remove_var("GH_HOST");
        assert_eq!(env_host(), None);

        if let Some(v) = orig {
            std::env::set_var("GH_HOST", v);
        }
    }

    /// 引数を記録して固定の JSON を返す gh を `dir` に置く。戻り値は記録ファイル
    #[cfg(unix)]
    fn install_fake_gh(dir: &std::path::Path, response: &str) -> std::path::PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let log = dir.join("argv.log");
        let script = format!(
            "#!/bin/sh\necho \"$@\" >> '{}'\ncat <<'JSON'\n{}\nJSON\n",
            log.display(),
            response
        );
        let gh = dir.join("gh");
        std::fs::write(&gh, script).unwrap();
        std::fs::set_permissions(&gh, std::fs::Permissions::from_mode(0o755)).unwrap();
        log
    }

    /// `dir` を PATH の先頭に置いて `fut` を実行し、PATH を元に戻す
    #[cfg(unix)]
    async fn with_path<F: std::future::Future>(dir: &std::path::Path, fut: F) -> F::Output {
        let orig = std::env::var_os("PATH");
        let mut paths = vec![dir.to_path_buf()];
        if let Some(orig) = &orig {
            paths.extend(std::env::split_paths(orig));
        }
        std::env::set_var("PATH", std::env::join_paths(paths).unwrap());
        let output = fut.await;
        match orig {
            Some(orig) => std::env::set_var("PATH", orig),
            None => std::env::remove_var("PATH"),
        }
        output
    }

    #[cfg(unix)]
    #[tokio::test]
    #[serial]
    async fn test_resolve_pr_number_queries_current_checkout() {
        let dir = tempfile::tempdir().unwrap();
        let log = install_fake_gh(dir.path(), r#"{"number":5}"#);

        let pr = with_path(dir.path(), resolve_pr_number(None)).await.unwrap();
        assert_eq!(pr, 5);
        let argv = std::fs::read_to_string(&log).unwrap();
        assert_eq!(argv.trim_end(), "pr view --json number");
    }

    #[cfg(unix)]
    #[tokio::test]
    #[serial]
    async fn test_resolve_pr_number_explicit_skips_gh() {
        let dir = tempfile::tempdir().unwrap();
        let log = install_fake_gh(dir.path(), r#"{"number":5}"#);

        let pr = with_path(dir.path(), resolve_pr_number(Some(12))).await.unwrap();
        assert_eq!(pr, 12);
        assert!(!log.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    #[serial]
    async fn test_resolve_repo_from_current_checkout() {
        let dir = tempfile::tempdir().unwrap();
        let log = install_fake_gh(dir.path(), r#"{"nameWithOwner":"octo/hello"}"#);

        let repo = with_path(dir.path(), resolve_repo(None)).await.unwrap();
        assert_eq!(repo.to_string(), "octo/hello");
        let argv = std::fs::read_to_string(&log).unwrap();
        assert_eq!(argv.trim_end(), "repo view --json nameWithOwner");

        let explicit = with_path(dir.path(), resolve_repo(Some("o/n"))).await.unwrap();
        assert_eq!(explicit, RepoRef::parse("o/n").unwrap());
    }
}
