use std::fs;
use std::path::PathBuf;

use spdlog::{info, warn};

use crate::config::Config;
use crate::error::ApiError;
use crate::remote::{RemoteFile, RemoteRepo};
use crate::sanitize::resolve_under;

/// The two kinds of resource the admin surface persists. Each knows its
/// local directory, its path inside the remote repository, and the public
/// path handed back to callers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoreTarget {
    Posts,
    Images,
}

impl StoreTarget {
    fn local_dir<'a>(&self, config: &'a Config) -> &'a PathBuf {
        match self {
            StoreTarget::Posts => &config.paths.posts_dir,
            StoreTarget::Images => &config.paths.images_dir,
        }
    }

    fn remote_path(&self, filename: &str) -> String {
        match self {
            StoreTarget::Posts => format!("content/blog/{}", filename),
            StoreTarget::Images => format!("public/blog/{}", filename),
        }
    }

    /// Images are served from under the site root; posts are addressed by
    /// their repository-relative path.
    fn public_path(&self, filename: &str) -> String {
        match self {
            StoreTarget::Posts => format!("content/blog/{}", filename),
            StoreTarget::Images => format!("/blog/{}", filename),
        }
    }

    fn noun(&self) -> &'static str {
        match self {
            StoreTarget::Posts => "Post",
            StoreTarget::Images => "Image",
        }
    }
}

/// Local stage outcomes. The fallback decision is a match on these, not an
/// intercepted exception: a failed local write is data, not an error.
enum LocalWrite {
    Saved,
    Unavailable(String),
}

enum LocalDelete {
    Removed,
    Missing,
    Unavailable(String),
}

fn write_local(dir: &PathBuf, path: &PathBuf, content: &[u8]) -> LocalWrite {
    if !dir.exists() {
        if let Err(e) = fs::create_dir_all(dir) {
            return LocalWrite::Unavailable(e.to_string());
        }
    }

    match fs::write(path, content) {
        Ok(()) => LocalWrite::Saved,
        Err(e) => LocalWrite::Unavailable(e.to_string()),
    }
}

fn delete_local(path: &PathBuf) -> LocalDelete {
    if !path.exists() {
        return LocalDelete::Missing;
    }

    match fs::remove_file(path) {
        Ok(()) => LocalDelete::Removed,
        Err(e) => LocalDelete::Unavailable(e.to_string()),
    }
}

/// The fallback needs credentials; without them the caller learns both that
/// the feature is unconfigured and why the local attempt did not settle it.
fn remote_repo(config: &Config, action: &str, local_reason: &str) -> Result<RemoteRepo, ApiError> {
    match config.remote_credentials() {
        Some((token, repo)) => RemoteRepo::from_parts(repo, token),
        None => Err(ApiError::NotConfigured(format!(
            "Local {} failed: {}. Remote fallback requires a token and repository in the configuration.",
            action, local_reason,
        ))),
    }
}

/// An existing remote file makes the write an update and its hash rides
/// along; a missing one makes it a create with no hash at all.
fn commit_plan(existing: RemoteFile, filename: &str) -> (Option<String>, String) {
    match existing {
        RemoteFile::Found { sha } => (Some(sha), format!("Update {}", filename)),
        RemoteFile::NotFound => (None, format!("Add {}", filename)),
    }
}

/// Writes a named resource, local filesystem first, remote store second.
/// Returns the stored public path. Overwriting an existing file is fine;
/// repeating a write with identical content is safe on both backends.
pub async fn store_file(config: &Config, target: StoreTarget, filename: &str, content: &[u8]) -> Result<String, ApiError> {
    let dir = target.local_dir(config);
    let path = resolve_under(dir, filename)?;

    let reason = match write_local(dir, &path, content) {
        LocalWrite::Saved => {
            info!("Stored {} locally at {}", filename, path.to_str().unwrap_or(filename));
            return Ok(target.public_path(filename));
        }
        LocalWrite::Unavailable(reason) => reason,
    };

    warn!("Local write of {} failed ({}), falling back to remote store", filename, reason);

    let repo = remote_repo(config, "write", &reason)?;
    let remote_path = target.remote_path(filename);

    let existing = repo.get_file(&remote_path).await
        .map_err(|e| e.with_local_failure(&reason))?;

    let (sha, message) = commit_plan(existing, filename);

    repo.put_file(&remote_path, content, sha.as_deref(), &message).await
        .map_err(|e| e.with_local_failure(&reason))?;

    info!("Stored {} in the remote repository ({})", filename, message);
    Ok(target.public_path(filename))
}

/// Deletes a named resource with the same local-then-remote order. A
/// resource absent from both backends is not-found, never a crash; deleting
/// twice reports not-found the second time.
pub async fn delete_file(config: &Config, target: StoreTarget, filename: &str) -> Result<(), ApiError> {
    let dir = target.local_dir(config);
    let path = resolve_under(dir, filename)?;

    let reason = match delete_local(&path) {
        LocalDelete::Removed => {
            info!("Removed {} locally", filename);
            return Ok(());
        }
        LocalDelete::Missing => {
            return Err(ApiError::NotFound(format!("{} not found", target.noun())));
        }
        LocalDelete::Unavailable(reason) => reason,
    };

    warn!("Local delete of {} failed ({}), falling back to remote store", filename, reason);

    let repo = remote_repo(config, "delete", &reason)?;
    let remote_path = target.remote_path(filename);

    let sha = match repo.get_file(&remote_path).await.map_err(|e| e.with_local_failure(&reason))? {
        RemoteFile::Found { sha } => sha,
        RemoteFile::NotFound => {
            return Err(ApiError::NotFound(format!("{} not found in repository", target.noun())));
        }
    };

    repo.delete_file(&remote_path, &sha, &format!("Remove {}", filename)).await
        .map_err(|e| e.with_local_failure(&reason))?;

    info!("Removed {} from the remote repository", filename);
    Ok(())
}
