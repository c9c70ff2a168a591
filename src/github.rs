use async_trait::async_trait;
use log::*;
use octocrab::{
    models::{repos::RepoCommit, Repository},
    Octocrab,
};

use crate::{
    retry::RetryPolicy,
    source::{decode_content, Branch, EntryKind, RepositoryEntry, SourceProvider},
};

const PER_PAGE: u8 = 100;

/// This function returns a live Octocrab instance authenticated with `token`.
pub fn octocrab_handle(token: &str) -> octocrab::Result<Octocrab> {
    Octocrab::builder().personal_token(token.to_string()).build()
}

/// Whether a failed call is worth repeating. Client errors other than rate
/// limiting are final; transport problems and server errors are not.
pub fn is_transient(err: &octocrab::Error) -> bool {
    match err {
        octocrab::Error::GitHub { source, .. } => {
            is_transient_response(source.status_code.as_u16(), &source.message)
        }
        octocrab::Error::Serde { .. } | octocrab::Error::Json { .. } => false,
        _ => true,
    }
}

/// Classify an error response by status and message. GitHub reports secondary
/// rate limits as 403, so the message is checked too.
pub fn is_transient_response(status: u16, message: &str) -> bool {
    (500..600).contains(&status)
        || status == 429
        || message.to_lowercase().contains("rate limit")
}

/// [`SourceProvider`] backed by the GitHub Contents API.
#[derive(Clone)]
pub struct GitHubSource {
    gh: Octocrab,
    owner: String,
    repo: String,
    retry: RetryPolicy,
}

impl GitHubSource {
    pub fn new(gh: Octocrab, owner: String, repo: String, retry: RetryPolicy) -> GitHubSource {
        GitHubSource {
            gh,
            owner,
            repo,
            retry,
        }
    }

    /// `owner/repo`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    async fn fetch_branch_page(&self, page: u32) -> octocrab::Result<Vec<Branch>> {
        let label = format!("branch listing page {} of {}/{}", page, self.owner, self.repo);
        let current_page = self
            .retry
            .run(&label, is_transient, || async move {
                self.gh
                    .repos(&self.owner, &self.repo)
                    .list_branches()
                    .per_page(PER_PAGE)
                    .page(page)
                    .send()
                    .await
            })
            .await?;

        Ok(current_page
            .items
            .into_iter()
            .map(|b| Branch { name: b.name })
            .collect())
    }

    async fn fetch_content(
        &self,
        branch: &str,
        path: &str,
    ) -> octocrab::Result<Vec<octocrab::models::repos::Content>> {
        let label = format!("contents of «{}» on {}", path, branch);
        let items = self
            .retry
            .run(&label, is_transient, || async move {
                self.gh
                    .repos(&self.owner, &self.repo)
                    .get_content()
                    .path(path)
                    .r#ref(branch)
                    .send()
                    .await
            })
            .await?;
        Ok(items.items)
    }
}

#[async_trait]
impl SourceProvider for GitHubSource {
    async fn list_branches(&self) -> Vec<Branch> {
        let mut to_return: Vec<Branch> = Vec::new();

        // GitHub pages are 1-based.
        let mut page_number = 1u32;

        loop {
            let current_page = match self.fetch_branch_page(page_number).await {
                Ok(branches) => branches,
                Err(err) => {
                    warn!(
                        "Unable to fetch branches of {}/{}: {}",
                        self.owner, self.repo, err
                    );
                    break;
                }
            };

            let last_page = current_page.len() < PER_PAGE as usize;
            to_return.extend(current_page);

            if last_page {
                debug!("Finished paging through branches.");
                break;
            }

            page_number += 1;
        }

        to_return
    }

    async fn list_directory(&self, branch: &str, path: &str) -> Vec<RepositoryEntry> {
        match self.fetch_content(branch, path).await {
            Ok(items) => items
                .into_iter()
                .map(|item| RepositoryEntry {
                    kind: EntryKind::from_api_type(&item.r#type),
                    name: item.name,
                    path: item.path,
                })
                .collect(),
            Err(err) => {
                warn!("Could not list «{}» on branch {}: {}", path, branch, err);
                Vec::new()
            }
        }
    }

    async fn read_file(&self, branch: &str, path: &str) -> Option<String> {
        let items = match self.fetch_content(branch, path).await {
            Ok(items) => items,
            Err(err) => {
                warn!("Could not fetch «{}» on branch {}: {}", path, branch, err);
                return None;
            }
        };

        let encoded = items.into_iter().find_map(|item| item.content);
        match encoded.as_deref().and_then(decode_content) {
            Some(text) => Some(text),
            None => {
                warn!("File «{}» on branch {} has no readable content.", path, branch);
                None
            }
        }
    }
}

/// Every repository the token can see. With `collaborator_only` set, only
/// repositories where the user was added as a collaborator.
pub async fn list_accessible_repos(
    gh: &Octocrab,
    collaborator_only: bool,
    retry: &RetryPolicy,
) -> octocrab::Result<Vec<Repository>> {
    let mut to_return: Vec<Repository> = Vec::new();
    let mut page_number = 1u8;

    loop {
        let label = format!("repository page {}", page_number);
        let current_page = retry
            .run(&label, is_transient, || async move {
                let current = gh.current();
                let builder = current
                    .list_repos_for_authenticated_user()
                    .per_page(PER_PAGE)
                    .page(page_number);
                let builder = if collaborator_only {
                    builder.affiliation("collaborator")
                } else {
                    builder.type_("all")
                };
                builder.send().await
            })
            .await?;

        let last_page = current_page.items.len() < PER_PAGE as usize;
        to_return.extend(current_page.items);

        if last_page {
            debug!("Finished paging through repositories.");
            break;
        }
        page_number += 1;
    }

    Ok(to_return)
}

/// Fetch the newest commit on the default branch, `None` for empty repositories.
pub async fn get_latest_commit(
    gh: &Octocrab,
    owner: &str,
    name: &str,
    retry: &RetryPolicy,
) -> Option<RepoCommit> {
    let label = format!("latest commit of {}/{}", owner, name);
    let commits = match retry
        .run(&label, is_transient, || async move {
            gh.repos(owner, name).list_commits().per_page(1).send().await
        })
        .await
    {
        Ok(commits) => commits,
        Err(e) => {
            warn!("Failed to fetch commits of {}/{}: {}", owner, name, e);
            return None;
        }
    };

    commits.items.into_iter().next()
}
