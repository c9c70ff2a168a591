use chrono::{DateTime, FixedOffset, NaiveTime, Utc};
use log::*;
use octocrab::{models::repos::RepoCommit, Octocrab};
use serde::Serialize;

use crate::{github, retry::RetryPolicy};

/// Deadline expressed as an hour of the day at a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cutoff {
    pub hour: u32,
    pub utc_offset_hours: i32,
}

impl Cutoff {
    /// True when `when`, seen in the cutoff's time zone, falls after the cutoff
    /// hour of its own day.
    pub fn is_late(&self, when: DateTime<Utc>) -> bool {
        let Some(offset) = FixedOffset::east_opt(self.utc_offset_hours * 3600) else {
            warn!("Ignoring out of range UTC offset {}", self.utc_offset_hours);
            return false;
        };
        let Some(deadline) = NaiveTime::from_hms_opt(self.hour, 0, 0) else {
            warn!("Ignoring out of range cutoff hour {}", self.hour);
            return false;
        };
        when.with_timezone(&offset).time() > deadline
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepoActivity {
    pub owner: String,
    pub name: String,
    pub url: Option<String>,
    pub last_commit: Option<DateTime<Utc>>,
    pub late: bool,
}

pub fn commit_time(commit: &RepoCommit) -> Option<DateTime<Utc>> {
    commit
        .commit
        .committer
        .as_ref()
        .and_then(|c| c.date)
        .or_else(|| commit.commit.author.as_ref().and_then(|a| a.date))
}

/// Last commit of every repository the token can reach.
pub async fn collect_activity(
    gh: &Octocrab,
    collaborator_only: bool,
    cutoff: Cutoff,
    retry: &RetryPolicy,
) -> octocrab::Result<Vec<RepoActivity>> {
    let repos = github::list_accessible_repos(gh, collaborator_only, retry).await?;
    info!("Got repos: {}", repos.len());

    let mut to_return = Vec::with_capacity(repos.len());
    for repo in repos {
        let Some(owner) = repo.owner.as_ref().map(|o| o.login.clone()) else {
            warn!("Repo {} has no owner, skipping.", repo.name);
            continue;
        };

        let last_commit = github::get_latest_commit(gh, &owner, &repo.name, retry)
            .await
            .as_ref()
            .and_then(commit_time);
        if last_commit.is_none() {
            debug!("No commit date for {}/{}", owner, repo.name);
        }

        to_return.push(RepoActivity {
            late: last_commit.map(|t| cutoff.is_late(t)).unwrap_or(false),
            url: repo.html_url.as_ref().map(|u| u.to_string()),
            name: repo.name,
            owner,
            last_commit,
        });
    }

    Ok(to_return)
}
