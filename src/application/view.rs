use crate::domain::models::commit::CommitEntry;
use crate::domain::models::dashboard::DashboardState;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputView {
    pub field: &'static str,
    pub placeholder: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitView {
    pub key: usize,
    pub message: String,
    pub date: Option<String>,
    /// `"by <name>"`, absent when the author has no name.
    pub author: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitListView {
    #[serde(rename = "refreshLabel")]
    pub refresh_label: &'static str,
    pub title: &'static str,
    pub entries: Vec<CommitView>,
}

/// What the page should draw for the current state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View {
    #[serde(rename = "countdownBanner")]
    pub countdown_banner: Option<String>,
    pub inputs: Vec<InputView>,
    pub loading: bool,
    #[serde(rename = "submitLabel")]
    pub submit_label: &'static str,
    pub commits: Option<CommitListView>,
}

/// Messages pushed from a dashboard session to the page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    View(View),
    Alert { message: String },
}

/// e.g. `Jan 1, 2024, 10:00 AM`
pub fn format_commit_date(date: DateTime<Utc>) -> String {
    date.format("%b %-d, %Y, %-I:%M %p").to_string()
}

fn commit_view(key: usize, entry: &CommitEntry) -> CommitView {
    CommitView {
        key,
        message: entry.message.clone(),
        date: entry.authored_at.map(format_commit_date),
        author: (!entry.author_name.is_empty()).then(|| format!("by {}", entry.author_name)),
    }
}

pub fn render(state: &DashboardState) -> View {
    let commits = state.commits();

    View {
        countdown_banner: state
            .countdown
            .map(|seconds| format!("Refreshing list in : {seconds}s")),
        inputs: vec![
            InputView {
                field: "token",
                placeholder: "Enter public key",
                value: state.form.token.clone(),
            },
            InputView {
                field: "owner",
                placeholder: "Enter owner name",
                value: state.form.owner.clone(),
            },
            InputView {
                field: "repo",
                placeholder: "Enter repo name",
                value: state.form.repo.clone(),
            },
        ],
        loading: state.is_loading(),
        submit_label: "Get Commit Details",
        commits: (!commits.is_empty()).then(|| CommitListView {
            refresh_label: "Refresh Commits",
            title: "List of commits : ",
            entries: commits
                .iter()
                .enumerate()
                .map(|(key, entry)| commit_view(key, entry))
                .collect(),
        }),
    }
}
