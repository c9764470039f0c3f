pub mod fetch_commits;
