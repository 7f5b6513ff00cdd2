//! Connectors module
//!
//! Upstream access: the [`RepositorySource`] trait and its GitHub REST
//! implementation.

pub mod github;
pub mod trait_;

pub use github::{
    DEFAULT_COMMIT_LIMIT, GitHubClient, GitHubError, RepoRef, effective_commit_limit,
    parse_reference,
};
pub use trait_::RepositorySource;
