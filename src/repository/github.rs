// src/repository/github.rs

//! GitHub-hosted package sources
//!
//! A source URL such as `git://github.com/components/jquery.git` is reduced
//! to its `owner/repo` pair. Tags come from the GitHub tags API, manifests
//! from raw file hosting at a ref, and release archives from the zipball or
//! tarball URL of the selected tag.

use super::Transport;
use crate::error::{Error, Result};
use crate::version::{self, VersionMatcher};
use serde::Deserialize;
use tracing::{debug, info};

/// GitHub REST API base
pub const GITHUB_API: &str = "https://api.github.com";

/// Raw file hosting base used for manifest fetches
pub const GITHUB_RAW: &str = "https://raw.githubusercontent.com";

/// Manifest file looked up at a ref
const MANIFEST_FILE: &str = "bower.json";

/// A tag as returned by the GitHub tags API
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Tag {
    pub name: String,
    pub zipball_url: String,
    pub tarball_url: String,
}

impl Tag {
    /// Pseudo-tag pointing at the head of a branch
    fn branch(owner: &str, repo: &str, branch: &str) -> Self {
        Self {
            name: branch.to_string(),
            zipball_url: format!("{}/repos/{}/{}/zipball/{}", GITHUB_API, owner, repo, branch),
            tarball_url: format!("{}/repos/{}/{}/tarball/{}", GITHUB_API, owner, repo, branch),
        }
    }
}

/// Release archive flavour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArchiveKind {
    #[default]
    Zip,
    Tar,
}

impl ArchiveKind {
    /// File extension used for cached archives
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveKind::Zip => "zip",
            ArchiveKind::Tar => "tar.gz",
        }
    }
}

/// One resolved upstream source
pub struct GithubRepository<'a> {
    transport: &'a dyn Transport,
    owner: String,
    repo: String,
    selected: Option<Tag>,
}

impl<'a> GithubRepository<'a> {
    /// Create a repository for a source URL
    pub fn new(transport: &'a dyn Transport, source: &str) -> Result<Self> {
        let (owner, repo) = parse_source(source)?;
        Ok(Self {
            transport,
            owner,
            repo,
            selected: None,
        })
    }

    /// Point this repository at another source, dropping any selected tag
    pub fn set_source(&mut self, source: &str) -> Result<()> {
        let (owner, repo) = parse_source(source)?;
        self.owner = owner;
        self.repo = repo;
        self.selected = None;
        Ok(())
    }

    /// Normalized `https://github.com/<owner>/<repo>` URL
    pub fn url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.repo)
    }

    /// `owner/repo` pair
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Base URL for raw file fetches
    pub fn raw_base(&self) -> String {
        format!("{}/{}/{}", GITHUB_RAW, self.owner, self.repo)
    }

    /// List tags in the order the API returns them (newest first)
    pub fn list_tags(&self) -> Result<Vec<Tag>> {
        let url = format!(
            "{}/repos/{}/{}/tags?per_page=100",
            GITHUB_API, self.owner, self.repo
        );

        let body = self.transport.get(&url).map_err(|e| {
            Error::Repository(format!("Cannot list tags for {}: {}", self.slug(), e))
        })?;

        let tags: Vec<Tag> = serde_json::from_slice(&body).map_err(|e| {
            Error::Repository(format!("Invalid tag list for {}: {}", self.slug(), e))
        })?;

        debug!("{} has {} tags", self.slug(), tags.len());
        Ok(tags)
    }

    /// Fetch the raw manifest at a ref
    ///
    /// Returns `None` when the ref has no manifest file (HTTP 404).
    pub fn fetch_manifest(&self, reference: &str) -> Result<Option<Vec<u8>>> {
        let url = format!("{}/{}/{}", self.raw_base(), reference, MANIFEST_FILE);

        match self.transport.get(&url) {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.is_not_found() => {
                debug!("No {} at {}", MANIFEST_FILE, url);
                Ok(None)
            }
            Err(e) => Err(Error::Repository(format!("Cannot fetch {}: {}", url, e))),
        }
    }

    /// Resolve a constraint to a tag name and remember it as selected
    pub fn resolve_version(&mut self, constraint: &str) -> Result<Option<String>> {
        self.selected = None;
        if version::is_branch(constraint) {
            return Ok(Some(self.select_branch(version::DEFAULT_BRANCH)));
        }

        let tags = self.list_tags()?;
        let matcher = VersionMatcher::new(constraint);

        if tags.is_empty() && matcher.pattern() == "*" {
            info!("{} has no tags, using {}", self.slug(), version::DEFAULT_BRANCH);
            return Ok(Some(self.select_branch(version::DEFAULT_BRANCH)));
        }

        let found = matcher
            .find(tags.iter().map(|tag| tag.name.as_str()))
            .map(str::to_string);

        if let Some(name) = &found {
            info!("Resolved {} {} to {}", self.slug(), constraint, name);
            self.selected = tags.into_iter().find(|tag| &tag.name == name);
        }

        Ok(found)
    }

    fn select_branch(&mut self, branch: &str) -> String {
        self.selected = Some(Tag::branch(&self.owner, &self.repo, branch));
        branch.to_string()
    }

    /// The tag chosen by the last `resolve_version`, if it matched
    pub fn selected_tag(&self) -> Option<&Tag> {
        self.selected.as_ref()
    }

    /// Download the release archive of the selected tag
    pub fn fetch_release(&self, kind: ArchiveKind) -> Result<Vec<u8>> {
        let tag = self.selected.as_ref().ok_or_else(|| {
            Error::Repository(format!(
                "No version of {} has been selected for download",
                self.slug()
            ))
        })?;

        let url = match kind {
            ArchiveKind::Zip => &tag.zipball_url,
            ArchiveKind::Tar => &tag.tarball_url,
        };

        info!("Downloading {} {} from {}", self.slug(), tag.name, url);
        self.transport
            .get(url)
            .map_err(|e| Error::Repository(format!("Cannot download {}: {}", url, e)))
    }
}

/// Reduce a source URL to its `(owner, repo)` pair
///
/// Accepts `https://`, `http://`, `git://`, `ssh://` and `git@host:` forms as
/// well as the bare `owner/repo` shorthand. A trailing `.git` is dropped.
pub fn parse_source(source: &str) -> Result<(String, String)> {
    let invalid = || Error::Repository(format!("Invalid GitHub repository URL: {}", source));

    let mut rest = source.trim().trim_end_matches('/');
    rest = rest.strip_suffix(".git").unwrap_or(rest);

    let mut had_scheme = false;
    for scheme in ["git+https://", "git+ssh://", "https://", "http://", "git://", "ssh://"] {
        if let Some(stripped) = rest.strip_prefix(scheme) {
            rest = stripped;
            had_scheme = true;
            break;
        }
    }
    if let Some(stripped) = rest.strip_prefix("git@") {
        rest = stripped;
        had_scheme = true;
    }

    let mut had_host = false;
    for host in ["www.github.com", "github.com", "raw.githubusercontent.com", "raw.github.com"] {
        if let Some(stripped) = rest.strip_prefix(host) {
            if let Some(path) = stripped.strip_prefix('/').or_else(|| stripped.strip_prefix(':')) {
                rest = path;
                had_host = true;
                break;
            }
        }
    }

    if had_scheme && !had_host {
        return Err(Error::Repository(format!(
            "Unsupported repository host (only GitHub is supported): {}",
            source
        )));
    }

    let mut segments = rest.split('/').filter(|s| !s.is_empty());
    let owner = segments.next().ok_or_else(invalid)?;
    let repo = segments.next().ok_or_else(invalid)?;

    Ok((owner.to_string(), repo.to_string()))
}
