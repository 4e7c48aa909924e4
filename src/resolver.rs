// src/resolver.rs

//! Dependency resolution and the install/update/uninstall pipeline
//!
//! Resolution is a synchronous depth-first walk. Each package node goes
//! through registry lookup (unless it names its own source), tag matching,
//! manifest fetch and installation, then its dependencies are visited in
//! manifest order. There is no graph-wide solving: the first version
//! installed for a name wins and later requests for that name are skipped.
//!
//! Every operation returns the list of `Outcome`s it produced; nothing here
//! prints.

use crate::config::{Config, InitParams};
use crate::error::{Error, Result};
use crate::installer::Installer;
use crate::packages::{ANY_VERSION, Manifest, Package, is_source_url, validate_name};
use crate::registry::{RegistryClient, RegistryEntry};
use crate::repository::{ArchiveKind, GithubRepository, Transport};
use crate::version::VersionMatcher;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use tracing::{debug, info, warn};

/// What happened to a package during an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Installed,
    Updated,
    Skipped,
    Removed,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Action::Installed => "installed",
            Action::Updated => "updated",
            Action::Skipped => "skipped",
            Action::Removed => "removed",
        })
    }
}

/// Result of processing one package node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub name: String,
    pub version: Option<String>,
    pub action: Action,
}

impl Outcome {
    fn new(name: &str, version: Option<&str>, action: Action) -> Self {
        Self {
            name: name.to_string(),
            version: version.map(str::to_string),
            action,
        }
    }
}

/// Answer to a package info query
#[derive(Debug, Clone, PartialEq)]
pub enum PackageInfo {
    /// The manifest at the resolved version
    Manifest(Manifest),
    /// Tag names in the order the repository lists them
    Versions(Vec<String>),
    /// A single manifest field, or the repository URL for `url`
    Field(Value),
}

/// State of one top-level operation
///
/// `resolving` is the chain of packages currently being worked on; reaching
/// one of them again is a dependency cycle.
#[derive(Debug, Default)]
struct Traversal {
    resolving: Vec<String>,
    outcomes: Vec<Outcome>,
}

impl Traversal {
    fn enter(&mut self, name: &str) -> Result<()> {
        if let Some(start) = self.resolving.iter().position(|n| n == name) {
            let mut chain = self.resolving[start..].to_vec();
            chain.push(name.to_string());
            return Err(Error::Cycle(chain));
        }
        self.resolving.push(name.to_string());
        Ok(())
    }

    fn leave(&mut self, name: &str) {
        if let Some(index) = self.resolving.iter().rposition(|n| n == name) {
            self.resolving.remove(index);
        }
    }

    fn record(&mut self, name: &str, version: Option<&str>, action: Action) {
        self.outcomes.push(Outcome::new(name, version, action));
    }

    fn visited(&self, name: &str) -> bool {
        self.outcomes.iter().any(|o| o.name == name)
    }

    fn is_resolving(&self, name: &str) -> bool {
        self.resolving.iter().any(|n| n == name)
    }
}

/// Resolution context: transport, configuration and install options
pub struct Resolver<T: Transport> {
    transport: T,
    config: Config,
    archive_kind: ArchiveKind,
}

impl<T: Transport> Resolver<T> {
    pub fn new(transport: T, config: Config) -> Self {
        Self {
            transport,
            config,
            archive_kind: ArchiveKind::default(),
        }
    }

    /// Download tarballs instead of zipballs
    pub fn with_archive_kind(mut self, kind: ArchiveKind) -> Self {
        self.archive_kind = kind;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    fn registry(&self) -> RegistryClient<'_> {
        RegistryClient::new(&self.transport, self.config.registry())
    }

    fn installer(&self) -> Installer<'_> {
        Installer::new(&self.config).with_archive_kind(self.archive_kind)
    }

    /// Install a package and, recursively, its dependencies
    ///
    /// An installed package is skipped unless `force` is set. With saving
    /// enabled the package is recorded in `bower.json`.
    pub fn install_package(&self, package: Package, force: bool) -> Result<Vec<Outcome>> {
        let mut traversal = Traversal::default();
        self.install_node(package, force, true, &mut traversal)?;
        Ok(traversal.outcomes)
    }

    /// Install every dependency listed in `bower.json`
    pub fn install_dependencies(&self, force: bool) -> Result<Vec<Outcome>> {
        let root = self.config.read_root_manifest()?;
        let mut traversal = Traversal::default();

        for (name, value) in &root.dependencies {
            let package = Package::from_dependency(name, value)?;
            self.install_node(package, force, false, &mut traversal)?;
        }

        Ok(traversal.outcomes)
    }

    fn install_node(
        &self,
        mut package: Package,
        force: bool,
        top_level: bool,
        traversal: &mut Traversal,
    ) -> Result<()> {
        let name = package.name().to_string();
        let installer = self.installer();
        let installed = installer.is_installed(&name);

        if installed && !force {
            let record = self.config.read_installed_manifest(&name)?;
            info!("{} is already installed", name);
            traversal.record(&name, record.version.as_deref(), Action::Skipped);

            if top_level {
                if let Some(version) = &record.version {
                    package.set_version(version);
                }
                self.save_to_root(&package)?;
            }
            return Ok(());
        }

        traversal.enter(&name)?;

        let mut repository = self.open_repository(&package, None)?;
        self.resolve_package(&mut package, &mut repository)?;

        if installed {
            installer.update(&package, &repository)?;
        } else {
            installer.install(&package, &repository)?;
        }
        traversal.record(&name, package.version(), Action::Installed);

        for (dep_name, value) in package.requires() {
            debug!("{} requires {} {}", name, dep_name, value);
            let dependency = Package::from_dependency(dep_name, value)?;
            self.install_node(dependency, false, false, traversal)?;
        }

        if top_level {
            self.save_to_root(&package)?;
        }

        traversal.leave(&name);
        Ok(())
    }

    /// Update one installed package to the newest version its constraint allows
    pub fn update_package(&self, name: &str) -> Result<Vec<Outcome>> {
        validate_name(name)?;
        if !self.config.is_installed(name) {
            return Err(Error::NotInstalled(name.to_string()));
        }

        let requested = self.root_dependency(name)?;
        let mut traversal = Traversal::default();
        self.update_node(name, requested.as_deref(), &mut traversal)?;
        Ok(traversal.outcomes)
    }

    /// Update every root dependency, installing the ones that are missing
    pub fn update_packages(&self) -> Result<Vec<Outcome>> {
        let root = self.config.read_root_manifest()?;
        let mut traversal = Traversal::default();

        for (name, value) in &root.dependencies {
            if traversal.visited(name) {
                continue;
            }
            validate_name(name)?;
            if self.config.is_installed(name) {
                self.update_node(name, Some(value), &mut traversal)?;
            } else {
                let package = Package::from_dependency(name, value)?;
                self.install_node(package, false, false, &mut traversal)?;
            }
        }

        Ok(traversal.outcomes)
    }

    /// `requested` is the dependency value declared by the root manifest or a
    /// parent; without one the frozen `_target` constraint is reused.
    fn update_node(
        &self,
        name: &str,
        requested: Option<&str>,
        traversal: &mut Traversal,
    ) -> Result<()> {
        traversal.enter(name)?;

        let record = self.config.read_installed_manifest(name)?;
        let installed_version = record.version.clone();

        let mut package = match requested {
            Some(value) => Package::from_dependency(name, value)?,
            None => Package::new(name, record.target().unwrap_or(ANY_VERSION)),
        };

        let mut repository = self.open_repository(&package, record.source())?;
        let resolved = self.resolve_version(&package, &mut repository)?;
        package.set_version(&resolved);

        if package.version() == installed_version.as_deref() {
            info!("{} is up to date at {:?}", name, installed_version);
            traversal.record(name, installed_version.as_deref(), Action::Skipped);
            traversal.leave(name);
            return Ok(());
        }

        let installer = self.installer();
        if let Some(resolved) = package.version() {
            self.check_conflicts(&installer, name, resolved)?;
        }

        self.load_manifest(&mut package, &repository)?;
        installer.update(&package, &repository)?;
        info!(
            "Updated {} from {:?} to {:?}",
            name,
            installed_version,
            package.version()
        );
        traversal.record(name, package.version(), Action::Updated);

        for (dep_name, value) in package.requires() {
            // Re-entering a package still being updated is reported as a cycle
            if traversal.visited(dep_name) && !traversal.is_resolving(dep_name) {
                continue;
            }
            validate_name(dep_name)?;
            if self.config.is_installed(dep_name) {
                self.update_node(dep_name, Some(value), traversal)?;
            } else {
                let dependency = Package::from_dependency(dep_name, value)?;
                self.install_node(dependency, false, false, traversal)?;
            }
        }

        traversal.leave(name);
        Ok(())
    }

    /// Fail when an installed dependent's constraint rejects the new version
    fn check_conflicts(&self, installer: &Installer<'_>, name: &str, resolved: &str) -> Result<()> {
        for (constraint, dependent) in installer.find_dependent_packages(name)? {
            if !VersionMatcher::new(&constraint).matches(resolved) {
                return Err(Error::Conflict {
                    name: name.to_string(),
                    version: resolved.to_string(),
                    dependent,
                    constraint,
                });
            }
        }
        Ok(())
    }

    /// Remove an installed package, and its `bower.json` entry when saving
    pub fn uninstall_package(&self, name: &str) -> Result<Outcome> {
        validate_name(name)?;
        let record = self.config.read_installed_manifest(name).ok();
        self.installer().uninstall(name)?;

        if self.config.remove_dependency(name)? {
            info!("Removed {} from bower.json", name);
        }

        Ok(Outcome::new(
            name,
            record.as_ref().and_then(|r| r.version.as_deref()),
            Action::Removed,
        ))
    }

    /// Remove installed packages not reachable from `bower.json`
    ///
    /// Reachability is computed from the install records on disk; nothing is
    /// fetched.
    pub fn prune_extraneous(&self) -> Result<Vec<Outcome>> {
        let root = self.config.read_root_manifest()?;
        let installer = self.installer();

        let mut required = BTreeSet::new();
        let mut queue: VecDeque<String> = root.dependencies.keys().cloned().collect();
        while let Some(name) = queue.pop_front() {
            if !required.insert(name.clone()) {
                continue;
            }
            if !self.config.is_installed(&name) {
                warn!("{} is required but not installed", name);
                continue;
            }
            let record = self.config.read_installed_manifest(&name)?;
            queue.extend(record.dependencies.into_keys());
        }

        let mut outcomes = Vec::new();
        for package in installer.get_installed()? {
            if required.contains(package.name()) {
                continue;
            }
            installer.uninstall(package.name())?;
            info!("Pruned {}", package.name());
            outcomes.push(Outcome::new(package.name(), package.version(), Action::Removed));
        }

        Ok(outcomes)
    }

    pub fn get_installed_packages(&self) -> Result<Vec<Package>> {
        self.installer().get_installed()
    }

    /// Describe a package without installing it
    ///
    /// `field` is `None` for the whole manifest, `versions` for the tag list,
    /// `url` for the repository URL, or any manifest field name.
    pub fn get_package_info(&self, spec: &str, field: Option<&str>) -> Result<PackageInfo> {
        let mut package = Package::parse(spec)?;
        let mut repository = self.open_repository(&package, None)?;

        match field {
            Some("url") => return Ok(PackageInfo::Field(Value::String(repository.url()))),
            Some("versions") => {
                let tags = repository.list_tags()?;
                return Ok(PackageInfo::Versions(tags.into_iter().map(|t| t.name).collect()));
            }
            _ => {}
        }

        self.resolve_package(&mut package, &mut repository)?;
        let manifest = package.info().clone();

        match field {
            None => Ok(PackageInfo::Manifest(manifest)),
            Some(key) => manifest
                .field(key)
                .map(PackageInfo::Field)
                .ok_or_else(|| Error::UnsupportedField(key.to_string())),
        }
    }

    pub fn lookup_package(&self, name: &str) -> Result<RegistryEntry> {
        self.registry().lookup(name)
    }

    pub fn search_packages(&self, query: &str) -> Result<Vec<RegistryEntry>> {
        self.registry().search(query)
    }

    /// Create the project's `bower.json`
    pub fn init(&self, params: &InitParams) -> Result<Manifest> {
        self.config.init_root_manifest(params)
    }

    /// Repository for a package: its own source, the frozen source of an
    /// installed copy, or the registry entry for its name
    fn open_repository(
        &self,
        package: &Package,
        frozen: Option<&str>,
    ) -> Result<GithubRepository<'_>> {
        let source = match package.source().or(frozen) {
            Some(source) if is_source_url(source) => source.to_string(),
            Some(alias) => self.registry().lookup(alias)?.url,
            None => self.registry().lookup(package.name())?.url,
        };

        debug!("Using {} for {}", source, package.name());
        GithubRepository::new(&self.transport, &source)
    }

    fn resolve_version(
        &self,
        package: &Package,
        repository: &mut GithubRepository<'_>,
    ) -> Result<String> {
        repository
            .resolve_version(package.required_version())?
            .ok_or_else(|| Error::VersionNotFound {
                name: package.name().to_string(),
                constraint: package.required_version().to_string(),
            })
    }

    /// Resolve the version and load the manifest at it
    fn resolve_package(
        &self,
        package: &mut Package,
        repository: &mut GithubRepository<'_>,
    ) -> Result<()> {
        let resolved = self.resolve_version(package, repository)?;
        package.set_version(&resolved);
        self.load_manifest(package, repository)
    }

    /// Fetch and attach the manifest at the package's resolved version
    ///
    /// A ref without `bower.json` gets a manifest holding only the name.
    fn load_manifest(
        &self,
        package: &mut Package,
        repository: &GithubRepository<'_>,
    ) -> Result<()> {
        let reference = package.version().unwrap_or(crate::version::DEFAULT_BRANCH).to_string();

        let manifest = match repository.fetch_manifest(&reference)? {
            Some(bytes) => Manifest::from_slice(&bytes).map_err(|e| Error::Manifest {
                name: package.name().to_string(),
                reason: e.to_string(),
            })?,
            None => Manifest::named(package.name()),
        };

        package.set_info(manifest);
        package.bind_repository(&repository.url())
    }

    fn save_to_root(&self, package: &Package) -> Result<()> {
        let constraint = package.manifest_constraint();
        if self.config.save_dependency(package.name(), &constraint)? {
            info!("Saved {} {} to bower.json", package.name(), constraint);
        }
        Ok(())
    }

    /// Dependency value declared in `bower.json`, if there is one
    fn root_dependency(&self, name: &str) -> Result<Option<String>> {
        if !self.config.root_manifest_path().is_file() {
            return Ok(None);
        }
        Ok(self.config.read_root_manifest()?.dependencies.get(name).cloned())
    }
}

/// Group outcomes by action for summaries
pub fn summarize(outcomes: &[Outcome]) -> BTreeMap<String, usize> {
    let mut summary = BTreeMap::new();
    for outcome in outcomes {
        *summary.entry(outcome.action.to_string()).or_insert(0) += 1;
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_REGISTRY;
    use crate::test_utils::{FakeTransport, zip_archive};
    use std::fs;
    use std::path::Path;

    /// Serve a GitHub-hosted package through the registry
    ///
    /// `versions` lists tags newest first with the manifest body at each tag.
    fn serve(
        transport: &FakeTransport,
        name: &str,
        owner: &str,
        versions: &[(&str, Option<&str>)],
    ) {
        transport.respond(
            &format!("{}/{}", DEFAULT_REGISTRY, name),
            format!(r#"{{"name": "{}", "url": "git://github.com/{}/{}.git"}}"#, name, owner, name),
        );

        let api = format!("https://api.github.com/repos/{}/{}", owner, name);
        let tags: Vec<String> = versions
            .iter()
            .map(|(v, _)| {
                format!(
                    r#"{{"name": "{v}", "zipball_url": "{api}/zipball/{v}", "tarball_url": "{api}/tarball/{v}"}}"#
                )
            })
            .collect();
        transport.respond(
            &format!("{}/tags?per_page=100", api),
            format!("[{}]", tags.join(",")),
        );

        for (version, manifest) in versions {
            if let Some(manifest) = manifest {
                transport.respond(
                    &format!(
                        "https://raw.githubusercontent.com/{}/{}/{}/bower.json",
                        owner, name, version
                    ),
                    *manifest,
                );
            }
            let wrapper = format!("{}-{}-{}/", owner, name, version);
            let file = format!("{}{}.js", wrapper, name);
            let content = format!("{} {}", name, version);
            transport.respond(
                &format!("{}/zipball/{}", api, version),
                zip_archive(&[(wrapper.as_str(), b""), (file.as_str(), content.as_bytes())]),
            );
        }
    }

    fn project(dir: &Path) -> Config {
        fs::write(dir.join(".bowerrc"), r#"{"storage": {"packages": ".cache"}}"#).unwrap();
        Config::load(dir).unwrap()
    }

    fn installed_version(config: &Config, name: &str) -> Option<String> {
        config.read_installed_manifest(name).unwrap().version
    }

    #[test]
    fn test_traversal_detects_cycles() {
        let mut traversal = Traversal::default();
        traversal.enter("a").unwrap();
        traversal.enter("b").unwrap();

        let err = traversal.enter("a").unwrap_err();
        match &err {
            Error::Cycle(chain) => assert_eq!(chain, &["a", "b", "a"]),
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(err.to_string(), "Dependency cycle detected: a -> b -> a");

        traversal.leave("b");
        traversal.enter("c").unwrap();
        assert_eq!(traversal.resolving, ["a", "c"]);
    }

    #[test]
    fn test_install_package() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();
        serve(&transport, "jquery", "components", &[
            ("2.1.0", Some(r#"{"name": "jquery"}"#)),
            ("2.0.3", Some(r#"{"name": "jquery", "main": "jquery.js"}"#)),
        ]);
        let resolver = Resolver::new(&transport, project(dir.path()));

        let outcomes = resolver
            .install_package(Package::new("jquery", "2.0.*"), false)
            .unwrap();

        assert_eq!(outcomes, [Outcome::new("jquery", Some("2.0.3"), Action::Installed)]);
        let config = resolver.config();
        assert_eq!(installed_version(config, "jquery").as_deref(), Some("2.0.3"));
        assert_eq!(
            fs::read_to_string(config.package_dir("jquery").join("jquery.js")).unwrap(),
            "jquery 2.0.3"
        );
    }

    #[test]
    fn test_second_install_is_skipped_without_requests() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();
        serve(&transport, "jquery", "components", &[("2.0.3", Some(r#"{"name": "jquery"}"#))]);
        let resolver = Resolver::new(&transport, project(dir.path()));

        resolver.install_package(Package::new("jquery", "2.0.3"), false).unwrap();
        let before = transport.request_count();

        let outcomes = resolver.install_package(Package::new("jquery", "2.0.3"), false).unwrap();
        assert_eq!(outcomes, [Outcome::new("jquery", Some("2.0.3"), Action::Skipped)]);
        assert_eq!(transport.request_count(), before);
    }

    #[test]
    fn test_force_reinstalls() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();
        serve(&transport, "jquery", "components", &[("2.0.3", Some(r#"{"name": "jquery"}"#))]);
        let resolver = Resolver::new(&transport, project(dir.path()));

        resolver.install_package(Package::new("jquery", "*"), false).unwrap();
        let outcomes = resolver.install_package(Package::new("jquery", "*"), true).unwrap();
        assert_eq!(outcomes[0].action, Action::Installed);
    }

    #[test]
    fn test_install_recurses_into_dependencies() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();
        serve(&transport, "bootstrap", "twbs", &[(
            "3.0.0",
            Some(r#"{"name": "bootstrap", "dependencies": {"jquery": ">= 1.9.0"}}"#),
        )]);
        serve(&transport, "jquery", "components", &[
            ("2.0.3", Some(r#"{"name": "jquery"}"#)),
            ("1.9.1", Some(r#"{"name": "jquery"}"#)),
        ]);
        let resolver = Resolver::new(&transport, project(dir.path()));

        let outcomes = resolver.install_package(Package::new("bootstrap", "3.0.*"), false).unwrap();

        assert_eq!(
            outcomes,
            [
                Outcome::new("bootstrap", Some("3.0.0"), Action::Installed),
                Outcome::new("jquery", Some("1.9.1"), Action::Installed),
            ]
        );
        let record = resolver.config().read_installed_manifest("jquery").unwrap();
        assert_eq!(record.target(), Some(">= 1.9.0"));
    }

    #[test]
    fn test_dependency_names_cannot_leave_install_dir() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();
        serve(&transport, "site-kit", "acme", &[(
            "1.0.0",
            Some(r#"{"name": "site-kit", "dependencies": {"../../escaped": "o/evil#1.0.0"}}"#),
        )]);
        serve(&transport, "evil", "o", &[("1.0.0", Some(r#"{"name": "evil"}"#))]);
        let resolver = Resolver::new(&transport, project(dir.path()));

        let err = resolver.install_package(Package::new("site-kit", "*"), false).unwrap_err();
        assert!(matches!(err, Error::InvalidName(ref name) if name == "../../escaped"));
        assert!(!dir.path().join("escaped").exists());
        assert!(!dir.path().parent().unwrap().join("escaped").exists());
        assert!(transport.requests().iter().all(|url| !url.contains("/o/evil")));
    }

    #[test]
    fn test_version_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();
        serve(&transport, "jquery", "components", &[("2.0.3", None)]);
        let resolver = Resolver::new(&transport, project(dir.path()));

        let err = resolver.install_package(Package::new("jquery", "3.0.0"), false).unwrap_err();
        match err {
            Error::VersionNotFound { name, constraint } => {
                assert_eq!(name, "jquery");
                assert_eq!(constraint, "3.0.0");
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(!resolver.config().is_installed("jquery"));
    }

    #[test]
    fn test_invalid_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();
        serve(&transport, "jquery", "components", &[("2.0.3", Some("{not json"))]);
        let resolver = Resolver::new(&transport, project(dir.path()));

        let err = resolver.install_package(Package::new("jquery", "*"), false).unwrap_err();
        assert!(matches!(err, Error::Manifest { ref name, .. } if name == "jquery"));
    }

    #[test]
    fn test_missing_manifest_installs_with_name_only() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();
        serve(&transport, "normalize-css", "necolas", &[("3.0.0", None)]);
        let resolver = Resolver::new(&transport, project(dir.path()));

        resolver.install_package(Package::new("normalize-css", "*"), false).unwrap();

        let record = resolver.config().read_installed_manifest("normalize-css").unwrap();
        assert_eq!(record.name.as_deref(), Some("normalize-css"));
        assert_eq!(record.version.as_deref(), Some("3.0.0"));
    }

    #[test]
    fn test_registry_failure() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();
        let resolver = Resolver::new(&transport, project(dir.path()));

        let err = resolver.install_package(Package::new("nope", "*"), false).unwrap_err();
        assert!(matches!(err, Error::Registry(_)));
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_source_override_skips_registry() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();
        serve(&transport, "jquery", "components", &[("2.0.3", Some(r#"{"name": "jquery"}"#))]);
        let resolver = Resolver::new(&transport, project(dir.path()));

        let package = Package::parse("https://github.com/components/jquery.git#2.0.3").unwrap();
        resolver.install_package(package, false).unwrap();

        assert!(
            transport
                .requests()
                .iter()
                .all(|url| !url.starts_with(DEFAULT_REGISTRY))
        );
        assert!(resolver.config().is_installed("jquery"));
    }

    #[test]
    fn test_install_saves_to_root_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();
        serve(&transport, "jquery", "components", &[("2.0.3", Some(r#"{"name": "jquery"}"#))]);
        let mut resolver = Resolver::new(&transport, project(dir.path()));
        resolver.config_mut().set_save_to_manifest(true);
        fs::write(dir.path().join("bower.json"), r#"{"name": "site"}"#).unwrap();

        resolver.install_package(Package::new("jquery", "*"), false).unwrap();

        let root = resolver.config().read_root_manifest().unwrap();
        assert_eq!(root.dependencies["jquery"], "~2.0.3");
    }

    #[test]
    fn test_install_without_save_leaves_root_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();
        serve(&transport, "jquery", "components", &[("2.0.3", Some(r#"{"name": "jquery"}"#))]);
        let resolver = Resolver::new(&transport, project(dir.path()));
        fs::write(dir.path().join("bower.json"), r#"{"name": "site"}"#).unwrap();

        resolver.install_package(Package::new("jquery", "*"), false).unwrap();

        assert!(resolver.config().read_root_manifest().unwrap().dependencies.is_empty());
    }

    #[test]
    fn test_update_to_newer_tag() {
        let dir = tempfile::tempdir().unwrap();
        let old = FakeTransport::new();
        serve(&old, "jquery", "components", &[("2.0.2", Some(r#"{"name": "jquery"}"#))]);
        Resolver::new(&old, project(dir.path()))
            .install_package(Package::new("jquery", "2.0.*"), false)
            .unwrap();

        let new = FakeTransport::new();
        serve(&new, "jquery", "components", &[
            ("2.0.3", Some(r#"{"name": "jquery"}"#)),
            ("2.0.2", Some(r#"{"name": "jquery"}"#)),
        ]);
        let resolver = Resolver::new(&new, project(dir.path()));

        let outcomes = resolver.update_package("jquery").unwrap();
        assert_eq!(outcomes, [Outcome::new("jquery", Some("2.0.3"), Action::Updated)]);
        assert_eq!(installed_version(resolver.config(), "jquery").as_deref(), Some("2.0.3"));

        // Frozen source means no registry lookup was needed
        assert!(new.requests().iter().all(|url| !url.starts_with(DEFAULT_REGISTRY)));

        let outcomes = resolver.update_package("jquery").unwrap();
        assert_eq!(outcomes[0].action, Action::Skipped);
    }

    #[test]
    fn test_update_not_installed() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();
        let resolver = Resolver::new(&transport, project(dir.path()));

        let err = resolver.update_package("jquery").unwrap_err();
        assert!(matches!(err, Error::NotInstalled(_)));
        assert!(err.to_string().contains("jquery"));
        assert_eq!(transport.request_count(), 0);
    }

    #[test]
    fn test_update_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let config = project(dir.path());
        let old = FakeTransport::new();
        serve(&old, "jquery", "components", &[("1.9.1", Some(r#"{"name": "jquery"}"#))]);
        Resolver::new(&old, config.clone())
            .install_package(Package::new("jquery", "*"), false)
            .unwrap();
        let plugin = Manifest::from_slice(
            br#"{"name": "legacy-plugin", "version": "1.0.0", "dependencies": {"jquery": "1.9.*"}}"#,
        )
        .unwrap();
        config.write_installed_manifest("legacy-plugin", &plugin).unwrap();

        let new = FakeTransport::new();
        serve(&new, "jquery", "components", &[
            ("2.0.3", Some(r#"{"name": "jquery"}"#)),
            ("1.9.1", Some(r#"{"name": "jquery"}"#)),
        ]);
        let resolver = Resolver::new(&new, config);

        let err = resolver.update_package("jquery").unwrap_err();
        match err {
            Error::Conflict { name, version, dependent, constraint } => {
                assert_eq!(name, "jquery");
                assert_eq!(version, "2.0.3");
                assert_eq!(dependent, "legacy-plugin");
                assert_eq!(constraint, "1.9.*");
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(installed_version(resolver.config(), "jquery").as_deref(), Some("1.9.1"));
    }

    #[test]
    fn test_update_cycle_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = project(dir.path());
        for (name, deps) in [("a", r#"{"b": "*"}"#), ("b", r#"{"a": "*"}"#)] {
            let body = format!(
                r#"{{"name": "{}", "version": "1.0.0", "_source": "https://github.com/o/{}", "dependencies": {}}}"#,
                name, name, deps
            );
            config
                .write_installed_manifest(name, &Manifest::from_slice(body.as_bytes()).unwrap())
                .unwrap();
        }

        let transport = FakeTransport::new();
        let a = r#"{"name": "a", "dependencies": {"b": "*"}}"#;
        let b = r#"{"name": "b", "dependencies": {"a": "2.*"}}"#;
        serve(&transport, "a", "o", &[("2.0.0", Some(a))]);
        serve(&transport, "b", "o", &[("2.0.0", Some(b))]);
        let resolver = Resolver::new(&transport, config);

        let err = resolver.update_package("a").unwrap_err();
        assert!(matches!(err, Error::Cycle(ref chain) if chain == &["a", "b", "a"]));
    }

    #[test]
    fn test_uninstall_package() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();
        serve(&transport, "jquery", "components", &[("2.0.3", Some(r#"{"name": "jquery"}"#))]);
        let mut resolver = Resolver::new(&transport, project(dir.path()));
        resolver.config_mut().set_save_to_manifest(true);
        resolver.install_package(Package::new("jquery", "2.0.3"), false).unwrap();
        assert_eq!(resolver.config().read_root_manifest().unwrap().dependencies["jquery"], "2.0.3");

        let outcome = resolver.uninstall_package("jquery").unwrap();
        assert_eq!(outcome, Outcome::new("jquery", Some("2.0.3"), Action::Removed));
        assert!(!resolver.config().package_dir("jquery").exists());
        assert!(resolver.config().read_root_manifest().unwrap().dependencies.is_empty());

        assert!(matches!(resolver.uninstall_package("jquery"), Err(Error::NotInstalled(_))));
    }

    #[test]
    fn test_prune_extraneous() {
        let dir = tempfile::tempdir().unwrap();
        let config = project(dir.path());
        fs::write(
            dir.path().join("bower.json"),
            r#"{"name": "site", "dependencies": {"bootstrap": "3.0.*"}}"#,
        )
        .unwrap();
        for body in [
            r#"{"name": "bootstrap", "version": "3.0.0", "dependencies": {"jquery": ">= 1.9.0"}}"#,
            r#"{"name": "jquery", "version": "2.0.3"}"#,
            r#"{"name": "moment", "version": "2.5.0"}"#,
        ] {
            let manifest = Manifest::from_slice(body.as_bytes()).unwrap();
            let name = manifest.name.clone().unwrap();
            config.write_installed_manifest(&name, &manifest).unwrap();
        }

        let transport = FakeTransport::new();
        let resolver = Resolver::new(&transport, config);
        let outcomes = resolver.prune_extraneous().unwrap();

        assert_eq!(outcomes, [Outcome::new("moment", Some("2.5.0"), Action::Removed)]);
        let names: Vec<_> = resolver
            .get_installed_packages()
            .unwrap()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        assert_eq!(names, ["bootstrap", "jquery"]);
        assert_eq!(transport.request_count(), 0);
    }

    #[test]
    fn test_prune_uses_directory_names() {
        let dir = tempfile::tempdir().unwrap();
        let config = project(dir.path());
        fs::write(dir.path().join("bower.json"), r#"{"name": "site"}"#).unwrap();
        let record = Manifest::from_slice(br#"{"name": "jquery", "version": "2.0.3"}"#).unwrap();
        config.write_installed_manifest("jquery-legacy", &record).unwrap();

        let transport = FakeTransport::new();
        let resolver = Resolver::new(&transport, config);
        let outcomes = resolver.prune_extraneous().unwrap();

        assert_eq!(outcomes, [Outcome::new("jquery-legacy", Some("2.0.3"), Action::Removed)]);
        assert!(!resolver.config().package_dir("jquery-legacy").exists());
    }

    #[test]
    fn test_package_info() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();
        serve(&transport, "jquery", "components", &[
            ("2.0.3", Some(r#"{"name": "jquery", "main": "jquery.js"}"#)),
            ("1.9.1", Some(r#"{"name": "jquery", "main": "jquery.min.js"}"#)),
        ]);
        let resolver = Resolver::new(&transport, project(dir.path()));

        assert_eq!(
            resolver.get_package_info("jquery", Some("versions")).unwrap(),
            PackageInfo::Versions(vec!["2.0.3".to_string(), "1.9.1".to_string()])
        );
        assert_eq!(
            resolver.get_package_info("jquery", Some("url")).unwrap(),
            PackageInfo::Field(Value::String("https://github.com/components/jquery".to_string()))
        );
        assert_eq!(
            resolver.get_package_info("jquery#1.9", Some("main")).unwrap(),
            PackageInfo::Field(Value::String("jquery.min.js".to_string()))
        );

        match resolver.get_package_info("jquery", None).unwrap() {
            PackageInfo::Manifest(manifest) => assert_eq!(manifest.name.as_deref(), Some("jquery")),
            other => panic!("unexpected info: {:?}", other),
        }

        let err = resolver.get_package_info("jquery", Some("keywords")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedField(ref f) if f == "keywords"));
        assert!(!resolver.config().is_installed("jquery"));
    }

    #[test]
    fn test_install_dependencies_requires_root_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let transport = FakeTransport::new();
        let resolver = Resolver::new(&transport, project(dir.path()));

        assert!(matches!(resolver.install_dependencies(false), Err(Error::Config(_))));
    }

    #[test]
    fn test_summarize() {
        let outcomes = [
            Outcome::new("a", Some("1.0.0"), Action::Installed),
            Outcome::new("b", Some("1.0.0"), Action::Installed),
            Outcome::new("c", None, Action::Skipped),
        ];
        let summary = summarize(&outcomes);
        assert_eq!(summary["installed"], 2);
        assert_eq!(summary["skipped"], 1);
        assert!(!summary.contains_key("removed"));
    }
}
