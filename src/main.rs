// src/main.rs

use anyhow::{Context, Result};
use bowerpm::config::{Config, InitParams};
use bowerpm::packages::{Manifest, Package};
use bowerpm::repository::{ArchiveKind, HttpClient};
use bowerpm::resolver::{Outcome, PackageInfo, Resolver, summarize};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::io;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "bowerpm")]
#[command(author, version, long_about = None)]
#[command(about = "Front-end package manager for GitHub-hosted packages")]
struct Cli {
    /// Project directory (default: current directory)
    #[arg(long, global = true, value_name = "DIR")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a bower.json in the project directory
    Init {
        /// Project name (default: directory name)
        #[arg(long)]
        name: Option<String>,
        /// Author entry, e.g. "Jane <jane@example.com>"
        #[arg(long)]
        author: Option<String>,
    },
    /// Install packages, or every dependency in bower.json if none are given
    Install {
        /// Package specs: name, name#constraint, owner/repo or a GitHub URL
        packages: Vec<String>,
        /// Record installed packages in bower.json
        #[arg(short = 'S', long)]
        save: bool,
        /// Reinstall packages that are already installed
        #[arg(short, long)]
        force: bool,
        /// Download tarballs instead of zipballs
        #[arg(long)]
        tarball: bool,
    },
    /// Update a package, or every dependency in bower.json if omitted
    Update {
        /// Installed package name
        package: Option<String>,
        /// Download tarballs instead of zipballs
        #[arg(long)]
        tarball: bool,
    },
    /// Remove an installed package
    Uninstall {
        /// Installed package name
        package: String,
        /// Also remove the package from bower.json
        #[arg(short = 'S', long)]
        save: bool,
    },
    /// Remove installed packages not required by bower.json
    Prune,
    /// List installed packages
    List,
    /// Show package information without installing
    Info {
        /// Package spec
        package: String,
        /// Field to show: versions, url or any manifest field
        field: Option<String>,
    },
    /// Show the repository URL registered for a package
    Lookup {
        /// Package name
        name: String,
    },
    /// Search the registry
    Search {
        /// Search query
        query: String,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type
        shell: Shell,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let project_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir().context("Cannot determine current directory")?,
    };

    let Some(command) = cli.command else {
        println!("bowerpm v{}", env!("CARGO_PKG_VERSION"));
        println!("Run 'bowerpm --help' for usage information");
        return Ok(());
    };

    if let Commands::Completions { shell } = command {
        clap_complete::generate(shell, &mut Cli::command(), "bowerpm", &mut io::stdout());
        return Ok(());
    }

    let config = Config::load(&project_dir)?;
    info!("Project directory: {}", project_dir.display());

    match command {
        Commands::Init { name, author } => {
            let name = name
                .or_else(|| {
                    project_dir
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                })
                .unwrap_or_else(|| "app".to_string());

            let resolver = Resolver::new(HttpClient::new()?, config);
            resolver.init(&InitParams { name, author })?;
            println!("Created {}", resolver.config().root_manifest_path().display());
            Ok(())
        }
        Commands::Install {
            packages,
            save,
            force,
            tarball,
        } => {
            let mut resolver =
                Resolver::new(HttpClient::new()?, config).with_archive_kind(archive_kind(tarball));
            resolver.config_mut().set_save_to_manifest(save);

            let mut outcomes = Vec::new();
            if packages.is_empty() {
                outcomes.extend(resolver.install_dependencies(force)?);
            } else {
                for spec in &packages {
                    let package = Package::parse(spec)?;
                    outcomes.extend(resolver.install_package(package, force)?);
                }
            }
            print_outcomes(&outcomes);
            Ok(())
        }
        Commands::Update { package, tarball } => {
            let resolver =
                Resolver::new(HttpClient::new()?, config).with_archive_kind(archive_kind(tarball));

            let outcomes = match package {
                Some(name) => resolver.update_package(&name)?,
                None => resolver.update_packages()?,
            };
            print_outcomes(&outcomes);
            Ok(())
        }
        Commands::Uninstall { package, save } => {
            let mut resolver = Resolver::new(HttpClient::new()?, config);
            resolver.config_mut().set_save_to_manifest(save);

            let outcome = resolver.uninstall_package(&package)?;
            print_outcomes(&[outcome]);
            Ok(())
        }
        Commands::Prune => {
            let resolver = Resolver::new(HttpClient::new()?, config);
            let outcomes = resolver.prune_extraneous()?;
            if outcomes.is_empty() {
                println!("Nothing to prune.");
            }
            print_outcomes(&outcomes);
            Ok(())
        }
        Commands::List => {
            let resolver = Resolver::new(HttpClient::new()?, config);
            let packages = resolver.get_installed_packages()?;

            if packages.is_empty() {
                println!("No packages installed.");
            } else {
                println!("Installed packages:");
                for package in &packages {
                    println!(
                        "  {}#{} ({})",
                        package.name(),
                        package.version().unwrap_or("unknown"),
                        package.required_version()
                    );
                    for (dep, constraint) in package.requires() {
                        println!("    {} {}", dep, constraint);
                    }
                }
                println!("\nTotal: {} package(s)", packages.len());
            }
            Ok(())
        }
        Commands::Info { package, field } => {
            let resolver = Resolver::new(HttpClient::new()?, config);

            match resolver.get_package_info(&package, field.as_deref())? {
                PackageInfo::Manifest(manifest) => print_manifest(&manifest)?,
                PackageInfo::Versions(versions) => {
                    println!("Available versions:");
                    for version in sort_versions(versions) {
                        println!("  - {}", version);
                    }
                }
                PackageInfo::Field(value) => match value.as_str() {
                    Some(text) => println!("{}", text),
                    None => println!("{}", serde_json::to_string_pretty(&value)?),
                },
            }
            Ok(())
        }
        Commands::Lookup { name } => {
            let resolver = Resolver::new(HttpClient::new()?, config);
            let entry = resolver.lookup_package(&name)?;
            println!("{} {}", entry.name, entry.url);
            Ok(())
        }
        Commands::Search { query } => {
            let resolver = Resolver::new(HttpClient::new()?, config);
            let entries = resolver.search_packages(&query)?;

            if entries.is_empty() {
                println!("No results.");
            } else {
                println!("Search results:");
                for entry in &entries {
                    println!("  {} {}", entry.name, entry.url);
                }
            }
            Ok(())
        }
        Commands::Completions { .. } => Ok(()),
    }
}

fn archive_kind(tarball: bool) -> ArchiveKind {
    if tarball {
        ArchiveKind::Tar
    } else {
        ArchiveKind::Zip
    }
}

fn print_outcomes(outcomes: &[Outcome]) {
    for outcome in outcomes {
        println!(
            "{:>9} {}#{}",
            outcome.action,
            outcome.name,
            outcome.version.as_deref().unwrap_or("?")
        );
    }

    if outcomes.len() > 1 {
        let summary = summarize(outcomes)
            .into_iter()
            .map(|(action, count)| format!("{} {}", count, action))
            .collect::<Vec<_>>()
            .join(", ");
        println!("\nTotal: {}", summary);
    }
}

fn print_manifest(manifest: &Manifest) -> Result<()> {
    print!("{}", manifest.to_pretty_json()?);
    Ok(())
}

/// Newest first; tags that are not semver keep their order at the end
fn sort_versions(versions: Vec<String>) -> Vec<String> {
    let (mut semver_tags, other): (Vec<_>, Vec<_>) = versions
        .into_iter()
        .map(|tag| {
            let parsed = semver::Version::parse(tag.trim_start_matches('v')).ok();
            (parsed, tag)
        })
        .partition(|(parsed, _)| parsed.is_some());

    semver_tags.sort_by(|(a, _), (b, _)| b.cmp(a));
    semver_tags
        .into_iter()
        .chain(other)
        .map(|(_, tag)| tag)
        .collect()
}
