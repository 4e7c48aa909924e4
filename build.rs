// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn build_cli() -> Command {
    Command::new("bowerpm")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Bowerpm Contributors")
        .about("Front-end package manager for GitHub-hosted packages")
        .subcommand_required(false)
        .arg(
            Arg::new("cwd")
                .long("cwd")
                .value_name("DIR")
                .global(true)
                .help("Project directory (default: current directory)"),
        )
        .subcommand(
            Command::new("init")
                .about("Create a bower.json in the project directory")
                .arg(Arg::new("name").long("name").help("Project name (default: directory name)"))
                .arg(Arg::new("author").long("author").help("Author entry")),
        )
        .subcommand(
            Command::new("install")
                .about("Install packages, or every dependency in bower.json if none are given")
                .arg(
                    Arg::new("packages")
                        .num_args(0..)
                        .help("Package specs: name, name#constraint, owner/repo or a GitHub URL"),
                )
                .arg(
                    Arg::new("save")
                        .short('S')
                        .long("save")
                        .action(ArgAction::SetTrue)
                        .help("Record installed packages in bower.json"),
                )
                .arg(
                    Arg::new("force")
                        .short('f')
                        .long("force")
                        .action(ArgAction::SetTrue)
                        .help("Reinstall packages that are already installed"),
                )
                .arg(
                    Arg::new("tarball")
                        .long("tarball")
                        .action(ArgAction::SetTrue)
                        .help("Download tarballs instead of zipballs"),
                ),
        )
        .subcommand(
            Command::new("update")
                .about("Update a package, or every dependency in bower.json if omitted")
                .arg(Arg::new("package").help("Installed package name"))
                .arg(
                    Arg::new("tarball")
                        .long("tarball")
                        .action(ArgAction::SetTrue)
                        .help("Download tarballs instead of zipballs"),
                ),
        )
        .subcommand(
            Command::new("uninstall")
                .about("Remove an installed package")
                .arg(Arg::new("package").required(true).help("Installed package name"))
                .arg(
                    Arg::new("save")
                        .short('S')
                        .long("save")
                        .action(ArgAction::SetTrue)
                        .help("Also remove the package from bower.json"),
                ),
        )
        .subcommand(
            Command::new("prune").about("Remove installed packages not required by bower.json"),
        )
        .subcommand(Command::new("list").about("List installed packages"))
        .subcommand(
            Command::new("info")
                .about("Show package information without installing")
                .arg(Arg::new("package").required(true).help("Package spec"))
                .arg(Arg::new("field").help("Field to show: versions, url or any manifest field")),
        )
        .subcommand(
            Command::new("lookup")
                .about("Show the repository URL registered for a package")
                .arg(Arg::new("name").required(true).help("Package name")),
        )
        .subcommand(
            Command::new("search")
                .about("Search the registry")
                .arg(Arg::new("query").required(true).help("Search query")),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "elvish", "fish", "powershell", "zsh"])
                        .help("Shell type"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory
    let out_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).expect("Failed to create man directory");

    // Generate main man page
    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();
    man.render(&mut buffer).expect("Failed to render man page");

    let man_path = man_dir.join("bowerpm.1");
    fs::write(&man_path, buffer).expect("Failed to write man page");
}
