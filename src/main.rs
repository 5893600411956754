//! gitshadow - inspect a remote Git repository through a transient shadow
//!
//! This is the main entry point for the gitshadow command-line interface.

use std::io::Write;
use std::process::ExitCode;

use gitshadow::git::{GitObject, ObjectId, Repository};
use tracing_subscriber::EnvFilter;

/// What to do once the shadow is set up.
enum Action {
    Branches,
    Head,
    Show(String),
    LsTree(String),
    Cat { tag: String, hash: String },
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    // Parse simple command line args.
    let mut verbose = false;
    let mut positional: Vec<String> = Vec::new();

    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "-v" | "--verbose" => verbose = true,
            "-h" | "--help" => {
                print_help();
                return ExitCode::SUCCESS;
            }
            "--version" => {
                println!("gitshadow v{}", env!("CARGO_PKG_VERSION"));
                return ExitCode::SUCCESS;
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown option: {}", other);
                return ExitCode::FAILURE;
            }
            other => positional.push(other.to_string()),
        }
    }

    init_logging(verbose);

    let (url, action) = match parse_action(&positional) {
        Some(parsed) => parsed,
        None => {
            print_help();
            return ExitCode::FAILURE;
        }
    };

    let repo = match Repository::new(url) {
        Ok(repo) => repo,
        Err(e) => {
            eprintln!("Error opening remote: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = run(&repo, action);
    if let Err(e) = repo.close() {
        eprintln!("Warning: could not remove shadow store: {}", e);
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "gitshadow=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_action(positional: &[String]) -> Option<(String, Action)> {
    let (url, rest) = positional.split_first()?;
    let action = match rest {
        [cmd] if cmd == "branches" => Action::Branches,
        [cmd] if cmd == "head" => Action::Head,
        [cmd, branch] if cmd == "show" => Action::Show(branch.clone()),
        [cmd, branch] if cmd == "ls-tree" => Action::LsTree(branch.clone()),
        [cmd, tag, hash] if cmd == "cat" => Action::Cat {
            tag: tag.clone(),
            hash: hash.clone(),
        },
        _ => return None,
    };
    Some((url.clone(), action))
}

fn run(repo: &Repository, action: Action) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        Action::Branches => {
            for branch in repo.list_branches()? {
                println!("{}\t{}", branch.commit_id(), branch.name());
            }
        }
        Action::Head => {
            println!("{}", repo.head_branch_name()?);
        }
        Action::Show(name) => {
            let branch = repo.get_branch(&name)?;
            let info = branch.commit().info()?;
            println!("commit {}", info.id);
            println!("tree   {}", info.tree_id);
            for parent in &info.parent_ids {
                println!("parent {}", parent);
            }
            println!("author {} {}", info.author, info.authored_at.to_rfc3339());
            println!();
            for line in info.message.lines() {
                println!("    {}", line);
            }
        }
        Action::LsTree(name) => {
            let tree = repo.get_branch(&name)?.tree()?;
            println!("tree {}", tree.id());
            for entry in tree.entries()? {
                println!("{} {} {}\t{}", entry.mode, entry.kind, entry.id, entry.name);
            }
        }
        Action::Cat { tag, hash } => {
            let id: ObjectId = hash.parse()?;
            let content = repo.read_object_by_tag(&id, &tag)?;
            std::io::stdout().write_all(&content)?;
        }
    }
    Ok(())
}

fn print_help() {
    println!("gitshadow - inspect a remote Git repository without cloning it");
    println!();
    println!("Usage: gitshadow [OPTIONS] <URL> <COMMAND>");
    println!();
    println!("Commands:");
    println!("  branches               List remote branches and their tips");
    println!("  head                   Print the remote's default branch");
    println!("  show <BRANCH>          Show the tip commit of a branch (HEAD for default)");
    println!("  ls-tree <BRANCH>       List the root tree of a branch");
    println!("  cat <TYPE> <HASH>      Print a commit, tree or blob verbatim");
    println!();
    println!("Options:");
    println!("  -v, --verbose          Enable debug logging (RUST_LOG overrides)");
    println!("  -h, --help             Show this help message");
    println!("  --version              Show version");
    println!();
    println!("Examples:");
    println!("  gitshadow https://github.com/rust-lang/log branches");
    println!("  gitshadow https://github.com/rust-lang/log show HEAD");
}
