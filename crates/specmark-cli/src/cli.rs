//! Command dispatch for the `specmark` entrypoint.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use eyre::{Context, Result, bail, eyre};
use specmark_engine::{
    ConnectionPool, EngineConfig, InMemoryImplementationIndex, ResolveError, StepResolver,
};
use specmark_runner::{
    ExecutionSequencer, ProcessRunner, discover, find_specification_files, is_specification_file,
};
use specmark_syntax::{canonical_step_text_at, parse_document, parse_document_ordered};

use crate::output::{
    ConsoleReporter, write_cases, write_cases_json, write_resolution, write_run_summary,
    write_tokens, write_tokens_json,
};

/// Tokenize, discover, and run plain-text specification documents.
#[derive(Parser)]
#[command(author, version, about)]
pub(crate) struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Supported commands.
#[derive(Subcommand)]
pub(crate) enum Commands {
    /// List the classified tokens of one document.
    Tokens(TokensArgs),
    /// List the test cases found under the given files and directories.
    Discover(DiscoverArgs),
    /// Run every discovered test case through an engine command.
    Run(RunArgs),
    /// Ask the engine how one step line resolves.
    Resolve(ResolveArgs),
}

#[derive(Args)]
pub(crate) struct TokensArgs {
    /// Document to scan.
    pub file: PathBuf,
    /// Sort tokens by document position instead of scanning pass.
    #[arg(long)]
    pub ordered: bool,
    /// Emit JSON instead of human-readable text.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub(crate) struct DiscoverArgs {
    /// Specification files or directories to search.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
    /// Emit JSON instead of human-readable text.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub(crate) struct RunArgs {
    /// Specification files or directories to search.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
    /// Command executed once per test case.
    #[arg(long)]
    pub engine: PathBuf,
    /// Extra argument passed to the engine command; repeatable.
    #[arg(long = "engine-arg", allow_hyphen_values = true)]
    pub engine_args: Vec<String>,
    /// Ask the engine to wait for a debugger on each case.
    #[arg(long)]
    pub debug: bool,
}

#[derive(Args)]
pub(crate) struct ResolveArgs {
    /// Document containing the step.
    pub file: PathBuf,
    /// 1-based line number of the step.
    #[arg(long)]
    pub line: usize,
    /// Engine host, overriding the environment.
    #[arg(long)]
    pub host: Option<String>,
    /// Engine port, overriding the environment.
    #[arg(long)]
    pub port: Option<u16>,
    /// Round-trip timeout in milliseconds, overriding the environment.
    #[arg(long = "timeout-ms")]
    pub timeout_ms: Option<u64>,
}

pub(crate) fn run() -> Result<()> {
    match Cli::parse().command {
        Commands::Tokens(args) => handle_tokens(&args)?,
        Commands::Discover(args) => handle_discover(&args)?,
        Commands::Run(args) => handle_run(&args)?,
        Commands::Resolve(args) => handle_resolve(&args)?,
    }
    Ok(())
}

fn handle_tokens(args: &TokensArgs) -> Result<()> {
    let text = read_document(&args.file)?;
    let tokens = if args.ordered {
        parse_document_ordered(&text)
    } else {
        parse_document(&text)
    };

    let mut stdout = io::stdout();
    if args.json {
        write_tokens_json(&mut stdout, &tokens)?;
    } else {
        write_tokens(&mut stdout, &tokens, &text)?;
    }
    stdout.flush().wrap_err("failed to flush token listing")
}

fn handle_discover(args: &DiscoverArgs) -> Result<()> {
    let files = expand_paths(&args.paths)?;
    let cases = discover(&files, None);

    let mut stdout = io::stdout();
    if args.json {
        write_cases_json(&mut stdout, &cases)?;
    } else {
        write_cases(&mut stdout, &cases)?;
    }
    stdout.flush().wrap_err("failed to flush case listing")
}

fn handle_run(args: &RunArgs) -> Result<()> {
    let files = expand_paths(&args.paths)?;
    let cases = discover(&files, None);
    let total = cases.len();

    let runner = ProcessRunner::new(args.engine.clone()).with_args(args.engine_args.clone());
    let reporter = ConsoleReporter::default();
    let sequencer = ExecutionSequencer::new();
    sequencer.run(&cases, args.debug, &runner, &reporter);

    let finished = reporter.finished();
    let failed = reporter.failed();
    let mut stdout = io::stdout();
    write_run_summary(&mut stdout, total, finished, failed)?;
    stdout.flush().wrap_err("failed to flush run summary")?;

    if finished != total {
        bail!("run stopped after {finished} of {total} cases");
    }
    if failed > 0 {
        bail!("{failed} of {total} cases failed");
    }
    Ok(())
}

fn handle_resolve(args: &ResolveArgs) -> Result<()> {
    let text = read_document(&args.file)?;
    let line_index = args
        .line
        .checked_sub(1)
        .ok_or_else(|| eyre!("--line is 1-based; 0 is not a valid line"))?;
    let step_text = canonical_step_text_at(&text, line_index).ok_or_else(|| {
        eyre!(
            "line {} is past the end of {}",
            args.line,
            args.file.display()
        )
    })?;

    let config =
        EngineConfig::from_env()?.apply_overrides(args.host.clone(), args.port, args.timeout_ms);
    let pool = ConnectionPool::new(config);
    let root = project_root_of(&args.file);
    let connection = pool
        .connection_for(root)
        .wrap_err("failed to connect to the engine")?;
    let mut guard = connection
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);

    // No local implementation index on the command line; the engine catalog
    // decides on its own.
    let index = InMemoryImplementationIndex::new();
    let mut resolver = StepResolver::new(&mut *guard, &index);
    let resolution = resolver.resolve(&step_text);
    drop(guard);
    if matches!(resolution, Err(ResolveError::Unavailable(_))) {
        // A failed round trip leaves the socket in an unknown state; the
        // next request must reconnect.
        pool.evict(root);
    }
    let resolution = resolution.wrap_err("step resolution failed")?;

    let mut stdout = io::stdout();
    write_resolution(&mut stdout, &step_text, &resolution)?;
    stdout.flush().wrap_err("failed to flush resolution")
}

fn read_document(path: &Path) -> Result<String> {
    fs::read_to_string(path).wrap_err_with(|| format!("failed to read {}", path.display()))
}

/// Expands files and directories into a sorted, deduplicated file list.
///
/// Directories are searched recursively; explicitly named files that do not
/// carry a specification extension are skipped without comment.
fn expand_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for path in paths {
        let metadata = fs::metadata(path)
            .wrap_err_with(|| format!("failed to inspect {}", path.display()))?;
        if metadata.is_dir() {
            found.extend(find_specification_files(path));
        } else if is_specification_file(path) {
            found.push(path.clone());
        }
    }
    found.sort();
    found.dedup();
    Ok(found)
}

fn project_root_of(file: &Path) -> &Path {
    file.parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::project_root_of;

    #[test]
    fn root_of_a_nested_file_is_its_directory() {
        assert_eq!(
            project_root_of(Path::new("specs/login.spec")),
            Path::new("specs")
        );
    }

    #[test]
    fn root_of_a_bare_file_name_is_the_current_directory() {
        assert_eq!(project_root_of(Path::new("login.spec")), Path::new("."));
    }
}
