use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use time::macros::format_description;

use tagsel::app::artifacts::ResourceRegistry;
use tagsel::app::history::NavigationHistory;
use tagsel::app::probe::Probe;
use tagsel::app::selection::SelectionSession;
use tagsel::app::store::HistoryStore;
use tagsel::domain::model::{JumpTarget, Location};
use tagsel::infra::config::{Backend, Config, Lookup, find_repo_root};
use tagsel::infra::grep::GrepProbe;
use tagsel::infra::table;
use tagsel::infra::workspace::Workspace;
use tagsel::ui::app::{SelectApp, TerminalHost};
use tagsel::{FindOutcome, Navigator, TagError, TagFinder};

#[derive(Parser)]
#[command(
    name = "tagsel",
    author,
    version,
    about = "Collect every match for a tag and pick one",
    long_about = None
)]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find all matches for IDENT and select one
    Find(FindArgs),
    /// Pop the most recent mark and print where it points
    Back,
    /// List saved marks, newest first
    Marks,
    /// Print a shell completion script
    Completions { shell: Shell },
}

#[derive(Args)]
struct FindArgs {
    identifier: String,
    /// Directory to search (defaults to the configured root or the current directory)
    #[arg(long)]
    root: Option<PathBuf>,
    /// Where the jump starts from; recorded on the mark stack
    #[arg(long, value_name = "PATH:LINE[:COL]")]
    from: Option<String>,
    /// Print the numbered match list instead of opening the selector
    #[arg(long)]
    list: bool,
    /// Jump to the match with this number without opening the selector
    #[arg(long, value_name = "N", conflicts_with = "list")]
    pick: Option<String>,
    /// Mark the jump as targeting the other window
    #[arg(long)]
    other_window: bool,
    /// Lookup backend: grep or table
    #[arg(long)]
    backend: Option<Backend>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    tagsel::init(cli.verbose);

    match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("tagsel: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Find(args) => run_find(args),
        Commands::Back => run_back(),
        Commands::Marks => run_marks(),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut io::stdout());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_find(args: FindArgs) -> Result<ExitCode> {
    let mut config = Config::load()?;
    if let Some(backend) = args.backend {
        config.lookup.backend = backend;
    }
    let root = args
        .root
        .clone()
        .or_else(|| config.lookup.root.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    let store = HistoryStore::new(state_root()?);
    let mut history = store.load(config.history.max_entries)?;
    let mut workspace = Workspace::new();

    let origin = args
        .from
        .as_deref()
        .map(|raw| Location::parse(raw).ok_or_else(|| anyhow!("invalid --from location '{raw}'")))
        .transpose()?;
    if let Some(origin) = &origin
        && origin.path.is_file()
    {
        // The starting file counts as already open, so lookups never dispose it.
        workspace
            .visit(&origin.path)
            .with_context(|| format!("failed to open {}", origin.path.display()))?;
    }

    let mut probe = build_probe(&root, &config.lookup)?;
    let mut finder = TagFinder::from_config(&config);
    let mut printer = PrintNavigator::new(origin.clone(), io::stdout());

    let outcome = finder.find_tag(
        &args.identifier,
        probe.as_mut(),
        &mut history,
        &mut workspace,
        &mut printer,
    );

    let code = match outcome {
        Ok(FindOutcome::Jumped(_)) => ExitCode::SUCCESS,
        Ok(FindOutcome::Session(mut session)) => {
            let code = if args.list {
                print!("{}", session.render_text());
                ExitCode::SUCCESS
            } else if let Some(number) = args.pick.as_deref() {
                let picked = session.select_number(
                    number,
                    args.other_window,
                    finder.options(),
                    &mut history,
                    &mut printer,
                );
                match picked {
                    Ok(_) => ExitCode::SUCCESS,
                    Err(error) => report(&error),
                }
            } else {
                let (returned, code) =
                    select_interactively(session, &finder, &config, origin, &mut history)?;
                session = returned;
                code
            };
            finder.dispose(session);
            code
        }
        Err(error) => report(&error),
    };

    store.save(&history)?;
    Ok(code)
}

fn select_interactively(
    session: SelectionSession,
    finder: &TagFinder,
    config: &Config,
    origin: Option<Location>,
    history: &mut dyn NavigationHistory,
) -> Result<(SelectionSession, ExitCode)> {
    if !io::stderr().is_terminal() {
        print!("{}", session.render_text());
        eprintln!("tagsel: no terminal for interactive selection; use --pick N to choose");
        return Ok((session, ExitCode::FAILURE));
    }

    let host = TerminalHost::new(origin, config.ui.clone());
    let mut app = SelectApp::new(session, finder.options().clone(), host, history);
    app.run()?;
    let (session, jumped) = app.finish();
    if let Some(target) = jumped {
        println!("{}", target.location());
    }
    Ok((session, ExitCode::SUCCESS))
}

fn run_back() -> Result<ExitCode> {
    let config = Config::load()?;
    let store = HistoryStore::new(state_root()?);
    let mut history = store.load(config.history.max_entries)?;

    let Some(location) = history.pop() else {
        eprintln!("tagsel: mark stack is empty");
        return Ok(ExitCode::FAILURE);
    };
    println!("{location}");
    store.save(&history)?;
    Ok(ExitCode::SUCCESS)
}

fn run_marks() -> Result<ExitCode> {
    let store = HistoryStore::new(state_root()?);
    let record = store.load_record()?;

    if let Some(saved_at) = record.saved_at {
        let stamp = saved_at.format(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second]"
        ))?;
        println!("# saved {stamp} UTC");
    }
    for (depth, mark) in record.marks.iter().rev().enumerate() {
        println!("{depth:>3} {mark}");
    }
    Ok(ExitCode::SUCCESS)
}

fn build_probe(root: &Path, lookup: &Lookup) -> Result<Box<dyn Probe>> {
    Ok(match lookup.backend {
        Backend::Grep => Box::new(GrepProbe::new(root, lookup)?),
        Backend::Table => Box::new(table::open_table(root, lookup)?),
    })
}

/// Directory holding `.tagsel/`: the enclosing repository, or the working directory.
fn state_root() -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("unable to determine working directory")?;
    Ok(find_repo_root(&cwd).unwrap_or(cwd))
}

fn report(error: &TagError) -> ExitCode {
    eprintln!("tagsel: {error}");
    ExitCode::FAILURE
}

/// Non-interactive host: a jump prints its destination.
struct PrintNavigator<W: Write> {
    origin: Option<Location>,
    out: W,
}

impl<W: Write> PrintNavigator<W> {
    fn new(origin: Option<Location>, out: W) -> Self {
        Self { origin, out }
    }
}

impl<W: Write> Navigator for PrintNavigator<W> {
    fn current_location(&self) -> Option<Location> {
        self.origin.clone()
    }

    fn open(&mut self, target: &JumpTarget) -> Result<()> {
        writeln!(self.out, "{}", target.location()).context("failed to write jump target")?;
        self.out.flush().context("failed to flush jump target")
    }

    fn highlight(&mut self, target: &JumpTarget, duration: Duration) {
        tracing::debug!(target = %target, ?duration, "highlight skipped in line mode");
    }

    fn read_tag_number(&mut self, _initial: &str) -> Option<String> {
        None
    }
}
