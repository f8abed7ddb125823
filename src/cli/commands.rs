use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "pl", about = concat!("[x] phaselist v", env!("CARGO_PKG_VERSION"), " - checklists in phases"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different project directory
    #[arg(short = 'C', long = "project-dir", global = true)]
    pub project_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new phaselist project in the current directory
    Init(InitArgs),
    /// Show overall progress and per-phase state
    Status,
    /// List tasks, optionally for a single phase
    List(ListArgs),
    /// Mark tasks done
    Check(TaskIdsArgs),
    /// Mark tasks not done
    Uncheck(TaskIdsArgs),
    /// Expand a phase (or all phases)
    Expand(SectionArgs),
    /// Collapse a phase (or all phases)
    Collapse(SectionArgs),
    /// Toggle a phase between expanded and collapsed
    Toggle(PhaseArg),
    /// Show or reset phase timers
    Timer(TimerCmd),
    /// Show or set phase notes
    Notes(NotesArgs),
    /// Show or change the color theme
    Theme(ThemeArgs),
    /// Clear all progress, timers and notes
    Reset(ResetArgs),
    /// View or prune the recovery log
    Recovery(RecoveryCmd),
}

#[derive(Args)]
pub struct InitArgs {
    /// Project name (default: inferred from directory name)
    #[arg(long)]
    pub name: Option<String>,
    /// Reinitialize even if phaselist/ already exists
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ListArgs {
    /// Phase to list (default: all phases)
    pub phase: Option<String>,
}

#[derive(Args)]
pub struct TaskIdsArgs {
    /// Task IDs
    #[arg(required = true)]
    pub ids: Vec<String>,
}

#[derive(Args)]
pub struct PhaseArg {
    /// Phase ID
    pub phase: String,
}

#[derive(Args)]
pub struct SectionArgs {
    /// Phase ID
    #[arg(required_unless_present = "all", conflicts_with = "all")]
    pub phase: Option<String>,
    /// Apply to every phase
    #[arg(long)]
    pub all: bool,
}

#[derive(Args)]
pub struct TimerCmd {
    #[command(subcommand)]
    pub action: TimerAction,
}

#[derive(Subcommand)]
pub enum TimerAction {
    /// Show elapsed time (one phase or all)
    Show(OptionalPhaseArg),
    /// Stop a phase timer and zero it
    Reset(PhaseArg),
}

#[derive(Args)]
pub struct OptionalPhaseArg {
    /// Phase ID
    pub phase: Option<String>,
}

#[derive(Args)]
pub struct NotesArgs {
    /// Phase ID
    pub phase: String,
    /// New notes text (prints current notes when omitted)
    #[arg(conflicts_with = "clear")]
    pub text: Option<String>,
    /// Clear the notes
    #[arg(long)]
    pub clear: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ThemeChoice {
    Dark,
    Light,
    Toggle,
}

#[derive(Args)]
pub struct ThemeArgs {
    /// New theme (prints the current theme when omitted)
    pub theme: Option<ThemeChoice>,
}

#[derive(Args)]
pub struct ResetArgs {
    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Args)]
pub struct RecoveryCmd {
    #[command(subcommand)]
    pub action: Option<RecoveryAction>,
    /// Show only the N most recent entries
    #[arg(long)]
    pub tail: Option<usize>,
}

#[derive(Subcommand)]
pub enum RecoveryAction {
    /// Remove old entries (older than 30 days by default)
    Prune(PruneArgs),
}

#[derive(Args)]
pub struct PruneArgs {
    /// Remove every entry
    #[arg(long)]
    pub all: bool,
}
