use std::{path::PathBuf, process, time::Duration};

use clap::{Args, Parser, Subcommand};

use log::*;

use simplelog::*;

use branch_grader::{
  commit_age::{collect_activity, Cutoff},
  config::{load_token, Settings},
  evaluate::{valid_submissions, Evaluator},
  github::{octocrab_handle, GitHubSource},
  plan::{presets, EvaluationPlan, DEFAULT_BRANCH_PREFIX},
  report,
  retry::RetryPolicy,
  roster::{load_roster, CapitalSplitMatcher},
  source::SourceProvider,
  Result,
};

#[derive(Parser, Debug)]
#[command(author, version, arg_required_else_help(true))]
struct Opts {
  /// Would you like to enable debug information?
  #[arg(short = 'd', long, default_value_t = false, global = true)]
  debug: bool,

  /// Directory holding the .env and .env.local files.
  #[arg(long, default_value = ".", global = true)]
  env_dir: PathBuf,

  /// Repository owner, instead of REPO_OWNER.
  #[arg(short = 'o', long, global = true)]
  owner: Option<String>,

  /// Repository name, instead of REPO_NAME.
  #[arg(short = 'r', long, global = true)]
  repo: Option<String>,

  /// How many times to try each GitHub call.
  #[arg(long, default_value_t = 3, global = true)]
  retries: u32,

  /// Delay before the first retry, doubled on each further one.
  #[arg(long, default_value_t = 500, global = true)]
  backoff_ms: u64,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Grade every matching branch and write the results as JSON.
  Evaluate(EvaluateArgs),
  /// List matching branches and the entries of a subfolder on each.
  Branches(BranchesArgs),
  /// Join two result files with the roster into a grade-import CSV.
  Import(ImportArgs),
  /// List reachable repositories with the time of their last commit.
  Repos(ReposArgs),
}

#[derive(Args, Debug)]
struct EvaluateArgs {
  /// Built-in plan to run.
  #[arg(short = 'p', long, conflicts_with = "plan", required_unless_present = "plan")]
  preset: Option<String>,

  /// JSON plan file to run.
  #[arg(long)]
  plan: Option<PathBuf>,

  /// Only branches starting with this are graded.
  #[arg(short = 'b', long)]
  branch_prefix: Option<String>,

  #[arg(long, default_value = "evaluation_results.json")]
  output: PathBuf,

  /// Deepest directory level to descend into. Defaults to the plan's limit.
  #[arg(long)]
  max_depth: Option<usize>,

  /// Most files collected per branch. Defaults to the plan's limit.
  #[arg(long)]
  max_entries: Option<usize>,
}

#[derive(Args, Debug)]
struct BranchesArgs {
  /// Folder to list on every branch.
  subfolder: String,

  #[arg(long, default_value = "feature/")]
  prefix: String,
}

#[derive(Args, Debug)]
struct ImportArgs {
  /// Roster JSON with surnames, given names and email per student.
  #[arg(long)]
  roster: PathBuf,

  /// Results for exercise 1.
  #[arg(long)]
  first: PathBuf,

  /// Results for exercise 2.
  #[arg(long)]
  second: PathBuf,

  #[arg(long, default_value = "importacion.csv")]
  output: PathBuf,

  #[arg(short = 'b', long, default_value = DEFAULT_BRANCH_PREFIX)]
  branch_prefix: String,
}

#[derive(Args, Debug)]
struct ReposArgs {
  /// Only repositories you collaborate on.
  #[arg(short = 'c', long, default_value_t = false)]
  collaborator: bool,

  /// Commits after this hour are flagged.
  #[arg(long, default_value_t = 10)]
  cutoff_hour: u32,

  /// Offset from UTC, in hours, used for the cutoff.
  #[arg(long, default_value_t = 1, allow_hyphen_values = true)]
  utc_offset: i32,
}

fn retry_policy(opts: &Opts) -> RetryPolicy {
  let base_delay = Duration::from_millis(opts.backoff_ms);
  RetryPolicy {
    max_attempts: opts.retries.max(1),
    base_delay,
    max_delay: base_delay.saturating_mul(16),
  }
}

fn github_source(opts: &Opts) -> Result<GitHubSource> {
  let settings = Settings::load(&opts.env_dir, opts.owner.clone(), opts.repo.clone())?;
  let gh = octocrab_handle(&settings.token)?;
  Ok(GitHubSource::new(
    gh,
    settings.owner,
    settings.repo,
    retry_policy(opts),
  ))
}

async fn run_evaluate(opts: &Opts, args: &EvaluateArgs) -> Result<()> {
  let mut plan = match (&args.plan, &args.preset) {
    (Some(path), _) => EvaluationPlan::load(path)?,
    (None, Some(name)) => presets::preset(name)?,
    (None, None) => unreachable!("clap requires --preset or --plan"),
  };
  if let Some(prefix) = &args.branch_prefix {
    plan.branch_prefix = prefix.clone();
  }
  plan.limits = plan.limits.overridden(args.max_depth, args.max_entries);
  debug!("Walk limits: {:?}", plan.limits);

  info!("Running plan {} (max score {})", plan.name, plan.max_score());

  let source = github_source(opts)?;
  info!("Grading branches of {}", source.full_name());
  let evaluations = Evaluator::new(&source, &plan).evaluate_all().await;

  info!(
    "Valid submissions found: {} of {}",
    valid_submissions(&evaluations),
    evaluations.len()
  );

  report::write_json(&args.output, &evaluations)
}

async fn run_branches(opts: &Opts, args: &BranchesArgs) -> Result<()> {
  let source = github_source(opts)?;

  for branch in source.list_branches().await {
    if !branch.name.starts_with(&args.prefix) {
      continue;
    }
    info!("Branch: {}", branch.name);
    for entry in source.list_directory(&branch.name, &args.subfolder).await {
      info!("  - {}", entry.name);
    }
  }

  Ok(())
}

fn run_import(args: &ImportArgs) -> Result<()> {
  let roster = load_roster(&args.roster)?;
  let first = report::read_evaluations(&args.first)?;
  let second = report::read_evaluations(&args.second)?;
  let matcher = CapitalSplitMatcher::new(args.branch_prefix.clone());

  let rows = report::build_import_rows(&first, &second, &roster, &matcher);
  if rows.len() < first.len() {
    warn!(
      "{} branches could not be matched to a student.",
      first.len() - rows.len()
    );
  }

  report::write_import_csv(&args.output, &rows)
}

async fn run_repos(opts: &Opts, args: &ReposArgs) -> Result<()> {
  let token = load_token(&opts.env_dir)?;
  let gh = octocrab_handle(&token)?;
  let cutoff = Cutoff {
    hour: args.cutoff_hour,
    utc_offset_hours: args.utc_offset,
  };

  let activity = collect_activity(&gh, args.collaborator, cutoff, &retry_policy(opts)).await?;
  for repo in &activity {
    let url = repo.url.as_deref().unwrap_or("-");
    match repo.last_commit {
      Some(when) if repo.late => warn!(
        "{}: {} (owner {}) last commit {} is after {}:00",
        repo.name, url, repo.owner, when, args.cutoff_hour
      ),
      Some(when) => info!(
        "{}: {} (owner {}) last commit {}",
        repo.name, url, repo.owner, when
      ),
      None => info!(
        "{}: {} (owner {}) last commit unknown",
        repo.name, url, repo.owner
      ),
    }
  }

  info!("Total repositories: {}", activity.len());
  Ok(())
}

#[tokio::main]
async fn main() {
  let opts = Opts::parse();

  let log_level = if opts.debug {
    LevelFilter::Debug
  } else {
    LevelFilter::Info
  };

  if let Err(e) = TermLogger::init(
    log_level,
    Config::default(),
    TerminalMode::Mixed,
    ColorChoice::Auto,
  ) {
    eprintln!("Failed to initialize logger: {:?}", e);
    process::exit(1);
  }

  debug!("DEBUG ENABLED");

  let outcome = match &opts.command {
    Command::Evaluate(args) => run_evaluate(&opts, args).await,
    Command::Branches(args) => run_branches(&opts, args).await,
    Command::Import(args) => run_import(args),
    Command::Repos(args) => run_repos(&opts, args).await,
  };

  if let Err(e) = outcome {
    error!("{}", e);
    process::exit(1);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_evaluate_needs_exactly_one_plan_source() {
    assert!(Opts::try_parse_from(["branch-grader", "evaluate"]).is_err());
    assert!(Opts::try_parse_from([
      "branch-grader",
      "evaluate",
      "--preset",
      "async-js",
      "--plan",
      "plan.json",
    ])
    .is_err());

    let opts = Opts::try_parse_from(["branch-grader", "evaluate", "--preset", "async-js"]).unwrap();
    match opts.command {
      Command::Evaluate(args) => {
        assert_eq!(args.preset.as_deref(), Some("async-js"));
        assert_eq!(args.max_depth, None);
        assert_eq!(args.max_entries, None);
      }
      other => panic!("unexpected command {:?}", other),
    }
  }

  #[test]
  fn test_walk_flags_are_optional_overrides() {
    let opts = Opts::try_parse_from([
      "branch-grader",
      "evaluate",
      "--plan",
      "plan.json",
      "--max-depth",
      "3",
    ])
    .unwrap();
    let Command::Evaluate(args) = opts.command else {
      panic!("expected evaluate");
    };
    assert_eq!(args.max_depth, Some(3));
    assert_eq!(args.max_entries, None);
  }
}
