#[cfg(target_env = "musl")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{bail, Context};
use clap::Parser;
use dirguard_core::http::models::{DEFAULT_MODEL, DEFAULT_MODELS_ENDPOINT};
use dirguard_core::notify::{self, NotifyOutcome, SuccessOutcome};
use dirguard_core::output::{append_outputs, check_outputs};
use dirguard_core::policy::detect::detect_student_task;
use dirguard_core::prompt::PromptBuilder;
use dirguard_core::review::{self, AiCheckRequest};
use dirguard_core::types::DEFAULT_API_URL;
use dirguard_core::{
    check_files, check_pull_request, CheckReport, CheckResult, ErrorKind, GitHubApiClient,
    ModelsClient, RepoSlug, Roster,
};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "dirguard",
    version,
    about = "Directory guard and CI glue for student pull requests"
)]
struct Cli {
    /// Verbose logging (same as RUST_LOG=debug)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Check that a PR only touches the author's task directory
    Check(CheckArgs),
    /// Comment, label and close a PR according to the stored check result
    Notify(NotifyArgs),
    /// Label an approved PR and open its tracking issue
    OnSuccess(NotifyArgs),
    /// Print the grading prompt for a student and task
    Prompt(PromptArgs),
    /// Prepare the grading prompt for a PR, or mark it as rated/defended
    PrPrompt(PrPromptArgs),
    /// Run the AI review through GitHub Models
    AiCheck(AiCheckArgs),
    /// Regenerate the students table in README.md
    StudentsTable(TableArgs),
}

#[derive(clap::Args)]
struct GitHubArgs {
    /// Repository in owner/name format (falls back to GITHUB_REPOSITORY)
    #[arg(long, env = "REPO")]
    repo: Option<String>,

    /// Pull request number
    #[arg(long = "pr", env = "PR_NUMBER")]
    pr: Option<String>,

    /// GitHub token (falls back to GH_TOKEN)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// GitHub REST API root
    #[arg(long, env = "GITHUB_API_URL")]
    api_url: Option<String>,
}

#[derive(clap::Args)]
struct CheckArgs {
    #[command(flatten)]
    github: GitHubArgs,

    /// Roster CSV
    #[arg(long, env = "ROSTER_PATH", default_value = "students/students.csv")]
    roster: PathBuf,

    /// Where to write the check result JSON
    #[arg(long, env = "CHECK_RESULT_PATH", default_value = ".github/check_result.json")]
    check_result_path: PathBuf,

    /// PR author, for offline checks (skips the API)
    #[arg(long, requires = "files")]
    author: Option<String>,

    /// Changed files, for offline checks (comma-separated)
    #[arg(long, value_delimiter = ',', requires = "author")]
    files: Option<Vec<String>>,

    /// Exit 0 even when the PR is rejected
    #[arg(long)]
    no_fail: bool,

    /// Output format: gha, json, text (default: auto-detect)
    #[arg(long, env = "DIRGUARD_OUTPUT_FORMAT")]
    output_format: Option<String>,
}

#[derive(clap::Args)]
struct NotifyArgs {
    #[command(flatten)]
    github: GitHubArgs,

    /// Check result JSON written by `check`
    #[arg(long, env = "CHECK_RESULT_PATH", default_value = ".github/check_result.json")]
    check_result_path: PathBuf,
}

#[derive(clap::Args)]
struct PromptArgs {
    /// Student directory name (NameLatin)
    #[arg(long, short = 's')]
    student: String,

    /// Task number, e.g. task_01, task_1 or 01
    #[arg(long, short = 't')]
    task: String,

    /// Repository checkout root
    #[arg(long, default_value = ".")]
    root: PathBuf,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum MarkLabel {
    Rated,
    Defend,
}

impl MarkLabel {
    fn as_str(self) -> &'static str {
        match self {
            MarkLabel::Rated => "rated",
            MarkLabel::Defend => "defend",
        }
    }
}

#[derive(clap::Args)]
struct PrPromptArgs {
    #[command(flatten)]
    github: GitHubArgs,

    /// Do not check out the PR branch
    #[arg(long)]
    skip_checkout: bool,

    /// Only post a comment and a label on the PR
    #[arg(long, requires_all = ["message", "label"])]
    mark: bool,

    /// Comment body (with --mark)
    #[arg(long)]
    message: Option<String>,

    /// Label to apply (with --mark)
    #[arg(long, value_enum, ignore_case = true)]
    label: Option<MarkLabel>,

    /// Repository checkout root
    #[arg(long, default_value = ".")]
    root: PathBuf,
}

#[derive(clap::Args)]
struct AiCheckArgs {
    /// Student directory name
    #[arg(long)]
    student: String,

    /// Task folder or number
    #[arg(long)]
    task: String,

    /// Prepared prompt file
    #[arg(long)]
    prompt_file: PathBuf,

    /// Where to write the answer
    #[arg(long, default_value = "ai_response.md")]
    out: PathBuf,

    /// Model name [default: gpt5-mini]
    #[arg(long, env = "MODEL")]
    model: Option<String>,

    /// GitHub Models endpoint root
    #[arg(long, env = "MODELS_ENDPOINT")]
    endpoint: Option<String>,

    /// Token with models access (falls back to GH_TOKEN)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Repository checkout root
    #[arg(long, default_value = ".")]
    root: PathBuf,
}

#[derive(clap::Args)]
struct TableArgs {
    /// Roster CSV
    #[arg(long, default_value = "students/students.csv")]
    csv: PathBuf,

    /// README to update
    #[arg(long, default_value = "README.md")]
    readme: PathBuf,
}

/// Output format for the CLI
enum OutputFormat {
    /// GitHub Actions: write to $GITHUB_OUTPUT + summary to stdout
    Gha,
    /// Full JSON to stdout
    Json,
    /// Human-readable text to stdout
    Text,
}

impl OutputFormat {
    fn detect(explicit: Option<&str>) -> Self {
        match explicit {
            Some("gha") => OutputFormat::Gha,
            Some("json") => OutputFormat::Json,
            Some("text") => OutputFormat::Text,
            _ => {
                if std::env::var("GITHUB_ACTIONS").is_ok() {
                    OutputFormat::Gha
                } else {
                    OutputFormat::Text
                }
            }
        }
    }
}

/// Repository, PR and credentials resolved from arguments and environment
struct GitHubContext {
    repo: RepoSlug,
    pr: u64,
    client: GitHubApiClient,
}

/// Filter empty string from Option (env vars may produce "" for empty values)
fn clean_opt(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

fn resolve_token(explicit: &Option<String>) -> Option<String> {
    clean_opt(explicit)
        .map(str::to_string)
        .or_else(|| env_nonempty("GH_TOKEN"))
}

impl GitHubArgs {
    fn repo(&self) -> anyhow::Result<RepoSlug> {
        let raw = clean_opt(&self.repo)
            .map(str::to_string)
            .or_else(|| env_nonempty("GITHUB_REPOSITORY"))
            .ok_or_else(|| dirguard_core::Error::Config("missing REPO".to_string()))?;
        Ok(raw.parse()?)
    }

    fn pr(&self) -> anyhow::Result<u64> {
        let raw = clean_opt(&self.pr)
            .ok_or_else(|| dirguard_core::Error::Config("missing PR_NUMBER".to_string()))?;
        raw.parse::<u64>().map_err(|_| {
            dirguard_core::Error::Config(format!("invalid PR number '{}'", raw)).into()
        })
    }

    fn context(&self, require_token: bool) -> anyhow::Result<GitHubContext> {
        let api_url = clean_opt(&self.api_url).unwrap_or(DEFAULT_API_URL).to_string();
        let client = GitHubApiClient::new(api_url, resolve_token(&self.token));
        if require_token && !client.has_token() {
            return Err(dirguard_core::Error::Config(
                "missing GITHUB_TOKEN (or GH_TOKEN)".to_string(),
            )
            .into());
        }
        Ok(GitHubContext {
            repo: self.repo()?,
            pr: self.pr()?,
            client,
        })
    }
}

fn init_tracing(debug: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Exit code for a failed command: 2 for bad input, 1 otherwise
fn failure_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<dirguard_core::Error>().map(|e| e.kind()) {
        Some(ErrorKind::Config) | Some(ErrorKind::Prompt) => 2,
        _ => 1,
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build();
    let rt = match rt {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create runtime: {e}");
            std::process::exit(1);
        }
    };

    let result = rt.block_on(async {
        match cli.command {
            Commands::Check(args) => run_check(args).await,
            Commands::Notify(args) => run_notify(args).await,
            Commands::OnSuccess(args) => run_on_success(args).await,
            Commands::Prompt(args) => run_prompt(args),
            Commands::PrPrompt(args) => run_pr_prompt(args).await,
            Commands::AiCheck(args) => run_ai_check(args).await,
            Commands::StudentsTable(args) => run_students_table(args),
        }
    });

    let code = match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            failure_code(&e)
        }
    };
    std::process::exit(code);
}

async fn run_check(args: CheckArgs) -> anyhow::Result<i32> {
    let (roster, warnings) = Roster::from_csv_path(&args.roster)
        .with_context(|| format!("failed to load roster {}", args.roster.display()))?;
    tracing::info!(
        students = roster.len(),
        skipped = warnings.len(),
        "roster loaded"
    );

    let report = match (clean_opt(&args.author), &args.files) {
        (Some(author), Some(files)) => {
            let files: Vec<&str> = files
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect();
            check_files(author, &files, &roster)
        }
        _ => {
            let ctx = args.github.context(false)?;
            check_pull_request(&ctx.client, &ctx.repo, ctx.pr, &roster)
                .await
                .context("failed to fetch pull request")?
        }
    };

    report
        .result
        .save(&args.check_result_path)
        .with_context(|| format!("failed to write {}", args.check_result_path.display()))?;

    match OutputFormat::detect(clean_opt(&args.output_format)) {
        OutputFormat::Gha => write_gha_output(&report),
        OutputFormat::Json => write_json_output(&report.result),
        OutputFormat::Text => write_text_output(&report),
    }

    if args.no_fail {
        Ok(0)
    } else {
        Ok(report.result.exit_code)
    }
}

/// Write outputs to $GITHUB_OUTPUT and a summary to stdout
fn write_gha_output(report: &CheckReport) {
    let Some(output_file) = env_nonempty("GITHUB_OUTPUT") else {
        tracing::warn!("GITHUB_OUTPUT not set, falling back to stdout");
        write_json_output(&report.result);
        return;
    };

    if let Err(e) = append_outputs(Path::new(&output_file), &check_outputs(&report.result)) {
        tracing::error!("cannot write GITHUB_OUTPUT ({}): {}", output_file, e);
    }
    write_text_output(report);
}

/// Write the check result JSON to stdout
fn write_json_output(result: &CheckResult) {
    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    let _ = serde_json::to_writer(&mut lock, result);
    let _ = writeln!(lock);
}

/// Write a human-readable summary to stdout
fn write_text_output(report: &CheckReport) {
    let result = &report.result;
    let stdout = std::io::stdout();
    let mut w = stdout.lock();

    let _ = writeln!(w, "Student Directory Check");
    let _ = writeln!(w, "=======================");
    let _ = writeln!(w, "Author: {}", result.author);
    let _ = writeln!(w, "Allowed directory: {}", result.allowed_or_unknown());
    let _ = writeln!(w, "Files checked: {}", report.files_checked);
    let _ = writeln!(
        w,
        "Verdict: {} (exit {})",
        report.verdict.kind().as_str(),
        result.exit_code
    );

    for (title, items) in [
        ("Outside allowed directory", &result.violations),
        ("Outside task directories", &result.non_task_files),
        ("Tasks touched", &result.tasks),
    ] {
        if !items.is_empty() {
            let _ = writeln!(w, "\n{} ({}):", title, items.len());
            for item in items {
                let _ = writeln!(w, "  - {item}");
            }
        }
    }
}

fn load_result(path: &Path) -> Option<CheckResult> {
    match CheckResult::load(path) {
        Ok(Some(result)) => Some(result),
        Ok(None) => {
            tracing::info!("no result file at {}", path.display());
            None
        }
        Err(e) => {
            tracing::warn!("unreadable result file {}: {}", path.display(), e);
            None
        }
    }
}

async fn run_notify(args: NotifyArgs) -> anyhow::Result<i32> {
    let ctx = args.github.context(true)?;
    let Some(result) = load_result(&args.check_result_path) else {
        return Ok(0);
    };

    let outcome = notify::report_result(&ctx.client, &ctx.repo, ctx.pr, Some(&result)).await?;
    match outcome {
        NotifyOutcome::Rejected { kind, comment } => {
            println!("PR #{} rejected ({}), comment {:?}", ctx.pr, kind.as_str(), comment);
        }
        NotifyOutcome::Approved => println!("PR #{} approved", ctx.pr),
        NotifyOutcome::Ignored { exit_code } => {
            println!("Nothing to do for exit code {}", exit_code)
        }
        NotifyOutcome::NoResult => {}
    }
    Ok(0)
}

async fn run_on_success(args: NotifyArgs) -> anyhow::Result<i32> {
    let ctx = args.github.context(true)?;
    let result = load_result(&args.check_result_path);

    match notify::on_success(&ctx.client, &ctx.repo, ctx.pr, result.as_ref()).await? {
        SuccessOutcome::IssueCreated { number, title } => {
            println!("Created tracking issue #{}: {}", number, title);
        }
        SuccessOutcome::Undetected => {
            println!("Could not detect student or task; labelled only");
        }
        SuccessOutcome::NotApproved { exit_code } => {
            println!("Validation not successful (exit code {}), skipping", exit_code);
        }
    }
    Ok(0)
}

fn run_prompt(args: PromptArgs) -> anyhow::Result<i32> {
    let builder = PromptBuilder::new(&args.root);
    let roster = builder.load_roster()?;
    let prompt = builder.build(&args.student, &args.task, &roster)?;
    println!("{}", prompt);
    Ok(0)
}

async fn run_pr_prompt(args: PrPromptArgs) -> anyhow::Result<i32> {
    let ctx = args.github.context(args.mark)?;

    if args.mark {
        let (Some(message), Some(label)) = (clean_opt(&args.message), args.label) else {
            bail!(dirguard_core::Error::Config(
                "--mark requires both --message and --label".to_string()
            ));
        };
        match ctx.client.get_pull_request(&ctx.repo, ctx.pr).await {
            Ok(pull) => println!(
                "PR #{} -> {}",
                ctx.pr,
                pull.title.as_deref().unwrap_or("(no title)")
            ),
            Err(e) => tracing::warn!("could not fetch PR details: {}", e),
        }
        ctx.client.post_comment(&ctx.repo, ctx.pr, message).await?;
        ctx.client.add_label(&ctx.repo, ctx.pr, label.as_str()).await?;
        println!(
            "Added label '{}' and posted a comment to PR #{}.",
            label.as_str(),
            ctx.pr
        );
        return Ok(0);
    }

    let pull = ctx.client.get_pull_request(&ctx.repo, ctx.pr).await?;
    println!(
        "PR #{} -> {}",
        ctx.pr,
        pull.title.as_deref().unwrap_or("(no title)")
    );

    let files = ctx.client.list_pull_files(&ctx.repo, ctx.pr).await?;
    println!("Changed files:");
    for f in &files {
        println!(" - {:>7} {}", f.status.as_deref().unwrap_or("?"), f.filename);
    }

    let names: Vec<&str> = files.iter().map(|f| f.filename.as_str()).collect();
    let (student, task) = detect_student_task(&names)?;
    println!("Detected student='{}' task='{}'", student, task);

    let builder = PromptBuilder::new(&args.root);
    let roster = builder.load_roster()?;
    let prompt = builder.build(&student, &task, &roster)?;
    println!("\n=== Prepared prompt ===\n");
    println!("{}", prompt);
    println!("\n=== End prompt ===\n");

    if !args.skip_checkout {
        let branch = dirguard_core::git::checkout_pr_branch(&args.root, ctx.pr).await?;
        println!("Checked out local branch {}", branch);
    }
    Ok(0)
}

async fn run_ai_check(args: AiCheckArgs) -> anyhow::Result<i32> {
    let Some(token) = resolve_token(&args.token) else {
        bail!(dirguard_core::Error::Config(
            "GITHUB_TOKEN is required".to_string()
        ));
    };
    let model = clean_opt(&args.model).unwrap_or(DEFAULT_MODEL).to_string();
    let endpoint = clean_opt(&args.endpoint).unwrap_or(DEFAULT_MODELS_ENDPOINT);
    let client = ModelsClient::new(endpoint, token);

    let request = AiCheckRequest {
        root: args.root,
        student: args.student,
        task: args.task,
        prompt_file: args.prompt_file,
        out: args.out,
        model,
    };
    let outcome = review::run_ai_check(&client, &request).await?;
    Ok(if outcome.is_success() { 0 } else { 1 })
}

fn run_students_table(args: TableArgs) -> anyhow::Result<i32> {
    let table = dirguard_core::table::update_readme(&args.csv, &args.readme)
        .with_context(|| format!("failed to update {}", args.readme.display()))?;
    println!(
        "Updated {} with table from {} ({} rows normalized)",
        args.readme.display(),
        args.csv.display(),
        table.mismatches.len()
    );
    Ok(0)
}
