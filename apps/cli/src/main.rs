use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use fcstamp_codes::{scan_codes, InsertOutcome, RngSource, StampConfig, Stamper, CODE_PATTERN};
use fcstamp_core::{Document, MemoryHost, TextRange};
use fcstamp_search::{SearchEngine, SearchOptions};
use fcstamp_settings::{Preferences, PreferencesStore};
use futures::executor::block_on;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const FALLBACK_LOG_FILTER: &str = "warn";

#[derive(Parser)]
#[command(
    name = "fcstamp-cli",
    about = "Generate and insert unique fc-DDD-DDD codes into documents",
    author,
    version
)]
struct Cli {
    /// 指定工作區根目錄；預設為目前目錄。 / Workspace root (defaults to current directory).
    #[arg(long, global = true, value_name = "PATH")]
    workspace: Option<PathBuf>,
    /// 日誌過濾條件，覆寫偏好設定與 RUST_LOG。 / Log filter directive; overrides RUST_LOG and preferences.
    #[arg(long, global = true, value_name = "FILTER")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 列出文件中既有的代碼。 / List the codes already present in documents.
    Scan(ScanArgs),
    /// 產生文件中尚未使用的代碼。 / Print a code not yet used in a document.
    Generate(GenerateArgs),
    /// 產生並插入代碼後存檔。 / Generate codes, insert them and save the document.
    Stamp(StampArgs),
    /// 匯入/匯出偏好設定。 / Import, export or show preferences.
    #[command(subcommand)]
    Preferences(PreferencesCommand),
}

#[derive(Args)]
struct ScanArgs {
    /// 要掃描的文件。 / Documents to scan.
    #[arg(required = true, value_name = "DOC")]
    documents: Vec<PathBuf>,

    /// 列出每個出現位置。 / Print every occurrence with its line and column.
    #[arg(long)]
    locations: bool,
}

#[derive(Args)]
struct GenerateArgs {
    /// 目標文件。 / Document the code must be unique in.
    #[arg(value_name = "DOC")]
    document: PathBuf,

    /// 亂數種子，用於可重現的結果。 / Seed for reproducible draws.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args)]
struct StampArgs {
    /// 目標文件。 / Document to stamp.
    #[arg(value_name = "DOC")]
    document: PathBuf,

    /// 插入位置（位元組偏移）；預設為文件結尾。 / Caret byte offset; defaults to the end of the document.
    #[arg(long, value_name = "OFFSET", conflicts_with = "select")]
    at: Option<usize>,

    /// 選取範圍，代碼插入於其後。 / Selection `START:END`; codes go after its end.
    #[arg(long, value_name = "START:END", value_parser = parse_selection)]
    select: Option<TextRange>,

    /// 插入的代碼數量。 / Number of codes to insert.
    #[arg(long, default_value_t = 1)]
    count: usize,

    /// 亂數種子。 / Seed for reproducible draws.
    #[arg(long)]
    seed: Option<u64>,

    /// 另存的輸出路徑；預設就地覆寫。 / Write the result here instead of in place.
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum PreferencesCommand {
    /// 匯出偏好設定。 / Export preferences to a file.
    Export(PreferencesExportArgs),
    /// 匯入偏好設定。 / Import preferences from a file.
    Import(PreferencesImportArgs),
    /// 顯示目前生效的偏好設定。 / Print the effective preferences.
    Show,
}

#[derive(Args)]
struct PreferencesExportArgs {
    /// 輸出檔案路徑。 / Destination file path.
    #[arg(long, value_name = "FILE")]
    output: PathBuf,
}

#[derive(Args)]
struct PreferencesImportArgs {
    /// 輸入檔案路徑。 / Source preferences JSON.
    #[arg(value_name = "FILE")]
    input: PathBuf,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let Cli {
        workspace,
        log_level,
        command,
    } = Cli::parse();
    let workspace_root = resolve_workspace(workspace)?;
    let prefs_path = preferences_path(&workspace_root);
    let store = PreferencesStore::load(&prefs_path)
        .with_context(|| format!("failed to load preferences from {}", prefs_path.display()))?;
    init_logging(log_level.as_deref(), store.preferences())?;
    debug!(workspace = %workspace_root.display(), "workspace resolved");

    match command {
        Commands::Scan(args) => execute_scan(args),
        Commands::Generate(args) => execute_generate(args, store.preferences().stamp_config()),
        Commands::Stamp(args) => execute_stamp(args, store.preferences().stamp_config()),
        Commands::Preferences(subcommand) => execute_preferences_command(subcommand, store),
    }
}

/// 依序採用 --log-level、RUST_LOG、偏好設定。 / Flag first, then RUST_LOG, then preferences.
///
/// 偏好設定中的無效條件會退回 `warn`，讓使用者仍可修復設定檔。 / An invalid stored
/// filter falls back to `warn` so the preferences commands stay usable.
fn init_logging(flag: Option<&str>, prefs: &Preferences) -> Result<()> {
    let mut rejected = None;
    let filter = match flag {
        Some(directive) => EnvFilter::try_new(directive)
            .with_context(|| format!("invalid log filter '{directive}'"))?,
        None => match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(&prefs.logging.filter).unwrap_or_else(|err| {
                rejected = Some(err);
                EnvFilter::new(FALLBACK_LOG_FILTER)
            }),
        },
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to install logger: {err}"))?;
    if let Some(err) = rejected {
        warn!(
            filter = %prefs.logging.filter,
            fallback = FALLBACK_LOG_FILTER,
            error = %err,
            "ignoring invalid log filter in preferences"
        );
    }
    Ok(())
}

fn execute_scan(args: ScanArgs) -> Result<()> {
    for path in &args.documents {
        let path = resolve_input_path(path)?;
        let document =
            Document::open(&path).with_context(|| format!("failed to open {}", path.display()))?;

        if args.locations {
            let matches = SearchEngine::new(document.text())
                .find_all(&SearchOptions::regex(CODE_PATTERN))
                .context("failed to search for codes")?;
            println!("{} ({} occurrences)", path.display(), matches.len());
            for m in &matches {
                println!("  Line {} (Col {}): {}", m.line, m.column, m.matched);
            }
            continue;
        }

        let mut host = MemoryHost::new(document);
        let existing = block_on(scan_codes(&mut host))
            .with_context(|| format!("failed to scan {}", path.display()))?;
        println!("{} ({} codes)", path.display(), existing.len());
        for code in existing.sorted() {
            println!("  {code}");
        }
    }
    Ok(())
}

fn execute_generate(args: GenerateArgs, config: StampConfig) -> Result<()> {
    let path = resolve_input_path(&args.document)?;
    let document =
        Document::open(&path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut session = Stamper::new(MemoryHost::new(document), code_source(args.seed), config);
    let code = block_on(session.generate())?;
    println!("{code}");
    Ok(())
}

fn execute_stamp(args: StampArgs, config: StampConfig) -> Result<()> {
    if args.count == 0 {
        bail!("--count must be at least 1");
    }
    let path = resolve_input_path(&args.document)?;
    let document =
        Document::open(&path).with_context(|| format!("failed to open {}", path.display()))?;
    let selection = match (args.at, args.select) {
        (Some(offset), _) => TextRange::caret(offset),
        (None, Some(range)) => range,
        (None, None) => TextRange::caret(document.len()),
    };

    let mut host = MemoryHost::new(document);
    host.set_selection(selection).with_context(|| {
        format!(
            "invalid insertion point {}:{}",
            selection.start(),
            selection.end()
        )
    })?;
    let mut session = Stamper::new(host, code_source(args.seed), config);

    for _ in 0..args.count {
        block_on(session.generate())?;
        let code = match block_on(session.insert())? {
            InsertOutcome::Inserted(code) => code,
            InsertOutcome::Suppressed => bail!("the document rejected the insertion"),
        };
        println!("{code}");
        // Place the next code after this one rather than in front of it.
        let next = session.host().current_selection().end() + code.to_string().len();
        session
            .host_mut()
            .set_selection(TextRange::caret(next))
            .context("failed to advance the insertion point")?;
    }

    let mut document = session.into_host().into_document();
    let target = match args.output {
        Some(output) => {
            let output = resolve_input_path(&output)?;
            document
                .save_as(&output)
                .with_context(|| format!("failed to write {}", output.display()))?;
            output
        }
        None => {
            document
                .save()
                .with_context(|| format!("failed to write {}", path.display()))?;
            path
        }
    };
    info!(count = args.count, path = %target.display(), "document stamped");
    println!("Saved {}", target.display());
    Ok(())
}

fn execute_preferences_command(
    command: PreferencesCommand,
    mut store: PreferencesStore,
) -> Result<()> {
    match command {
        PreferencesCommand::Export(args) => {
            let output = resolve_input_path(&args.output)?;
            store
                .export_to(&output)
                .with_context(|| format!("failed to export preferences to {}", output.display()))?;
            println!("Exported preferences to {}", output.display());
        }
        PreferencesCommand::Import(args) => {
            let input = resolve_input_path(&args.input)?;
            if !input.exists() {
                bail!("preferences file '{}' does not exist", input.display());
            }
            store
                .import_from(&input)
                .with_context(|| format!("failed to import preferences from {}", input.display()))?;
            println!("Imported preferences from {}", input.display());
        }
        PreferencesCommand::Show => {
            let payload = serde_json::to_string_pretty(store.preferences())
                .context("failed to serialize preferences")?;
            println!("{payload}");
        }
    }
    Ok(())
}

fn code_source(seed: Option<u64>) -> RngSource<StdRng> {
    match seed {
        Some(seed) => RngSource::seeded(seed),
        None => RngSource::new(StdRng::from_entropy()),
    }
}

fn parse_selection(raw: &str) -> Result<TextRange, String> {
    let (start, end) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected START:END, got '{raw}'"))?;
    let start = start
        .trim()
        .parse::<usize>()
        .map_err(|err| format!("invalid start offset '{start}': {err}"))?;
    let end = end
        .trim()
        .parse::<usize>()
        .map_err(|err| format!("invalid end offset '{end}': {err}"))?;
    Ok(TextRange::new(start, end))
}

fn preferences_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join(".fcstamp").join("preferences.json")
}

fn resolve_workspace(workspace: Option<PathBuf>) -> Result<PathBuf> {
    match workspace {
        Some(path) => resolve_input_path(&path),
        None => std::env::current_dir().context("determine current directory"),
    }
}

fn resolve_input_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()
            .context("determine current directory")?
            .join(path))
    }
}
