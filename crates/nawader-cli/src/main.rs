use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use nawader_contracts::chat::{parse_intent, CHAT_HELP_COMMANDS};
use nawader_contracts::events::EventWriter;
use nawader_contracts::transcript::{Role, Turn};
use nawader_engine::views::{ActiveView, AppShell, IgnoreReason, SubmitOutcome};
use nawader_engine::{Gateway, GatewayConfig, DEFAULT_ANALYSIS_PROMPT};
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "nawader",
    version,
    about = "Arabic chat and image analysis on top of Gemini"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Chat(ChatArgs),
    Analyze(AnalyzeArgs),
}

#[derive(Debug, Args)]
struct GatewayArgs {
    /// Overrides NAWADER_MODEL.
    #[arg(long)]
    model: Option<String>,
    /// Overrides NAWADER_THINKING_BUDGET.
    #[arg(long)]
    thinking_budget: Option<u32>,
    /// Append a diagnostic trace to this JSONL file.
    #[arg(long)]
    events: Option<PathBuf>,
    /// Start with extended reasoning enabled.
    #[arg(long)]
    think: bool,
}

#[derive(Debug, Parser)]
struct ChatArgs {
    #[command(flatten)]
    gateway: GatewayArgs,
}

#[derive(Debug, Parser)]
struct AnalyzeArgs {
    #[arg(long)]
    image: PathBuf,
    #[arg(long, default_value = DEFAULT_ANALYSIS_PROMPT)]
    prompt: String,
    /// MIME type of the image; guessed from the extension or contents when omitted.
    #[arg(long)]
    mime: Option<String>,
    #[command(flatten)]
    gateway: GatewayArgs,
}

const THINKING_BADGE: &str = "تم تطبيق التفكير العميق";

fn main() {
    init_tracing();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("nawader error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Chat(args) => {
            run_chat(args)?;
            Ok(0)
        }
        Command::Analyze(args) => run_analyze(args),
    }
}

fn build_gateway(args: &GatewayArgs) -> Gateway {
    let mut config = GatewayConfig::from_env();
    if let Some(model) = args.model.as_ref() {
        config.model = Some(model.clone());
    }
    if let Some(budget) = args.thinking_budget {
        config.thinking_budget = budget;
    }
    let gateway = Gateway::new(&config);
    match args.events.as_ref() {
        Some(path) => {
            info!(events = %path.display(), "writing diagnostic trace");
            gateway.with_events(EventWriter::new(path))
        }
        None => gateway,
    }
}

fn run_chat(args: ChatArgs) -> Result<()> {
    let gateway = build_gateway(&args.gateway);
    let mut shell = AppShell::new();
    shell.set_extended_reasoning(args.gateway.think);

    for turn in shell.chat.transcript().turns() {
        print_turn(turn);
    }
    if let Err(err) = shell.chat.mount(&gateway) {
        eprintln!("Chat unavailable: {err}");
    }
    println!("Type /help for commands.");

    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("{}", prompt_marker(&shell));
        io::stdout().flush()?;

        line.clear();
        let read = match stdin.read_line(&mut line) {
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        if read == 0 {
            break;
        }

        let input = line.trim_end_matches(['\n', '\r']);
        let intent = parse_intent(input);

        match intent.action.as_str() {
            "noop" => continue,
            "exit" => break,
            "help" => {
                println!("Commands: {}", CHAT_HELP_COMMANDS.join("  "));
            }
            "history" => {
                for turn in shell.chat.transcript().turns() {
                    print_turn(turn);
                }
            }
            "set_reasoning" => {
                let mode = value_as_str(intent.command_args.get("mode")).unwrap_or("toggle");
                let enabled = apply_reasoning_mode(&mut shell, mode);
                gateway.emit("reasoning_toggled", json!({ "enabled": enabled }));
                println!(
                    "Extended reasoning {}",
                    if enabled { "enabled" } else { "disabled" }
                );
            }
            "set_view" => {
                let view = match value_as_str(intent.command_args.get("view")) {
                    Some("image_analysis") => ActiveView::ImageAnalysis,
                    _ => ActiveView::Chat,
                };
                shell.set_active_view(view);
                println!("View set to {}", view_label(view));
            }
            "set_analysis_prompt" => {
                let prompt = value_as_str(intent.command_args.get("prompt")).unwrap_or("");
                shell.analyzer.set_instruction(prompt);
                println!("Analysis instruction set.");
            }
            "analyze" => {
                let path = value_as_str(intent.command_args.get("path")).unwrap_or("");
                if path.is_empty() {
                    println!("/analyze requires a path");
                    continue;
                }
                if let Some(instruction) = value_as_str(intent.command_args.get("instruction")) {
                    shell.analyzer.set_instruction(instruction);
                }
                shell.set_active_view(ActiveView::ImageAnalysis);
                match load_image(Path::new(path), None) {
                    Ok((bytes, mime_type)) => {
                        shell.analyzer.select_image(bytes, mime_type);
                        run_analysis(&mut shell, &gateway);
                    }
                    Err(err) => println!("Could not load image: {err:#}"),
                }
            }
            "send" => {
                let text = intent.prompt.clone().unwrap_or_default();
                match shell.active_view() {
                    ActiveView::Chat => send_chat(&mut shell, &gateway, &text),
                    ActiveView::ImageAnalysis => {
                        shell.analyzer.set_instruction(text);
                        run_analysis(&mut shell, &gateway);
                    }
                }
            }
            "invalid" => {
                let command = value_as_str(intent.command_args.get("command")).unwrap_or("");
                let arg = value_as_str(intent.command_args.get("arg")).unwrap_or("");
                println!("Invalid argument for /{command}: {arg}");
            }
            _ => {
                let command = value_as_str(intent.command_args.get("command")).unwrap_or("");
                println!("Unknown command: /{command}");
            }
        }
    }

    if let Some(session) = shell.chat.unmount() {
        info!(session_id = session.id(), "chat session closed");
    }
    Ok(())
}

fn send_chat(shell: &mut AppShell, gateway: &Gateway, text: &str) {
    if shell.chat.can_submit(text).is_ok() {
        println!("{}", loading_text(shell.extended_reasoning()));
    }
    match shell.chat.submit(gateway, text) {
        SubmitOutcome::Completed | SubmitOutcome::Failed => {
            if let Some(turn) = shell.chat.transcript().last() {
                print_turn(turn);
            }
        }
        SubmitOutcome::Ignored(IgnoreReason::NoSession) => {
            println!("Chat unavailable: no session. Check GEMINI_API_KEY and restart.");
        }
        SubmitOutcome::Ignored(_) => {}
    }
}

fn run_analysis(shell: &mut AppShell, gateway: &Gateway) {
    match shell.analyzer.can_analyze() {
        Err(IgnoreReason::NoImage) => {
            println!("Select an image first: /analyze <path>");
            return;
        }
        Err(_) => return,
        Ok(()) => println!("جاري التحليل..."),
    }
    shell.analyzer.analyze(gateway);
    println!("{}", shell.analyzer.analysis());
}

fn run_analyze(args: AnalyzeArgs) -> Result<i32> {
    let gateway = build_gateway(&args.gateway);
    let (bytes, mime_type) = load_image(&args.image, args.mime.as_deref())?;

    let mut shell = AppShell::new();
    shell.set_active_view(ActiveView::ImageAnalysis);
    shell.set_extended_reasoning(args.gateway.think);
    shell.analyzer.set_instruction(args.prompt);
    shell.analyzer.select_image(bytes, mime_type);

    let outcome = shell.analyzer.analyze(&gateway);
    println!("{}", shell.analyzer.analysis());
    Ok(match outcome {
        SubmitOutcome::Completed => 0,
        SubmitOutcome::Failed | SubmitOutcome::Ignored(_) => 1,
    })
}

fn load_image(path: &Path, explicit_mime: Option<&str>) -> Result<(Vec<u8>, String)> {
    let bytes = fs::read(path).with_context(|| format!("failed reading {}", path.display()))?;
    if bytes.is_empty() {
        bail!("{} is empty", path.display());
    }
    let mime_type = resolve_mime_type(path, &bytes, explicit_mime)?;
    Ok((bytes, mime_type))
}

fn resolve_mime_type(path: &Path, bytes: &[u8], explicit: Option<&str>) -> Result<String> {
    if let Some(mime) = explicit.map(str::trim).filter(|value| !value.is_empty()) {
        return Ok(mime.to_string());
    }
    if let Some(mime) = mime_for_path(path) {
        return Ok(mime.to_string());
    }
    match image::guess_format(bytes) {
        Ok(format) => Ok(format.to_mime_type().to_string()),
        Err(_) => bail!("unrecognized image format: {}", path.display()),
    }
}

fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(|value| value.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "heic" => Some("image/heic"),
        "heif" => Some("image/heif"),
        _ => None,
    }
}

fn apply_reasoning_mode(shell: &mut AppShell, mode: &str) -> bool {
    match mode {
        "on" => shell.set_extended_reasoning(true),
        "off" => shell.set_extended_reasoning(false),
        _ => {
            shell.toggle_extended_reasoning();
        }
    }
    shell.extended_reasoning()
}

fn print_turn(turn: &Turn) {
    let label = match turn.role {
        Role::User => "أنت",
        Role::Model => "نوادر",
    };
    if turn.extended_reasoning {
        println!("  [{THINKING_BADGE}]");
    }
    println!("{label}: {}", turn.content);
}

fn loading_text(extended_reasoning: bool) -> &'static str {
    if extended_reasoning {
        "جاري تحليل المنطق المعقد..."
    } else {
        "جاري التفكير..."
    }
}

fn prompt_marker(shell: &AppShell) -> String {
    let view = match shell.active_view() {
        ActiveView::Chat => "chat",
        ActiveView::ImageAnalysis => "image",
    };
    if shell.extended_reasoning() {
        format!("[{view}+think]> ")
    } else {
        format!("[{view}]> ")
    }
}

fn view_label(view: ActiveView) -> &'static str {
    match view {
        ActiveView::Chat => "chat",
        ActiveView::ImageAnalysis => "image analysis",
    }
}

fn value_as_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
}
