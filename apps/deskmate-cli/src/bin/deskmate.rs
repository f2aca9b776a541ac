use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use deskmate_core::config::{resolve_input_path, Config};
use deskmate_embed::get_default_embedder;
use deskmate_pages::{submit, FileQuestion, ImagePrompt, NotesRequest, Page, Pages, Status};
use deskmate_remote::ApiClient;
use deskmate_task::TaskRunner;

const USAGE: &str = "Usage: deskmate <command> [args...]

Commands:
  poem <topic>                    write a poem about a topic
  translate <text>                translate English text to Korean
  image [-o <file>] <prompt>      generate an image, optionally saving it
  notes <audio> <output.md>       transcribe audio and save meeting notes
  ask <file> <question>           answer a question about a document
  rudebot <question>              ask the sarcastic chatbot";

fn parse_args() -> Option<(String, Vec<String>)> {
    let mut args = env::args().skip(1);
    let cmd = args.next()?;
    Some((cmd, args.collect()))
}

/// Joins the remaining words so unquoted prompts still work.
fn rest(args: &[String], from: usize) -> String {
    args.get(from..).map(|a| a.join(" ")).unwrap_or_default()
}

fn arg(args: &[String], i: usize) -> &str {
    args.get(i).map_or("", String::as_str)
}

fn image_prompt(args: &[String], cwd: &Path) -> ImagePrompt {
    match args.first().map(String::as_str) {
        Some("-o" | "--out") => ImagePrompt {
            prompt: rest(args, 2),
            output: Some(resolve_input_path(cwd, arg(args, 1))),
        },
        _ => ImagePrompt {
            prompt: rest(args, 0),
            output: None,
        },
    }
}

/// Submit one page request and drive the runner from this thread until the
/// page leaves the working state. Returns whether it succeeded.
fn run_page<P>(page: &P, runner: &mut TaskRunner, input: P::Input) -> bool
where
    P: Page + 'static,
{
    if submit(page, runner, input, |_| {}).is_err() {
        eprintln!("{}", page.status().get());
        return false;
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(page.status().get().to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    while runner.is_busy(page.slot()) {
        runner.wait_next(Duration::from_millis(200));
    }
    spinner.finish_and_clear();

    let status = page.status().get();
    match status {
        Status::Done(_) => {
            println!("{status}");
            true
        }
        _ => {
            eprintln!("{status}");
            false
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let Some((cmd, args)) = parse_args() else {
        eprintln!("{USAGE}");
        return Ok(ExitCode::FAILURE);
    };

    tracing::debug!(%cmd, "starting");
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let settings = config.settings()?;
    let client = Arc::new(ApiClient::from_settings(&settings)?);
    let embedder = get_default_embedder(Arc::clone(&client));
    let pages = Pages::new(client, embedder, &settings)?;
    let mut runner = TaskRunner::with_policy(settings.runner.shutdown);
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let ok = match cmd.as_str() {
        "poem" => run_page(&pages.poem, &mut runner, rest(&args, 0)),
        "translate" => run_page(&pages.translate, &mut runner, rest(&args, 0)),
        "rudebot" => run_page(&pages.rudebot, &mut runner, rest(&args, 0)),
        "image" => run_page(&pages.image, &mut runner, image_prompt(&args, &cwd)),
        "notes" => {
            let request = NotesRequest {
                audio: resolve_input_path(&cwd, arg(&args, 0)),
                output: resolve_input_path(&cwd, arg(&args, 1)),
            };
            run_page(&pages.notes, &mut runner, request)
        }
        "ask" => {
            let question = FileQuestion {
                path: resolve_input_path(&cwd, arg(&args, 0)),
                question: rest(&args, 1),
            };
            run_page(&pages.filesearch, &mut runner, question)
        }
        _ => {
            eprintln!("Unknown command: {}\n\n{USAGE}", cmd);
            false
        }
    };

    runner.shutdown();
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
