use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};

use mdpress::batch::{run_batch, BatchEvent, FileQueue};
use mdpress::config::SettingsStore;
use mdpress::export::{ExportFormat, ExportOptions, Exporter};
use mdpress::llm::{ChatClient, ChatError, ChatOutcome};
use mdpress::render::{render_page, RenderOptions};
use mdpress::state::{ChatResolution, Document, EditorSession};

#[derive(Parser)]
#[command(version, about = "Markdown to PDF converter with live preview and an AI writing assistant")]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Settings file to use instead of the platform default
    #[arg(long, global = true, env = "MDPRESS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert Markdown files to PDF or Word
    Convert {
        /// Markdown files to convert, in order
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Write outputs here instead of next to each source
        #[arg(short, long = "output-dir")]
        output_dir: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = ExportFormat::Pdf)]
        format: ExportFormat,

        /// Chromium-based browser used for printing
        #[arg(long)]
        browser: Option<PathBuf>,

        /// Time given to diagrams and math before printing
        #[arg(long, default_value_t = 3000)]
        grace_ms: u64,

        /// Give up on a file after this many seconds
        #[arg(long, default_value_t = 60)]
        timeout_secs: u64,
    },
    /// Print the rendered HTML page for a file
    Render {
        file: PathBuf,

        /// Render the way the editor preview does (single newlines break lines)
        #[arg(long)]
        preview: bool,
    },
    /// Ask the assistant about a file
    Ask {
        file: PathBuf,
        prompt: String,

        /// Answer only; never propose a replacement document
        #[arg(long)]
        no_canvas: bool,

        /// Save the assistant's replacement document back to the file
        #[arg(long)]
        write: bool,
    },
    /// Inspect or change assistant settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Open the desktop editor
    #[cfg(feature = "desktop")]
    Gui { file: Option<PathBuf> },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print the current settings with keys masked
    Show,
    /// Set one value: provider, gemini_key, open_router_key or model
    Set { key: String, value: String },
    /// Print where the settings file lives
    Path,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    mdpress::logging::init(cli.verbose);

    let store = match &cli.config {
        Some(path) => SettingsStore::at(path),
        None => SettingsStore::new(),
    };

    match cli.command {
        Some(Commands::Convert {
            files,
            output_dir,
            format,
            browser,
            grace_ms,
            timeout_secs,
        }) => {
            let options = ExportOptions {
                browser,
                grace: Duration::from_millis(grace_ms),
                timeout: Duration::from_secs(timeout_secs),
            };
            convert(files, output_dir, format, options)
        }
        Some(Commands::Render { file, preview }) => render(file, preview),
        Some(Commands::Ask {
            file,
            prompt,
            no_canvas,
            write,
        }) => ask(&store, file, &prompt, !no_canvas, write),
        Some(Commands::Settings { action }) => settings(&store, action),
        #[cfg(feature = "desktop")]
        Some(Commands::Gui { file }) => {
            mdpress::app::launch(store, file);
            Ok(())
        }
        None => {
            #[cfg(feature = "desktop")]
            mdpress::app::launch(store, None);
            #[cfg(not(feature = "desktop"))]
            <Cli as clap::CommandFactory>::command().print_help()?;
            Ok(())
        }
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("failed to start async runtime")
}

fn convert(
    files: Vec<PathBuf>,
    output_dir: Option<PathBuf>,
    format: ExportFormat,
    options: ExportOptions,
) -> Result<()> {
    let mut queue = FileQueue::new();
    let given = files.len();
    let added = queue.add_paths(files);
    if added < given {
        eprintln!("Skipped {} non-Markdown or duplicate path(s)", given - added);
    }
    if queue.is_empty() {
        bail!("no Markdown files to convert");
    }
    queue.set_output_dir(output_dir);

    let exporter = Exporter::new(options);
    let total = queue.len();
    let summary = runtime()?.block_on(run_batch(&exporter, &queue, format, |event| {
        if let BatchEvent::Finished { index, path, ok } = event {
            let status = if ok { "done" } else { "FAILED" };
            println!("[{}/{}] {} {}", index + 1, total, status, path.display());
        }
    }));

    println!(
        "Converted {} of {} file(s) to {}",
        summary.succeeded,
        summary.total(),
        format
    );
    if summary.succeeded == 0 {
        bail!("every conversion failed; run with -v for details");
    }
    Ok(())
}

fn render(file: PathBuf, preview: bool) -> Result<()> {
    let document = Document::open(&file)?;
    let options = if preview {
        RenderOptions::preview()
    } else {
        RenderOptions::default()
    };
    let base_dir = document.base_dir();
    print!("{}", render_page(document.text(), &options, base_dir.as_deref()));
    Ok(())
}

fn ask(store: &SettingsStore, file: PathBuf, prompt: &str, canvas: bool, write: bool) -> Result<()> {
    let settings = store.load();
    let mut session = EditorSession::new(Document::open(&file)?);
    session.canvas_mode = canvas;

    let job = match session.begin_chat(prompt, &settings) {
        Err(ChatError::MissingKey(provider)) => bail!(
            "no API key for {}; set one with `mdpress settings set {} <KEY>`",
            provider,
            match provider {
                mdpress::llm::Provider::Gemini => "gemini_key",
                mdpress::llm::Provider::OpenRouter => "open_router_key",
            }
        ),
        other => other?,
    };

    let id = job.id;
    let client = ChatClient::new();
    let result = runtime()?.block_on(client.complete(
        job.provider,
        &job.api_key,
        &job.model,
        &job.messages,
    ));

    let resolution = session.finish_chat(ChatOutcome { id, result });
    let reply = session
        .transcript()
        .last()
        .map(|entry| entry.text.clone())
        .unwrap_or_default();

    match resolution {
        ChatResolution::Failed => Err(anyhow!(reply)),
        ChatResolution::Stale => bail!("reply arrived for an unknown request"),
        ChatResolution::Replied { buffer_replaced } => {
            println!("{}", reply);
            if buffer_replaced {
                if write {
                    session.document.save()?;
                    eprintln!("Saved updated document to {}", file.display());
                } else {
                    eprintln!("The assistant proposed a new document; pass --write to save it");
                }
            }
            Ok(())
        }
    }
}

fn settings(store: &SettingsStore, action: SettingsAction) -> Result<()> {
    match action {
        SettingsAction::Show => {
            let settings = store.load().redacted();
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        SettingsAction::Set { key, value } => {
            let mut settings = store.load();
            settings.set(&key, &value).map_err(|e| anyhow!(e))?;
            store.save(&settings)?;
            println!("Updated {} in {}", key, store.path().display());
        }
        SettingsAction::Path => println!("{}", store.path().display()),
    }
    Ok(())
}
