use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use folio_common::telemetry::{self, TelemetryConfig};
use folio_common::{Config, FileStore, default_config_path};
use folio_editor_core::{Editor, EditorCommand, HttpExporter, default_schema};
use miette::{IntoDiagnostic, Result};

#[derive(Parser)]
#[command(version, about = "folio - format, render and edit markdown documents with media", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to config file (defaults to <config dir>/folio/config.kdl)
    #[arg(long, global = true, env = "FOLIO_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Re-serialize a markdown document in canonical form
    Fmt {
        file: PathBuf,

        /// Rewrite the file instead of printing
        #[arg(long, short)]
        write: bool,
    },
    /// Render a markdown document to HTML
    Html { file: PathBuf },
    /// Print the document tree as JSON
    Tree { file: PathBuf },
    /// Change the layout of a media node
    Align {
        file: PathBuf,

        layout: Layout,

        /// Which media node, counting from 0 in document order
        #[arg(long, default_value_t = 0)]
        index: usize,

        #[arg(long, short)]
        write: bool,
    },
    /// Set the dimensions of a media node
    Resize {
        file: PathBuf,

        #[arg(long)]
        width: Option<u32>,

        #[arg(long)]
        height: Option<u32>,

        #[arg(long, default_value_t = 0)]
        index: usize,

        #[arg(long, short)]
        write: bool,
    },
    /// Replace the caption of a media node
    Alt {
        file: PathBuf,

        text: String,

        #[arg(long, default_value_t = 0)]
        index: usize,

        #[arg(long, short)]
        write: bool,
    },
    /// Download the resource behind a media node
    Download {
        file: PathBuf,

        #[arg(long, default_value_t = 0)]
        index: usize,

        /// Directory to save into
        #[arg(long, short, default_value = ".")]
        out: PathBuf,
    },
    /// Show the effective configuration
    Config {
        /// Print the built-in defaults instead
        #[arg(long)]
        print_default: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Layout {
    Right,
    Left,
    FullWidth,
    Center,
}

impl From<Layout> for EditorCommand {
    fn from(layout: Layout) -> Self {
        match layout {
            Layout::Right => EditorCommand::AlignRight,
            Layout::Left => EditorCommand::AlignLeft,
            Layout::FullWidth => EditorCommand::AlignFullWidth,
            Layout::Center => EditorCommand::AlignCenter,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_miette();
    telemetry::init_tracing(TelemetryConfig::from_env("folio-cli"));

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Fmt { file, write } => {
            let editor = open(&file, &config)?;
            emit(&file, &editor, write)?;
        }
        Commands::Html { file } => {
            let editor = open(&file, &config)?;
            println!("{}", editor.html());
        }
        Commands::Tree { file } => {
            let editor = open(&file, &config)?;
            let json = serde_json::to_string_pretty(editor.doc()).into_diagnostic()?;
            println!("{json}");
        }
        Commands::Align {
            file,
            layout,
            index,
            write,
        } => {
            let mut editor = open(&file, &config)?;
            select_media(&mut editor, index)?;
            apply(&mut editor, &layout.into())?;
            emit(&file, &editor, write)?;
        }
        Commands::Resize {
            file,
            width,
            height,
            index,
            write,
        } => {
            let mut editor = open(&file, &config)?;
            select_media(&mut editor, index)?;
            apply(&mut editor, &EditorCommand::Resize { width, height })?;
            emit(&file, &editor, write)?;
        }
        Commands::Alt {
            file,
            text,
            index,
            write,
        } => {
            let mut editor = open(&file, &config)?;
            select_media(&mut editor, index)?;
            apply(&mut editor, &EditorCommand::SetAlt(text))?;
            emit(&file, &editor, write)?;
        }
        Commands::Download { file, index, out } => {
            let mut editor = open(&file, &config)?;
            select_media(&mut editor, index)?;
            let exporter = HttpExporter::new(&out, &config.download)?;
            let download = editor
                .download_resource(&exporter)
                .ok_or_else(|| miette::miette!("media node {index} has nothing to download"))?;
            let saved = download.await?;
            println!("✓ Saved {} ({} bytes)", saved.location, saved.size);
        }
        Commands::Config { print_default } => {
            let shown = if print_default {
                Config::default()
            } else {
                config
            };
            print!("{}", shown.to_kdl());
        }
    }

    Ok(())
}

async fn load_config(path: Option<&Path>) -> Result<Config> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => default_config_path()?,
    };
    tracing::debug!(path = %path.display(), "loading config");
    Ok(Config::load(&FileStore::new(&path)).await?)
}

fn open(file: &Path, config: &Config) -> Result<Editor> {
    let markdown = std::fs::read_to_string(file)
        .into_diagnostic()
        .map_err(|e| e.wrap_err(format!("reading {}", file.display())))?;
    let schema = default_schema()?;
    Ok(Editor::from_markdown(schema, &markdown, config)?)
}

/// Node-select the `index`th media node.
fn select_media(editor: &mut Editor, index: usize) -> Result<()> {
    let mut positions = Vec::new();
    editor.doc().descendants(&mut |node, pos| {
        if node.attr("src").is_some() {
            positions.push(pos);
        }
    });
    let pos = positions.get(index).copied().ok_or_else(|| {
        miette::miette!(
            "document has {} media node(s), no index {index}",
            positions.len()
        )
    })?;
    if !editor.select_node(pos) {
        return Err(miette::miette!("could not select media node at {pos}"));
    }
    Ok(())
}

fn apply(editor: &mut Editor, command: &EditorCommand) -> Result<()> {
    if editor.execute(command) {
        tracing::info!(%command, "applied");
        Ok(())
    } else {
        Err(miette::miette!("`{command}` does not apply to the selected node"))
    }
}

fn emit(file: &Path, editor: &Editor, write: bool) -> Result<()> {
    let mut markdown = editor.markdown();
    markdown.push('\n');
    if write {
        std::fs::write(file, markdown).into_diagnostic()?;
        println!("✓ Wrote {}", file.display());
    } else {
        print!("{markdown}");
    }
    Ok(())
}

fn init_miette() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))
    .expect("couldn't set the miette hook");
    miette::set_panic_hook();
}
