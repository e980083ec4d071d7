//! xuk - inspect and convert XUK documents

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use xuk::{Outline, Presentation, XukNaming, XukOptions};

#[derive(Parser)]
#[command(name = "xuk")]
#[command(version, about = "Inspect and convert XUK documents", long_about = None)]
#[command(after_help = "EXAMPLES:
    xuk info book.xuk                     Show node and channel counts
    xuk convert book.xuk small.xuk -c     Rewrite with compact element names
    xuk tree book.xuk --json              Print the node outline as JSON")]
struct Cli {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show a summary of a document
    Info {
        #[arg(value_name = "FILE")]
        input: String,
    },

    /// Read a document and write it back out
    Convert {
        #[arg(value_name = "INPUT")]
        input: String,

        #[arg(value_name = "OUTPUT")]
        output: String,

        /// Use compact element names
        #[arg(short, long)]
        compact: bool,

        /// Write everything on one line
        #[arg(long)]
        no_indent: bool,
    },

    /// Print the node outline
    Tree {
        #[arg(value_name = "FILE")]
        input: String,

        /// Emit JSON instead of indented text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let result = match &cli.command {
        Command::Info { input } => show_info(input),
        Command::Convert {
            input,
            output,
            compact,
            no_indent,
        } => convert(input, output, *compact, *no_indent),
        Command::Tree { input, json } => show_tree(input, *json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn setup_logging(verbosity: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn show_info(path: &str) -> Result<(), String> {
    let presentation = Presentation::open(path).map_err(|e| e.to_string())?;
    let tree = presentation.tree();
    let root = presentation.root();

    println!("File: {path}");
    println!("Nodes: {}", tree.node_count(root));
    println!("Depth: {}", tree.depth(root));
    let channels = presentation.channels();
    if channels.is_empty() {
        println!("Channels: none");
    } else {
        println!("Channels:");
        for channel in channels.channels() {
            println!("  {} ({})", channel.id, channel.name);
        }
    }
    Ok(())
}

fn convert(input: &str, output: &str, compact: bool, no_indent: bool) -> Result<(), String> {
    let presentation = Presentation::open(input).map_err(|e| e.to_string())?;

    let mut options = XukOptions::default();
    if compact {
        options = options.with_naming(XukNaming::Compact);
    }
    if no_indent {
        options = options.with_indent(None);
    }

    presentation
        .save(output, &options)
        .map_err(|e| e.to_string())?;
    println!("{input} -> {output}");
    Ok(())
}

fn show_tree(path: &str, json: bool) -> Result<(), String> {
    let presentation = Presentation::open(path).map_err(|e| e.to_string())?;
    let outline = Outline::of(&presentation);

    if json {
        let text = serde_json::to_string_pretty(&outline).map_err(|e| e.to_string())?;
        println!("{text}");
    } else {
        print!("{}", outline.to_text());
    }
    Ok(())
}
