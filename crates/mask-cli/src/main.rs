//! `mask` CLI — unmask tokens, render templates, and desensitize values.
//!
//! ## Usage
//!
//! ```sh
//! # Print the display segment of each token (stdin → stdout, one per line)
//! echo '_mask|GM|bm9uY2U|ZW5j|bWFj|138****5678' | mask extract
//!
//! # Render {{ }} placeholders in plain text against a JSON context
//! echo 'Hello {{user.name | mask}}!' | mask render --context ctx.json
//!
//! # Rewrite a JSON node tree, with desensitize rules available as filters
//! mask scan --context ctx.json --desensitize -i page.json -o out.json
//!
//! # Replace <MaskData> elements in a JSON node tree
//! mask tags -i page.json
//!
//! # Mask raw values, one per line
//! echo 13812345678 | mask desensitize --kind mobile
//!
//! # Assemble a token from already-encoded segments
//! mask compose --algorithm GM --nonce bm9uY2U --encrypt ZW5j --mac bWFj --display '138****5678'
//! ```
//!
//! Set `RUST_LOG` (or pass `--verbose`) to see resolution diagnostics on stderr.

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use mask_core::{
    desensitize, extract_str, process_mask_data_tags, Context, FilterRegistry, MaskToken, Node,
    SensitiveKind, TemplateEngine,
};
use std::io::{self, Read};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mask", version, about = "Masked-value token and template CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log resolution diagnostics at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the display segment of each input line
    Extract {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Render {{ }} placeholders in plain text
    Render {
        /// JSON file holding the context object
        #[arg(short, long)]
        context: String,
        /// Register desensitize rules as filters
        #[arg(long)]
        desensitize: bool,
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Rewrite {{ }} placeholders in a JSON node tree
    Scan {
        /// JSON file holding the context object
        #[arg(short, long)]
        context: String,
        /// Register desensitize rules as filters
        #[arg(long)]
        desensitize: bool,
        /// Input tree (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Replace <MaskData> elements in a JSON node tree
    Tags {
        /// Input tree (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Mask each input line with a desensitize rule
    Desensitize {
        /// Rule name: bank_card, email, id_card, mobile, telephone,
        /// chinese_name, english_name, custom
        #[arg(short, long)]
        kind: String,
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Assemble a token from already-encoded segments
    Compose {
        #[arg(long)]
        algorithm: String,
        #[arg(long)]
        nonce: String,
        #[arg(long)]
        encrypt: String,
        #[arg(long)]
        mac: String,
        #[arg(long)]
        display: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // --verbose forces debug, otherwise RUST_LOG decides (default: warnings)
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Extract { input, output } => {
            let text = read_input(input.as_deref())?;
            let out = map_lines(&text, |line| Ok(extract_str(line).to_string()))?;
            write_output(output.as_deref(), &out)?;
        }
        Commands::Render {
            context,
            desensitize,
            input,
            output,
        } => {
            let engine = build_engine(&context, desensitize)?;
            let template = read_input(input.as_deref())?;
            write_output(output.as_deref(), &engine.render(&template))?;
        }
        Commands::Scan {
            context,
            desensitize,
            input,
            output,
        } => {
            let engine = build_engine(&context, desensitize)?;
            let mut tree = read_tree(input.as_deref())?;
            let report = engine.scan_now(&mut tree);
            tracing::info!(
                rewrites = report.rewrites(),
                faults = report.faults,
                "Tree rewritten"
            );
            write_tree(output.as_deref(), &tree)?;
        }
        Commands::Tags { input, output } => {
            let mut tree = read_tree(input.as_deref())?;
            process_mask_data_tags(&mut tree);
            write_tree(output.as_deref(), &tree)?;
        }
        Commands::Desensitize {
            kind,
            input,
            output,
        } => {
            let kind: SensitiveKind = kind.parse()?;
            let text = read_input(input.as_deref())?;
            let out = map_lines(&text, |line| {
                desensitize(kind, line).with_context(|| format!("Failed to desensitize: {line}"))
            })?;
            write_output(output.as_deref(), &out)?;
        }
        Commands::Compose {
            algorithm,
            nonce,
            encrypt,
            mac,
            display,
        } => {
            let token = MaskToken::compose(&algorithm, &nonce, &encrypt, &mac, &display)
                .context("Failed to compose token")?;
            println!("{}", token);
        }
    }

    Ok(())
}

/// Load the context file and build an engine over it.
fn build_engine(context_path: &str, desensitize: bool) -> Result<TemplateEngine> {
    let json = std::fs::read_to_string(context_path)
        .with_context(|| format!("Failed to read context file: {}", context_path))?;
    let context = Context::from_json(&json)
        .with_context(|| format!("Failed to load context from {}", context_path))?;
    let registry = if desensitize {
        FilterRegistry::with_desensitizers()
    } else {
        FilterRegistry::new()
    };
    Ok(TemplateEngine::with_registry(context, registry))
}

/// Apply `f` to every line, keeping line structure and a trailing newline.
fn map_lines<F>(text: &str, mut f: F) -> Result<String>
where
    F: FnMut(&str) -> Result<String>,
{
    let mut out = String::with_capacity(text.len());
    for line in text.lines() {
        out.push_str(&f(line)?);
        out.push('\n');
    }
    Ok(out)
}

fn read_tree(path: Option<&str>) -> Result<Node> {
    let json = read_input(path)?;
    serde_json::from_str(&json).context("Failed to parse node tree JSON")
}

fn write_tree(path: Option<&str>, tree: &Node) -> Result<()> {
    let mut pretty = serde_json::to_string_pretty(tree)?;
    pretty.push('\n');
    write_output(path, &pretty)
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
