//! Command-line interface for the streaming transformer.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::DEFAULT_CHUNK_SIZE;
use crate::engine::ResultEvent;
use crate::error::Result;
use crate::parser::parse_reader;
use crate::schema::SchemaRegistry;

/// RegelRecht XML stream - Convert XML into schema-shaped values.
#[derive(Parser)]
#[command(name = "regelrecht-xml-stream")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse an XML document and print one value per root element.
    Parse {
        /// Schema file (.yaml, .yml or .json)
        #[arg(short, long)]
        schema: PathBuf,

        /// XML input file (default: stdin)
        input: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Bytes read per chunk
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
    },
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One JSON document per line.
    Json,
    /// A YAML stream with one document per result.
    Yaml,
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse {
            schema,
            input,
            format,
            chunk_size,
        } => parse_command(&schema, input.as_deref(), format, chunk_size),
    }
}

/// Execute the parse command.
fn parse_command(
    schema_path: &Path,
    input: Option<&Path>,
    format: OutputFormat,
    chunk_size: usize,
) -> Result<()> {
    let schema = SchemaRegistry::from_path(schema_path)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut emit = |result: ResultEvent| write_result(&mut out, &result, format);

    let count = match input {
        Some(path) => {
            let file = File::open(path)?;

            let pb = ProgressBar::new_spinner();
            #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg}")
                    .expect("valid template"),
            );
            pb.set_message(format!("Parsing {}...", path.display()));
            pb.enable_steady_tick(std::time::Duration::from_millis(100));

            let outcome = parse_reader(&schema, pb.wrap_read(file), chunk_size, &mut emit);
            pb.finish_and_clear();
            outcome?
        }
        None => parse_reader(&schema, io::stdin().lock(), chunk_size, &mut emit)?,
    };
    out.flush()?;

    eprintln!(
        "{} {} result(s) from {}",
        style("Parsed").green().bold(),
        style(count).cyan(),
        input.map_or_else(|| "stdin".to_string(), |p| p.display().to_string())
    );
    Ok(())
}

/// Write a single result in the requested format.
pub fn write_result(out: &mut impl Write, result: &ResultEvent, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer(&mut *out, result)?;
            writeln!(out)?;
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(result)?;
            writeln!(out, "---")?;
            out.write_all(yaml.as_bytes())?;
        }
    }
    Ok(())
}
