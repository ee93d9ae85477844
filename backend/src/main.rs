//! psmtable CLI - format TriNetX PSM exports into publication tables
//!
//! ```bash
//! psmtable serve                          # Start HTTP server (port 3000)
//! psmtable format export.csv --html t.html --pdf t.pdf
//! psmtable extract export.csv --skip-rows 9   # Extracted table as JSON
//! psmtable options > options.json         # Default options to edit
//! ```
//!
//! Logs go to stderr; set `RUST_LOG` to change verbosity.

use clap::{Args, Parser, Subcommand};
use psmtable::{
    export_table, parse_file_auto, parse_options, run_file, transform::extract, ExportFormat,
    ExtractMode, PipelineOptions, ServerConfig,
};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "psmtable")]
#[command(version)]
#[command(about = "Format TriNetX propensity-score-matching exports into publication tables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Header row location; overrides the options file.
#[derive(Args, Debug, Clone)]
struct HeaderArgs {
    /// Drop exactly N banner rows; the next row is the header
    #[arg(long, conflicts_with = "marker")]
    skip_rows: Option<usize>,

    /// Header is the first row whose first cell contains this text
    #[arg(long)]
    marker: Option<String>,
}

impl HeaderArgs {
    fn mode(&self) -> Option<ExtractMode> {
        match (&self.skip_rows, &self.marker) {
            (Some(n), _) => Some(ExtractMode::SkipRows(*n)),
            (None, Some(m)) => Some(ExtractMode::Marker(m.clone())),
            (None, None) => None,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write the preview and/or exports
    Format {
        /// Input CSV file
        input: PathBuf,

        /// Options JSON file (see `psmtable options`)
        #[arg(long)]
        options: Option<PathBuf>,

        #[command(flatten)]
        header: HeaderArgs,

        /// Decimal places (0-5)
        #[arg(long)]
        decimals: Option<u32>,

        /// Write the HTML preview here
        #[arg(long)]
        html: Option<PathBuf>,

        /// Write a CSV export here
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Write a Word document export here
        #[arg(long)]
        doc: Option<PathBuf>,

        /// Write a PDF export here
        #[arg(long)]
        pdf: Option<PathBuf>,
    },

    /// Extract the table below the banner rows and print it as JSON
    Extract {
        /// Input CSV file
        input: PathBuf,

        #[command(flatten)]
        header: HeaderArgs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the default options JSON
    Options,

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: PSMTABLE_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind (default: PSMTABLE_HOST or 0.0.0.0)
        #[arg(long)]
        host: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "psmtable=info,tower_http=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Format {
            input,
            options,
            header,
            decimals,
            html,
            csv,
            doc,
            pdf,
        } => cmd_format(
            &input,
            options.as_deref(),
            header,
            decimals,
            Outputs { html, csv, doc, pdf },
        ),

        Commands::Extract {
            input,
            header,
            output,
        } => cmd_extract(&input, header, output.as_deref()),

        Commands::Options => cmd_options(),

        Commands::Serve { port, host } => cmd_serve(port, host).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

struct Outputs {
    html: Option<PathBuf>,
    csv: Option<PathBuf>,
    doc: Option<PathBuf>,
    pdf: Option<PathBuf>,
}

fn cmd_format(
    input: &Path,
    options_path: Option<&Path>,
    header: HeaderArgs,
    decimals: Option<u32>,
    outputs: Outputs,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = match options_path {
        Some(path) => parse_options(&fs::read_to_string(path)?)?,
        None => PipelineOptions::default(),
    };
    if let Some(mode) = header.mode() {
        options.extract = mode;
    }
    if let Some(d) = decimals {
        options.formatting.decimal_places = d;
    }

    let output = run_file(input, &options)?;
    if let Some(error) = &output.rendered.error {
        eprintln!("Warning: preview not rendered: {}", error);
    }

    let exports = [
        (outputs.csv, ExportFormat::Csv),
        (outputs.doc, ExportFormat::Document),
        (outputs.pdf, ExportFormat::Pdf),
    ];
    let mut wrote_any = false;

    if let Some(path) = &outputs.html {
        fs::write(path, &output.rendered.html)?;
        eprintln!("Preview written to: {}", path.display());
        wrote_any = true;
    }
    for (path, format) in exports.into_iter().filter_map(|(p, f)| p.map(|p| (p, f))) {
        let bytes = export_table(&output.table, format, &options.export)?;
        fs::write(&path, bytes)?;
        eprintln!("{} written to: {}", format.file_name(), path.display());
        wrote_any = true;
    }

    if !wrote_any {
        println!("{}", output.rendered.html);
    }
    Ok(())
}

fn cmd_extract(input: &Path, header: HeaderArgs, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let sheet = parse_file_auto(input)?;
    let mode = header.mode().unwrap_or_default();
    let table = extract(&sheet, &mode)?;

    eprintln!("   Encoding: {}", sheet.info.encoding);
    eprintln!("   Columns: {}", table.header.join(", "));
    eprintln!("   Rows: {}", table.len());

    let json = serde_json::to_string_pretty(&json!({
        "columns": &table.header,
        "rows": table.texts(),
    }))?;
    write_output(&json, output)
}

fn cmd_options() -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(&PipelineOptions::default())?);
    Ok(())
}

async fn cmd_serve(port: Option<u16>, host: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::from_env().with_port(port).with_host(host);
    psmtable::server::start_server(config).await?;
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
