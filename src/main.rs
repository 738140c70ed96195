use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use xml_transcripts_csv::conversion::converter::{convert, convert_to_writer};

/// Flattens a chat-reference XML export into one CSV row per record.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// XML export to read.
    #[arg(short, long, default_value = "input_data.xml")]
    pub input: PathBuf,

    /// CSV file to write, `-` for stdout.
    #[arg(short, long, default_value = "output_data.csv")]
    pub output: PathBuf,

    /// Log every converted record.
    #[arg(short, long)]
    pub verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logger(args.verbose);

    if args.output.as_os_str() == "-" {
        let stdout = std::io::stdout();
        let handle = stdout.lock();
        let summary = convert_to_writer(&args.input, handle)
            .with_context(|| format!("converting {}", args.input.display()))?;
        tracing::info!(records = summary.records, "wrote CSV to stdout");
    } else {
        convert(&args.input, &args.output).with_context(|| {
            format!(
                "converting {} into {}",
                args.input.display(),
                args.output.display()
            )
        })?;
    }

    Ok(())
}

// logs go to stderr so that `--output -` stays plain CSV
fn init_logger(verbose: bool) {
    let default_directive = if verbose {
        "xml_transcripts_csv=debug"
    } else {
        "xml_transcripts_csv=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}
