//! `complaint`: command-line front end for complaint-core.
//!
//! ```text
//! complaint extract "Маршрут 12 опоздал на остановке Сарыарка"
//! complaint extract --trace --participant lexicon < complaint.txt
//! complaint place "Сарыарқа аялдамасына 09:10 келмеді"
//! complaint batch --input complaints.csv --output enriched.csv
//! complaint gazetteer
//! complaint demo
//! ```
//!
//! Configuration comes from the environment (and `.env`): see
//! `complaint_core::config`. Logs go to stderr, `LOG_FORMAT=json|plain`.

use std::io::Read;
use std::path::PathBuf;
use std::sync::mpsc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use complaint_core::{
    corpus::demo_texts, Extractor, ParticipantStrategy, Settings, Table,
};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "complaint")]
#[command(about = "Extract route, time, place and participant facts from transit complaints")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract one record from TEXT (or stdin)
    Extract {
        text: Option<String>,
        /// Print every extraction step as a JSON line
        #[arg(long)]
        trace: bool,
        #[arg(long, value_enum, default_value_t = Participant::Patterns)]
        participant: Participant,
    },
    /// Resolve the place of TEXT (or stdin), structured and as a plain string
    Place { text: Option<String> },
    /// Add extraction columns to every row of a CSV with a `text` column
    Batch {
        #[arg(long, short = 'i')]
        input: PathBuf,
        /// Output CSV; stdout when omitted
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = Participant::Patterns)]
        participant: Participant,
    },
    /// Show the loaded gazetteer
    Gazetteer {
        /// Dump every stop instead of a per-city summary
        #[arg(long)]
        full: bool,
    },
    /// Run the extractor over the built-in demo complaints
    Demo,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Participant {
    Patterns,
    Lexicon,
}

impl From<Participant> for ParticipantStrategy {
    fn from(p: Participant) -> Self {
        match p {
            Participant::Patterns => ParticipantStrategy::Patterns,
            Participant::Lexicon => ParticipantStrategy::Lexicon,
        }
    }
}

#[derive(Serialize)]
struct CitySummary<'a> {
    city: &'a str,
    stops: usize,
}

#[derive(Serialize)]
struct PlaceOutput {
    place: Option<complaint_core::PlaceResult>,
    place_string: Option<String>,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let settings = Settings::from_env();

    match cli.command {
        Command::Extract {
            text,
            trace,
            participant,
        } => {
            let text = text_or_stdin(text)?;
            let extractor =
                Extractor::from_settings(&settings).with_participant_strategy(participant.into());
            if trace {
                let (tx, rx) = mpsc::channel();
                extractor.extract_streaming(&text, tx);
                for event in rx.try_iter() {
                    println!("{}", serde_json::to_string(&event)?);
                }
            } else {
                print_json(&extractor.extract(&text))?;
            }
        }
        Command::Place { text } => {
            let text = text_or_stdin(text)?;
            let extractor = Extractor::from_settings(&settings);
            print_json(&PlaceOutput {
                place: extractor.place(&text),
                place_string: extractor.extract_place(&text),
            })?;
        }
        Command::Batch {
            input,
            output,
            participant,
        } => {
            let table = Table::from_path(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            let extractor =
                Extractor::from_settings(&settings).with_participant_strategy(participant.into());
            let enriched = extractor
                .extract_batch(&table)
                .with_context(|| format!("extracting {}", input.display()))?;
            match output {
                Some(path) => {
                    enriched
                        .write_path(&path)
                        .with_context(|| format!("writing {}", path.display()))?;
                    info!(rows = enriched.len(), output = %path.display(), "batch written");
                }
                None => enriched.write_to(std::io::stdout().lock())?,
            }
        }
        Command::Gazetteer { full } => {
            let extractor = Extractor::from_settings(&settings);
            let gazetteer = extractor.gazetteer();
            if full {
                print_json(gazetteer)?;
            } else {
                let cities: Vec<CitySummary> = gazetteer
                    .cities()
                    .map(|(city, stops)| CitySummary {
                        city,
                        stops: stops.len(),
                    })
                    .collect();
                print_json(&serde_json::json!({
                    "source": gazetteer.source(),
                    "stops": gazetteer.stop_count(),
                    "variants": gazetteer.variant_count(),
                    "cities": cities,
                }))?;
            }
        }
        Command::Demo => {
            let extractor = Extractor::from_settings(&settings);
            for (title, text) in demo_texts() {
                let record = extractor.extract(text);
                println!(
                    "{}",
                    serde_json::to_string(&serde_json::json!({
                        "title": title,
                        "text": text,
                        "record": record,
                    }))?
                );
            }
        }
    }
    Ok(())
}

/// `RUST_LOG`, else `LOG_LEVEL`, else `info`. JSON unless `LOG_FORMAT=plain`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
            EnvFilter::try_new(level.to_lowercase())
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let plain = std::env::var("LOG_FORMAT")
        .map(|f| f.eq_ignore_ascii_case("plain"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if plain {
        builder.init();
    } else {
        builder.json().init();
    }
}

fn text_or_stdin(text: Option<String>) -> Result<String> {
    match text {
        Some(text) => Ok(text),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading complaint text from stdin")?;
            Ok(buf)
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_batch_args() {
        let cli = Cli::try_parse_from([
            "complaint",
            "batch",
            "-i",
            "in.csv",
            "--participant",
            "lexicon",
        ])
        .unwrap();
        match cli.command {
            Command::Batch {
                input,
                output,
                participant,
            } => {
                assert_eq!(input, PathBuf::from("in.csv"));
                assert_eq!(output, None);
                assert!(matches!(
                    ParticipantStrategy::from(participant),
                    ParticipantStrategy::Lexicon
                ));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
