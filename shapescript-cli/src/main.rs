//! Shapescript CLI: run format scripts and print the shapes as JSON.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use log::debug;

use shapescript_core::interpreter::{self, DEFAULT_TIMEOUT_MS};

#[derive(Parser)]
#[command(version, about = "Shapescript \u{2014} format-script interpreter")]
struct Cli {
    /// Format script file to run
    script: Option<String>,

    /// Run an inline script instead of reading a file
    #[arg(short = 'e', long = "eval")]
    eval: Option<String>,

    /// Input data file
    #[arg(short = 'd', long = "data")]
    data: Option<String>,

    /// Inline input data
    #[arg(long = "data-text")]
    data_text: Option<String>,

    /// Execution budget in milliseconds
    #[arg(long = "timeout-ms", default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// Write the JSON to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let script = read_script(&cli);
    let data = read_data(&cli);

    let result = interpreter::interpret(&script, &data, cli.timeout_ms);
    if let Some(err) = result.error {
        eprintln!("Error: {err}");
        process::exit(1);
    }
    debug!("interpreted {} shapes", result.shapes.len());

    let json = if cli.pretty {
        serde_json::to_string_pretty(&result.shapes)
    } else {
        serde_json::to_string(&result.shapes)
    };
    let json = match json {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error serializing shapes: {e}");
            process::exit(1);
        }
    };

    match &cli.output {
        Some(path) => {
            if let Err(e) = fs::write(path, &json) {
                eprintln!("Error writing {}: {e}", path.display());
                process::exit(1);
            }
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
}

fn read_script(cli: &Cli) -> String {
    if let Some(ref text) = cli.eval {
        return text.clone();
    }
    if let Some(ref file) = cli.script {
        match fs::read_to_string(file) {
            Ok(s) => return s,
            Err(e) => {
                eprintln!("Error reading {file}: {e}");
                process::exit(1);
            }
        }
    }
    eprintln!("No script file or inline script specified");
    process::exit(1);
}

fn read_data(cli: &Cli) -> String {
    if let Some(ref text) = cli.data_text {
        return text.clone();
    }
    if let Some(ref file) = cli.data {
        match fs::read_to_string(file) {
            Ok(s) => return s,
            Err(e) => {
                eprintln!("Error reading {file}: {e}");
                process::exit(1);
            }
        }
    }
    String::new()
}
