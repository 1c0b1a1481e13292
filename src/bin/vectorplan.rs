use anyhow::{Context, Result, anyhow, bail};
use bio::io::fasta;
use std::{env, fs, fs::File, sync::Arc};
use vectorplan::{
    config::Config, design::design, primers::HomologyPrimerDesigner, seq_match::Match,
};

fn usage() {
    eprintln!(
        "Usage:\n  \
  vectorplan --version\n  \
  vectorplan [--config PATH] plan TARGET.fa MATCHES.json [OUTPUT.json]"
    );
}

fn parse_global_config_arg(args: &[String]) -> (Option<String>, usize) {
    if args.len() >= 3 && args[1] == "--config" {
        return (Some(args[2].clone()), 3);
    }
    (None, 1)
}

/// The first record of a FASTA file: (name, sequence).
fn read_target(path: &str) -> Result<(String, String)> {
    let file = File::open(path).with_context(|| format!("could not read target {path}"))?;
    let record = fasta::Reader::new(file)
        .records()
        .next()
        .ok_or_else(|| anyhow!("no sequences in {path}"))?
        .with_context(|| format!("could not parse {path}"))?;

    let name = if record.id().is_empty() {
        path.to_string()
    } else {
        record.id().to_string()
    };
    Ok((name, String::from_utf8_lossy(record.seq()).into_owned()))
}

fn read_matches(path: &str) -> Result<Vec<Match>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("could not read matches {path}"))?;
    serde_json::from_str(&text).with_context(|| format!("matches {path} are not valid JSON"))
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() <= 1 {
        usage();
        bail!("missing command");
    }
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("vectorplan {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let (config_path, cmd_idx) = parse_global_config_arg(&args);
    if args.len() <= cmd_idx {
        usage();
        bail!("missing command");
    }

    let conf = match config_path {
        Some(path) => Arc::new(Config::from_path(&path)?),
        None => Arc::new(Config::default()),
    };

    match args[cmd_idx].as_str() {
        "plan" => {
            if args.len() <= cmd_idx + 2 {
                usage();
                bail!("plan requires: TARGET.fa MATCHES.json [OUTPUT.json]");
            }
            let (name, seq) = read_target(&args[cmd_idx + 1])?;
            let matches = read_matches(&args[cmd_idx + 2])?;

            let out = design(&name, &seq, matches, &HomologyPrimerDesigner::default(), &conf)?;
            let json = serde_json::to_string_pretty(&out)?;

            match args.get(cmd_idx + 3) {
                Some(path) => {
                    fs::write(path, json)
                        .with_context(|| format!("could not write output {path}"))?;
                    println!(
                        "Wrote {} solution(s) for '{}' to '{path}'",
                        out.solutions.len(),
                        out.target
                    );
                }
                None => println!("{json}"),
            }
            Ok(())
        }
        command => {
            usage();
            bail!("unknown command '{command}'");
        }
    }
}
