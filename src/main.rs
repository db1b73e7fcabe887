use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use nfa2dfa::{Automaton, AppliedStep, Cursor, Dfa, LoadError, Nfa, NfaDefinition, Phase, Session,
              Symbol};

const SAMPLE: &str = r#"{
    "alphabet": ["a", "b"],
    "states": ["1", "2", "3"],
    "start": "1",
    "accept": ["1"],
    "transitions": [
        {"from": "1", "symbol": null, "to": "3"},
        {"from": "1", "symbol": "a", "to": "2"},
        {"from": "2", "symbol": "b", "to": "1"},
        {"from": "3", "symbol": "a", "to": "3"}
    ]
}"#;

/// Convert an NFA into a reduced DFA one step at a time.
#[derive(Debug, Parser)]
#[command(name = "nfa2dfa", version)]
struct Args {
    /// JSON NFA definition; a built-in sample when omitted
    file: Option<PathBuf>,

    /// Stop after this many forward steps instead of running to completion
    #[arg(long)]
    steps: Option<usize>,

    /// Step back this many times afterwards
    #[arg(long, default_value_t = 0)]
    undo: usize,

    /// Print each step as a line of JSON
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbosity: u8) {
    let directive = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("NFA2DFA_LOG").unwrap_or_else(|_| EnvFilter::new(directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load(file: Option<&PathBuf>) -> Result<Nfa, LoadError> {
    let definition = match file {
        Some(path) => NfaDefinition::load(path)?,
        None => NfaDefinition::from_json(SAMPLE)?,
    };
    definition.build()
}

/// Where a session stands once the driver stops stepping, the last line of
/// `--json` output.
#[derive(Debug, Serialize)]
struct Status<'a> {
    phase: Phase,
    cursor: Cursor,
    history: usize,
    automaton: Option<&'a Dfa>,
}

impl<'a> Status<'a> {
    fn of(session: &'a Session) -> Self {
        Status {
            phase: session.phase(),
            cursor: session.cursor(),
            history: session.history().count(),
            automaton: session.automaton(),
        }
    }
}

fn print_step(applied: &AppliedStep, json: bool) {
    if json {
        match serde_json::to_string(&applied.step) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!(error = %e, "cannot serialize step"),
        }
    } else {
        println!("[{}] {}", applied.step.kind(), applied.step);
    }
}

// Every word over the alphabet up to length `max`, shortest first.
fn words(alphabet: &[Symbol], max: usize) -> Vec<Vec<Symbol>> {
    let mut words = vec![Vec::new()];
    let mut frontier = vec![Vec::new()];
    for _ in 0..max {
        frontier = frontier.iter()
            .flat_map(|word: &Vec<Symbol>| {
                alphabet.iter().map(move |&c| {
                    let mut next = word.clone();
                    next.push(c);
                    next
                })
            })
            .collect();
        words.extend(frontier.iter().cloned());
    }
    words
}

fn check_language(nfa: &Nfa, dfa: &Dfa) -> bool {
    let mut same = true;
    for word in words(dfa.alphabet(), 4) {
        let expected = nfa.accepts(&word);
        if dfa.accepts(&word) != expected {
            let word: String = word.iter().collect();
            warn!(word = %word, expected, "DFA disagrees with NFA");
            same = false;
        }
    }
    same
}

fn run(args: &Args) -> Result<bool, Box<dyn std::error::Error>> {
    let nfa = load(args.file.as_ref())?;
    let mut session = Session::new(nfa);

    match args.steps {
        Some(n) => {
            for _ in 0..n {
                match session.step_forward()? {
                    Some(applied) => print_step(&applied, args.json),
                    None => break,
                }
            }
        }
        None => {
            for applied in session.complete()? {
                print_step(&applied, args.json);
            }
        }
    }
    for _ in 0..args.undo {
        match session.step_backward() {
            Some(step) => println!("[undo] {}", step),
            None => break,
        }
    }

    if args.json {
        println!("{}", serde_json::to_string(&Status::of(&session))?);
    }
    let dfa = match session.automaton() {
        Some(dfa) => dfa,
        None => return Ok(true),
    };
    if !args.json {
        println!();
        print!("{}", dfa);
        println!("phase: {:?}", session.phase());
    }
    if dfa.is_complete() && session.next_step_kind().is_none() {
        return Ok(check_language(session.source(), dfa));
    }
    Ok(true)
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            error!(error = %e, "conversion failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
