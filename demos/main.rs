use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use rpncalc::format::format_result;
use rpncalc::Session;

/// Terminal calculator: expressions in, numbers out.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Evaluate a single expression and exit.
    #[arg(short, long)]
    eval: Option<String>,

    /// Variable file to load at startup and write on `save`
    /// (one `name value` pair per line).
    #[arg(long)]
    vars: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut session = Session::new();
    session.store_mut().define("pi", std::f64::consts::PI)?;
    session.store_mut().define("e", std::f64::consts::E)?;

    if let Some(path) = &args.vars {
        match session.store_mut().load_file(path) {
            Ok(report) => {
                for line in &report.bad_lines {
                    eprintln!("  Failed to parse line {} from {}", line, path.display());
                }
            }
            Err(err) => eprintln!("  Could not load {}: {}", path.display(), err),
        }
    }

    if let Some(expr) = &args.eval {
        match session.eval_line(expr) {
            Ok(value) => println!("{}", format_result(value, false)),
            Err(err) => {
                eprintln!("{}", err);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let mut scientific = false;
    let mut editor = DefaultEditor::new()?;
    loop {
        let line = match editor.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        editor.add_history_entry(input)?;

        match input {
            "quit" => break,
            "sci" => scientific = true,
            "dec" => scientific = false,
            "ls" => {
                for (name, value) in session.store().iter_named() {
                    println!("  {} = {}", name, value);
                }
                println!();
            }
            "save" => match &args.vars {
                Some(path) => match session.store().save_file(path) {
                    Ok(()) => println!("  Saved variables to {}\n", path.display()),
                    Err(err) => println!("  Could not save {}: {}\n", path.display(), err),
                },
                None => println!("  No variable file given (--vars)\n"),
            },
            _ => match session.eval_line(input) {
                Ok(value) => println!("  {}\n", format_result(value, scientific)),
                Err(err) => println!("  {}\n", err),
            },
        }
    }

    Ok(())
}
