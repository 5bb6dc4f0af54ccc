use std::env;
use std::path::PathBuf;
use std::process;

use lox::Lox;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

const HISTORY_FILE: &str = ".lox_history";

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut lox = Lox::new();

    match args.len() {
        1 => run_prompt(&mut lox),
        2 => lox.run_file(&args[1]),
        _ => {
            println!("Usage: lox [script]");
            process::exit(64);
        }
    }
}

fn history_path() -> Option<PathBuf> {
    home::home_dir().map(|home| home.join(HISTORY_FILE))
}

fn run_prompt(lox: &mut Lox) {
    println!("lox {}", env!("CARGO_PKG_VERSION"));

    let mut editor = DefaultEditor::new().expect("terminal to support line editing");
    let history_path = history_path();

    if let Some(path) = &history_path {
        let _ = editor.load_history(path);
    }

    loop {
        match editor.readline("> ") {
            Ok(line) => {
                let _ = editor.add_history_entry(&line);
                lox.run_line(&line);
            }
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => break,
            Err(err) => {
                eprintln!("Readline error: {err}");
                break;
            }
        }
    }

    if let Some(path) = &history_path {
        let _ = editor.save_history(path);
    }
}
