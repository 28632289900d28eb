use std::{env, fs, process::ExitCode};

use slough::{Report, parse};

const USAGE: &str = "usage: slough-map FILE [--json]";

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let Some(file_path) = args.get(1) else {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    };
    let mut json = false;
    for flag in &args[2..] {
        if flag == "--json" {
            json = true;
        } else {
            eprintln!("unknown option: {flag}");
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    }

    let source = match fs::read_to_string(file_path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: reading {file_path}: {err}");
            return ExitCode::FAILURE;
        }
    };
    let root = match parse(&source, file_path) {
        Ok(root) => root,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let report = Report::from_module(&root);
    if json {
        match report.to_json() {
            Ok(text) => println!("{text}"),
            Err(err) => {
                eprintln!("error: {err}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print!("{report}");
    }
    ExitCode::SUCCESS
}
