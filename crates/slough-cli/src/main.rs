use std::{env, fs, process::ExitCode};

use slough::{Target, decompile, fold_module, inline_module, parse};

const USAGE: &str = "usage: slough FILE [constprop|inline|py|js|js2]...";

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let Some(file_path) = args.get(1) else {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    };
    let source = match read_file(file_path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut root = match parse(&source, file_path) {
        Ok(root) => root,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    // Operations apply left to right; a dialect selector only takes effect
    // for the final render, last one wins.
    let mut target = Target::Python;
    for op in &args[2..] {
        match op.as_str() {
            "constprop" => root = fold_module(root),
            "inline" => {
                root = match inline_module(root) {
                    Ok(root) => root,
                    Err(err) => {
                        eprintln!("error: {err}");
                        return ExitCode::FAILURE;
                    }
                };
            }
            selector => match selector.parse::<Target>() {
                Ok(choice) => target = choice,
                Err(_) => {
                    eprintln!("unknown operation: {selector}");
                    eprintln!("{USAGE}");
                    return ExitCode::FAILURE;
                }
            },
        }
    }

    match decompile(&root, target) {
        Ok(text) => {
            print!("{text}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn read_file(file_path: &str) -> Result<String, String> {
    match fs::metadata(file_path) {
        Ok(metadata) if !metadata.is_file() => Err(format!("{file_path} is not a file")),
        Ok(_) => fs::read_to_string(file_path).map_err(|err| format!("reading {file_path}: {err}")),
        Err(err) => Err(format!("reading {file_path}: {err}")),
    }
}
