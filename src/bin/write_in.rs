use std::{fs::read_to_string, path::Path};

use cp2kin::program::{cp2k::Submission, Calculation};

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("usage: {} <inputs.json> <folder>", args[0]);
        std::process::exit(1);
    }
    let contents = read_to_string(&args[1]).unwrap_or_else(|e| {
        eprintln!("failed to read {} with {e}", args[1]);
        std::process::exit(1);
    });
    let Submission {
        calculation,
        inputs,
    } = serde_json::from_str(&contents).unwrap_or_else(|e| {
        eprintln!("failed to parse {} with {e}", args[1]);
        std::process::exit(1);
    });
    let info = calculation
        .prepare_for_submission(Path::new(&args[2]), inputs)
        .unwrap_or_else(|e| {
            eprintln!("{e}");
            std::process::exit(1);
        });
    match serde_json::to_string_pretty(&info) {
        Ok(s) => println!("{s}"),
        Err(e) => {
            eprintln!("failed to serialize job description with {e}");
            std::process::exit(1);
        }
    }
}
