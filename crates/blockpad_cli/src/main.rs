//! CLI smoke and import entry point.
//!
//! # Responsibility
//! - Print the linked `blockpad_core` version.
//! - `import <file>` runs the line parser on a text file and prints blocks as JSON.

use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => {
            println!("blockpad_core version={}", blockpad_core::core_version());
            ExitCode::SUCCESS
        }
        [command, path] if command == "import" => match import_file(path) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(message) => {
                eprintln!("{message}");
                ExitCode::FAILURE
            }
        },
        _ => {
            eprintln!("usage: blockpad_cli [import <file>]");
            ExitCode::from(2)
        }
    }
}

fn import_file(path: &str) -> Result<String, String> {
    let raw_text =
        std::fs::read_to_string(path).map_err(|err| format!("cannot read `{path}`: {err}"))?;
    let content = blockpad_core::ImportContent::from_file(path, raw_text);
    let blocks = blockpad_core::parse_plain_text(&content.raw_text);
    let payload = serde_json::json!({
        "title": content.suggested_title,
        "blocks": blocks,
    });
    serde_json::to_string_pretty(&payload).map_err(|err| format!("cannot encode blocks: {err}"))
}
