use anyhow::{Context, Result};
use clap::Parser;
use jsonschema::JSONSchema;
use serde_json::Value;
use std::{fs, path::PathBuf};

/// Validate a universal-record JSONL file against the Universal Record v1 schema.
#[derive(Parser, Debug)]
#[command(name = "validate-records", version, about = "Validate universal records against the JSON Schema")]
struct Cli {
    /// Path to the JSONL file to validate
    path: PathBuf,

    /// Optional path to a schema file (defaults to schemas/universal_record.v1.json)
    #[arg(long)]
    schema: Option<PathBuf>,
}

fn load_json(path: &PathBuf) -> Result<Value> {
    let data = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let json: Value =
        serde_json::from_str(&data).with_context(|| format!("Failed to parse JSON in {}", path.display()))?;
    Ok(json)
}

fn main() -> Result<()> {
    let args = Cli::parse();
    let schema_path = args
        .schema
        .unwrap_or_else(|| PathBuf::from("schemas/universal_record.v1.json"));

    let schema_json = load_json(&schema_path)?;

    // jsonschema 0.17 expects a schema with 'static lifetime; leak the parsed schema for CLI lifetime
    let schema_static: &'static Value = Box::leak(Box::new(schema_json));
    let compiled = JSONSchema::options()
        .compile(schema_static)
        .context("Failed to compile JSON Schema")?;

    let data = fs::read_to_string(&args.path).with_context(|| format!("Failed to read {}", args.path.display()))?;

    let mut invalid = 0usize;
    let mut total = 0usize;
    for (index, line) in data.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        total += 1;
        let instance: Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                invalid += 1;
                eprintln!("line {}: not JSON: {}", index + 1, e);
                continue;
            }
        };
        let result = compiled.validate(&instance);
        if let Err(errors) = result {
            invalid += 1;
            eprintln!("line {}: invalid", index + 1);
            for error in errors {
                eprintln!("- {} at {}", error, error.instance_path);
            }
        }
    }

    if invalid == 0 {
        println!("valid ({} records)", total);
        Ok(())
    } else {
        eprintln!("{} of {} records invalid", invalid, total);
        std::process::exit(1)
    }
}
