// Report defects in the pain point and God-Mode prompt catalogs.
// Usage:
//   cargo run --bin validate_catalog [pain_points.yaml] [god_mode_prompts.yaml]
//   Without arguments the paths come from the config at REPLYWRIGHT_CONFIG_PATH.

use common::catalog::validation::{validate_god_mode_prompts, validate_pain_points, EntryIssue};
use common::configuration::Configuration;
use common::consts::{CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
use common::errors::CatalogError;
use std::{env, fs, process};

type Validator = fn(&str) -> Result<Vec<EntryIssue>, CatalogError>;

fn catalog_paths() -> Result<(String, String), String> {
    let args: Vec<String> = env::args().skip(1).collect();
    if let [pain_points, god_mode_prompts] = args.as_slice() {
        return Ok((pain_points.clone(), god_mode_prompts.clone()));
    }

    let config_path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = Configuration::load(&config_path).map_err(|e| e.to_string())?;
    Ok((config.catalog.pain_points, config.catalog.god_mode_prompts))
}

fn check(label: &str, path: &str, validate: Validator) -> Result<usize, String> {
    let contents =
        fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path, e))?;
    let issues = validate(&contents).map_err(|e| format!("{}: {}", path, e))?;

    if issues.is_empty() {
        println!("✓ {} ({}): no problems", label, path);
    } else {
        println!("✗ {} ({}): {} entries with problems", label, path, issues.len());
        for issue in &issues {
            println!("  - {}", issue);
        }
    }
    Ok(issues.len())
}

fn main() {
    let (pain_points, god_mode_prompts) = match catalog_paths() {
        Ok(paths) => paths,
        Err(e) => {
            eprintln!("Error locating catalogs: {}", e);
            eprintln!("  pass both catalog paths, or set {}", CONFIG_PATH_ENV);
            process::exit(2);
        }
    };

    let results = [
        check("pain points", &pain_points, validate_pain_points),
        check("god mode prompts", &god_mode_prompts, validate_god_mode_prompts),
    ];

    let mut total = 0;
    for result in results {
        match result {
            Ok(count) => total += count,
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(2);
            }
        }
    }

    if total > 0 {
        process::exit(1);
    }
}
