//! Init command - write a config template from guessed roles.

use std::path::PathBuf;

use clickshare::{BreakdownConfig, Parser, PartialRoles};
use colored::Colorize;

pub fn run(
    file: PathBuf,
    output: Option<PathBuf>,
    _verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    let (table, _) = Parser::new().parse_file(&file)?;
    let config = BreakdownConfig {
        roles: PartialRoles::guess(&table.headers),
        ..BreakdownConfig::default()
    };

    let config_path = output.unwrap_or_else(|| {
        let stem = file.file_stem().unwrap_or_default().to_string_lossy();
        file.with_file_name(format!("{}.clickshare.json", stem))
    });
    config.save(&config_path)?;

    println!(
        "{} {}",
        "Wrote config to".green().bold(),
        config_path.display().to_string().cyan()
    );
    println!(
        "Add breakdown columns under {}, then run {}",
        "roles.breakdown".yellow(),
        format!(
            "clickshare process {} --config {}",
            file.display(),
            config_path.display()
        )
        .cyan()
    );

    Ok(())
}
