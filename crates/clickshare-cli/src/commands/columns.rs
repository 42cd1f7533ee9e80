//! Columns command - list headers and guessed roles.

use std::path::PathBuf;

use clickshare::{DataTable, Parser, PartialRoles};
use colored::Colorize;

pub fn run(
    file: PathBuf,
    json_output: bool,
    _verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    let (table, source) = Parser::new().parse_file(&file)?;
    let guessed = PartialRoles::guess(&table.headers);

    if json_output {
        let columns: Vec<_> = table
            .headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                serde_json::json!({
                    "index": i,
                    "name": header,
                    "role": role_of(&guessed, header),
                    "nulls": null_count(&table, i),
                })
            })
            .collect();

        let status = serde_json::json!({
            "file": source.file,
            "format": source.format,
            "rows": source.row_count,
            "columns": columns,
            "guessed_roles": guessed,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!(
        "{} {} ({} rows, {})",
        "Columns in".cyan().bold(),
        source.file.white(),
        source.row_count,
        source.format
    );
    println!();

    for (i, header) in table.headers.iter().enumerate() {
        let role = match role_of(&guessed, header) {
            Some(role) => role.green(),
            None => "-".dimmed(),
        };
        let nulls = null_count(&table, i);
        let nulls = if nulls > 0 {
            format!("{} null", nulls).yellow()
        } else {
            String::new().normal()
        };
        println!("  {:>3}  {:<32} {:<12} {}", i + 1, header, role, nulls);
    }

    let missing: Vec<_> = [
        ("url", &guessed.url),
        ("device", &guessed.device),
        ("country", &guessed.country),
        ("clicks", &guessed.clicks),
    ]
    .into_iter()
    .filter(|(_, column)| column.is_none())
    .map(|(role, _)| role)
    .collect();

    if !missing.is_empty() {
        println!();
        println!(
            "{} no column guessed for {}; bind it with {}",
            "Warning:".yellow().bold(),
            missing.join(", "),
            format!("--{}", missing[0]).cyan()
        );
    }

    Ok(())
}

/// Role a guessed binding assigns to `header`.
fn role_of(roles: &PartialRoles, header: &str) -> Option<&'static str> {
    [
        ("url", &roles.url),
        ("device", &roles.device),
        ("country", &roles.country),
        ("date", &roles.date),
        ("query", &roles.query),
        ("clicks", &roles.clicks),
        ("impressions", &roles.impressions),
    ]
    .into_iter()
    .find(|(_, column)| column.as_deref() == Some(header))
    .map(|(role, _)| role)
}

fn null_count(table: &DataTable, index: usize) -> usize {
    table
        .column_values(index)
        .filter(|v| DataTable::is_null_value(v))
        .count()
}
