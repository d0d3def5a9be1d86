mod args;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use convokit_io_xlsx::{XlsxWriter, read_raw_grid};
use convokit_schedule::{extract_schedule, normalize_grid};
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use crate::args::Args;

fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    run(&args)
}

fn run(args: &Args) -> Result<()> {
    let letter = args.derive_letter()?;
    let options = args.derive_extract_options();

    let raw_grid = read_raw_grid(&args.input, &args.derive_read_options())
        .with_context(|| format!("reading {}", args.input.display()))?;
    let normalized = normalize_grid(&raw_grid, &options.layout)
        .with_context(|| format!("normalizing {}", args.input.display()))?;

    if let Some(path_audit) = &args.audit_out {
        let mut writer = XlsxWriter::new(path_audit.clone());
        writer.write_audit_grid(&normalized, "normalized")?;
        writer.close()?;
        info!(file = %path_audit.display(), "audit grid written");
    }

    let output = extract_schedule(&normalized, &options)?;
    for warning in &output.report.warnings {
        warn!("{warning}");
    }
    println!("{}", output.report);

    if output.schedule.is_empty() {
        warn!(
            policy = options.policy.name(),
            "no assignment found; check --policy and --trailing-cols"
        );
    }

    if let Some(path_json) = &args.out_json {
        let payload = json!({
            "policy": options.policy.name(),
            "report": output.report.to_dict(),
            "warnings": output
                .report
                .warnings
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>(),
            "schedule": &output.schedule,
        });
        fs::write(path_json, serde_json::to_string_pretty(&payload)?)
            .with_context(|| format!("writing {}", path_json.display()))?;
        info!(file = %path_json.display(), "schedule JSON written");
    }

    let path_out = args
        .out_xlsx
        .clone()
        .unwrap_or_else(|| PathBuf::from(letter.derive_file_name()));
    let mut writer = XlsxWriter::new(path_out.clone());
    writer.write_convocations(&output.schedule, &letter)?;
    writer.close()?;
    for report in writer.report() {
        for msg in &report.warnings {
            warn!("{msg}");
        }
    }
    println!(
        "{} convocation(s) written to {}",
        output.schedule.len(),
        path_out.display()
    );
    Ok(())
}
