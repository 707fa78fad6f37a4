//! `xdiag run`

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use xdiag_client::XApiClient;
use xdiag_core::{
    classify_access_tier, render_credentials, render_report, render_samples, run_diagnostics,
    write_sample_artifact, AccessTierGuess, ApiClient, CredentialSet, DiagnosticReport,
    ReportSummary, ScriptedClient,
};

use super::RunArgs;
use crate::settings::AppConfig;

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: ReportSummary,
    access_tier: AccessTierGuess,
    #[serde(flatten)]
    report: &'a DiagnosticReport,
}

/// Run the probes and print the report. Returns the process exit code.
pub async fn run(args: RunArgs, mut config: AppConfig) -> Result<i32> {
    if let Some(handle) = args.handle {
        config.diagnostics.target_handle = handle;
    }
    if let Some(query) = args.query {
        config.diagnostics.search_query = query;
    }

    let credentials = CredentialSet::from_env();
    if !args.json {
        println!("{}", render_credentials(&credentials));
    }
    for warning in credentials.hygiene_warnings() {
        warn!("{}", warning);
    }

    let report = execute(&config, &credentials, args.dry_run).await;

    if args.json {
        let output = JsonReport {
            summary: report.summary(),
            access_tier: classify_access_tier(report.results()),
            report: &report,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialize report")?
        );
    } else {
        print!("{}", render_report(&report));
        let samples = render_samples(report.samples(), config.output.sample_limit);
        if !samples.is_empty() {
            println!();
            print!("{}", samples);
        }
    }

    if args.artifact {
        let dir = PathBuf::from(args.output_dir.unwrap_or(config.output.artifact_dir));
        match write_sample_artifact(&dir, &report, &config.output.artifact_title, Utc::now())
            .context("Failed to write sample artifact")?
        {
            Some(path) if !args.json => println!("\nSample artifact: {}", path.display()),
            Some(_) => {}
            None => info!("No posts fetched, artifact skipped"),
        }
    }

    Ok(report.exit_code())
}

async fn execute(
    config: &AppConfig,
    credentials: &CredentialSet,
    dry_run: bool,
) -> DiagnosticReport {
    let probes = config.diagnostics.plan().into_probes();

    if dry_run {
        info!("Dry run: using scripted client");
        return run_diagnostics(&ScriptedClient::new(), credentials, &probes).await;
    }

    let client = match XApiClient::new(config.api.clone()) {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "Could not build API client");
            return DiagnosticReport::aborted(format!("could not build API client: {}", e));
        }
    };
    info!(base_url = client.base_url(), probes = probes.len(), "Starting diagnostics");

    let client: &dyn ApiClient = &client;
    run_diagnostics(client, credentials, &probes).await
}
