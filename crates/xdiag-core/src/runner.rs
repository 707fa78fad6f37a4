//! Credential diagnostic runner
//!
//! A linear fold over the probe list: every probe runs, in order, and yields
//! exactly one [`ProbeResult`]. Failures never escape a probe and never stop
//! the run.

use tracing::{debug, info, instrument, warn};

use crate::client::{ApiClient, Auth};
use crate::credentials::CredentialSet;
use crate::probe::{FailureKind, Probe, ProbeResult, RunContext};
use crate::report::DiagnosticReport;

/// Run every probe against `client` and collect the report.
#[instrument(skip_all, fields(probes = probes.len()))]
pub async fn run_diagnostics(
    client: &dyn ApiClient,
    credentials: &CredentialSet,
    probes: &[Box<dyn Probe>],
) -> DiagnosticReport {
    let mut ctx = RunContext::default();
    let mut report = DiagnosticReport::new();

    for probe in probes {
        let result = run_probe(client, credentials, probe.as_ref(), &mut ctx, &mut report).await;
        report.push(result);
    }

    let summary = report.summary();
    info!(
        successes = summary.successes,
        failures = summary.failures,
        skipped = summary.skipped,
        "Diagnostics finished"
    );

    report
}

async fn run_probe(
    client: &dyn ApiClient,
    credentials: &CredentialSet,
    probe: &dyn Probe,
    ctx: &mut RunContext,
    report: &mut DiagnosticReport,
) -> ProbeResult {
    let name = probe.name();
    let capability = probe.capability();

    let missing = credentials.missing(probe.required_fields());
    if !missing.is_empty() {
        info!(probe = %name, ?missing, "Skipping probe: missing credential");
        return ProbeResult::missing_credential(name, capability);
    }

    let Some(auth) = Auth::from_credentials(probe.auth_mode(), credentials) else {
        return ProbeResult::missing_credential(name, capability);
    };

    if let Some(handle) = probe.depends_on() {
        if ctx.resolved(handle).is_none() {
            info!(probe = %name, handle, "Skipping probe: account not resolved");
            return ProbeResult::failure(
                name,
                capability,
                FailureKind::DependencyUnavailable,
                Some(format!("requires resolve_user(@{}) to succeed first", handle)),
                None,
            );
        }
    }

    debug!(probe = %name, "Running probe");

    match probe.execute(client, &auth, ctx).await {
        Ok(output) => {
            info!(probe = %name, "Probe succeeded");
            if let Some((handle, profile)) = output.resolved {
                ctx.record_user(&handle, profile);
            }
            report.extend_samples(output.samples);
            ProbeResult::success(name, capability, output.detail)
        }
        Err(error) => {
            let kind = probe.classify(&error);
            warn!(probe = %name, status = ?error.status, kind = %kind, "Probe failed");
            let detail = probe.failure_detail(kind, &error);
            ProbeResult::failure(name, capability, kind, Some(detail), error.status)
        }
    }
}
