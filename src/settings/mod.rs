//! Application configuration types

use serde::{Deserialize, Serialize};
use xdiag_client::XApiConfig;
use xdiag_core::ProbePlan;

mod loader;

pub use loader::load_config;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: XApiConfig,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which accounts and queries the probes exercise
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    pub target_handle: String,
    pub search_query: String,
    pub search_max_results: u32,
    pub timeline_max_results: u32,
    pub following_max_results: u32,
    /// Extra timelines sampled when search is unavailable
    pub key_accounts: Vec<String>,
    pub key_account_max_results: u32,
    pub exclude_replies: bool,
    pub exclude_reshares: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            target_handle: "userownedai".to_string(),
            search_query: "AI crypto blockchain".to_string(),
            search_max_results: 10,
            timeline_max_results: 5,
            following_max_results: 5,
            key_accounts: vec![
                "VitalikButerin".to_string(),
                "sama".to_string(),
                "elonmusk".to_string(),
            ],
            key_account_max_results: 3,
            exclude_replies: true,
            exclude_reshares: true,
        }
    }
}

impl DiagnosticsConfig {
    /// The probe sequence for a run.
    ///
    /// Target account first, then the "who am I" and following checks that
    /// tell user context apart from app-only access, then search and the
    /// timeline fallbacks.
    pub fn plan(&self) -> ProbePlan {
        let target = self.target_handle.as_str();

        let plan = ProbePlan::new()
            .resolve_user(target)
            .authenticated_identity()
            .list_followed_accounts(target, self.following_max_results)
            .search_recent(&self.search_query, self.search_max_results)
            .list_recent_posts(
                target,
                self.timeline_max_results,
                self.exclude_replies,
                self.exclude_reshares,
            );

        self.key_accounts.iter().fold(plan, |plan, account| {
            plan.list_recent_posts(
                account,
                self.key_account_max_results,
                self.exclude_replies,
                self.exclude_reshares,
            )
        })
    }
}

/// Artifact and excerpt settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub artifact_dir: String,
    pub artifact_title: String,
    /// Post excerpts printed after the report
    pub sample_limit: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            artifact_dir: "data/test-newsletters".to_string(),
            artifact_title: "UserOwned.AI Daily Brief".to_string(),
            sample_limit: 3,
        }
    }
}

/// Log filter and format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, overridden by `RUST_LOG`
    pub filter: String,
    /// Emit JSON lines instead of human-readable logs
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "xdiag=info,xdiag_core=info,xdiag_client=info".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_plan_order() {
        let names = DiagnosticsConfig::default().plan().names();

        assert_eq!(
            names,
            vec![
                "resolve_user(@userownedai)",
                "authenticated_identity",
                "list_followed_accounts(@userownedai, max=5)",
                "search_recent(\"AI crypto blockchain\", max=10)",
                "list_recent_posts(@userownedai, max=5)",
                "resolve_user(@vitalikbuterin)",
                "list_recent_posts(@vitalikbuterin, max=3)",
                "resolve_user(@sama)",
                "list_recent_posts(@sama, max=3)",
                "resolve_user(@elonmusk)",
                "list_recent_posts(@elonmusk, max=3)",
            ]
        );
    }

    #[test]
    fn test_plan_without_key_accounts() {
        let config = DiagnosticsConfig {
            key_accounts: Vec::new(),
            ..DiagnosticsConfig::default()
        };
        assert_eq!(config.plan().len(), 5);
    }
}
