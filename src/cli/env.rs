use xdiag_core::{render_credentials, CredentialSet};

pub fn run() -> anyhow::Result<()> {
    let credentials = CredentialSet::from_env();
    print!("{}", render_credentials(&credentials));

    if credentials.bearer().is_none() {
        println!();
        println!("TWITTER_BEARER_TOKEN is required for every app-only probe.");
    }
    if credentials.user_context().is_none() {
        println!("User-context probes need all four of TWITTER_API_KEY, TWITTER_API_SECRET,");
        println!("TWITTER_ACCESS_TOKEN and TWITTER_ACCESS_TOKEN_SECRET.");
    }

    Ok(())
}
