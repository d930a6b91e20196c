//! `tollgate inspect`.

use anyhow::Context;
use tollgate_core::TokenIssuer;
use tollgate_core::stats::TokenStats;
use tollgate_core::token::BEARER_PREFIX;

pub fn run(issuer: &TokenIssuer, token: &str, json: bool) -> anyhow::Result<()> {
    let token = token.trim();
    let token = token.strip_prefix(BEARER_PREFIX).unwrap_or(token);

    let stats = TokenStats::inspect(issuer.codec(), token).context("token rejected")?;
    if json {
        let output = serde_json::to_string_pretty(&stats).context("failed to format token")?;
        println!("{output}");
    } else {
        println!("{stats}");
    }

    Ok(())
}
