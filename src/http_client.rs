use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;

static CLIENT: OnceCell<Client> = OnceCell::new();

/// Shared blocking client. The timeout of the first call wins.
pub fn http_client(timeout_secs: u64) -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build http client")
    })
}

/// GET a JSON document as text. Non-2xx responses are errors carrying the body.
pub fn fetch_text(client: &Client, url: &str) -> Result<String> {
    let resp = client
        .get(url)
        .header(USER_AGENT, "playcall-terminal/0.1")
        .send()
        .with_context(|| format!("request {url}"))?;
    let status = resp.status();
    let body = resp
        .text()
        .with_context(|| format!("read body {url}"))?;
    if !status.is_success() {
        return Err(anyhow!("http {status} for {url}: {body}"));
    }
    Ok(body)
}
