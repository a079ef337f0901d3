use anyhow::{Context, Result};
use clap::Args;
use portal_client::Method;
use serde_json::Value;

use crate::cmd::client::ClientArgs;
use crate::output::print_json;

#[derive(Args, Debug)]
pub struct CallArgs {
    /// HTTP method, e.g. GET or POST
    pub method: String,

    /// Route path, e.g. /api/dashboard
    pub path: String,

    /// JSON request body
    #[arg(long, short = 'd')]
    pub data: Option<String>,
}

pub fn run(client_args: &ClientArgs, args: CallArgs) -> Result<()> {
    let method = Method::from_bytes(args.method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("invalid HTTP method '{}'", args.method))?;
    let body: Option<Value> = args
        .data
        .as_deref()
        .map(serde_json::from_str::<Value>)
        .transpose()
        .context("--data is not valid JSON")?;

    let client = client_args.build()?;
    let rt = tokio::runtime::Runtime::new()?;
    let response = rt.block_on(client.request(method, &args.path, body.as_ref()))?;
    print_json(&response)
}
