use anyhow::Result;

use crate::cmd::client::ClientArgs;
use crate::output::print_json;

pub fn run(args: &ClientArgs, json: bool) -> Result<()> {
    let client = args.build()?;
    let rt = tokio::runtime::Runtime::new()?;
    let session = rt.block_on(client.session())?;

    if json {
        return print_json(&serde_json::to_value(&session)?);
    }
    println!("{} ({})", session.email, session.role);
    if session.admin_capable {
        println!("admin routes: allowed");
    }
    Ok(())
}
