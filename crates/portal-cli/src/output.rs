use serde_json::Value;

pub fn print_json(value: &Value) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}
