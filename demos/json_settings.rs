//! Settings panel backed by a store of JSON values
//!
//! Run with `cargo run --example json_settings --features json`.

use keyed_store::{Callback, KeyedStore, Record};
use serde_json::{json, Value};

fn main() -> keyed_store::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let defaults: Record<&str, Value> = Record::from([
        ("theme", json!("light")),
        ("font_size", json!(14)),
        ("recent", json!([])),
    ]);

    let settings = KeyedStore::builder()
        .label("settings")
        .defaults(defaults)
        .build();

    let on_theme = Callback::new(|theme: Option<&Value>| println!("theme -> {theme:?}"));
    let on_recent = Callback::new(|recent: Option<&Value>| println!("recent -> {recent:?}"));
    settings.subscribe("theme", &on_theme)?;
    settings.subscribe("recent", &on_recent)?;

    // same string, no notification
    settings.set("theme", json!("light"))?;
    settings.set("theme", json!("dark"))?;

    // arrays are always fresh copies, so every write notifies
    settings.update("recent", |recent| {
        let mut list = recent
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        list.push(json!("notes.txt"));
        Value::Array(list)
    })?;

    let snapshot = settings.snapshot()?;
    println!(
        "settings: {}",
        serde_json::to_string_pretty(&snapshot).unwrap_or_default()
    );

    settings.restore_default(None)?;
    println!("theme after reset: {:?}", settings.get(&"theme")?);

    Ok(())
}
