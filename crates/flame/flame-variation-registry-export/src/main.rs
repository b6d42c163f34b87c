//! Dump the variation registry and neutral-pad table as JSON for tooling.
//!
//! Usage: `flame-variation-registry-export [OUT_PATH]` (stdout when no path is given).

use std::fs;

use anyhow::{Context, Result};
use flame_interp::{Variation, NEUTRAL_PADS};
use serde_json::json;

fn registry_json() -> serde_json::Value {
    let variations: Vec<_> = Variation::ALL
        .iter()
        .enumerate()
        .map(|(index, var)| {
            json!({
                "index": index,
                "name": var.name(),
                "params": var.params(),
            })
        })
        .collect();
    json!({
        "version": env!("CARGO_PKG_VERSION"),
        "variations": variations,
        "neutral_pads": NEUTRAL_PADS,
    })
}

fn main() -> Result<()> {
    let text = serde_json::to_string_pretty(&registry_json())
        .context("failed to serialize variation registry")?;
    match std::env::args().nth(1) {
        Some(path) => {
            fs::write(&path, text).with_context(|| format!("failed to write {path}"))?;
        }
        None => println!("{text}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_lists_every_variation_with_params() {
        let value = registry_json();
        let vars = value["variations"].as_array().expect("variations array");
        assert_eq!(vars.len(), Variation::ALL.len());
        let blob = vars
            .iter()
            .find(|v| v["name"] == "blob")
            .expect("blob registered");
        assert_eq!(blob["params"][1]["name"], "low");
        assert!(value["neutral_pads"]
            .as_array()
            .is_some_and(|pads| pads.iter().any(|p| p["rule"]["kind"] == "inverse_linear")));
    }
}
