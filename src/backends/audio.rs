// SPDX-License-Identifier: GPL-3.0-only

//! Microphone discovery through PipeWire
//!
//! Used to decide whether recording audio can be granted at all. A system
//! without any `Audio/Source` node records silent videos.

use serde_json::Value;
use std::process::Command;
use tracing::{debug, warn};

/// A microphone or other audio capture node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSource {
    /// Human readable name
    pub name: String,
    pub node_name: String,
    pub is_default: bool,
}

/// Enumerate audio capture nodes, default source first
pub fn enumerate_audio_sources() -> Vec<AudioSource> {
    let output = match Command::new("pw-dump").output() {
        Ok(output) if output.status.success() => output,
        Ok(output) => {
            warn!(status = %output.status, "pw-dump failed");
            return Vec::new();
        }
        Err(e) => {
            warn!(error = %e, "Failed to run pw-dump");
            return Vec::new();
        }
    };

    match std::str::from_utf8(&output.stdout) {
        Ok(stdout) => parse_pw_dump(stdout),
        Err(e) => {
            warn!(error = %e, "pw-dump output is not UTF-8");
            Vec::new()
        }
    }
}

/// Whether at least one audio capture node exists
pub fn has_audio_source() -> bool {
    !enumerate_audio_sources().is_empty()
}

/// Extract audio sources from `pw-dump` JSON
pub fn parse_pw_dump(json: &str) -> Vec<AudioSource> {
    let nodes: Vec<Value> = match serde_json::from_str(json) {
        Ok(nodes) => nodes,
        Err(e) => {
            warn!(error = %e, "Failed to parse JSON from pw-dump");
            return Vec::new();
        }
    };

    let default_source = nodes.iter().find_map(default_source_name);

    let mut sources: Vec<AudioSource> = nodes
        .iter()
        .filter_map(|node| node.pointer("/info/props"))
        .filter(|props| props.get("media.class").and_then(Value::as_str) == Some("Audio/Source"))
        .map(|props| {
            let text = |key: &str| props.get(key).and_then(Value::as_str);
            let node_name = text("node.name").unwrap_or_default().to_string();
            let source = AudioSource {
                name: text("node.nick")
                    .or_else(|| text("node.description"))
                    .or_else(|| text("node.name"))
                    .unwrap_or("Unknown Audio Device")
                    .to_string(),
                is_default: default_source.as_deref() == Some(node_name.as_str()),
                node_name,
            };
            debug!(name = %source.name, is_default = source.is_default, "Found audio input device");
            source
        })
        .collect();

    sources.sort_by(|a, b| b.is_default.cmp(&a.is_default).then_with(|| a.name.cmp(&b.name)));
    sources
}

/// Node name of the default source from the `default` metadata object
fn default_source_name(node: &Value) -> Option<String> {
    if node.get("type").and_then(Value::as_str) != Some("PipeWire:Interface:Metadata")
        || node.pointer("/props/metadata.name").and_then(Value::as_str) != Some("default")
    {
        return None;
    }
    node.get("metadata")?.as_array()?.iter().find_map(|entry| {
        let key = entry.get("key").and_then(Value::as_str)?;
        matches!(key, "default.audio.source" | "default.configured.audio.source")
            .then(|| entry.pointer("/value/name").and_then(Value::as_str))
            .flatten()
            .map(str::to_string)
    })
}
