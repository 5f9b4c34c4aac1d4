//! Simple decoder to inspect literal source files.
//!
//! Usage: `decode_file <path> [--unsafe]`

use std::collections::BTreeMap;
use std::fs;

use tosource::{EncodeOptions, Graph, Handle, Value, decode, encode};

fn preview(text: &str) -> String {
    let head: String = text.chars().take(80).collect();
    if text.chars().count() > 80 {
        format!("{}...", head)
    } else {
        head
    }
}

fn describe(graph: &Graph, handle: Handle) -> String {
    match graph.get(handle) {
        Some(Value::Text(s)) => format!("\"{}\"", preview(s)),
        Some(Value::Number(n)) => format!("{}", n),
        Some(Value::Bool(b)) => format!("{}", b),
        Some(Value::Null) => "null".to_string(),
        Some(Value::Undefined) => "undefined".to_string(),
        Some(Value::Array(elements)) => format!("ARRAY[{}]", elements.len()),
        Some(Value::Record(members)) => format!("RECORD{{{}}}", members.len()),
        Some(Value::Callable(c)) => format!("FUNCTION({})", preview(&c.source)),
        Some(Value::DateTime(d)) => match d.epoch_ms() {
            Some(ms) => format!("DATE({} ms)", ms),
            None => "DATE(invalid)".to_string(),
        },
        Some(Value::Pattern(p)) => format!("REGEXP(/{}/{})", p.source, p.flags),
        Some(Value::Error(m)) => format!("ERROR({})", m.as_deref().unwrap_or("")),
        Some(Value::Bytes(b)) => format!("BYTES[{}]", b.len()),
        Some(Value::TypedArray(t)) => format!("{}[{}]", t.kind().constructor_name(), t.len()),
        Some(Value::Set(m)) => format!("SET[{}]", m.len()),
        Some(Value::Map(e)) => format!("MAP[{}]", e.len()),
        None => format!("<dangling {}>", handle),
    }
}

fn main() {
    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| "data.js".to_string());
    let unsafe_mode = args.any(|a| a == "--unsafe");

    println!("Reading: {}", path);

    let text = fs::read_to_string(&path).expect("Failed to read file");
    println!("File size: {} bytes", text.len());
    println!("Mode: {}", if unsafe_mode { "unsafe" } else { "safe (sanitized)" });

    let doc = decode(&text, unsafe_mode).expect("Failed to decode");

    println!("\n=== Root ===");
    println!("{}", describe(&doc.graph, doc.root));

    if let Some(Value::Record(members)) = doc.root_value() {
        println!("\n=== Members ({}) ===", members.len());
        for (key, &member) in members {
            println!("  {}: {}", key, describe(&doc.graph, member));
        }
    }

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for (_, value) in doc.graph.iter() {
        *counts.entry(value.kind().name()).or_default() += 1;
    }

    println!("\n=== Value Kinds ({} total) ===", doc.graph.len());
    for (kind, count) in &counts {
        println!("  {:<12} {}", kind, count);
    }

    let encoded = encode(&doc.graph, doc.root, &EncodeOptions::new()).expect("Failed to encode");
    println!("\n=== Re-encoded ===");
    println!("Size: {} bytes ({} input)", encoded.len(), text.len());
    println!("{}", preview(&encoded));
}
