//! Benchmark for literal encoding using a JSON dataset.
//!
//! Loads a JSON file (or generates a synthetic city list when none is
//! given), converts it into a value graph and times encoding and decoding
//! in each mode.
//!
//! Set `RUST_LOG=tosource=debug` to see the codec's diagnostics.

use std::fs;
use std::time::Instant;

use serde_json::Value as Json;
use tosource::codec::{ModuleOptions, decode, encode, encode_as_module};
use tosource::{EncodeOptions, Graph, Handle};
use tracing_subscriber::EnvFilter;

const DECODE_ITERS: u32 = 5;
const SYNTHETIC_CITIES: usize = 20_000;

/// Inserts a JSON document into `graph` and returns the root handle.
fn insert_json(graph: &mut Graph, json: &Json) -> Handle {
    match json {
        Json::Null => graph.null(),
        Json::Bool(b) => graph.bool(*b),
        Json::Number(n) => graph.number(n.as_f64().unwrap_or(f64::NAN)),
        Json::String(s) => graph.text(s.as_str()),
        Json::Array(items) => {
            let handles: Vec<Handle> = items.iter().map(|item| insert_json(graph, item)).collect();
            graph.array(handles)
        }
        Json::Object(members) => {
            let members: Vec<(&str, Handle)> = members
                .iter()
                .map(|(key, value)| (key.as_str(), insert_json(graph, value)))
                .collect();
            graph.record_from(members)
        }
    }
}

/// Builds a city list shaped like the usual geo datasets.
fn synthetic_cities(count: usize) -> Json {
    let cities: Vec<Json> = (0..count)
        .map(|i| {
            serde_json::json!({
                "id": i,
                "name": format!("City {i}"),
                "state_code": format!("S{}", i % 50),
                "country_code": (["DE", "FR", "BR", "JP", "US"][i % 5]),
                "latitude": 48.0 + (i as f64) * 0.001,
                "longitude": -(i as f64) * 0.0007,
                "population": (i * 37) % 1_000_000,
                "wikiDataId": if i % 3 == 0 { Json::Null } else { Json::String(format!("Q{}", 1000 + i)) },
                "translations": {
                    "ko": format!("도시 {i}"),
                    "ar": format!("مدينة {i}"),
                    "note": "</script><b>escaped</b>",
                },
            })
        })
        .collect();
    Json::Array(cities)
}

fn throughput(bytes: usize, secs: f64) -> f64 {
    (bytes as f64 / 1_000_000.0) / secs
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let json = match std::env::args().nth(1) {
        Some(path) => {
            println!("Loading dataset from: {}", path);
            let data = fs::read_to_string(&path).expect("Failed to read dataset");
            let parse_start = Instant::now();
            let json: Json = serde_json::from_str(&data).expect("Failed to parse JSON");
            println!("Parsed {} bytes of JSON in {:?}", data.len(), parse_start.elapsed());
            json
        }
        None => {
            println!("No dataset given, generating {} synthetic cities", SYNTHETIC_CITIES);
            synthetic_cities(SYNTHETIC_CITIES)
        }
    };

    let convert_start = Instant::now();
    let mut graph = Graph::new();
    let root = insert_json(&mut graph, &json);
    tracing::debug!(values = graph.len(), "dataset converted");
    println!(
        "Converted to a graph of {} values in {:?}",
        graph.len(),
        convert_start.elapsed()
    );

    // Safe encoding
    let encode_start = Instant::now();
    let encoded = encode(&graph, root, &EncodeOptions::new()).expect("Failed to encode");
    let encode_time = encode_start.elapsed();
    println!("\nSafe: {} bytes in {:?}", encoded.len(), encode_time);
    println!(
        "  Throughput: {:.2} MB/s",
        throughput(encoded.len(), encode_time.as_secs_f64())
    );

    // Unsafe encoding
    let unsafe_start = Instant::now();
    let unsafe_encoded =
        encode(&graph, root, &EncodeOptions::unsafe_output()).expect("Failed to encode unsafe");
    let unsafe_time = unsafe_start.elapsed();
    println!("\nUnsafe: {} bytes in {:?}", unsafe_encoded.len(), unsafe_time);
    println!(
        "  Escaping overhead: {:.1}% larger",
        (encoded.len() as f64 / unsafe_encoded.len() as f64 - 1.0) * 100.0
    );

    // Module output with references
    let module_start = Instant::now();
    let module = encode_as_module(&graph, root, &ModuleOptions::new().references())
        .expect("Failed to encode module");
    println!(
        "\nModule (references): {} bytes in {:?}",
        module.len(),
        module_start.elapsed()
    );

    // Safe decoding
    let decode_start = Instant::now();
    for _ in 0..DECODE_ITERS {
        let doc = decode(&encoded, false).expect("Failed to decode");
        std::hint::black_box(doc);
    }
    let decode_time = decode_start.elapsed() / DECODE_ITERS;
    println!("\nDecode (safe, sanitized): {:?}", decode_time);
    println!(
        "  Throughput: {:.2} MB/s",
        throughput(encoded.len(), decode_time.as_secs_f64())
    );

    // Unsafe decoding skips the sanitizer
    let decode_unsafe_start = Instant::now();
    for _ in 0..DECODE_ITERS {
        let doc = decode(&unsafe_encoded, true).expect("Failed to decode unsafe");
        std::hint::black_box(doc);
    }
    let decode_unsafe_time = decode_unsafe_start.elapsed() / DECODE_ITERS;
    println!("\nDecode (unsafe): {:?}", decode_unsafe_time);
    println!(
        "  Sanitizer overhead: {:.1}x",
        decode_time.as_secs_f64() / decode_unsafe_time.as_secs_f64()
    );

    // Verify the round trip
    let doc = decode(&encoded, false).expect("Failed to decode");
    assert!(
        graph.structurally_eq(root, &doc.graph, doc.root),
        "Round trip should preserve the graph"
    );

    println!("\n=== Summary ===");
    println!("Values: {}", graph.len());
    println!("Safe literal: {} bytes", encoded.len());
    println!("Unsafe literal: {} bytes", unsafe_encoded.len());
    println!("Round trip: ok");
}
