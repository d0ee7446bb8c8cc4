//! Criterion benchmarks for spritesalvage critical paths
//!
//! Benchmarks the operations that scale with capture size:
//! - Raw scan: sprite and texture-list recovery from escaped capture text
//! - Manifest: structured atlas resolution
//! - Classifier: role and symbol matching over sprite names
//! - Crop: clamped sub-image extraction

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use image::{DynamicImage, Rgba, RgbaImage};
use serde_json::json;
use std::path::Path;

use spritesalvage::atlas::manifest::{resolve_manifest, ManifestOptions};
use spritesalvage::atlas::raw::{scan_raw, scan_texture_refs};
use spritesalvage::atlas::SpriteRect;
use spritesalvage::classify::{count_symbol_sprites, Classifier};
use spritesalvage::decompose::crop_sprite;

// =============================================================================
// Test Data Generators
// =============================================================================

const NAMES: [&str; 8] = ["bg", "symbol", "frame", "logo", "title", "fire", "column", "H"];

fn sprite_name(i: usize) -> String {
    format!("s_{}{}", NAMES[i % NAMES.len()], i)
}

/// Manifest JSON with `atlases` atlas components of `sprites` sprites each
fn make_manifest(atlases: usize, sprites: usize) -> String {
    let nodes: Vec<serde_json::Value> = (0..atlases)
        .map(|a| {
            let list: serde_json::Map<String, serde_json::Value> = (0..sprites)
                .map(|i| {
                    (sprite_name(i), json!({"x": i * 4, "y": a * 4, "width": 32, "height": 32}))
                })
                .collect();
            json!({"name": format!("atlas{}", a), "components": [{
                "componentType": "UIAtlas",
                "serializableData": {
                    "textureContent": {"guid": format!("{:032x}", a)},
                    "spriteList": list
                }
            }]})
        })
        .collect();
    json!({"resources": [{"type": "GameObject", "data": {"root": nodes}}]}).to_string()
}

/// The same manifest embedded as a string in a capture, so every quote is escaped
fn make_capture_text(atlases: usize, sprites: usize) -> String {
    let entry = json!({
        "request": {"url": "https://cdn.example/game.json"},
        "response": {"content": {"mimeType": "application/json", "text": make_manifest(atlases, sprites)}}
    });
    json!({"log": {"entries": [entry]}}).to_string()
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_raw_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("raw_scan");

    for sprites in [10, 100, 500].iter() {
        let text = make_capture_text(4, *sprites);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::new("scan_raw", sprites), &text, |b, text| {
            b.iter(|| scan_raw(black_box(text)).into_index())
        });
    }

    let text = make_capture_text(4, 100);
    group.bench_function("scan_texture_refs", |b| b.iter(|| scan_texture_refs(black_box(&text))));

    group.finish();
}

fn bench_manifest(c: &mut Criterion) {
    let mut group = c.benchmark_group("manifest");

    for sprites in [10, 100, 500].iter() {
        let text = make_manifest(4, *sprites);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::new("resolve", sprites), &text, |b, text| {
            b.iter(|| {
                resolve_manifest(black_box(text), Path::new("bench.json"), ManifestOptions::default())
            })
        });
    }

    group.finish();
}

fn bench_classifier(c: &mut Criterion) {
    let mut group = c.benchmark_group("classifier");
    let classifier = Classifier::default();
    let names: Vec<String> = (0..1000).map(sprite_name).collect();

    group.throughput(Throughput::Elements(names.len() as u64));
    group.bench_function("classify_1000", |b| {
        b.iter(|| names.iter().map(|n| classifier.classify(black_box(n))).count())
    });
    group.bench_function("count_symbols_1000", |b| {
        b.iter(|| count_symbol_sprites(names.iter().map(String::as_str)))
    });

    group.finish();
}

fn bench_crop(c: &mut Criterion) {
    let mut group = c.benchmark_group("crop");
    let texture = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2048, 2048, Rgba([9, 9, 9, 255])));

    for size in [16, 128, 512].iter() {
        let rect = SpriteRect::new("s_bench", 100, 100, *size, *size).expect("valid rect");
        group.throughput(Throughput::Elements((*size * *size) as u64));
        group.bench_with_input(
            BenchmarkId::new("crop_sprite", format!("{}x{}", size, size)),
            &rect,
            |b, rect| b.iter(|| crop_sprite(black_box(&texture), black_box(rect))),
        );
    }

    // Mostly off the texture; exercises clamping
    let overflow = SpriteRect::new("s_edge", 2000, 2000, 9999, 9999).expect("valid rect");
    group.bench_function("crop_clamped", |b| {
        b.iter(|| crop_sprite(black_box(&texture), black_box(&overflow)))
    });

    group.finish();
}

criterion_group!(benches, bench_raw_scan, bench_manifest, bench_classifier, bench_crop);
criterion_main!(benches);
