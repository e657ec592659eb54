//! Benchmarks for the tilecomp pipeline.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use image::{Rgba, RgbaImage};
use serde_json::json;

use tilecomp::diagnostics::Reporter;
use tilecomp::registry::{Category, SheetKind, SpriteRegistry};
use tilecomp::render::{quantize, GridPacker};
use tilecomp::resolve::Resolver;
use tilecomp::types::TileEntry;

fn sprite(seed: u32, size: u32) -> RgbaImage {
    RgbaImage::from_fn(size, size, |x, y| {
        let v = (x * 7 + y * 13 + seed * 31) % 256;
        Rgba([v as u8, (v * 3 % 256) as u8, (255 - v) as u8, 255])
    })
}

// -- Packing benchmarks --

fn bench_packing(c: &mut Criterion) {
    let mut group = c.benchmark_group("packing");

    let small: Vec<RgbaImage> = (0..16).map(|i| sprite(i, 16)).collect();
    let large: Vec<RgbaImage> = (0..256).map(|i| sprite(i, 32)).collect();

    group.bench_function("pack_16_sprites_16px", |b| {
        let packer = GridPacker::new(16, 16, 16);
        b.iter(|| packer.pack(black_box(&small), true, |_| {}))
    });

    group.bench_function("pack_256_sprites_32px", |b| {
        let packer = GridPacker::new(32, 32, 16);
        b.iter(|| packer.pack(black_box(&large), true, |_| {}))
    });

    group.finish();
}

// -- Quantization benchmarks --

fn bench_quantization(c: &mut Criterion) {
    let mut group = c.benchmark_group("quantization");

    let sprites: Vec<RgbaImage> = (0..64).map(|i| sprite(i, 32)).collect();
    let sheet = GridPacker::new(32, 32, 8).pack(&sprites, false, |_| {}).unwrap();

    group.bench_function("quantize_256x256", |b| {
        b.iter(|| quantize(black_box(&sheet)))
    });

    group.finish();
}

// -- Resolution benchmarks --

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");

    let mut registry = SpriteRegistry::new();
    for i in 0..512 {
        registry.register(&format!("t_sprite_{}", i), Category::Main);
    }
    let entries: Vec<TileEntry> = (0..256)
        .map(|i| {
            TileEntry::new(
                json!({
                    "id": format!("t_tile_{}", i),
                    "fg": [
                        {"weight": 2, "sprite": format!("t_sprite_{}", i)},
                        {"weight": 1, "sprite": format!("t_sprite_{}", i + 256)}
                    ],
                    "bg": format!("t_sprite_{}", (i * 3) % 512),
                    "rotates": true
                }),
                "bench.json",
            )
        })
        .collect();
    let reporter = Reporter::silent();

    group.bench_function("convert_256_entries", |b| {
        b.iter_batched(
            || registry.clone(),
            |mut registry| {
                let mut resolver =
                    Resolver::new(&mut registry, &reporter, SheetKind::Main, "tile_config.json");
                for entry in &entries {
                    black_box(resolver.convert(entry));
                }
            },
            BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_packing, bench_quantization, bench_resolution);
criterion_main!(benches);
