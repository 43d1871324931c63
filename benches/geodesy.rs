//! Criterion benchmarks for the per-report geometry.
//!
//! Run with: cargo bench --bench geodesy

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use harborwatch::geo::{distance_nm, point_in_polygon, BoundingBox, GeoPoint, Polygon};

fn ring(vertices: usize) -> Vec<GeoPoint> {
    (0..vertices)
        .map(|i| {
            let angle = i as f64 / vertices as f64 * std::f64::consts::TAU;
            GeoPoint::new(51.95 + 0.05 * angle.sin(), 4.05 + 0.08 * angle.cos())
        })
        .collect()
}

fn bench_distance(c: &mut Criterion) {
    let mut group = c.benchmark_group("geo_distance");

    group.bench_function("haversine_short_leg", |b| {
        b.iter(|| distance_nm(black_box(51.95), black_box(4.04), black_box(51.26), black_box(4.40)));
    });

    group.bench_function("bbox_antimeridian", |b| {
        let bbox = BoundingBox::around(&GeoPoint::new(-18.1, 179.8), 0.5);
        b.iter(|| bbox.contains(black_box(&GeoPoint::new(-18.0, -179.9))));
    });

    group.finish();
}

fn bench_containment(c: &mut Criterion) {
    let mut group = c.benchmark_group("geo_containment");
    let inside = GeoPoint::new(51.95, 4.05);

    for vertices in [4usize, 64, 1024] {
        let boundary = ring(vertices);
        group.bench_function(format!("raw_ring_{vertices}"), |b| {
            b.iter(|| point_in_polygon(black_box(inside.lat), black_box(inside.lon), &boundary));
        });

        let Ok(polygon) = Polygon::new(&boundary) else {
            continue;
        };
        group.bench_function(format!("polygon_{vertices}"), |b| {
            b.iter(|| polygon.contains(black_box(&inside)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_distance, bench_containment);
criterion_main!(benches);
