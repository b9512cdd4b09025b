use std::hint::black_box;

use chrono::Utc;
use common::{Money, ProductId, VariantId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{PackageDimensions, Product, Variant, resolve};

fn flat_product(stock: u32) -> Product {
    Product {
        id: ProductId::new(),
        name: "Benchmark Tee".to_string(),
        active: true,
        stock: Some(stock),
        sizes: Vec::new(),
        colors: Vec::new(),
        price: Money::from_cents(2_500),
        original_price: None,
        created_at: Utc::now(),
    }
}

fn variant_grid(product_id: ProductId, sizes: &[&str], colors: &[&str]) -> Vec<Variant> {
    let mut variants = Vec::new();
    for size in sizes {
        for color in colors {
            variants.push(Variant {
                id: VariantId::new(),
                product_id,
                size: Some(size.to_string()),
                color: Some(color.to_string()),
                stock: 10,
            });
        }
    }
    variants
}

fn bench_resolve_flat(c: &mut Criterion) {
    let product = flat_product(10);

    c.bench_function("domain/resolve_flat_stock", |b| {
        b.iter(|| resolve(black_box(&product), &[], None, None).unwrap());
    });
}

fn bench_resolve_variant_grid(c: &mut Criterion) {
    let product = Product {
        stock: None,
        ..flat_product(0)
    };
    let variants = variant_grid(
        product.id,
        &["PP", "P", "M", "G", "GG"],
        &["black", "white", "navy", "olive"],
    );

    c.bench_function("domain/resolve_among_20_variants", |b| {
        b.iter(|| {
            resolve(
                black_box(&product),
                black_box(&variants),
                Some("M"),
                Some("navy"),
            )
            .unwrap()
        });
    });
}

fn bench_package_heuristic(c: &mut Criterion) {
    c.bench_function("domain/package_dimensions_1_to_100", |b| {
        b.iter(|| {
            for items in 1..=100u32 {
                black_box(PackageDimensions::for_item_count(items));
            }
        });
    });
}

criterion_group!(
    benches,
    bench_resolve_flat,
    bench_resolve_variant_grid,
    bench_package_heuristic,
);
criterion_main!(benches);
