use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use once_cell::sync::Lazy;
use smol_str::SmolStr;
use std::hint::black_box;
use std::sync::Arc;
use wide_orm::accessor::resolve;
use wide_orm::codec::Codec;
use wide_orm::store::Cells;
use wide_orm::{
    AccessError, ColumnFamily, Element, FieldDescriptor, MemoryStore, Operation, PropertyAccessor,
    RecordCodec, RowHandle, Schema, Value, ValueKind, Visibility,
};

// ─── Test Data ──────────────────────────────────────────────────────────────

/// Page with a public key and a title only reachable through bean methods.
#[derive(Debug, Clone, PartialEq, Default)]
struct Page {
    path: SmolStr,
    title: String,
}

fn set_path(p: &mut Page, v: Value) -> Result<(), AccessError> {
    p.path = v.into_smol_str().unwrap_or_default();
    Ok(())
}

fn set_title(p: &mut Page, v: Value) -> Result<(), AccessError> {
    p.title = v.as_str().unwrap_or_default().to_owned();
    Ok(())
}

fn title_field() -> FieldDescriptor<Page> {
    FieldDescriptor::new("title", ValueKind::Str)
        .slot(|p: &Page| Value::from(p.title.as_str()), set_title)
        .getter(|p: &Page| Value::from(p.title.as_str()), Visibility::Public)
        .setter(set_title, Visibility::Public)
}

impl Element for Page {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: Lazy<Schema<Page>> = Lazy::new(|| {
            Schema::builder("Page")
                .field(
                    FieldDescriptor::new("path", ValueKind::Str)
                        .public()
                        .key(1)
                        .slot(|p: &Page| Value::from(p.path.clone()), set_path),
                )
                .field(title_field())
                .build()
                .unwrap()
        });
        &SCHEMA
    }
}

/// Counter element: `path:views`.
#[derive(Debug, Clone, PartialEq, Default)]
struct Views {
    path: SmolStr,
    views: i64,
}

impl Element for Views {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: Lazy<Schema<Views>> = Lazy::new(|| {
            Schema::builder("Views")
                .field(
                    FieldDescriptor::new("path", ValueKind::Str)
                        .public()
                        .key(1)
                        .slot(
                            |v: &Views| Value::from(v.path.clone()),
                            |v, x| {
                                v.path = x.into_smol_str().unwrap_or_default();
                                Ok(())
                            },
                        ),
                )
                .field(
                    FieldDescriptor::new("views", ValueKind::I64)
                        .public()
                        .key(2)
                        .slot(
                            |v: &Views| Value::from(v.views),
                            |v, x| {
                                v.views = x.as_i64().unwrap_or_default();
                                Ok(())
                            },
                        ),
                )
                .build()
                .unwrap()
        });
        &SCHEMA
    }
}

const ENTRIES: usize = 1_000;

fn page(i: usize) -> Page {
    Page {
        path: format!("/p/{i:05}").into(),
        title: format!("page number {i}"),
    }
}

fn pages_family() -> ColumnFamily<Page> {
    let row = RowHandle::new("sites", "s1", Arc::new(MemoryStore::new()));
    ColumnFamily::builder("pages", row).build().unwrap()
}

fn views_family() -> ColumnFamily<Views> {
    let row = RowHandle::new("sites", "s1", Arc::new(MemoryStore::new()));
    ColumnFamily::builder("views", row)
        .incrementing()
        .build()
        .unwrap()
}

fn page_cells() -> Cells {
    let codec = RecordCodec::<Page>::new();
    (0..ENTRIES)
        .map(|i| {
            let p = page(i);
            (p.path.clone(), codec.encode(&p).unwrap())
        })
        .collect()
}

fn view_cells() -> Cells {
    (0..ENTRIES)
        .map(|i| (SmolStr::from(format!("/p/{i:05}")), (i as i64).to_le_bytes().to_vec()))
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════
// Group 1: Mutating the materialized view
// ═══════════════════════════════════════════════════════════════════════════

fn bench_mutation(c: &mut Criterion) {
    let mut group = c.benchmark_group("mutation");

    group.bench_function("add (ordinary, 1k)", |b| {
        b.iter_batched(
            pages_family,
            |mut family| {
                for i in 0..ENTRIES {
                    family.add(black_box(page(i)));
                }
                family
            },
            BatchSize::SmallInput,
        )
    });

    group.bench_function("add (counter, 1k)", |b| {
        b.iter_batched(
            views_family,
            |mut family| {
                for i in 0..ENTRIES {
                    family.add(black_box(Views {
                        path: format!("/p/{i:05}").into(),
                        views: i as i64,
                    }));
                }
                family
            },
            BatchSize::SmallInput,
        )
    });

    let mut family = pages_family();
    family.rebuild(&page_cells()).unwrap();
    group.bench_function("get", |b| {
        b.iter(|| family.get(black_box("/p/00500")))
    });

    group.bench_function("delta (1k sets)", |b| {
        let mut family = pages_family();
        family.add_all((0..ENTRIES).map(page));
        b.iter(|| family.delta().unwrap())
    });

    group.finish();
}

// ═══════════════════════════════════════════════════════════════════════════
// Group 2: Rebuilding from stored cells
// ═══════════════════════════════════════════════════════════════════════════

fn bench_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("rebuild");

    let cells = page_cells();
    group.bench_function("records (1k)", |b| {
        let mut family = pages_family();
        b.iter(|| family.rebuild(black_box(&cells)).unwrap())
    });

    let cells = view_cells();
    group.bench_function("counters (1k)", |b| {
        let mut family = views_family();
        b.iter(|| family.rebuild(black_box(&cells)).unwrap())
    });

    group.finish();
}

// ═══════════════════════════════════════════════════════════════════════════
// Group 3: Accessor dispatch
// ═══════════════════════════════════════════════════════════════════════════

fn bench_accessors(c: &mut Criterion) {
    let mut group = c.benchmark_group("accessors");
    let field = title_field();
    let accessor = resolve(&field, &[Operation::Read, Operation::Write]).unwrap();
    let mut target = page(7);

    group.bench_function("resolve", |b| {
        b.iter(|| resolve(black_box(&field), &[Operation::Read, Operation::Write]).unwrap())
    });

    group.bench_function("get_value (memoized)", |b| {
        b.iter(|| accessor.get_value(black_box(&target)).unwrap())
    });

    group.bench_function("set_value (memoized)", |b| {
        b.iter(|| {
            accessor
                .set_value(&mut target, black_box(Value::from("renamed")))
                .unwrap()
        })
    });

    group.finish();
}

// ─── Criterion Main ─────────────────────────────────────────────────────────

criterion_group!(benches, bench_mutation, bench_rebuild, bench_accessors);
criterion_main!(benches);
