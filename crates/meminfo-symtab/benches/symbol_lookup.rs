use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use meminfo_symtab::{DEFAULT_TABLE_CAPACITY, SlotId, SymbolTable};
use std::hint::black_box;

const FIELD_NAMES: [&str; 24] = [
    "Size",
    "KernelPageSize",
    "MMUPageSize",
    "Rss",
    "Pss",
    "Pss_Dirty",
    "Shared_Clean",
    "Shared_Dirty",
    "Private_Clean",
    "Private_Dirty",
    "Referenced",
    "Anonymous",
    "KSM",
    "LazyFree",
    "AnonHugePages",
    "ShmemPmdMapped",
    "FilePmdMapped",
    "Shared_Hugetlb",
    "Private_Hugetlb",
    "Swap",
    "SwapPss",
    "Locked",
    "THPeligible",
    "VmFlags",
];

fn ladder_lookup(key: &str) -> Option<SlotId> {
    FIELD_NAMES
        .iter()
        .position(|name| *name == key)
        .map(|i| SlotId(u32::try_from(i).expect("fits")))
}

fn bench_lookup(c: &mut Criterion) {
    let table = SymbolTable::preload(
        DEFAULT_TABLE_CAPACITY,
        FIELD_NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| (*name, SlotId(u32::try_from(i).expect("fits")))),
    )
    .expect("preload");

    let mut group = c.benchmark_group("field_lookup");
    group.throughput(Throughput::Elements(FIELD_NAMES.len() as u64));
    group.bench_function(BenchmarkId::new("symbol_table", FIELD_NAMES.len()), |b| {
        b.iter(|| {
            for name in FIELD_NAMES {
                black_box(table.lookup(black_box(name)));
            }
        });
    });
    group.bench_function(BenchmarkId::new("string_ladder", FIELD_NAMES.len()), |b| {
        b.iter(|| {
            for name in FIELD_NAMES {
                black_box(ladder_lookup(black_box(name)));
            }
        });
    });
    group.finish();
}

criterion_group!(benches, bench_lookup);
criterion_main!(benches);
