use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use table_codec::{DecodeTable, Decoder, EncodeTable, Encoder, TrailPolicy};

// EUC-style synthetic table: ASCII single bytes, leads 0xA1..=0xFE,
// trails 0xA1..=0xFE, every pair mapped into the CJK range.
fn bench_decode_table() -> DecodeTable {
    let single: Vec<u16> = (0u16..256)
        .map(|b| if b < 0x80 { b } else { 0xFFFD })
        .collect();
    let leads: Vec<u8> = (0xA1u8..=0xFE).collect();
    let span = (0xFE - 0xA1 + 1) as usize;

    let mut index1 = vec![0xFFFFu16; 256];
    for (row, &lead) in leads.iter().enumerate() {
        let block = row / 16;
        index1[lead as usize] = ((block as u16) << 4) | (row % 16) as u16;
    }
    let blocks = leads.len().div_ceil(16);
    let mut index2 = vec![0xFFFDu16; blocks * 16 * span];
    for row in 0..leads.len() {
        for t in 0..span {
            index2[row * span + t] = (0x4E00 + (row * span + t) % 0x5000) as u16;
        }
    }

    DecodeTable::new(
        single, index1, index2, &leads, 0xF, 4, 0xA1, 0xFE, 0xFFFF,
        TrailPolicy::Substitute,
    )
    .unwrap()
}

fn bench_encode_table() -> EncodeTable {
    // One row per high byte; ASCII singles plus a mapped CJK row.
    let mut index1 = vec![512u16; 256];
    index1[0x00] = 0;
    index1[0x4E] = 256;
    let mut index2 = vec![0u16; 768];
    for low in 0..0x80usize {
        index2[low] = low as u16;
    }
    for low in 0..256usize {
        index2[256 + low] = 0xA1A1 + low as u16;
    }
    EncodeTable::new(index1, index2, Vec::new(), 0xFF00, 0xFF, 8).unwrap()
}

fn mixed_input(size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut i = 0usize;
    while data.len() + 2 <= size {
        if i % 3 == 0 {
            data.push(b'A' + (i % 26) as u8);
        } else {
            data.push(0xA1 + (i % 0x5E) as u8);
            data.push(0xA1 + (i % 0x5E) as u8);
        }
        i += 1;
    }
    data
}

fn bench_decode(c: &mut Criterion) {
    let table = bench_decode_table();
    let mut group = c.benchmark_group("decode");

    for size in [256, 1024, 4096, 16384].iter() {
        let data = mixed_input(*size);
        let mut out = vec![0u16; data.len()];
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| {
                let mut decoder = Decoder::new(&table);
                decoder.decode(black_box(data), black_box(&mut out))
            });
        });
    }
    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let table = bench_encode_table();
    let mut group = c.benchmark_group("encode");

    for size in [256, 1024, 4096, 16384].iter() {
        let units: Vec<u16> = (0..*size)
            .map(|i| {
                if i % 3 == 0 {
                    0x0041 + (i % 26) as u16
                } else {
                    0x4E00 + (i % 256) as u16
                }
            })
            .collect();
        let mut out = vec![0u8; units.len() * 2];
        group.throughput(Throughput::Bytes((*size * 2) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &units, |b, units| {
            b.iter(|| {
                let mut encoder = Encoder::new(&table);
                encoder.encode(black_box(units), black_box(&mut out))
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_decode, bench_encode);
criterion_main!(benches);
