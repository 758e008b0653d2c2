use criterion::{black_box, criterion_group, criterion_main, Criterion};
use regler::{broadcast, Arg, ParamMap, Scale};

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("ParamMap::get() log", |b| {
        let freq = ParamMap::new(20.0, 20000.0, Scale::Log);
        b.iter(|| freq.get(black_box(0.5)))
    });

    c.bench_function("broadcast() mixed args", |b| {
        b.iter(|| {
            broadcast(black_box(vec![
                Arg::from(vec![1.0, 2.0, 3.0, 4.0]),
                Arg::from(0.5),
                Arg::from(vec![0.0, 1.0]),
            ]))
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
