//! Throughput of the master clock and the frame loop.

use criterion::{criterion_group, criterion_main, Criterion};
use famicore_core::Console;

fn nop_rom() -> Vec<u8> {
    let mut prg = vec![0xEA; 32 * 1024];
    prg[0x7FFC] = 0x00;
    prg[0x7FFD] = 0x80;
    let mut image = vec![0x4E, 0x45, 0x53, 0x1A, 2, 1, 0x00, 0x00];
    image.extend_from_slice(&[0; 8]);
    image.extend_from_slice(&prg);
    image.extend_from_slice(&[0; 8 * 1024]);
    image
}

fn bench_frame(c: &mut Criterion) {
    let rom = nop_rom();
    c.bench_function("run_frame_idle", |b| {
        let mut console = Console::new(&rom).unwrap();
        b.iter(|| console.run_frame());
    });

    c.bench_function("run_frame_rendering", |b| {
        let mut console = Console::new(&rom).unwrap();
        {
            use famicore_cpu::CpuBus;
            console.bus_mut().io.write(0x2001, 0x18);
        }
        b.iter(|| console.run_frame());
    });
}

criterion_group!(benches, bench_frame);
criterion_main!(benches);
