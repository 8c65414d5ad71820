use chrono_tz::America::New_York;
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use slotwatch::grid::infer_grid;
use slotwatch::parser::parse_date_and_times_in_year;
use slotwatch::visibility::{SlotVisibility, infer_visible_window};

fn bench_grid(c: &mut Criterion) {
    let labels: Vec<String> = (0..24)
        .map(|i| {
            if i % 3 == 0 {
                format!("{}:{:02} PM", 5 + i / 4, (i % 4) * 15)
            } else {
                String::new()
            }
        })
        .collect();
    c.bench_function("infer_grid sparse evening row", |b| {
        b.iter(|| infer_grid(black_box("2025-08-03"), black_box(&labels), &New_York))
    });
}

fn bench_visibility(c: &mut Criterion) {
    let slots: Vec<SlotVisibility> = (0..40)
        .map(|i| {
            let time = format!("{:02}:{:02}:00", 11 + i / 4, (i % 4) * 15);
            SlotVisibility::new(time, (5..30).contains(&i))
        })
        .collect();
    c.bench_function("infer_visible_window clipped band", |b| {
        b.iter(|| infer_visible_window(black_box("2025-08-03"), black_box(&slots)))
    });
}

fn bench_parser(c: &mut Criterion) {
    c.bench_function("parse_date_and_times", |b| {
        b.iter(|| {
            parse_date_and_times_in_year(
                black_box("Sunday, August 3, 2025 8:15 PM 8:30 PM 8:45 PM"),
                2025,
            )
        })
    });
}

criterion_group!(benches, bench_grid, bench_visibility, bench_parser);
criterion_main!(benches);
