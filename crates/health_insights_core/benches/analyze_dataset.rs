use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use health_insights_core::stub::FixedTextGenerator;
use health_insights_core::summarizer::summarize;
use health_insights_core::{
    AnalysisConfig, InsightEngine, NormalizeOptions, Normalizer, RawTable, ShapeHint,
};
use tokio::runtime::Builder;

/// A year of daily wide-form rows for all four metrics.
fn year_table() -> RawTable {
    let mut table = RawTable::new(["date", "sleep_hours", "heart_rate", "water_ml", "steps"]);
    let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).expect("date");
    for i in 0..365u32 {
        let date = start + chrono::Duration::days(i64::from(i));
        let wobble = f64::from(i % 7);
        table.push_row([
            date.format("%Y-%m-%d").to_string(),
            format!("{:.1}", 6.0 + wobble * 0.3),
            format!("{}", 62.0 + wobble),
            format!("{}", 1500.0 + wobble * 120.0),
            format!("{}", 6000.0 + wobble * 800.0),
        ]);
    }
    table
}

fn bench_normalize_and_summarize(c: &mut Criterion) {
    let table = year_table();
    let options = NormalizeOptions::default();
    c.bench_function("normalize_and_summarize_year", |b| {
        b.iter(|| {
            let dataset = Normalizer::normalize(&table, &options).expect("dataset");
            dataset
                .iter()
                .map(|s| summarize(s, Some(30)))
                .collect::<Vec<_>>()
        })
    });
}

fn bench_engine_with_stub(c: &mut Criterion) {
    let rt = Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime");
    let table = year_table();
    let engine = InsightEngine::with_generator(
        Arc::new(FixedTextGenerator::new("Steady week.")),
        AnalysisConfig::default(),
    );
    c.bench_function("analyze_table_stub_generator", |b| {
        b.to_async(&rt).iter(|| async {
            engine
                .analyze_table(&table, ShapeHint::Auto)
                .await
                .expect("result")
        })
    });
}

criterion_group!(benches, bench_normalize_and_summarize, bench_engine_with_stub);
criterion_main!(benches);
