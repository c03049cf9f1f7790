//! Range ingestion keeps going past failing dates.

mod common;

use std::time::Duration;

use common::{FIXTURE_CLUES, ScriptedTransport, date, ingestor, key};
use xword_ingest::error::AppError;
use xword_ingest::models::Stage;
use xword_ingest::pipeline::RangeRunner;

#[tokio::test]
async fn failing_day_does_not_stop_the_range() {
    let transport = ScriptedTransport::new().respond(date(3), 404, "not found");
    let (ingestor, store, transport) = ingestor(transport);

    let summary = RangeRunner::new(&ingestor, 0)
        .run(date(1), date(5))
        .await
        .unwrap();

    assert_eq!(summary.total(), 5);
    assert_eq!(summary.succeeded(), 4);
    assert_eq!(summary.exit_code(), 1);

    let failed = summary.failed();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].date, date(3));
    assert!(matches!(
        failed[0].result,
        Err(AppError::Fetch { status: 404, .. })
    ));

    for day in [1, 2, 4, 5] {
        assert_eq!(store.promoted(&key(day)).len(), FIXTURE_CLUES, "day {day}");
    }
    assert!(store.promoted(&key(3)).is_empty());
    assert_eq!(transport.requests().len(), 5);

    let stages: Vec<Stage> = store.failures().iter().map(|f| f.stage).collect();
    assert_eq!(stages, vec![Stage::Fetch, Stage::RangeIngest]);
    assert!(store.failures().iter().all(|f| f.puzzle_date == date(3)));
}

#[tokio::test]
async fn clean_range_exits_zero() {
    let (ingestor, store, _) = ingestor(ScriptedTransport::new());

    let summary = RangeRunner::new(&ingestor, 0)
        .run(date(1), date(2))
        .await
        .unwrap();

    assert_eq!(summary.exit_code(), 0);
    assert_eq!(store.promoted_total(), 2 * FIXTURE_CLUES);
}

#[tokio::test]
async fn reversed_range_is_rejected() {
    let (ingestor, store, transport) = ingestor(ScriptedTransport::new());

    let err = RangeRunner::new(&ingestor, 0)
        .run(date(5), date(1))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert!(transport.requests().is_empty());
    assert!(store.failures().is_empty());
}

#[tokio::test(start_paused = true)]
async fn delay_applies_between_dates_only() {
    let (ingestor, _, _) = ingestor(ScriptedTransport::new());
    let started = tokio::time::Instant::now();

    let summary = RangeRunner::new(&ingestor, 750)
        .run(date(1), date(3))
        .await
        .unwrap();

    assert_eq!(summary.succeeded(), 3);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(1500), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(2250), "{elapsed:?}");
}
