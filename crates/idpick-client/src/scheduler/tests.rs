use super::*;
use crate::testing::FakeServer;
use core::time::Duration;
use idpick_core::wire::StateResponse;
use tokio::time::sleep;

fn scheduler(server: &FakeServer) -> Scheduler {
    Scheduler::spawn(server.clone(), &ClientConfig::default())
}

#[test]
fn unselected_key_trims_filter_and_omits_empty_one() {
    assert_eq!(
        ReadKey::unselected(" 12 ", 0, 20),
        ReadKey::unselected("12", 0, 20)
    );
    assert_ne!(
        ReadKey::unselected("12", 0, 20),
        ReadKey::unselected("12", 20, 20)
    );
    assert_eq!(
        ReadKey::unselected("", 40, 20).query(),
        vec![("offset", "40".to_string()), ("limit", "20".to_string())]
    );
    assert_eq!(ReadKey::unselected("7", 0, 5).query()[0], ("filter", "7".to_string()));
    assert!(ReadKey::State.query().is_empty());
}

#[tokio::test(start_paused = true)]
async fn identical_reads_share_one_request() {
    let server = FakeServer::new(10);
    let scheduler = scheduler(&server);

    let a = scheduler.read(ReadKey::State);
    let b = scheduler.read(ReadKey::State);
    let c = scheduler.read(ReadKey::unselected("", 0, 5));
    assert_eq!(scheduler.pending_reads(), 2);

    let (a, b, c) = tokio::join!(a, b, c);
    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(c.unwrap()["items"], json!([1, 2, 3, 4, 5]));
    assert_eq!(server.get_count(), 2);
    assert_eq!(scheduler.pending_reads(), 0);
}

#[tokio::test(start_paused = true)]
async fn reads_wait_for_the_next_tick() {
    let server = FakeServer::new(10);
    let scheduler = scheduler(&server);

    let read = tokio::spawn(scheduler.read(ReadKey::State));
    sleep(Duration::from_millis(900)).await;
    assert_eq!(server.get_count(), 0);

    sleep(Duration::from_millis(200)).await;
    assert_eq!(server.get_count(), 1);
    let state: StateResponse = serde_json::from_value(read.await.unwrap().unwrap()).unwrap();
    assert_eq!(state.max_id, 10);
}

#[tokio::test(start_paused = true)]
async fn idle_scheduler_makes_no_requests() {
    let server = FakeServer::new(10);
    let _scheduler = scheduler(&server);
    sleep(Duration::from_secs(30)).await;
    assert_eq!(server.get_count(), 0);
    assert!(server.writes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn failure_reaches_every_waiter() {
    let server = FakeServer::new(10);
    server.fail_reads(true);
    let scheduler = scheduler(&server);

    let (a, b) = tokio::join!(
        scheduler.read(ReadKey::State),
        scheduler.read(ReadKey::State)
    );
    assert_eq!(a, Err(Error::Status { status: 503 }));
    assert_eq!(b, Err(Error::Status { status: 503 }));
    assert_eq!(server.get_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn dropped_caller_does_not_cancel_the_request() {
    let server = FakeServer::new(10);
    let scheduler = scheduler(&server);

    drop(scheduler.read(ReadKey::State));
    let kept = scheduler.read(ReadKey::State);
    assert!(kept.await.is_ok());
    assert_eq!(server.get_count(), 1);

    drop(scheduler.read(ReadKey::unselected("3", 0, 20)));
    sleep(Duration::from_millis(1_100)).await;
    assert_eq!(server.get_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn later_reads_get_a_fresh_request() {
    let server = FakeServer::new(10);
    let scheduler = scheduler(&server);

    assert!(scheduler.read(ReadKey::State).await.is_ok());
    assert!(scheduler.read(ReadKey::State).await.is_ok());
    assert_eq!(server.get_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn new_identifiers_flush_together_on_the_coarse_interval() {
    let server = FakeServer::new(10);
    let scheduler = scheduler(&server);

    assert!(scheduler.enqueue_add_item(12));
    assert!(scheduler.enqueue_add_item(11));
    assert!(!scheduler.enqueue_add_item(12));

    sleep(Duration::from_secs(5)).await;
    assert!(server.writes().is_empty());

    sleep(Duration::from_secs(6)).await;
    let writes = server.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].0, WriteMethod::Post);
    assert_eq!(writes[0].1, "/items/bulk");
    assert_eq!(writes[0].2, json!({"ids": [12, 11]}));
    assert_eq!(server.catalog().snapshot().extra_ids, vec![11, 12]);
}

#[tokio::test(start_paused = true)]
async fn only_the_latest_selection_is_sent() {
    let server = FakeServer::new(10);
    let scheduler = scheduler(&server);

    scheduler.enqueue_selection(&[1, 2]);
    scheduler.enqueue_selection(&[2, 1]);
    let generation = scheduler.enqueue_selection(&[3]);
    assert_eq!(generation, 3);
    assert!(scheduler.selection_pending());

    sleep(Duration::from_millis(1_100)).await;
    let writes = server.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].0, WriteMethod::Put);
    assert_eq!(writes[0].2, json!({"order": [3]}));
    assert_eq!(server.catalog().selection().order(), &[3]);
    assert!(!scheduler.selection_pending());
}

#[tokio::test(start_paused = true)]
async fn failed_selection_flush_is_swallowed_and_stays_pending() {
    let server = FakeServer::new(10);
    server.fail_writes(true);
    let scheduler = scheduler(&server);

    scheduler.enqueue_selection(&[4]);
    sleep(Duration::from_millis(1_100)).await;
    assert_eq!(server.writes().len(), 1);
    assert!(scheduler.selection_pending());

    // Not retried on its own.
    sleep(Duration::from_secs(3)).await;
    assert_eq!(server.writes().len(), 1);

    server.fail_writes(false);
    scheduler.enqueue_selection(&[4, 5]);
    sleep(Duration::from_secs(1)).await;
    assert!(!scheduler.selection_pending());
    assert_eq!(server.catalog().selection().order(), &[4, 5]);
}

#[tokio::test(start_paused = true)]
async fn shutdown_rejects_reads_and_flushes_writes() {
    let server = FakeServer::new(10);
    let scheduler = scheduler(&server);

    let pending = scheduler.read(ReadKey::State);
    assert!(scheduler.enqueue_add_item(50));
    scheduler.enqueue_selection(&[50, 2]);

    scheduler.shutdown().await;

    assert_eq!(pending.await, Err(Error::SchedulerClosed));
    assert_eq!(server.get_count(), 0);
    let snapshot = server.catalog().snapshot();
    assert_eq!(snapshot.extra_ids, vec![50]);
    assert_eq!(snapshot.selected_order, vec![50, 2]);

    assert_eq!(
        scheduler.read(ReadKey::State).await,
        Err(Error::SchedulerClosed)
    );
    assert!(!scheduler.enqueue_add_item(51));
}

#[tokio::test(start_paused = true)]
async fn shutdown_is_idempotent() {
    let server = FakeServer::new(10);
    let scheduler = scheduler(&server);
    scheduler.shutdown().await;
    scheduler.clone().shutdown().await;
    assert!(server.writes().is_empty());
}

#[tokio::test(start_paused = true)]
async fn stamp_predates_selection_acknowledged_mid_flight() {
    let server = FakeServer::new(10);
    server.delay_reads(Duration::from_millis(1_500));
    let scheduler = scheduler(&server);

    let read = tokio::spawn(scheduler.read_stamped(ReadKey::State));
    sleep(Duration::from_millis(1_100)).await;
    assert_eq!(server.get_count(), 1);
    assert_eq!(scheduler.enqueue_selection(&[3]), 1);

    let stamped = read.await.unwrap().unwrap();
    assert!(!scheduler.selection_pending());
    assert_eq!(server.catalog().selection().order(), &[3]);

    // The response was computed before the write and says so.
    let state: StateResponse = serde_json::from_value(stamped.value).unwrap();
    assert!(state.selected_order.is_empty());
    assert_eq!(stamped.acked_generation, 0);
    assert_eq!(scheduler.selection_generation(), 1);
}

#[tokio::test(start_paused = true)]
async fn queued_selection_is_flushed_before_reads_on_the_same_tick() {
    let server = FakeServer::new(10);
    server.delay_writes(Duration::from_millis(500));
    let config = ClientConfig {
        selection_interval: Duration::from_secs(10),
        ..ClientConfig::default()
    };
    let scheduler = Scheduler::spawn(server.clone(), &config);

    let generation = scheduler.enqueue_selection(&[2]);
    let page = scheduler
        .read_stamped(ReadKey::unselected("", 0, 3))
        .await
        .unwrap();

    assert_eq!(page.value["items"], json!([1, 3, 4]));
    assert_eq!(page.value["total"], json!(9));
    assert_eq!(page.acked_generation, generation);
    let writes = server.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].2, json!({"order": [2]}));

    sleep(Duration::from_secs(10)).await;
    assert_eq!(server.writes().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn selection_after_shutdown_keeps_generation() {
    let server = FakeServer::new(10);
    let scheduler = scheduler(&server);
    assert_eq!(scheduler.enqueue_selection(&[1]), 1);
    scheduler.shutdown().await;
    assert!(!scheduler.selection_pending());

    assert_eq!(scheduler.enqueue_selection(&[1, 2]), 1);
    assert_eq!(scheduler.selection_generation(), 1);
    assert!(!scheduler.selection_pending());
    assert_eq!(server.catalog().selection().order(), &[1]);
}
