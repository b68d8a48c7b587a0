use std::time::{Duration, Instant};

use tempfile::TempDir;

use ventq_coordinator::{Coordinator, CoordinatorConfig, QueueIdentity};
use ventq_core::MAX_EFFORT;
use ventq_worker::{Worker, WorkerConfig};

fn test_config(workers: u32, tasks: u32, qsize: usize) -> CoordinatorConfig {
    CoordinatorConfig {
        workers,
        tasks,
        qsize,
        worker_bin: "vq-worker".into(),
        time_unit: Duration::from_millis(1),
        collect_timeout: Some(Duration::from_millis(500)),
    }
}

fn worker_config(identity: &QueueIdentity, worker_id: u32) -> WorkerConfig {
    WorkerConfig {
        worker_id,
        task_queue: identity.task_queue.clone(),
        result_queue: identity.result_queue.clone(),
        time_unit: Duration::from_millis(1),
    }
}

#[tokio::test]
async fn test_three_workers_five_tasks() {
    let dir = TempDir::new().unwrap();
    let identity = QueueIdentity::in_dir(dir.path(), 1);
    let coordinator = Coordinator::with_identity(test_config(3, 5, 2), identity.clone());

    let (mut task_queue, mut result_queue) = coordinator.setup().unwrap();

    let workers: Vec<_> = (1..=3)
        .map(|id| tokio::spawn(Worker::new(worker_config(&identity, id)).run()))
        .collect();

    coordinator.distribute(&task_queue).await;
    coordinator.send_stop_tasks(&task_queue).await;
    task_queue.close();

    let summaries = coordinator.collect(&mut result_queue).await;
    assert_eq!(summaries.len(), 3);
    assert_eq!(summaries.iter().map(|s| s.tasks_done).sum::<u32>(), 5);

    // Five tasks, each worth 1..=MAX_EFFORT time units.
    let total: u64 = summaries.iter().map(|s| s.total_time).sum();
    assert!(total >= 5);
    assert!(total <= 5 * u64::from(MAX_EFFORT));

    for handle in workers {
        let summary = handle.await.unwrap().unwrap();
        assert!(summary.tasks_done <= 5);
    }

    identity.destroy().unwrap();
}

#[tokio::test]
async fn test_single_worker_no_tasks() {
    let dir = TempDir::new().unwrap();
    let identity = QueueIdentity::in_dir(dir.path(), 2);
    let coordinator = Coordinator::with_identity(test_config(1, 0, 1), identity.clone());

    let (mut task_queue, mut result_queue) = coordinator.setup().unwrap();

    let worker = tokio::spawn(Worker::new(worker_config(&identity, 1)).run());

    coordinator.distribute(&task_queue).await;
    coordinator.send_stop_tasks(&task_queue).await;
    task_queue.close();

    let summaries = coordinator.collect(&mut result_queue).await;
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].tasks_done, 0);
    assert_eq!(summaries[0].total_time, 0);

    let summary = worker.await.unwrap().unwrap();
    assert_eq!(summary, summaries[0]);

    identity.destroy().unwrap();
}

#[tokio::test]
async fn test_missing_worker_leaves_gap_without_hanging() {
    let dir = TempDir::new().unwrap();
    let identity = QueueIdentity::in_dir(dir.path(), 3);
    let mut config = test_config(2, 0, 1);
    config.collect_timeout = Some(Duration::from_millis(100));
    let coordinator = Coordinator::with_identity(config, identity.clone());

    let (mut task_queue, mut result_queue) = coordinator.setup().unwrap();

    // Only one of the two expected workers ever shows up.
    let worker = tokio::spawn(Worker::new(worker_config(&identity, 1)).run());

    coordinator.send_stop_tasks(&task_queue).await;
    task_queue.close();

    let start = Instant::now();
    let summaries = coordinator.collect(&mut result_queue).await;
    assert_eq!(summaries.len(), 1);
    assert!(start.elapsed() < Duration::from_secs(5));

    worker.await.unwrap().unwrap();
    identity.destroy().unwrap();
}

#[tokio::test]
async fn test_run_reaps_every_spawned_process_and_destroys_queues() {
    let dir = TempDir::new().unwrap();
    let identity = QueueIdentity::in_dir(dir.path(), 6);

    // `true` exits without ever connecting, so every collection slot is a
    // gap; the run must still finish, reap both processes, and tear down.
    let mut config = test_config(2, 0, 2);
    config.worker_bin = "true".into();
    config.collect_timeout = Some(Duration::from_millis(100));

    let coordinator = Coordinator::with_identity(config, identity.clone());
    let report = coordinator.run().await.unwrap();

    assert!(report.summaries.is_empty());
    assert_eq!(report.reaped.len(), 2);
    assert!(report
        .reaped
        .iter()
        .all(|(_, status)| matches!(status, Some(s) if s.success())));

    assert!(!identity.task_queue.exists());
    assert!(!identity.result_queue.exists());
}

#[tokio::test]
async fn test_run_cleans_up_after_spawn_failure() {
    let dir = TempDir::new().unwrap();
    let identity = QueueIdentity::in_dir(dir.path(), 7);

    let mut config = test_config(2, 3, 1);
    config.worker_bin = "/nonexistent/vq-worker".into();

    let coordinator = Coordinator::with_identity(config, identity.clone());
    assert!(coordinator.run().await.is_err());

    // Teardown runs on the failure path too.
    assert!(!identity.task_queue.exists());
    assert!(!identity.result_queue.exists());
}

#[tokio::test]
async fn test_setup_rejects_invalid_config() {
    let dir = TempDir::new().unwrap();
    let identity = QueueIdentity::in_dir(dir.path(), 4);
    let coordinator = Coordinator::with_identity(test_config(0, 5, 1), identity.clone());

    assert!(coordinator.setup().is_err());

    // Nothing may be created before validation passes.
    assert!(!identity.task_queue.exists());
    assert!(!identity.result_queue.exists());
}

#[tokio::test]
async fn test_setup_replaces_stale_queues() {
    let dir = TempDir::new().unwrap();
    let identity = QueueIdentity::in_dir(dir.path(), 5);

    // Remnants of an earlier run with the same identity.
    std::fs::write(&identity.task_queue, b"stale").unwrap();
    std::fs::write(&identity.result_queue, b"stale").unwrap();

    let coordinator = Coordinator::with_identity(test_config(1, 0, 1), identity.clone());
    let (task_queue, result_queue) = coordinator.setup().unwrap();

    drop(task_queue);
    drop(result_queue);
    identity.destroy().unwrap();
}
