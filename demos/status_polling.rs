//! 通过检查器轮询进度的演示
//! Polling progress through the inspector
//!
//! 运行 / Run: `cargo run --example status_polling`

use seqq::config::SchedulerConfig;
use seqq::error::Error;
use seqq::executor::AsyncExecutorFunc;
use seqq::operation::Operation;
use seqq::scheduler::Scheduler;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  tracing_subscriber::fmt().init();

  // 第二个操作故意失败，展示失败被记录后队列继续前进
  // The second operation fails on purpose to show the queue moving past a recorded failure
  let executor = AsyncExecutorFunc::new(|operation: Operation| async move {
    tokio::time::sleep(Duration::from_millis(400)).await;
    if operation.id % 3 == 2 {
      return Err(Error::execution("marketplace returned a login challenge"));
    }
    Ok(())
  });

  let config = SchedulerConfig::new().operation_cooldown(Duration::from_millis(100));
  let scheduler = Scheduler::new(config, executor)?;
  let inspector = scheduler.inspector();

  for _ in 0..4 {
    scheduler.submit_renew("alice@example.com", 10)?;
  }

  loop {
    let all = inspector.all_statuses();
    for (tenant, status) in &all {
      println!(
        "{tenant}: pending={} active={} completed={} current={:?}",
        status.queue_size,
        status.is_active,
        status.completed,
        status.current_operation.as_ref().map(|d| d.id)
      );
      if let Some(last) = &status.last_error {
        println!("  last error on #{}: {}", last.operation_id, last.message);
      }
    }
    println!(
      "in flight: {}/{}",
      inspector.executions_in_flight(),
      inspector.execution_capacity()
    );

    if all.values().all(|status| !status.is_active) {
      break;
    }
    tokio::time::sleep(Duration::from_millis(250)).await;
  }

  scheduler.shutdown().await?;
  Ok(())
}
