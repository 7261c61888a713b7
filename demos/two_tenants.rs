//! 两个租户并行、租户内顺序执行的演示
//! Two tenants running in parallel while each tenant's operations stay sequential
//!
//! 运行 / Run: `cargo run --example two_tenants`

use seqq::config::SchedulerConfig;
use seqq::executor::AsyncExecutorFunc;
use seqq::operation::Operation;
use seqq::scheduler::Scheduler;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  tracing_subscriber::fmt()
    .with_max_level(tracing::Level::DEBUG)
    .init();

  // 真实部署中这里会打开浏览器会话并执行动作；演示里用延时代替
  // A real deployment opens a browser session here; the demo sleeps instead
  let executor = AsyncExecutorFunc::new(|operation: Operation| async move {
    println!(
      ">> executing {} #{} for {}",
      operation.kind.name(),
      operation.id,
      operation.tenant_key
    );
    tokio::time::sleep(Duration::from_millis(300)).await;
    println!("<< finished  #{}", operation.id);
    Ok(())
  });

  let config = SchedulerConfig::new()
    .max_concurrent_executions(2)
    .operation_cooldown(Duration::from_millis(100));
  let scheduler = Scheduler::new(config, executor)?;

  for i in 0..3 {
    scheduler.submit_post(
      "alice@example.com",
      format!("Road bike #{i}"),
      "Barely used",
      250.0,
      "images/bike.jpg",
    )?;
    scheduler.submit_renew("bob@example.com", 5)?;
  }

  // 等两个租户都排空
  // Wait until both tenants drain
  loop {
    let alice = scheduler.status_of("alice@example.com");
    let bob = scheduler.status_of("bob@example.com");
    if !alice.is_active && !bob.is_active {
      break;
    }
    tokio::time::sleep(Duration::from_millis(100)).await;
  }

  println!(
    "alice completed: {}, bob completed: {}",
    scheduler.status_of("alice@example.com").completed,
    scheduler.status_of("bob@example.com").completed
  );

  scheduler.shutdown().await?;
  Ok(())
}
