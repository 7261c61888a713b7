//! 租户工作者模块
//! Tenant worker module
//!
//! 每个有待处理工作的租户一个后台控制循环，严格按顺序排空其队列，
//! 每次执行前获取准入门槽位，执行后释放
//! One background control loop per tenant with pending work, draining its
//! queue strictly in order, acquiring an admission slot before each execution
//! and releasing it afterwards
//!
//! ## 失败语义 / Failure semantics
//!
//! 失败的操作不会中止队列、不会自动重试，也不会阻塞同租户的后续
//! 操作；执行器内部的崩溃在工作者边界被捕获并转换为一条失败记录，
//! 绝不会杀死工作者循环或泄漏准入槽位
//! A failing operation does not abort the queue, is never retried
//! automatically and does not block the tenant's subsequent operations; a
//! panic inside the executor is caught at the worker boundary and converted
//! into a recorded failure, never allowed to kill the worker loop or leak an
//! admission slot

use crate::error::Error;
use crate::queue::WorkerState;
use crate::scheduler::SchedulerCore;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

/// 工作者控制循环
/// Worker control loop
///
/// 每次迭代：在注册表锁内取出队首操作；获取准入槽位（唯一的全局
/// 并发挂起点）；调用执行器；无条件释放槽位并记录结果；继续循环。
/// 队列被观察到为空时退役，与下一次入队的竞争由注册表锁裁决
/// Per iteration: pop the head under the registry lock; acquire an admission
/// slot (the sole suspension point governing system-wide concurrency); invoke
/// the executor; release the slot unconditionally and record the outcome;
/// loop. Retires once the queue is observed empty; the race with the next
/// enqueue is arbitrated by the registry lock
pub(crate) async fn run(core: Arc<SchedulerCore>, tenant_key: String) {
  tracing::debug!(tenant = %tenant_key, "tenant worker started");

  loop {
    // 关闭信号：完成当前操作后停止，积压留在原地
    // Shutdown signal: stop after the current operation, backlog stays in place
    if core.shutdown.is_cancelled() {
      let mut tenants = core.tenants.lock().unwrap();
      if let Some(state) = tenants.get_mut(&tenant_key) {
        state.worker = WorkerState::Idle;
      }
      break;
    }

    let next = {
      let mut tenants = core.tenants.lock().unwrap();
      let Some(state) = tenants.get_mut(&tenant_key) else {
        let err = Error::invariant(format!("worker running for unregistered tenant {tenant_key}"));
        tracing::error!(tenant = %tenant_key, error = %err, "worker loop aborted");
        break;
      };
      if state.current.is_some() {
        // 同一租户出现第二个排空者，破坏核心顺序保证
        // A second drainer for this tenant would break the core sequencing guarantee
        let err = Error::invariant(format!("operation already in flight for tenant {tenant_key}"));
        tracing::error!(tenant = %tenant_key, error = %err, "worker loop aborted");
        break;
      }
      match state.take_next() {
        Some(operation) => Some(operation),
        None => {
          state.worker = WorkerState::Terminating;
          None
        }
      }
    };

    let Some(operation) = next else {
      // 重新在锁内检查：与上面空观察竞争的提交由本工作者吸收，
      // 而不是留下一个已退役的工作者和未排空的队列
      // Re-check under the lock: a submit that raced the empty observation is
      // absorbed by this worker rather than leaving a retired worker behind an
      // undrained queue
      let mut tenants = core.tenants.lock().unwrap();
      if let Some(state) = tenants.get_mut(&tenant_key) {
        if !state.pending.is_empty() && state.worker == WorkerState::Terminating {
          state.worker = WorkerState::Draining;
          drop(tenants);
          continue;
        }
        state.worker = WorkerState::Idle;
      }
      tracing::debug!(tenant = %tenant_key, "tenant worker retired");
      break;
    };

    // 获取准入槽位；这是约束全局并发的唯一挂起点
    // Acquire an admission slot; the sole suspension point bounding global concurrency
    let permit = match core.gate.acquire().await {
      Ok(permit) => permit,
      Err(_) => {
        // 关闭在执行开始前关掉了准入门，操作原样放回队首
        // Shutdown closed the gate before execution began, the operation goes
        // back to the head of the queue unexecuted
        let mut tenants = core.tenants.lock().unwrap();
        if let Some(state) = tenants.get_mut(&tenant_key) {
          state.put_back(operation);
          state.worker = WorkerState::Idle;
        }
        break;
      }
    };

    let descriptor = operation.descriptor();
    let started = Instant::now();
    tracing::info!(
      tenant = %tenant_key,
      operation = descriptor.id,
      kind = %descriptor.kind,
      "operation executing"
    );

    // 执行器崩溃在此处被捕获；槽位许可是 RAII 的，任何退出路径都会释放
    // Executor panics are caught here; the slot permit is RAII and released on every exit path
    let result = AssertUnwindSafe(core.executor.execute(operation))
      .catch_unwind()
      .await;
    drop(permit);

    let outcome = match result {
      Ok(outcome) => outcome,
      Err(panic) => Err(Error::execution(format!(
        "executor panicked: {}",
        panic_message(&*panic)
      ))),
    };

    {
      let mut tenants = core.tenants.lock().unwrap();
      if let Some(state) = tenants.get_mut(&tenant_key) {
        match &outcome {
          Ok(()) => state.record_success(),
          Err(e) => state.record_failure(&descriptor, e.to_string()),
        }
      }
    }

    match &outcome {
      Ok(()) => tracing::info!(
        tenant = %tenant_key,
        operation = descriptor.id,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "operation completed"
      ),
      Err(e) => tracing::warn!(
        tenant = %tenant_key,
        operation = descriptor.id,
        error = %e,
        "operation failed"
      ),
    }

    // 同一租户相邻操作之间的冷却间隔
    // Cooldown between the tenant's consecutive operations
    let cooldown = core.config.operation_cooldown;
    if !cooldown.is_zero() {
      tokio::select! {
        _ = tokio::time::sleep(cooldown) => {}
        _ = core.shutdown.cancelled() => {}
      }
    }
  }

  tracing::debug!(tenant = %tenant_key, "tenant worker stopped");
}

/// 从 panic 负载中提取可读信息
/// Extract a readable message from a panic payload
fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
  if let Some(s) = panic.downcast_ref::<&str>() {
    (*s).to_string()
  } else if let Some(s) = panic.downcast_ref::<String>() {
    s.clone()
  } else {
    "unknown panic".to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_panic_message_extraction() {
    let static_panic: Box<dyn std::any::Any + Send> = Box::new("boom");
    assert_eq!(panic_message(&*static_panic), "boom");

    let string_panic: Box<dyn std::any::Any + Send> = Box::new("browser crashed".to_string());
    assert_eq!(panic_message(&*string_panic), "browser crashed");

    let opaque_panic: Box<dyn std::any::Any + Send> = Box::new(42u32);
    assert_eq!(panic_message(&*opaque_panic), "unknown panic");
  }
}
