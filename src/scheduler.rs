//! 调度器模块
//! Scheduler module
//!
//! 进程级注册表，把租户标识映射到其队列与工作者，并对外提供
//! 提交、状态查询、取消和关闭接口
//! Process-wide registry mapping tenant identity to its queue and worker,
//! exposing submission, status, cancellation and shutdown
//!
//! ## 并发纪律 / Concurrency discipline
//!
//! 租户映射表由单把互斥锁守护，所有为某租户"创建或挂靠"工作者的
//! 决定都是这把锁内的一个原子步骤，因此两个几乎同时到达的新租户
//! 提交绝不会派生出两个工作者；工作者退役与下一次入队之间的竞争
//! 也由同一把锁裁决
//! The tenant map is guarded by a single mutex; every create-or-attach
//! decision for a tenant is one atomic step under that lock, so two
//! near-simultaneous submissions for a fresh tenant never spawn two workers,
//! and the worker-retire/next-enqueue race is arbitrated by the same lock
//!
//! 锁从不跨越 `await` 持有，因此提交和状态查询的耗时与队列深度
//! 和执行器延迟无关
//! The lock is never held across an `await`, so submission and status calls
//! return in bounded time regardless of queue depth or executor latency

use crate::config::SchedulerConfig;
use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::gate::AdmissionGate;
use crate::inspector::{Inspector, StatusSnapshot};
use crate::operation::{Operation, OperationKind};
use crate::queue::{TenantState, WorkerState};
use crate::worker;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// 提交结果
/// Enqueue result
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnqueueResult {
  /// 被分配的操作 id
  /// Assigned operation id
  pub operation_id: u64,
  /// 排在该操作之前的操作数量（包含正在执行的那个）
  /// Number of operations ahead of it (including the one in flight)
  pub position: usize,
  /// 入队后该租户的待处理队列长度
  /// Tenant's pending queue length after the insert
  pub queue_size_after: usize,
}

/// 调度器共享核心，被所有工作者和检查器持有
/// Shared scheduler core, held by every worker and inspector
pub(crate) struct SchedulerCore {
  /// 租户映射表 - 整个系统里唯一需要跨任意并发调用方互斥的状态
  /// Tenant map - the one piece of state requiring mutual exclusion across arbitrary callers
  pub(crate) tenants: Mutex<HashMap<String, TenantState>>,
  /// 全局准入门
  /// Global admission gate
  pub(crate) gate: AdmissionGate,
  /// 执行自动化动作的外部协作方
  /// External collaborator performing the automation action
  pub(crate) executor: Arc<dyn Executor>,
  /// 调度器配置
  /// Scheduler configuration
  pub(crate) config: SchedulerConfig,
  /// 关闭信号
  /// Shutdown signal
  pub(crate) shutdown: tokio_util::sync::CancellationToken,
}

/// 多租户顺序调度器
/// Multi-tenant sequential scheduler
///
/// 同一租户的操作严格按提交顺序逐个执行；不同租户的操作可以并行，
/// 受全局准入门限制。跨租户不保证任何顺序：当租户 A 抢槽位失败时，
/// 租户 B 更晚提交的操作可能先执行——这是设计使然，不是缺陷
/// Operations of one tenant execute strictly in submission order, one at a
/// time; operations of different tenants may run concurrently, bounded by the
/// global admission gate. No cross-tenant ordering is guaranteed: a
/// later-submitted operation of tenant B may start before an earlier one of
/// tenant A when A loses the race for a free slot - intentional, not a bug
#[derive(Clone)]
pub struct Scheduler {
  core: Arc<SchedulerCore>,
}

impl Scheduler {
  /// 创建新的调度器
  /// Create a new scheduler
  pub fn new<E>(config: SchedulerConfig, executor: E) -> Result<Self>
  where
    E: Executor + 'static,
  {
    config.validate()?;
    let gate = AdmissionGate::new(config.max_concurrent_executions);
    Ok(Self {
      core: Arc::new(SchedulerCore {
        tenants: Mutex::new(HashMap::new()),
        gate,
        executor: Arc::new(executor),
        config,
        shutdown: tokio_util::sync::CancellationToken::new(),
      }),
    })
  }

  /// 提交一个操作
  /// Submit an operation
  ///
  /// 把操作追加到其租户的积压里；若该租户当前没有工作者，在同一个
  /// 原子步骤里恰好启动一个。立即返回，从不阻塞在执行上
  /// Appends the operation to its tenant's backlog; if the tenant has no
  /// worker, exactly one is started within the same atomic step. Returns
  /// immediately and never blocks on execution
  ///
  /// 必须在 Tokio 运行时内调用（工作者作为任务被派生）
  /// Must be called inside a Tokio runtime (workers are spawned as tasks)
  pub fn submit(&self, operation: Operation) -> Result<EnqueueResult> {
    if self.core.shutdown.is_cancelled() {
      return Err(Error::SchedulerClosed);
    }
    // 反序列化得到的操作可能绕过构造器，入队前重新校验
    // A deserialized operation may bypass the constructor, re-validate before enqueue
    if operation.tenant_key.trim().is_empty() {
      return Err(Error::validation("tenant key must not be empty"));
    }
    operation.kind.validate()?;

    let tenant_key = operation.tenant_key.clone();
    let operation_id = operation.id;

    let mut tenants = self.core.tenants.lock().unwrap();
    let state = tenants
      .entry(tenant_key.clone())
      .or_insert_with(TenantState::new);

    if let Some(limit) = self.core.config.max_queue_depth_per_tenant {
      if state.pending.len() >= limit {
        return Err(Error::capacity(tenant_key, state.pending.len(), limit));
      }
    }

    let position = state.pending.len() + usize::from(state.current.is_some());
    state.pending.push_back(operation);
    let queue_size_after = state.pending.len();

    if state.worker == WorkerState::Idle {
      state.worker = WorkerState::Draining;
      let handle = tokio::spawn(worker::run(Arc::clone(&self.core), tenant_key.clone()));
      state.handle = Some(handle);
      tracing::debug!(tenant = %tenant_key, "tenant worker spawned");
    }

    tracing::debug!(
      tenant = %tenant_key,
      operation = operation_id,
      queue_size = queue_size_after,
      "operation enqueued"
    );

    Ok(EnqueueResult {
      operation_id,
      position,
      queue_size_after,
    })
  }

  /// 提交一个发布操作
  /// Submit a post operation
  pub fn submit_post<T: AsRef<str>>(
    &self,
    tenant_key: T,
    title: impl Into<String>,
    description: impl Into<String>,
    price: f64,
    image_path: impl Into<String>,
  ) -> Result<EnqueueResult> {
    self.submit(Operation::post(
      tenant_key,
      title,
      description,
      price,
      image_path,
    )?)
  }

  /// 提交一个续期操作
  /// Submit a renew operation
  pub fn submit_renew<T: AsRef<str>>(
    &self,
    tenant_key: T,
    renewal_count: u32,
  ) -> Result<EnqueueResult> {
    self.submit(Operation::new(
      tenant_key,
      OperationKind::Renew { renewal_count },
    )?)
  }

  /// 查询一个租户的状态快照
  /// Query a tenant's status snapshot
  ///
  /// 一致的时间点读取；未见过的租户返回全零的空闲快照，
  /// 无副作用，也绝不阻塞在运行中的操作上
  /// Consistent point-in-time read; a never-seen tenant yields a zeroed idle
  /// snapshot with no side effects, and the call never blocks on a running operation
  pub fn status_of(&self, tenant_key: &str) -> StatusSnapshot {
    let tenants = self.core.tenants.lock().unwrap();
    tenants
      .get(tenant_key)
      .map(TenantState::snapshot)
      .unwrap_or_default()
  }

  /// 丢弃一个租户所有尚未开始的操作，返回丢弃数量
  /// Drop all not-yet-started operations of a tenant, returning how many were dropped
  ///
  /// 正在执行的操作不受影响，照常结束
  /// Any in-flight operation is unaffected and finishes normally
  pub fn cancel_pending(&self, tenant_key: &str) -> usize {
    let mut tenants = self.core.tenants.lock().unwrap();
    match tenants.get_mut(tenant_key) {
      Some(state) => {
        let dropped = state.pending.len();
        state.pending.clear();
        if dropped > 0 {
          tracing::info!(tenant = %tenant_key, dropped, "pending operations cancelled");
        }
        dropped
      }
      None => 0,
    }
  }

  /// 获取检查器
  /// Get an inspector
  pub fn inspector(&self) -> Inspector {
    Inspector::new(Arc::clone(&self.core))
  }

  /// 优雅关闭：通知所有工作者在完成当前操作后停止，并等待它们结束
  /// Graceful shutdown: signal all workers to stop after their current
  /// operation completes and wait for their termination
  ///
  /// 仅用于进程收尾，不是稳态操作；剩余的待处理操作被留在原地丢弃
  /// Teardown only, not a steady-state operation; remaining pending
  /// operations are left behind
  pub async fn shutdown(&self) -> Result<()> {
    if self.core.shutdown.is_cancelled() {
      return Ok(());
    }
    tracing::info!("scheduler shutting down");
    self.core.shutdown.cancel();
    // 关闭准入门，唤醒正在等待槽位的工作者
    // Close the gate to wake workers blocked on a slot
    self.core.gate.close();

    let handles: Vec<_> = {
      let mut tenants = self.core.tenants.lock().unwrap();
      tenants
        .iter_mut()
        .filter_map(|(tenant, state)| state.handle.take().map(|h| (tenant.clone(), h)))
        .collect()
    };

    for (tenant, handle) in handles {
      match tokio::time::timeout(self.core.config.shutdown_timeout, handle).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
          tracing::warn!(tenant = %tenant, error = %e, "tenant worker join failed")
        }
        Err(_) => {
          tracing::warn!(tenant = %tenant, "tenant worker did not stop within shutdown timeout")
        }
      }
    }

    tracing::info!("scheduler shutdown complete");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::executor::ExecutorFunc;
  use std::time::Duration;

  fn noop_scheduler(config: SchedulerConfig) -> Scheduler {
    Scheduler::new(config, ExecutorFunc::new(|_op| Ok(()))).unwrap()
  }

  #[test]
  fn test_invalid_config_rejected() {
    let config = SchedulerConfig::new().max_concurrent_executions(0);
    assert!(Scheduler::new(config, ExecutorFunc::new(|_op| Ok(()))).is_err());
  }

  #[tokio::test]
  async fn test_submit_reports_position_and_size() {
    let config = SchedulerConfig::new().operation_cooldown(Duration::ZERO);
    let scheduler = noop_scheduler(config);

    let first = scheduler.submit_renew("alice@example.com", 5).unwrap();
    assert_eq!(first.queue_size_after, 1);

    let second = scheduler.submit_renew("alice@example.com", 5).unwrap();
    // 第二个操作前面至少还有一个未完成的操作
    // At least one unfinished operation is ahead of the second one
    assert!(second.position >= 1);

    scheduler.shutdown().await.unwrap();
  }

  #[tokio::test]
  async fn test_status_of_unknown_tenant_is_zeroed() {
    let scheduler = noop_scheduler(SchedulerConfig::default());
    let snap = scheduler.status_of("never-seen@example.com");
    assert_eq!(snap.queue_size, 0);
    assert!(!snap.is_active);
    assert!(snap.current_operation.is_none());
    assert_eq!(snap.completed, 0);
    assert!(snap.last_error.is_none());
  }

  #[tokio::test]
  async fn test_submit_after_shutdown_rejected() {
    let scheduler = noop_scheduler(SchedulerConfig::default());
    scheduler.shutdown().await.unwrap();
    let err = scheduler.submit_renew("t", 1).unwrap_err();
    assert!(matches!(err, Error::SchedulerClosed));
  }

  #[tokio::test]
  async fn test_shutdown_is_idempotent() {
    let scheduler = noop_scheduler(SchedulerConfig::default());
    scheduler.shutdown().await.unwrap();
    scheduler.shutdown().await.unwrap();
  }

  #[tokio::test]
  async fn test_malformed_operation_never_touches_queue() {
    let scheduler = noop_scheduler(SchedulerConfig::default());
    let err = scheduler
      .submit_post("alice@example.com", "", "desc", 1.0, "img.jpg")
      .unwrap_err();
    assert!(err.is_rejection());

    let snap = scheduler.status_of("alice@example.com");
    assert_eq!(snap.queue_size, 0);
    assert!(!snap.is_active);
  }

  #[tokio::test]
  async fn test_cancel_pending_unknown_tenant() {
    let scheduler = noop_scheduler(SchedulerConfig::default());
    assert_eq!(scheduler.cancel_pending("nobody@example.com"), 0);
  }
}
