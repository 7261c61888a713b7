//! 租户队列模块
//! Tenant queue module
//!
//! 每个租户一份的有序待处理积压及其实时进度状态
//! Per-tenant ordered backlog of pending operations plus that tenant's live progress state

use crate::inspector::StatusSnapshot;
use crate::operation::{Operation, OperationDescriptor};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::task::JoinHandle;

/// 租户工作者状态
/// Tenant worker state
///
/// 状态迁移只发生在注册表锁内：首次入队时 `Idle → Draining`，
/// 队列被观察到为空后 `Draining → Terminating → Idle`；
/// 同一把锁裁决退役与下一次入队之间的竞争，保证工作者不多不少恰好一个
/// Transitions happen only under the registry lock: `Idle → Draining` on first
/// enqueue, `Draining → Terminating → Idle` once the queue is observed empty;
/// the same lock arbitrates the retire/enqueue race so there is never zero and
/// never two workers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerState {
  /// 未实例化或已退役
  /// Not instantiated / retired
  Idle,
  /// 正在逐个取出并执行操作
  /// Actively popping and executing operations
  Draining,
  /// 已观察到队列为空，即将注销
  /// Queue observed empty, about to deregister
  Terminating,
}

/// 最近一次失败的记录
/// Record of the most recent failure
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LastError {
  /// 失败操作的 id
  /// Id of the failed operation
  pub operation_id: u64,
  /// 失败操作的类型名称
  /// Kind name of the failed operation
  pub kind: String,
  /// 失败详情
  /// Failure detail
  pub message: String,
  /// 失败时间
  /// Failure time
  pub failed_at: DateTime<Utc>,
}

/// 租户状态 - 一个租户的待处理队列和进度计数
/// Tenant state - one tenant's pending queue and progress counters
///
/// 只有配对的 `submit` 调用和该租户的工作者可以修改这些字段，
/// 读取方通过注册表锁获得一致的时间点快照
/// Only the pairing `submit` call and the tenant's own worker mutate these
/// fields; readers take a consistent point-in-time snapshot under the registry lock
pub struct TenantState {
  /// 待处理操作，插入顺序即执行顺序（严格 FIFO，无重排，无优先级）
  /// Pending operations, insertion order = execution order (strict FIFO, no reordering, no priority)
  pub(crate) pending: VecDeque<Operation>,
  /// 当前执行中的操作描述符
  /// Descriptor of the operation presently executing
  pub(crate) current: Option<OperationDescriptor>,
  /// 已完成（成功或失败）的操作计数，单调递增
  /// Monotonically increasing count of finished operations (success or failure)
  pub(crate) completed: u64,
  /// 最近一次失败，被更晚的失败覆盖
  /// Most recent failure, overwritten by a later failure
  pub(crate) last_error: Option<LastError>,
  /// 工作者生命周期状态
  /// Worker lifecycle state
  pub(crate) worker: WorkerState,
  /// 工作者任务句柄，关闭时用于等待其结束
  /// Worker task handle, awaited during shutdown
  pub(crate) handle: Option<JoinHandle<()>>,
}

impl TenantState {
  /// 创建新的租户状态
  /// Create a new tenant state
  pub(crate) fn new() -> Self {
    Self {
      pending: VecDeque::new(),
      current: None,
      completed: 0,
      last_error: None,
      worker: WorkerState::Idle,
      handle: None,
    }
  }

  /// 取出队首操作并标记为当前执行中
  /// Pop the head operation and mark it as currently executing
  pub(crate) fn take_next(&mut self) -> Option<Operation> {
    let operation = self.pending.pop_front()?;
    self.current = Some(operation.descriptor());
    Some(operation)
  }

  /// 把一个已取出但尚未开始执行的操作放回队首
  /// Put back an operation that was popped but never started executing
  pub(crate) fn put_back(&mut self, operation: Operation) {
    self.current = None;
    self.pending.push_front(operation);
  }

  /// 记录成功结果
  /// Record a successful outcome
  pub(crate) fn record_success(&mut self) {
    self.completed += 1;
    self.current = None;
  }

  /// 记录失败结果
  /// Record a failed outcome
  pub(crate) fn record_failure(&mut self, descriptor: &OperationDescriptor, message: String) {
    self.completed += 1;
    self.current = None;
    self.last_error = Some(LastError {
      operation_id: descriptor.id,
      kind: descriptor.kind.clone(),
      message,
      failed_at: Utc::now(),
    });
  }

  /// 是否有工作者挂靠且存在在执行或待执行的工作
  /// Whether a worker is attached and work is executing or waiting to execute
  ///
  /// 关闭丢弃积压后工作者已退役，残留的待处理操作不再算作活跃
  /// After shutdown abandons a backlog the worker is retired, so leftover
  /// pending operations no longer count as active
  pub(crate) fn is_active(&self) -> bool {
    self.worker != WorkerState::Idle && (self.current.is_some() || !self.pending.is_empty())
  }

  /// 生成状态快照
  /// Produce a status snapshot
  pub(crate) fn snapshot(&self) -> StatusSnapshot {
    StatusSnapshot {
      queue_size: self.pending.len(),
      is_active: self.is_active(),
      current_operation: self.current.clone(),
      completed: self.completed,
      last_error: self.last_error.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::operation::OperationKind;

  fn op(tenant: &str) -> Operation {
    Operation::new(tenant, OperationKind::renew_default()).unwrap()
  }

  #[test]
  fn test_fifo_order() {
    let mut state = TenantState::new();
    let a = op("t");
    let b = op("t");
    let c = op("t");
    let (ida, idb, idc) = (a.id, b.id, c.id);
    state.pending.push_back(a);
    state.pending.push_back(b);
    state.pending.push_back(c);

    assert_eq!(state.take_next().unwrap().id, ida);
    state.record_success();
    assert_eq!(state.take_next().unwrap().id, idb);
    state.record_success();
    assert_eq!(state.take_next().unwrap().id, idc);
    state.record_success();
    assert!(state.take_next().is_none());
    assert_eq!(state.completed, 3);
  }

  #[test]
  fn test_take_next_sets_current() {
    let mut state = TenantState::new();
    let operation = op("t");
    let id = operation.id;
    state.pending.push_back(operation);

    assert!(state.current.is_none());
    let popped = state.take_next().unwrap();
    assert_eq!(state.current.as_ref().unwrap().id, id);
    assert_eq!(popped.id, id);

    state.record_success();
    assert!(state.current.is_none());
    assert_eq!(state.completed, 1);
  }

  #[test]
  fn test_put_back_preserves_order() {
    let mut state = TenantState::new();
    let a = op("t");
    let b = op("t");
    let (ida, idb) = (a.id, b.id);
    state.pending.push_back(a);
    state.pending.push_back(b);

    let popped = state.take_next().unwrap();
    state.put_back(popped);
    assert!(state.current.is_none());
    assert_eq!(state.take_next().unwrap().id, ida);
    state.record_success();
    assert_eq!(state.take_next().unwrap().id, idb);
  }

  #[test]
  fn test_record_failure_keeps_queue_alive() {
    let mut state = TenantState::new();
    let operation = op("t");
    state.pending.push_back(operation);
    state.pending.push_back(op("t"));

    let popped = state.take_next().unwrap();
    let descriptor = popped.descriptor();
    state.record_failure(&descriptor, "session expired".to_string());

    assert_eq!(state.completed, 1);
    let last = state.last_error.as_ref().unwrap();
    assert_eq!(last.operation_id, descriptor.id);
    assert_eq!(last.message, "session expired");
    // 失败不会阻塞后续操作
    // A failure does not block subsequent operations
    assert!(state.take_next().is_some());
  }

  #[test]
  fn test_snapshot_excludes_current_from_queue_size() {
    let mut state = TenantState::new();
    state.worker = WorkerState::Draining;
    state.pending.push_back(op("t"));
    state.pending.push_back(op("t"));
    state.take_next();

    let snap = state.snapshot();
    assert_eq!(snap.queue_size, 1);
    assert!(snap.is_active);
    assert!(snap.current_operation.is_some());
    assert_eq!(snap.completed, 0);
  }

  #[test]
  fn test_idle_state_inactive() {
    let state = TenantState::new();
    assert!(!state.is_active());
    assert_eq!(state.worker, WorkerState::Idle);
    let snap = state.snapshot();
    assert!(!snap.is_active);
    assert_eq!(snap.queue_size, 0);
  }

  #[test]
  fn test_abandoned_backlog_is_not_active() {
    let mut state = TenantState::new();
    state.worker = WorkerState::Draining;
    state.pending.push_back(op("t"));
    assert!(state.is_active());

    // 工作者退役后残留的积压不算活跃，快照仍然报告其大小
    // A backlog left behind by a retired worker is not active; the snapshot still reports its size
    state.worker = WorkerState::Idle;
    assert!(!state.is_active());
    let snap = state.snapshot();
    assert!(!snap.is_active);
    assert_eq!(snap.queue_size, 1);
  }
}
