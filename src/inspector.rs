//! 检查器模块
//! Inspector module
//!
//! 调度器状态的只读投影，供轮询客户端和监控使用
//! Read-only projection of scheduler state for polling clients and monitoring

use crate::operation::OperationDescriptor;
use crate::queue::LastError;
use crate::scheduler::SchedulerCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// 状态快照 - 一个租户当前进度的一致时间点读取
/// Status snapshot - a consistent point-in-time read of one tenant's progress
///
/// 纯读投影：生成快照绝不修改调度器状态，任意数量的并发调用方
/// 都可以在工作者运行时安全读取
/// Pure read projection: producing a snapshot never mutates scheduler state,
/// and any number of concurrent callers may read while workers are running
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
  /// 待处理操作数量（不含正在执行的那个）
  /// Count of pending operations (excluding the one in flight)
  pub queue_size: usize,
  /// 是否有操作在执行或等待执行
  /// Whether an operation is executing or waiting to execute
  pub is_active: bool,
  /// 正在执行的操作描述符
  /// Descriptor of the operation presently executing
  pub current_operation: Option<OperationDescriptor>,
  /// 已完成（成功或失败）的操作总数
  /// Lifetime count of finished operations (success or failure)
  pub completed: u64,
  /// 最近一次失败
  /// Most recent failure
  pub last_error: Option<LastError>,
}

/// 检查器 - 跨租户的只读观测入口
/// Inspector - read-only observation entry point across tenants
#[derive(Clone)]
pub struct Inspector {
  core: Arc<SchedulerCore>,
}

impl Inspector {
  pub(crate) fn new(core: Arc<SchedulerCore>) -> Self {
    Self { core }
  }

  /// 查询一个租户的状态快照
  /// Query one tenant's status snapshot
  pub fn status_of(&self, tenant_key: &str) -> StatusSnapshot {
    let tenants = self.core.tenants.lock().unwrap();
    tenants
      .get(tenant_key)
      .map(|state| state.snapshot())
      .unwrap_or_default()
  }

  /// 查询所有已知租户的状态快照
  /// Query status snapshots for every known tenant
  pub fn all_statuses(&self) -> HashMap<String, StatusSnapshot> {
    let tenants = self.core.tenants.lock().unwrap();
    tenants
      .iter()
      .map(|(tenant, state)| (tenant.clone(), state.snapshot()))
      .collect()
  }

  /// 已知租户列表（按字典序）
  /// List of known tenants (sorted)
  pub fn tenants(&self) -> Vec<String> {
    let tenants = self.core.tenants.lock().unwrap();
    let mut keys: Vec<_> = tenants.keys().cloned().collect();
    keys.sort();
    keys
  }

  /// 当前执行中的操作总数
  /// Total number of operations currently executing
  pub fn executions_in_flight(&self) -> usize {
    self.core.gate.in_flight()
  }

  /// 准入门槽位总数
  /// Total admission gate slots
  pub fn execution_capacity(&self) -> usize {
    self.core.gate.capacity()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::SchedulerConfig;
  use crate::executor::ExecutorFunc;
  use crate::scheduler::Scheduler;
  use std::time::Duration;

  #[tokio::test]
  async fn test_inspector_sees_known_tenants() {
    let config = SchedulerConfig::new().operation_cooldown(Duration::ZERO);
    let scheduler = Scheduler::new(config, ExecutorFunc::new(|_op| Ok(()))).unwrap();
    let inspector = scheduler.inspector();

    assert!(inspector.tenants().is_empty());
    assert_eq!(inspector.execution_capacity(), 2);

    scheduler.submit_renew("bob@example.com", 3).unwrap();
    scheduler.submit_renew("alice@example.com", 3).unwrap();

    let tenants = inspector.tenants();
    assert_eq!(
      tenants,
      vec!["alice@example.com".to_string(), "bob@example.com".to_string()]
    );

    let all = inspector.all_statuses();
    assert_eq!(all.len(), 2);
    assert!(all.contains_key("alice@example.com"));

    scheduler.shutdown().await.unwrap();
  }

  #[tokio::test]
  async fn test_unknown_tenant_snapshot_is_default() {
    let scheduler = Scheduler::new(
      SchedulerConfig::default(),
      ExecutorFunc::new(|_op| Ok(())),
    )
    .unwrap();
    let inspector = scheduler.inspector();
    assert_eq!(inspector.status_of("ghost@example.com"), StatusSnapshot::default());
  }
}
