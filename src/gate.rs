//! 准入门模块
//! Admission gate module
//!
//! 进程级计数信号量，限制全体租户同时执行的操作数量
//! Process-wide counting semaphore bounding concurrently executing operations across all tenants

use crate::error::{Error, Result};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// 准入门 - 限制同时执行（浏览器打开）的操作数量
/// Admission gate - bounds how many operations may be executing (browser open) at once
///
/// 获取会挂起直到有空闲槽位；释放通过 RAII 完成，在包括崩溃在内的
/// 每条退出路径上都与先前的获取严格配对
/// Acquire suspends until a slot is free; release is RAII and strictly paired
/// with a prior acquire on every exit path, including panics
#[derive(Clone)]
pub struct AdmissionGate {
  slots: Arc<Semaphore>,
  capacity: usize,
}

impl AdmissionGate {
  /// 创建具有指定槽位数的准入门
  /// Create an admission gate with the given number of slots
  pub fn new(capacity: usize) -> Self {
    Self {
      slots: Arc::new(Semaphore::new(capacity)),
      capacity,
    }
  }

  /// 获取一个执行槽位（挂起等待，不自旋）
  /// Acquire one execution slot (suspends, does not spin)
  ///
  /// 调度器关闭后返回 [`Error::SchedulerClosed`]，唤醒所有等待者
  /// Returns [`Error::SchedulerClosed`] after the scheduler closes, waking all waiters
  pub async fn acquire(&self) -> Result<OwnedSemaphorePermit> {
    self
      .slots
      .clone()
      .acquire_owned()
      .await
      .map_err(|_| Error::SchedulerClosed)
  }

  /// 关闭准入门，唤醒所有阻塞的等待者
  /// Close the gate, waking all blocked waiters
  pub fn close(&self) {
    self.slots.close();
  }

  /// 槽位总数
  /// Total number of slots
  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// 当前空闲槽位数
  /// Currently available slots
  pub fn available(&self) -> usize {
    self.slots.available_permits()
  }

  /// 当前执行中的操作数量
  /// Number of operations currently executing
  pub fn in_flight(&self) -> usize {
    self.capacity - self.slots.available_permits()
  }
}
