//! 操作模块
//! Operation module
//!
//! 定义了操作相关的数据结构和校验逻辑
//! Defines data structures and validation logic related to operations

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// 默认的续期数量
/// Default renewal count
pub const DEFAULT_RENEWAL_COUNT: u32 = 20;

// 进程内单调递增的操作 id，仅用于追踪和日志关联
// Process-local monotonically increasing operation id, used only for tracing and log correlation
static NEXT_OPERATION_ID: AtomicU64 = AtomicU64::new(1);

/// 操作类型 - 描述一个自动化操作要执行的动作
/// Operation kind - describes the action an automation operation performs
///
/// 新增类型不需要改动任何调度逻辑
/// Adding a kind requires no change to scheduling logic
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OperationKind {
  /// 发布一个商品帖子
  /// Publish a marketplace post
  Post {
    title: String,
    description: String,
    price: f64,
    image_path: String,
  },
  /// 续期已有的帖子
  /// Renew existing listings
  Renew { renewal_count: u32 },
}

impl OperationKind {
  /// 操作类型名称
  /// Operation kind name
  pub fn name(&self) -> &'static str {
    match self {
      Self::Post { .. } => "post",
      Self::Renew { .. } => "renew",
    }
  }

  /// 使用默认续期数量创建续期操作
  /// Create a renew operation with the default renewal count
  pub fn renew_default() -> Self {
    Self::Renew {
      renewal_count: DEFAULT_RENEWAL_COUNT,
    }
  }

  /// 校验操作负载
  /// Validate the operation payload
  ///
  /// 不合法的负载在入队之前被拒绝，绝不会被静默丢弃或部分入队
  /// Malformed payloads are rejected before enqueue, never silently dropped or partially enqueued
  pub fn validate(&self) -> Result<()> {
    match self {
      Self::Post {
        title,
        description,
        price,
        image_path,
      } => {
        if title.trim().is_empty() {
          return Err(Error::validation("post title must not be empty"));
        }
        if description.trim().is_empty() {
          return Err(Error::validation("post description must not be empty"));
        }
        if !price.is_finite() || *price < 0.0 {
          return Err(Error::validation(format!(
            "post price must be a non-negative number, got {price}"
          )));
        }
        if image_path.trim().is_empty() {
          return Err(Error::validation("post image reference must not be empty"));
        }
        Ok(())
      }
      Self::Renew { renewal_count } => {
        if *renewal_count == 0 {
          return Err(Error::validation("renewal count must be at least 1"));
        }
        Ok(())
      }
    }
  }
}

/// 操作描述符 - 操作的轻量标识，用于状态快照和失败记录
/// Operation descriptor - lightweight identity of an operation, used in status snapshots and failure records
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationDescriptor {
  /// 操作 id
  /// Operation id
  pub id: u64,
  /// 操作类型名称
  /// Operation kind name
  pub kind: String,
}

/// 表示一个排队执行的自动化工作单元
/// Represents one queued unit of automation work
///
/// 操作一经构造即不可变；队列按值持有操作，外部无法再修改
/// Operations are immutable once constructed; the queue holds them by value with no external mutation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Operation {
  /// 进程内唯一且单调分配的操作 id
  /// Unique, monotonically assigned per-process operation id
  pub id: u64,
  /// 所属租户（账户）标识，队列和顺序以此为作用域
  /// Owning tenant (account) identity; queue and ordering are scoped to it
  pub tenant_key: String,
  /// 操作类型和负载
  /// Operation kind and payload
  pub kind: OperationKind,
  /// 提交时间，仅用于可观测性，绝不参与调度决策
  /// Submission time, observability only, never a scheduling input
  pub submitted_at: DateTime<Utc>,
}

impl Operation {
  /// 创建新操作
  /// Create a new operation
  ///
  /// 负载在此处完成校验；返回错误时没有任何状态被修改
  /// The payload is validated here; on error no state has been touched
  pub fn new<T: AsRef<str>>(tenant_key: T, kind: OperationKind) -> Result<Self> {
    let tenant_key = tenant_key.as_ref();
    if tenant_key.trim().is_empty() {
      return Err(Error::validation("tenant key must not be empty"));
    }
    kind.validate()?;

    Ok(Self {
      id: NEXT_OPERATION_ID.fetch_add(1, Ordering::Relaxed),
      tenant_key: tenant_key.to_string(),
      kind,
      submitted_at: Utc::now(),
    })
  }

  /// 创建发布操作
  /// Create a post operation
  pub fn post<T: AsRef<str>>(
    tenant_key: T,
    title: impl Into<String>,
    description: impl Into<String>,
    price: f64,
    image_path: impl Into<String>,
  ) -> Result<Self> {
    Self::new(
      tenant_key,
      OperationKind::Post {
        title: title.into(),
        description: description.into(),
        price,
        image_path: image_path.into(),
      },
    )
  }

  /// 创建续期操作
  /// Create a renew operation
  pub fn renew<T: AsRef<str>>(tenant_key: T, renewal_count: u32) -> Result<Self> {
    Self::new(tenant_key, OperationKind::Renew { renewal_count })
  }

  /// 获取操作描述符
  /// Get the operation descriptor
  pub fn descriptor(&self) -> OperationDescriptor {
    OperationDescriptor {
      id: self.id,
      kind: self.kind.name().to_string(),
    }
  }
}
