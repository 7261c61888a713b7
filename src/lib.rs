//! # Seqq
//!
//! 面向慢速、有状态浏览器自动化负载的多租户顺序调度器
//! Per-tenant sequential scheduler for slow, stateful browser automation workloads
//!
//! Seqq 把外部触发的、资源沉重的自动化操作（每个操作打开一个独立的
//! 浏览器会话、登录、完成一件事、关闭）串行化：同一账户同一时刻最多
//! 执行一个操作，不同账户的操作可以并行，全局还有一道准入门限制同时
//! 运行的操作总数。
//! Seqq serializes externally-triggered, resource-heavy automation operations
//! (each one opens a dedicated browser session, authenticates, performs one
//! task and closes): at most one operation executes at a time per account,
//! operations of different accounts run concurrently, and a system-wide
//! admission gate caps the total number running at once.
//!
//! ## 特性
//! ## Features
//!
//! - 同一租户严格 FIFO，绝无重叠执行
//!   - Strict per-tenant FIFO, never overlapping executions
//! - 全局准入门限制同时打开的浏览器数量
//!   - Global admission gate bounding simultaneously open browsers
//! - 惰性工作者生命周期：首次入队时启动，排空后退役，不会泄漏任务
//!   - Lazy worker lifecycle: started on first enqueue, retired when drained, no leaked tasks
//! - 提交与状态查询在有限时间内返回，与积压深度和执行延迟无关
//!   - Submission and status return in bounded time regardless of backlog or execution latency
//! - 失败被记录后队列继续前进；执行器崩溃不会杀死工作者或泄漏槽位
//!   - Failures are recorded and the queue moves on; executor panics never kill a worker or leak a slot
//! - 可选的每租户队列深度上限，防御失控调用方
//!   - Optional per-tenant queue depth limit against runaway callers
//!
//! ## 快速开始
//! ## Quick Start
//!
//! ```rust,no_run
//! use seqq::config::SchedulerConfig;
//! use seqq::executor::AsyncExecutorFunc;
//! use seqq::operation::Operation;
//! use seqq::scheduler::Scheduler;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!   // 执行器是打开浏览器并完成实际动作的外部过程
//!   // The executor is the external procedure that opens the browser and performs the action
//!   let executor = AsyncExecutorFunc::new(|operation: Operation| async move {
//!     println!("executing {} for {}", operation.kind.name(), operation.tenant_key);
//!     Ok(())
//!   });
//!
//!   let config = SchedulerConfig::new().max_concurrent_executions(2);
//!   let scheduler = Scheduler::new(config, executor)?;
//!
//!   // 提交立即返回，绝不阻塞在执行上
//!   // Submission returns immediately, never blocking on execution
//!   let queued = scheduler.submit_post(
//!     "alice@example.com",
//!     "City bike",
//!     "Red city bike, good condition",
//!     120.0,
//!     "images/bike.jpg",
//!   )?;
//!   println!("queued at position {}", queued.position);
//!
//!   // 进度只能通过轮询状态观察
//!   // Progress is observed only by polling status
//!   let status = scheduler.status_of("alice@example.com");
//!   println!("pending: {}, active: {}", status.queue_size, status.is_active);
//!
//!   scheduler.shutdown().await?;
//!   Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod gate;
pub mod inspector;
pub mod operation;
pub mod queue;
pub mod scheduler;
pub(crate) mod worker;

pub use config::SchedulerConfig;
pub use error::{Error, Result};
pub use executor::{AsyncExecutorFunc, Executor, ExecutorFunc};
pub use gate::AdmissionGate;
pub use inspector::{Inspector, StatusSnapshot};
pub use operation::{Operation, OperationDescriptor, OperationKind};
pub use queue::{LastError, WorkerState};
pub use scheduler::{EnqueueResult, Scheduler};
