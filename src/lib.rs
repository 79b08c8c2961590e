//! SimFlow - 响应式仿真资源注册表
//!
//! 把一组命名的仿真资源（传感器、执行器、派生量）组织在单一注册表下，
//! 以事件总线串联值变更与动作触发，实现小型反应式仿真系统
//!
//! # 架构分层
//!
//! - **应用门面**: [`Application`]，对调用方的 Read/Write/Action/Subscribe 入口
//! - **注册表**: [`Storage`]，命名资源的所有者与生命周期协调者
//! - **事件总线**: [`EventBus`]，主题化的扇出通知，带投递超时
//! - **资源层**: 常量、静态可写、随机、正弦、计数、反馈、计算、动作
//!
//! # 特性
//!
//! - **能力显式**: 资源通过 `reader()` / `writer()` 声明可读可写
//! - **异步优先**: 基于 Tokio，每个产生值的资源独占一个更新循环
//! - **有界投递**: 迟钝的订阅者在超时后被跳过，不拖垮发布方

pub mod app;
pub mod error;
pub mod events;
pub mod resource;
pub mod storage;
pub mod types;

// 重新导出核心类型
pub use app::Application;
pub use error::{Result, SimFlowError};
pub use events::{listener, EventBus, EventBusConfig, Listener, Payload, Topic};
pub use resource::{
    Action, Computed, Constant, Increment, LinearFeedback, Random, SineWave, Static,
};
pub use storage::{Reader, Resource, Storage, StorageBuilder, Writer};
pub use types::{Numeric, Value, ValueKind};

/// 框架信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const FRAMEWORK_NAME: &str = "SimFlow";

/// 快速启动函数
pub async fn initialize() -> Result<()> {
    // 初始化日志系统
    tracing_subscriber::fmt::init();

    tracing::info!("🚀 Initializing {} v{}", FRAMEWORK_NAME, VERSION);
    tracing::info!("🧩 Resources: constant, static, random, sine, increment, feedback, computed, action");
    tracing::info!("⚡ Delivery: bounded per-listener timeout, slow subscribers are skipped");

    Ok(())
}
