//! 应用门面
//!
//! 对外部调用方暴露 Read/Write/Action/Subscribe 的薄转发层；
//! 不属于核心，仅做委托

use crate::error::Result;
use crate::events::{EventBus, Listener, Payload, Topic};
use crate::storage::Storage;
use crate::types::Value;
use std::sync::Arc;

/// 面向外部调用方的应用门面
pub struct Application {
    storage: Arc<Storage>,
    events: Arc<EventBus>,
}

impl Application {
    /// 组合注册表与事件总线
    pub fn new(storage: Arc<Storage>, events: Arc<EventBus>) -> Self {
        Self { storage, events }
    }

    /// 读取命名资源的当前值
    pub async fn read(&self, resource: &str) -> Result<Value> {
        self.storage.read(resource).await
    }

    /// 向命名资源写入新值
    pub async fn write(&self, resource: &str, value: impl Into<Value>) -> Result<()> {
        self.storage.write(resource, value.into()).await
    }

    /// 触发动作事件；按总线契约尽力投递
    pub async fn action(&self, resource: &str, action: &str, payload: Payload) {
        self.events.emit(&Topic::action(resource, action), payload).await;
    }

    /// 观察资源的值变更通知
    pub async fn subscribe_changes(&self, resource: &str, listener: Listener) {
        self.events.subscribe(Topic::changed(resource), listener).await;
    }

    /// 取消值变更观察
    pub async fn unsubscribe_changes(&self, resource: &str, listener: &Listener) {
        self.events
            .unsubscribe(&Topic::changed(resource), listener)
            .await;
    }

    /// 观察动作通知
    pub async fn subscribe_action(&self, resource: &str, action: &str, listener: Listener) {
        self.events
            .subscribe(Topic::action(resource, action), listener)
            .await;
    }

    /// 取消动作观察
    pub async fn unsubscribe_action(&self, resource: &str, action: &str, listener: &Listener) {
        self.events
            .unsubscribe(&Topic::action(resource, action), listener)
            .await;
    }

    /// 启动注册表与全部资源；每次仿真运行恰好调用一次
    pub async fn start(&self) {
        self.storage.start(&self.events).await;
    }

    /// 停止全部资源；与 start 成对调用
    pub async fn stop(&self) {
        self.storage.stop().await;
    }
}
