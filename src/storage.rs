//! 资源注册表
//!
//! 持有固定的名称到资源映射（构造后成员不可变，无需加锁），
//! 按能力分派读写调用，并在进程边界驱动资源生命周期。
//! 注册表从不越过能力契约触碰资源内部

use crate::error::{Result, SimFlowError};
use crate::events::EventBus;
use crate::types::Value;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// 读能力
#[async_trait]
pub trait Reader: Send + Sync {
    /// 读取当前值；值在资源私有锁下写入，读到的总是完整值
    async fn read(&self) -> Result<Value>;
}

/// 写能力
#[async_trait]
pub trait Writer: Send + Sync {
    /// 写入新值；类型不一致时拒绝且不改变状态
    async fn write(&self, value: Value) -> Result<()>;
}

/// 资源生命周期契约
///
/// `start`/`stop` 括住资源的活动生命周期；括号之外的读写未定义，
/// 由注册表的生命周期契约负责阻止。能力以显式访问器声明
#[async_trait]
pub trait Resource: Send + Sync {
    /// 绑定注册名、注册表与事件总线，并启动更新循环（如有）
    async fn start(&self, name: &str, storage: Arc<Storage>, events: Arc<EventBus>);

    /// 退订、向循环发出终止信号并等待其退出，随后清除绑定引用
    async fn stop(&self);

    /// 读能力声明
    fn reader(&self) -> Option<&dyn Reader> {
        None
    }

    /// 写能力声明
    fn writer(&self) -> Option<&dyn Writer> {
        None
    }
}

/// 资源注册表
pub struct Storage {
    /// 名称到资源的固定映射
    memory: HashMap<String, Arc<dyn Resource>>,
}

impl Storage {
    /// 从既有映射创建注册表
    pub fn new(memory: HashMap<String, Arc<dyn Resource>>) -> Arc<Self> {
        Arc::new(Self { memory })
    }

    /// 构造器入口
    pub fn builder() -> StorageBuilder {
        StorageBuilder::default()
    }

    /// 启动所有注册资源；跨资源顺序未定义
    ///
    /// 资源的 start 不得假设同伴已启动：对同伴的读取可能返回默认/零初始值
    pub async fn start(self: &Arc<Self>, events: &Arc<EventBus>) {
        for (name, resource) in &self.memory {
            debug!("starting resource '{}'", name);
            resource
                .start(name, Arc::clone(self), Arc::clone(events))
                .await;
        }

        info!("storage started with {} resources", self.memory.len());
    }

    /// 停止所有注册资源；跨资源顺序未定义
    pub async fn stop(&self) {
        for (name, resource) in &self.memory {
            debug!("stopping resource '{}'", name);
            resource.stop().await;
        }

        info!("storage stopped");
    }

    /// 读取命名资源的当前值
    ///
    /// 名称未注册或缺少读能力时返回 `NotReadable`；
    /// 资源自身的错误被包装而非替换
    pub async fn read(&self, resource: &str) -> Result<Value> {
        match self.memory.get(resource).and_then(|entry| entry.reader()) {
            Some(reader) => reader
                .read()
                .await
                .map_err(|source| SimFlowError::read(resource, source)),
            None => Err(SimFlowError::not_readable(resource)),
        }
    }

    /// 向命名资源写入新值
    ///
    /// 名称未注册或缺少写能力时返回 `NotWritable`；
    /// 值类型由资源自身独立校验
    pub async fn write(&self, resource: &str, value: Value) -> Result<()> {
        match self.memory.get(resource).and_then(|entry| entry.writer()) {
            Some(writer) => writer
                .write(value)
                .await
                .map_err(|source| SimFlowError::write(resource, source)),
            None => Err(SimFlowError::not_writable(resource)),
        }
    }
}

/// 注册表构造器
#[derive(Default)]
pub struct StorageBuilder {
    memory: HashMap<String, Arc<dyn Resource>>,
}

impl StorageBuilder {
    /// 注册一个命名资源
    pub fn resource(mut self, name: &str, resource: impl Resource + 'static) -> Self {
        self.memory.insert(name.to_string(), Arc::new(resource));
        self
    }

    /// 完成构造；此后成员不可变
    pub fn build(self) -> Arc<Storage> {
        Storage::new(self.memory)
    }
}
