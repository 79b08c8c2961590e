//! 有界随机采样资源
//!
//! 周期性从有界分布抽样：整数闭区间、浮点半开区间或抛硬币

use crate::error::Result;
use crate::events::{EventBus, Payload, Topic};
use crate::resource::UpdateLoop;
use crate::storage::{Reader, Resource, Storage};
use crate::types::Value;
use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// 抽样范围：构造时固定值的类型
#[derive(Debug, Clone, Copy)]
enum Range {
    Int { min: i32, max: i32 },
    Float { min: f32, max: f32 },
    Bool,
}

impl Range {
    /// 抽取一个样本
    fn sample(&self) -> Value {
        let mut rng = rand::thread_rng();

        match self {
            Range::Int { min, max } => Value::Int(rng.gen_range(*min..=*max)),
            Range::Float { min, max } => Value::Float(min + rng.gen::<f32>() * (max - min)),
            Range::Bool => Value::Bool(rng.gen_bool(0.5)),
        }
    }

    /// 首个样本产生前的默认值
    fn initial(&self) -> Value {
        match self {
            Range::Int { .. } => Value::Int(0),
            Range::Float { .. } => Value::Float(0.0),
            Range::Bool => Value::Bool(false),
        }
    }
}

/// 周期性有界随机生成器
pub struct Random {
    range: Range,
    interval: Duration,
    /// 当前值
    current: Arc<RwLock<Value>>,
    /// 活动的更新循环
    active: Mutex<Option<UpdateLoop>>,
}

impl Random {
    fn new(range: Range, interval: Duration) -> Self {
        Self {
            range,
            interval,
            current: Arc::new(RwLock::new(range.initial())),
            active: Mutex::new(None),
        }
    }

    /// 整数闭区间 [min, max]；要求 min <= max
    pub fn int(min: i32, max: i32, interval: Duration) -> Self {
        Self::new(Range::Int { min, max }, interval)
    }

    /// 浮点半开区间 [min, max)
    pub fn float(min: f32, max: f32, interval: Duration) -> Self {
        Self::new(Range::Float { min, max }, interval)
    }

    /// 抛硬币
    pub fn bool(interval: Duration) -> Self {
        Self::new(Range::Bool, interval)
    }
}

#[async_trait]
impl Resource for Random {
    async fn start(&self, name: &str, _storage: Arc<Storage>, events: Arc<EventBus>) {
        debug!("random '{}' started", name);

        let name = name.to_string();
        let range = self.range;
        let period = self.interval;
        let current = Arc::clone(&self.current);

        let update = UpdateLoop::spawn(move |mut shutdown| async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = shutdown.recv() => break,
                    _ = ticker.tick() => {
                        let value = range.sample();
                        *current.write().await = value;

                        events
                            .emit(
                                &Topic::changed(&name),
                                Payload::Changed { resource: name.clone(), value },
                            )
                            .await;
                    }
                }
            }
        });

        *self.active.lock().await = Some(update);
    }

    async fn stop(&self) {
        if let Some(update) = self.active.lock().await.take() {
            update.stop().await;
        }
    }

    fn reader(&self) -> Option<&dyn Reader> {
        Some(self)
    }
}

#[async_trait]
impl Reader for Random {
    async fn read(&self) -> Result<Value> {
        Ok(*self.current.read().await)
    }
}
