//! 正弦波生成资源
//!
//! 值是墙钟时间的纯函数：amplitude * sin(2π · frequency · t) + offset，
//! 每个节拍重新求值

use crate::error::Result;
use crate::events::{EventBus, Payload, Topic};
use crate::resource::UpdateLoop;
use crate::storage::{Reader, Resource, Storage};
use crate::types::Value;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// 周期性正弦波生成器（float32 值）
pub struct SineWave {
    /// 频率（Hz）
    frequency: f64,
    /// 振幅
    amplitude: f64,
    /// 直流偏置
    offset: f64,
    /// 重采样间隔
    interval: Duration,
    /// 当前样本
    current: Arc<RwLock<f32>>,
    /// 活动的更新循环
    active: Mutex<Option<UpdateLoop>>,
}

impl SineWave {
    /// 创建正弦波生成器
    pub fn new(frequency: f64, amplitude: f64, offset: f64, interval: Duration) -> Self {
        Self {
            frequency,
            amplitude,
            offset,
            interval,
            current: Arc::new(RwLock::new(0.0)),
            active: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Resource for SineWave {
    async fn start(&self, name: &str, _storage: Arc<Storage>, events: Arc<EventBus>) {
        debug!("sine wave '{}' started", name);

        let name = name.to_string();
        let frequency = self.frequency;
        let amplitude = self.amplitude;
        let offset = self.offset;
        let period = self.interval;
        let current = Arc::clone(&self.current);

        let update = UpdateLoop::spawn(move |mut shutdown| async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = shutdown.recv() => break,
                    _ = ticker.tick() => {
                        let t = chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0) as f64 / 1e9;
                        let sample =
                            (amplitude * (2.0 * std::f64::consts::PI * frequency * t).sin() + offset) as f32;

                        *current.write().await = sample;

                        events
                            .emit(
                                &Topic::changed(&name),
                                Payload::Changed {
                                    resource: name.clone(),
                                    value: Value::Float(sample),
                                },
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
impl Reader for SineWave {
    async fn read(&self) -> Result<Value> {
        Ok(Value::Float(*self.current.read().await))
    }
}
