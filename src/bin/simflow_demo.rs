//! SimFlow 演示程序 - 罐温仿真
//!
//! 装配一个小型反应式仿真：正弦罐温、可写设定点、
//! 派生的越限判断和一个有界随机源，循环打印当前值直到 Ctrl+C

use simflow::{
    Application, Computed, EventBus, Numeric, Random, SineWave, Static, Storage, Value,
};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

/// 程序入口点
#[tokio::main]
async fn main() {
    // 初始化日志系统
    tracing_subscriber::fmt::init();

    // 运行主逻辑并处理错误
    match run_main().await {
        Ok(_) => {}
        Err(e) => {
            tracing::error!("❌ 程序运行失败: {}", e);
            std::process::exit(1);
        }
    }
}

/// 主要逻辑函数
async fn run_main() -> anyhow::Result<()> {
    let events = Arc::new(EventBus::default());
    let storage = Storage::builder()
        .resource(
            "tank_temperature",
            SineWave::new(0.15, 50.0, 50.0, Duration::from_millis(50)),
        )
        .resource("setpoint", Static::new(25i32))
        .resource(
            "is_above",
            Computed::new(
                false,
                ["tank_temperature", "setpoint"],
                |storage: Arc<Storage>| async move {
                    let setpoint = read_as_f32(&storage, "setpoint").await;
                    let tank = read_as_f32(&storage, "tank_temperature").await;

                    Value::Bool(tank > setpoint)
                },
            ),
        )
        .resource("rand", Random::int(0, 20, Duration::from_millis(100)))
        .build();

    let app = Application::new(storage, events);
    app.start().await;
    tracing::info!("simulation started, press Ctrl+C to stop");

    let mut ticker = tokio::time::interval(Duration::from_millis(100));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = ticker.tick() => {
                let tank = app.read("tank_temperature").await?;
                let setpoint = app.read("setpoint").await?;
                let is_above = app.read("is_above").await?;
                let rand = app.read("rand").await?;

                print!(
                    "\rtank_temperature={} setpoint={} is_above={} rand={}    ",
                    tank, setpoint, is_above, rand
                );
                std::io::stdout().flush()?;
            }
        }
    }

    println!();
    app.stop().await;
    tracing::info!("simulation stopped");

    Ok(())
}

/// 按 f32 读取数值资源；读取失败或非数值按 0.0 处理
async fn read_as_f32(storage: &Arc<Storage>, resource: &str) -> f32 {
    storage
        .read(resource)
        .await
        .ok()
        .and_then(|value| Numeric::try_from(value).ok())
        .map(|numeric| numeric.as_f32())
        .unwrap_or(0.0)
}
