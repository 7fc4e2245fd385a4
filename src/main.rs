use anyhow::Context;

use tutorcast::{config::Config, server, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();

    // 凭证缺失是致命的启动错误，直接退出
    let config = Config::from_env().context("加载配置失败")?;

    server::run(config).await
}
