use anyhow::Result;
use claims_verify::utils::logging;
use claims_verify::{App, Config};
use tracing::warn;

/// 128 + SIGINT
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化应用
    let app = App::initialize(config)?;

    // 第一次 Ctrl-C：尚未开始的配对不再调用 Oracle，已完成的结果照常写入报告
    // 第二次 Ctrl-C：立即退出
    let cancel = app.cancellation();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        warn!("⏹ 收到中断信号，剩余配对将被跳过（再次按 Ctrl-C 立即退出）");
        cancel.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("⏹ 再次收到中断信号，立即退出");
            std::process::exit(EXIT_INTERRUPTED);
        }
    });

    app.run().await?;

    Ok(())
}
