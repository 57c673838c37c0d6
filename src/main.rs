//! 股票估值后端服务
//!
//! 根据近三年市盈率分位区间判断股价低估 / 合理 / 高估，并给出多周期均线
//! 数据来源：新浪财经、Tushare；不可用时使用模拟数据

mod config;   // 配置加载
mod handlers; // HTTP 请求处理器
mod models;   // 数据模型定义
mod services; // 业务逻辑服务
mod state;    // 共享状态

use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use std::io;

use crate::config::AppConfig;
use crate::services::source::build_source;
use crate::services::stock_service::ValuationService;
use crate::state::AppState;

/// 应用程序入口
#[actix_web::main]
async fn main() -> io::Result<()> {
    let config = AppConfig::load();

    // 初始化日志系统，RUST_LOG 优先于配置文件
    env_logger::init_from_env(Env::default().default_filter_or(config.log.level.as_str()));
    for note in &config.load_notes {
        log::info!("{}", note);
    }

    let source = build_source(&config.data_source)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    let state = web::Data::new(AppState::new(ValuationService::new(
        source,
        config.data_source.history_years,
    )));

    let bind_addr = config.bind_addr();
    log::info!("启动估值服务，监听 {}", bind_addr);

    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default()) // 请求日志
            .configure(handlers::config)
    });
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server.bind(bind_addr)?.run().await
}
