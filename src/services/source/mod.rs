//! 行情数据源
//!
//! 数据源只负责返回原始日线收盘价、日度市盈率和股票名称，失败时由上层切换到模拟数据
//!
//! ## 数据来源
//! - 新浪财经：实时行情（名称）、日K线（收盘价），不提供历史市盈率
//! - Tushare：daily / daily_basic / stock_basic，含滚动市盈率
//! - 离线模式：始终失败，直接使用模拟数据

mod sina;
mod symbol;
mod tushare;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{DataSourceConfig, ProviderKind};
use crate::models::{RawPeRecord, RawPriceRecord};

pub use sina::SinaSource;
pub use symbol::MarketSymbol;
pub use tushare::TushareSource;

/// 一次抓取的原始结果
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedHistory {
    pub price_records: Vec<RawPriceRecord>,
    pub pe_records: Vec<RawPeRecord>,
    pub display_name: String,
    /// 最新市盈率
    pub latest_pe: Option<f64>,
    /// 数据来源标签
    pub source: String,
    /// 是否为模拟数据
    pub is_synthetic: bool,
}

/// 数据源适配器
#[async_trait]
pub trait DataSourceAdapter: Send + Sync {
    /// 数据来源标签
    fn source_label(&self) -> &'static str;

    /// 获取 [start, end] 区间的日线与市盈率
    async fn fetch(
        &self,
        symbol: &MarketSymbol,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchedHistory>;
}

/// 离线数据源：不访问网络，始终失败
pub struct OfflineSource;

#[async_trait]
impl DataSourceAdapter for OfflineSource {
    fn source_label(&self) -> &'static str {
        "离线"
    }

    async fn fetch(
        &self,
        symbol: &MarketSymbol,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<FetchedHistory> {
        bail!("未启用实时数据源，无法获取 {}", symbol)
    }
}

/// 按配置创建数据源
pub fn build_source(config: &DataSourceConfig) -> Result<Arc<dyn DataSourceAdapter>> {
    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .build()?;

    let source: Arc<dyn DataSourceAdapter> = match config.provider {
        ProviderKind::Sina => Arc::new(SinaSource::new(client)),
        ProviderKind::Tushare => match config.tushare_token.as_deref() {
            Some(token) if !token.is_empty() => Arc::new(TushareSource::new(client, token)),
            _ => {
                log::warn!("未配置 Tushare Token，改用新浪财经数据源");
                Arc::new(SinaSource::new(client))
            }
        },
        ProviderKind::Mock => Arc::new(OfflineSource),
    };

    log::info!("数据源: {}", source.source_label());
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_source_by_provider() {
        let mut config = DataSourceConfig::default();
        assert_eq!(build_source(&config).unwrap().source_label(), "新浪财经");

        config.provider = ProviderKind::Tushare;
        assert_eq!(build_source(&config).unwrap().source_label(), "新浪财经");

        config.tushare_token = Some("token".to_string());
        assert_eq!(build_source(&config).unwrap().source_label(), "Tushare");

        config.provider = ProviderKind::Mock;
        assert_eq!(build_source(&config).unwrap().source_label(), "离线");
    }

    #[tokio::test]
    async fn test_offline_source_always_fails() {
        let symbol = MarketSymbol::parse("600000").unwrap();
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        assert!(OfflineSource.fetch(&symbol, day, day).await.is_err());
    }
}
