//! 估值查询服务
//!
//! 数据源获取 -> 失败时切换模拟数据 -> 组装序列 -> 均线 / 估值区间 / 状态

use anyhow::Result;
use chrono::NaiveDate;
use std::sync::Arc;

use super::history::assemble_series;
use super::indicators::compute_ma_set;
use super::mock::{history_start, MockSeriesGenerator};
use super::source::{DataSourceAdapter, FetchedHistory, MarketSymbol};
use super::valuation::{classify, cursor_position, derive_band};
use crate::config::clamp_history_years;
use crate::models::{ReportDisplay, StockReport, StockSnapshot};

/// 估值查询服务
pub struct ValuationService {
    source: Arc<dyn DataSourceAdapter>,
    generator: MockSeriesGenerator,
    history_years: u32,
}

impl ValuationService {
    pub fn new(source: Arc<dyn DataSourceAdapter>, history_years: u32) -> Self {
        let history_years = clamp_history_years(history_years);
        Self {
            source,
            generator: MockSeriesGenerator::new(history_years),
            history_years,
        }
    }

    pub fn source_label(&self) -> &'static str {
        self.source.source_label()
    }

    /// 查询截至 `end` 的估值报告
    ///
    /// 实时数据源失败（网络错误、代码不存在、无数据）时使用模拟数据，
    /// 报告中标记为模拟并附带提示，不向调用方返回错误
    pub async fn search(&self, symbol: &MarketSymbol, end: NaiveDate) -> Result<StockReport> {
        let code = symbol.sina();
        let start = history_start(end, self.history_years);
        log::info!("查询估值: {} [{} ~ {}]", code, start, end);

        let live = match self.source.fetch(symbol, start, end).await {
            Ok(fetched) => build_report(&code, fetched, None),
            Err(e) => Err(e),
        };

        let report = match live {
            Ok(report) => report,
            Err(e) => {
                log::warn!(
                    "{} 获取 {} 失败，使用模拟数据: {:#}",
                    self.source.source_label(),
                    code,
                    e
                );
                let advisory = format!(
                    "{}数据获取失败，当前展示为模拟数据，仅供参考（{}）",
                    self.source.source_label(),
                    e
                );
                let fetched = self.generator.generate(&code, end);
                build_report(&code, fetched, Some(advisory))?
            }
        };

        log::info!(
            "{} 估值完成: {} 现价 {:.2}（{}）",
            code,
            report.status,
            report.snapshot.current_price,
            report.snapshot.source
        );
        Ok(report)
    }
}

/// 由原始数据构造完整报告
pub fn build_report(
    symbol: &str,
    fetched: FetchedHistory,
    advisory: Option<String>,
) -> Result<StockReport> {
    let history = assemble_series(symbol, &fetched.price_records, &fetched.pe_records)?;
    let band = derive_band(&history, fetched.latest_pe);

    let latest = history.latest();
    let current_price = latest.close;
    let price_change = history
        .previous()
        .map_or(0.0, |prev| current_price - prev.close);
    let current_pe = fetched.latest_pe.or(latest.pe_ratio);

    let moving_averages = compute_ma_set(&history);
    let status = classify(current_price, &band);
    let cursor = cursor_position(current_price, &band);

    let snapshot = StockSnapshot {
        symbol: symbol.to_string(),
        display_name: fetched.display_name,
        current_price,
        price_change,
        current_pe,
        source: fetched.source,
        is_synthetic: fetched.is_synthetic,
        history,
        band,
    };
    let display = ReportDisplay::build(&snapshot, &moving_averages, status, cursor);

    Ok(StockReport {
        snapshot,
        moving_averages,
        status,
        cursor_position: cursor,
        advisory,
        display,
    })
}
