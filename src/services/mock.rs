//! 模拟行情生成
//!
//! 仅在实时数据源失败时使用。以股票代码字符编码之和为种子，
//! 生成近若干年的工作日收盘价与市盈率，同一代码每次生成的结果完全一致。

use chrono::{Datelike, Duration, Months, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::source::FetchedHistory;
use crate::models::{RawPeRecord, RawPriceRecord};

/// 模拟数据来源标签
pub const MOCK_SOURCE_LABEL: &str = "模拟数据";

/// 基准价下限与种子偏移范围
const BASE_PRICE: f64 = 20.0;
const BASE_PRICE_SPREAD: u64 = 180;
/// 正弦波动幅度（相对基准价）与周期（交易日）
const WAVE_AMPLITUDE: f64 = 0.2;
const WAVE_PERIOD: f64 = 120.0;
/// 随机扰动幅度（相对基准价）
const NOISE_AMPLITUDE: f64 = 0.05;
/// 最低价格
const MIN_PRICE: f64 = 1.0;
/// 模拟 EPS 基数及其随机偏移
const PE_DIVISOR: f64 = 20.0;
const PE_DIVISOR_JITTER: f64 = 2.0;

/// 股票代码的字符编码之和
pub fn symbol_seed(symbol: &str) -> u64 {
    symbol.chars().map(|c| c as u64).sum()
}

/// 模拟行情生成器
#[derive(Debug, Clone)]
pub struct MockSeriesGenerator {
    history_years: u32,
}

impl MockSeriesGenerator {
    pub fn new(history_years: u32) -> Self {
        Self { history_years }
    }

    /// 生成截至 `end` 的模拟行情
    pub fn generate(&self, symbol: &str, end: NaiveDate) -> FetchedHistory {
        let seed = symbol_seed(symbol);
        let mut rng = StdRng::seed_from_u64(seed);
        let base = BASE_PRICE + (seed % BASE_PRICE_SPREAD) as f64;
        let start = history_start(end, self.history_years);

        let mut price_records = Vec::new();
        let mut pe_records = Vec::new();
        let mut date = start;
        let mut index = 0usize;

        while date <= end {
            if !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
                let wave = (index as f64 * std::f64::consts::TAU / WAVE_PERIOD).sin()
                    * base
                    * WAVE_AMPLITUDE;
                let noise = rng.gen_range(-1.0_f64..1.0) * base * NOISE_AMPLITUDE;
                let close = round2((base + wave + noise).max(MIN_PRICE));
                let pe = close / (PE_DIVISOR + rng.gen_range(0.0_f64..PE_DIVISOR_JITTER));

                price_records.push(RawPriceRecord { date, close });
                pe_records.push(RawPeRecord { date, pe: round2(pe) });
                index += 1;
            }
            date += Duration::days(1);
        }

        let latest_pe = pe_records.last().map(|r| r.pe);

        FetchedHistory {
            price_records,
            pe_records,
            display_name: format!("{}（模拟）", symbol.to_uppercase()),
            latest_pe,
            source: MOCK_SOURCE_LABEL.to_string(),
            is_synthetic: true,
        }
    }
}

/// 回溯 `years` 年的起始日期
pub fn history_start(end: NaiveDate, years: u32) -> NaiveDate {
    years
        .checked_mul(12)
        .and_then(|months| end.checked_sub_months(Months::new(months)))
        .unwrap_or(NaiveDate::MIN)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
