//! 历史序列组装
//!
//! 将数据源返回的收盘价与市盈率按日期精确匹配，生成升序 HistorySeries

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

use crate::models::{DailyRecord, HistorySeries, RawPeRecord, RawPriceRecord};

/// 组装历史序列
///
/// - 以收盘价记录为主表，同一日期重复时保留最后一条
/// - 非正或非有限的收盘价视为脏数据丢弃
/// - 当日没有市盈率记录时 pe_ratio 为 None，不会补 0
pub fn assemble_series(
    symbol: &str,
    price_records: &[RawPriceRecord],
    pe_records: &[RawPeRecord],
) -> Result<HistorySeries> {
    let pe_by_date: HashMap<NaiveDate, f64> = pe_records
        .iter()
        .filter(|r| r.pe.is_finite())
        .map(|r| (r.date, r.pe))
        .collect();

    let mut closes: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    let mut dropped = 0usize;
    for record in price_records {
        if record.close.is_finite() && record.close > 0.0 {
            closes.insert(record.date, record.close);
        } else {
            dropped += 1;
        }
    }
    if dropped > 0 {
        log::debug!("{} 丢弃 {} 条无效收盘价", symbol, dropped);
    }

    if closes.is_empty() {
        return Err(anyhow!("{} 没有有效的收盘价记录", symbol));
    }

    let records = closes
        .into_iter()
        .map(|(date, close)| DailyRecord {
            date,
            close,
            pe_ratio: pe_by_date.get(&date).copied(),
        })
        .collect();

    HistorySeries::new(symbol, records)
}
