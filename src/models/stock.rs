//! 股票数据模型
//!
//! 定义日线记录、历史序列以及单次查询的股票快照

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::iter::Rev;
use std::slice::Iter;

use super::valuation::ValuationBand;

/// 数据源返回的原始日线收盘价
#[derive(Debug, Clone, PartialEq)]
pub struct RawPriceRecord {
    pub date: NaiveDate,
    pub close: f64,
}

/// 数据源返回的原始日度市盈率（TTM）
#[derive(Debug, Clone, PartialEq)]
pub struct RawPeRecord {
    pub date: NaiveDate,
    pub pe: f64,
}

/// 单日记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRecord {
    /// 交易日期
    pub date: NaiveDate,
    /// 收盘价
    pub close: f64,
    /// 滚动市盈率，当日无数据时为 None
    pub pe_ratio: Option<f64>,
}

/// 单只股票的日线历史序列
///
/// 内部始终按日期升序存储，且日期不重复、序列非空。
/// 需要"最新在前"的场景通过 [`HistorySeries::newest_first`] 获取倒序视图，
/// 两种方向在类型上区分，避免调用方混用。
#[derive(Debug, Clone, Serialize)]
pub struct HistorySeries {
    symbol: String,
    records: Vec<DailyRecord>,
}

impl HistorySeries {
    /// 从升序记录构造序列，校验非空与日期严格递增
    pub fn new(symbol: impl Into<String>, records: Vec<DailyRecord>) -> Result<Self> {
        let symbol = symbol.into();
        if records.is_empty() {
            return Err(anyhow!("{} 的历史序列为空", symbol));
        }
        if let Some(pair) = records.windows(2).find(|w| w[0].date >= w[1].date) {
            return Err(anyhow!(
                "{} 的历史序列日期未严格递增: {} -> {}",
                symbol,
                pair[0].date,
                pair[1].date
            ));
        }
        Ok(Self { symbol, records })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// 最新一条记录
    pub fn latest(&self) -> &DailyRecord {
        // 构造时已保证非空
        &self.records[self.records.len() - 1]
    }

    /// 倒数第二条记录（用于计算涨跌额）
    pub fn previous(&self) -> Option<&DailyRecord> {
        self.records.len().checked_sub(2).map(|i| &self.records[i])
    }

    /// 按日期升序的视图
    pub fn chronological(&self) -> Chronological<'_> {
        Chronological(&self.records)
    }

    /// 最新在前的视图（对升序数据取反，而非重新排序）
    pub fn newest_first(&self) -> NewestFirst<'_> {
        NewestFirst(&self.records)
    }
}

/// 升序视图
#[derive(Debug, Clone, Copy)]
pub struct Chronological<'a>(&'a [DailyRecord]);

impl<'a> Chronological<'a> {
    pub fn iter(&self) -> Iter<'a, DailyRecord> {
        self.0.iter()
    }

    /// 所有存在的市盈率观测值
    pub fn pe_observations(&self) -> impl Iterator<Item = f64> + 'a {
        self.iter().filter_map(|r| r.pe_ratio)
    }
}

/// 最新在前视图
#[derive(Debug, Clone, Copy)]
pub struct NewestFirst<'a>(&'a [DailyRecord]);

impl<'a> NewestFirst<'a> {
    pub fn iter(&self) -> Rev<Iter<'a, DailyRecord>> {
        self.0.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 最近 n 个收盘价，从最新开始
    pub fn closes(&self, n: usize) -> impl Iterator<Item = f64> + 'a {
        self.iter().take(n).map(|r| r.close)
    }
}

/// 股票快照
///
/// 每次查询新建，构造后不再修改，下一次查询产生新的快照替代它
#[derive(Debug, Clone, Serialize)]
pub struct StockSnapshot {
    /// 股票代码
    pub symbol: String,
    /// 股票名称
    pub display_name: String,
    /// 当前价格（最新收盘价）
    pub current_price: f64,
    /// 涨跌额
    pub price_change: f64,
    /// 当前市盈率
    pub current_pe: Option<f64>,
    /// 数据来源
    pub source: String,
    /// 是否为模拟数据
    pub is_synthetic: bool,
    /// 历史序列
    pub history: HistorySeries,
    /// 估值区间
    pub band: ValuationBand,
}

/// 估值查询参数
#[derive(Debug, Deserialize)]
pub struct ValuationQuery {
    /// 结束日期（YYYYMMDD），默认今天
    pub end_date: Option<String>,
}
