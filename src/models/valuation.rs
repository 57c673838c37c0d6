//! 估值数据模型
//!
//! 市盈率分位区间、均线组合与估值状态

use serde::{Deserialize, Serialize};

/// 市盈率分位估值区间
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValuationBand {
    /// 低估市盈率（10% 分位）
    pub low_pe: f64,
    /// 高估市盈率（90% 分位）
    pub high_pe: f64,
    /// 反推的每股收益
    pub eps: f64,
    /// 低估价
    pub cheap_price: f64,
    /// 合理价（低估价与高估价的中点）
    pub fair_price: f64,
    /// 高估价
    pub expensive_price: f64,
    /// 是否使用了固定默认区间（有效市盈率样本不足）
    pub is_default: bool,
}

impl ValuationBand {
    /// 由分位市盈率与 EPS 计算三档价格
    pub fn from_pe_range(low_pe: f64, high_pe: f64, eps: f64, is_default: bool) -> Self {
        let cheap_price = eps * low_pe;
        let expensive_price = eps * high_pe;
        Self {
            low_pe,
            high_pe,
            eps,
            cheap_price,
            fair_price: (cheap_price + expensive_price) / 2.0,
            expensive_price,
            is_default,
        }
    }
}

/// 多周期简单移动平均线
///
/// 样本不足的周期为 None
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MovingAverageSet {
    pub ma5: Option<f64>,
    pub ma10: Option<f64>,
    pub ma20: Option<f64>,
    pub ma60: Option<f64>,
    pub ma120: Option<f64>,
    pub ma240: Option<f64>,
}

/// 估值状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationStatus {
    Cheap,
    Fair,
    Expensive,
    NoData,
}

impl ValuationStatus {
    /// 展示用中文标签
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cheap => "低估",
            Self::Fair => "合理",
            Self::Expensive => "高估",
            Self::NoData => "暂无数据",
        }
    }
}

impl std::fmt::Display for ValuationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
