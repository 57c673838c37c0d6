//! 估值报告
//!
//! 一次查询交给展示层的完整输出：快照、均线、估值状态和游标位置

use serde::Serialize;

use super::stock::StockSnapshot;
use super::valuation::{MovingAverageSet, ValuationStatus};

/// 估值报告
#[derive(Debug, Clone, Serialize)]
pub struct StockReport {
    pub snapshot: StockSnapshot,
    pub moving_averages: MovingAverageSet,
    pub status: ValuationStatus,
    /// 当前价在估值区间上的归一化位置（0-100）
    pub cursor_position: Option<f64>,
    /// 提示信息（例如使用了模拟数据）
    pub advisory: Option<String>,
    /// 格式化后的展示字段
    pub display: ReportDisplay,
}

/// 格式化后的展示字段，价格保留两位小数，游标保留一位
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportDisplay {
    pub current_price: String,
    pub price_change: String,
    pub current_pe: String,
    pub cheap_price: String,
    pub fair_price: String,
    pub expensive_price: String,
    pub low_pe: String,
    pub high_pe: String,
    pub eps: String,
    pub status: String,
    pub cursor_position: String,
    pub moving_averages: Vec<(String, String)>,
}

const PLACEHOLDER: &str = "--";

fn fixed(value: f64, digits: usize) -> String {
    if value.is_finite() {
        format!("{:.*}", digits, value)
    } else {
        PLACEHOLDER.to_string()
    }
}

fn fixed_opt(value: Option<f64>, digits: usize) -> String {
    value.map_or_else(|| PLACEHOLDER.to_string(), |v| fixed(v, digits))
}

impl ReportDisplay {
    pub fn build(
        snapshot: &StockSnapshot,
        moving_averages: &MovingAverageSet,
        status: ValuationStatus,
        cursor_position: Option<f64>,
    ) -> Self {
        let band = &snapshot.band;
        let change = if snapshot.price_change > 0.0 {
            format!("+{}", fixed(snapshot.price_change, 2))
        } else {
            fixed(snapshot.price_change, 2)
        };

        let ma_rows = [
            ("MA5", moving_averages.ma5),
            ("MA10", moving_averages.ma10),
            ("MA20", moving_averages.ma20),
            ("MA60", moving_averages.ma60),
            ("MA120", moving_averages.ma120),
            ("MA240", moving_averages.ma240),
        ];

        Self {
            current_price: fixed(snapshot.current_price, 2),
            price_change: change,
            current_pe: fixed_opt(snapshot.current_pe, 2),
            cheap_price: fixed(band.cheap_price, 2),
            fair_price: fixed(band.fair_price, 2),
            expensive_price: fixed(band.expensive_price, 2),
            low_pe: fixed(band.low_pe, 2),
            high_pe: fixed(band.high_pe, 2),
            eps: fixed(band.eps, 2),
            status: status.label().to_string(),
            cursor_position: fixed_opt(cursor_position, 1),
            moving_averages: ma_rows
                .iter()
                .map(|(name, value)| (name.to_string(), fixed_opt(*value, 2)))
                .collect(),
        }
    }
}
