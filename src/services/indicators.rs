//! 均线计算

use crate::models::{HistorySeries, MovingAverageSet, NewestFirst};

/// 均线周期
pub const MA_WINDOWS: [usize; 6] = [5, 10, 20, 60, 120, 240];

/// 计算简单移动平均
///
/// 取最新在前视图中的前 `window` 个收盘价求均值；
/// 样本不足或周期为 0 时返回 None
pub fn compute_ma(series: NewestFirst<'_>, window: usize) -> Option<f64> {
    if window == 0 || series.len() < window {
        return None;
    }
    let sum: f64 = series.closes(window).sum();
    Some(sum / window as f64)
}

/// 针对同一序列快照计算全部周期的均线
pub fn compute_ma_set(series: &HistorySeries) -> MovingAverageSet {
    let view = series.newest_first();
    let [ma5, ma10, ma20, ma60, ma120, ma240] = MA_WINDOWS.map(|w| compute_ma(view, w));

    MovingAverageSet {
        ma5,
        ma10,
        ma20,
        ma60,
        ma120,
        ma240,
    }
}
