//! 市盈率分位估值
//!
//! 根据历史市盈率的 10%/90% 分位推导低估价、合理价、高估价，
//! 并将当前价格归类为低估 / 合理 / 高估

use crate::models::{HistorySeries, ValuationBand, ValuationStatus};

/// 有效市盈率下限（不含）
const PE_FLOOR: f64 = 0.0;
/// 有效市盈率上限（不含），超出视为拆股、业绩异常等噪声
const PE_CEILING: f64 = 200.0;
/// 样本数需严格大于该值才使用分位区间
const MIN_PE_SAMPLES: usize = 10;

/// 样本不足时的默认区间
const DEFAULT_LOW_PE: f64 = 10.0;
const DEFAULT_HIGH_PE: f64 = 20.0;
const DEFAULT_REFERENCE_PE: f64 = 15.0;

/// 阈值混合权重：更靠近合理价
const FAIR_WEIGHT: f64 = 0.6;
const EDGE_WEIGHT: f64 = 0.4;

/// 游标区间相对低估价 / 高估价的外扩比例
const CURSOR_LOWER_SCALE: f64 = 0.8;
const CURSOR_UPPER_SCALE: f64 = 1.2;

/// 过滤并升序排列有效的历史市盈率
fn valid_pe_samples(series: &HistorySeries) -> Vec<f64> {
    let mut samples: Vec<f64> = series
        .chronological()
        .pe_observations()
        .filter(|pe| *pe > PE_FLOOR && *pe < PE_CEILING)
        .collect();
    samples.sort_by(|a, b| a.total_cmp(b));
    samples
}

/// 推导估值区间
///
/// 当前价取序列最新收盘价。有效样本数 N > 10 时：
/// - low_pe = 第 ⌊0.1·N⌋ 个，high_pe = 第 ⌊0.9·N⌋ 个（从 0 开始，最近秩，不插值）
/// - eps = 当前价 / 参考市盈率，参考市盈率优先取 `latest_pe`，否则取最小有效样本
///
/// 否则退化为固定区间 10~20 倍，eps = 当前价 / 15。
pub fn derive_band(series: &HistorySeries, latest_pe: Option<f64>) -> ValuationBand {
    let current_price = series.latest().close;
    let samples = valid_pe_samples(series);
    let n = samples.len();

    if n > MIN_PE_SAMPLES {
        let low_pe = samples[n / 10];
        let high_pe = samples[n * 9 / 10];
        let reference_pe = latest_pe.unwrap_or(samples[0]);
        ValuationBand::from_pe_range(low_pe, high_pe, current_price / reference_pe, false)
    } else {
        log::debug!(
            "{} 有效市盈率样本仅 {} 个，使用默认估值区间",
            series.symbol(),
            n
        );
        ValuationBand::from_pe_range(
            DEFAULT_LOW_PE,
            DEFAULT_HIGH_PE,
            current_price / DEFAULT_REFERENCE_PE,
            true,
        )
    }
}

/// 低估价、高估价是否可用于判断
fn band_is_usable(band: &ValuationBand) -> bool {
    band.cheap_price.is_finite()
        && band.expensive_price.is_finite()
        && band.fair_price.is_finite()
        && band.cheap_price > 0.0
        && band.expensive_price > 0.0
}

/// 低估 / 高估判定阈值 (lower, upper)
///
/// 两侧对称，均按 0.6 合理价 + 0.4 边界价加权（80/100/120 时为 92 和 108）
pub fn thresholds(band: &ValuationBand) -> (f64, f64) {
    let lower = band.cheap_price * EDGE_WEIGHT + band.fair_price * FAIR_WEIGHT;
    let upper = band.fair_price * FAIR_WEIGHT + band.expensive_price * EDGE_WEIGHT;
    (lower, upper)
}

/// 判定估值状态
///
/// 低估价或高估价缺失、非正、非有限（例如参考市盈率为 0 或负数导致）时返回 NoData
pub fn classify(current_price: f64, band: &ValuationBand) -> ValuationStatus {
    if !band_is_usable(band) || !current_price.is_finite() {
        return ValuationStatus::NoData;
    }

    let (lower, upper) = thresholds(band);
    if current_price <= lower {
        ValuationStatus::Cheap
    } else if current_price >= upper {
        ValuationStatus::Expensive
    } else {
        ValuationStatus::Fair
    }
}

/// 当前价在 [低估价×0.8, 高估价×1.2] 上的归一化位置，截断到 [0, 100]
///
/// 区间不可用或长度非正时返回 None
pub fn cursor_position(current_price: f64, band: &ValuationBand) -> Option<f64> {
    if !band_is_usable(band) || !current_price.is_finite() {
        return None;
    }

    let start = band.cheap_price * CURSOR_LOWER_SCALE;
    let end = band.expensive_price * CURSOR_UPPER_SCALE;
    let range = end - start;
    if !(range.is_finite() && range > 0.0) {
        return None;
    }

    Some(((current_price - start) / range * 100.0).clamp(0.0, 100.0))
}
