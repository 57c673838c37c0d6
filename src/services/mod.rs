//! 业务逻辑服务模块
//!
//! 估值引擎（序列组装、均线、分位估值）、数据源与模拟数据

pub mod history;       // 历史序列组装
pub mod indicators;    // 均线计算
pub mod mock;          // 模拟行情
pub mod session;       // 当前快照
pub mod source;        // 行情数据源
pub mod stock_service; // 估值查询服务
pub mod valuation;     // 分位估值与状态判定
