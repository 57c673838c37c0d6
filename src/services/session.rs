//! 当前估值快照
//!
//! 保存最近一次查询的报告。每次查询开始时领取递增序号，
//! 完成后只有序号比已保存报告更新时才会写入，较早发起的查询不会覆盖较新的结果。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::StockReport;

/// 查询序号
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SearchTicket(u64);

#[derive(Default)]
pub struct SnapshotSlot {
    next: AtomicU64,
    current: RwLock<Option<(SearchTicket, Arc<StockReport>)>>,
}

impl SnapshotSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// 领取查询序号
    pub fn begin(&self) -> SearchTicket {
        SearchTicket(self.next.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// 提交查询结果，已有更新的结果时丢弃并返回 false
    pub async fn commit(&self, ticket: SearchTicket, report: Arc<StockReport>) -> bool {
        let mut slot = self.current.write().await;
        if let Some((saved, _)) = slot.as_ref() {
            if *saved > ticket {
                log::debug!("丢弃过期的查询结果 #{}（当前 #{}）", ticket.0, saved.0);
                return false;
            }
        }
        *slot = Some((ticket, report));
        true
    }

    /// 当前报告
    pub async fn current(&self) -> Option<Arc<StockReport>> {
        self.current
            .read()
            .await
            .as_ref()
            .map(|(_, report)| Arc::clone(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::stock_service::build_report;
    use crate::services::mock::MockSeriesGenerator;
    use chrono::NaiveDate;

    fn report(symbol: &str) -> Arc<StockReport> {
        let end = NaiveDate::from_ymd_opt(2024, 6, 28).unwrap();
        let fetched = MockSeriesGenerator::new(1).generate(symbol, end);
        Arc::new(build_report(symbol, fetched, None).unwrap())
    }

    #[tokio::test]
    async fn test_empty_slot() {
        assert!(SnapshotSlot::new().current().await.is_none());
    }

    #[tokio::test]
    async fn test_newer_result_wins() {
        let slot = SnapshotSlot::new();
        let first = slot.begin();
        let second = slot.begin();
        assert!(first < second);

        assert!(slot.commit(second, report("sz000002")).await);
        // 先发起、后完成的查询不能覆盖
        assert!(!slot.commit(first, report("sh600000")).await);

        let current = slot.current().await.unwrap();
        assert_eq!(current.snapshot.symbol, "sz000002");
    }

    #[tokio::test]
    async fn test_in_order_results_replace() {
        let slot = SnapshotSlot::new();
        let first = slot.begin();
        assert!(slot.commit(first, report("sh600000")).await);
        let second = slot.begin();
        assert!(slot.commit(second, report("sz000002")).await);

        assert_eq!(slot.current().await.unwrap().snapshot.symbol, "sz000002");
    }
}
