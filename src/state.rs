//! 应用共享状态

use crate::services::session::SnapshotSlot;
use crate::services::stock_service::ValuationService;

/// 所有请求共享的状态：查询服务与当前快照
pub struct AppState {
    pub service: ValuationService,
    pub slot: SnapshotSlot,
}

impl AppState {
    pub fn new(service: ValuationService) -> Self {
        Self {
            service,
            slot: SnapshotSlot::new(),
        }
    }
}
