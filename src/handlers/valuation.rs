//! 估值接口处理器
//!
//! ## API 列表
//! - GET /valuation/{symbol}?end_date=YYYYMMDD - 查询估值报告
//! - GET /valuation/current - 获取最近一次查询的报告

use actix_web::{web, HttpResponse, Result};
use anyhow::anyhow;
use chrono::{NaiveDate, Utc};
use chrono_tz::Asia::Shanghai;
use std::sync::Arc;

use crate::models::{ApiResponse, StockReport, ValuationQuery};
use crate::services::source::MarketSymbol;
use crate::state::AppState;

/// 解析结束日期，未指定时取北京时间当天
fn parse_end_date(value: Option<&str>) -> anyhow::Result<NaiveDate> {
    match value {
        None => Ok(Utc::now().with_timezone(&Shanghai).date_naive()),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y%m%d")
            .map_err(|_| anyhow!("无效的结束日期: {}，格式应为 YYYYMMDD", s)),
    }
}

/// 查询估值报告
///
/// GET /api/v1/valuation/{symbol}
///
/// 实时数据不可用时返回模拟数据，提示信息放在 message 中
pub async fn get_valuation(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<ValuationQuery>,
) -> Result<HttpResponse> {
    let raw_symbol = path.into_inner();

    let symbol = match MarketSymbol::parse(&raw_symbol) {
        Ok(symbol) => symbol,
        Err(e) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::<StockReport>::error(e.to_string())));
        }
    };
    let end = match parse_end_date(query.end_date.as_deref()) {
        Ok(end) => end,
        Err(e) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::<StockReport>::error(e.to_string())));
        }
    };

    let ticket = state.slot.begin();
    match state.service.search(&symbol, end).await {
        Ok(report) => {
            let report = Arc::new(report);
            state.slot.commit(ticket, Arc::clone(&report)).await;

            let message = report
                .advisory
                .clone()
                .unwrap_or_else(|| "Success".to_string());
            Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(report.as_ref(), message)))
        }
        Err(e) => {
            log::error!("生成 {} 估值报告失败: {:#}", symbol, e);
            Ok(HttpResponse::InternalServerError().json(ApiResponse::<StockReport>::error(e.to_string())))
        }
    }
}

/// 获取最近一次查询的报告
///
/// GET /api/v1/valuation/current
pub async fn get_current(state: web::Data<AppState>) -> Result<HttpResponse> {
    match state.slot.current().await {
        Some(report) => Ok(HttpResponse::Ok().json(ApiResponse::success(report.as_ref()))),
        None => Ok(HttpResponse::NotFound()
            .json(ApiResponse::<StockReport>::error("暂无查询记录".to_string()))),
    }
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/valuation")
            .route("/current", web::get().to(get_current))
            .route("/{symbol}", web::get().to(get_valuation))
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::source::OfflineSource;
    use crate::services::stock_service::ValuationService;
    use actix_web::{http::StatusCode, test, App};

    fn app_state() -> web::Data<AppState> {
        web::Data::new(AppState::new(ValuationService::new(Arc::new(OfflineSource), 3)))
    }

    #[actix_web::test]
    async fn test_parse_end_date() {
        assert_eq!(
            parse_end_date(Some("20240628")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 28).unwrap()
        );
        assert!(parse_end_date(Some("2024-06-28")).is_err());
        assert!(parse_end_date(None).is_ok());
    }

    #[actix_web::test]
    async fn test_valuation_endpoint_returns_synthetic_report() {
        let app = test::init_service(
            App::new()
                .app_data(app_state())
                .configure(crate::handlers::config),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/valuation/600000?end_date=20240628")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["snapshot"]["symbol"], "sh600000");
        assert_eq!(body["data"]["snapshot"]["is_synthetic"], true);
        assert!(body["message"].as_str().unwrap().contains("模拟数据"));
    }

    #[actix_web::test]
    async fn test_invalid_symbol_is_bad_request() {
        let app = test::init_service(
            App::new()
                .app_data(app_state())
                .configure(crate::handlers::config),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/v1/valuation/AAPL").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get()
            .uri("/api/v1/valuation/600000?end_date=bad")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_current_report_tracks_latest_search() {
        let app = test::init_service(
            App::new()
                .app_data(app_state())
                .configure(crate::handlers::config),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/v1/valuation/current").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get()
            .uri("/api/v1/valuation/sz000001?end_date=20240628")
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get().uri("/api/v1/valuation/current").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["snapshot"]["symbol"], "sz000001");
    }

    #[actix_web::test]
    async fn test_health() {
        let app = test::init_service(
            App::new()
                .app_data(app_state())
                .configure(crate::handlers::config),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/v1/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
