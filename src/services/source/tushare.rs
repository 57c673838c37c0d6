//! Tushare 数据源
//!
//! daily 取收盘价，daily_basic 取 pe_ttm，stock_basic 取股票名称

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use super::{DataSourceAdapter, FetchedHistory, MarketSymbol};
use crate::models::{RawPeRecord, RawPriceRecord};

const TUSHARE_API: &str = "http://api.tushare.pro";
const DATE_FORMAT: &str = "%Y%m%d";

#[derive(Debug, Serialize)]
struct TushareRequest<'a> {
    api_name: &'a str,
    token: &'a str,
    params: HashMap<&'a str, String>,
    fields: String,
}

#[derive(Debug, Deserialize)]
struct TushareResponse {
    code: i32,
    msg: Option<String>,
    data: Option<TushareTable>,
}

/// Tushare 返回的表格：字段名 + 行数组
#[derive(Debug, Default, Deserialize)]
struct TushareTable {
    #[serde(default)]
    fields: Vec<String>,
    #[serde(default)]
    items: Vec<Vec<Value>>,
}

impl TushareTable {
    fn column(&self, name: &str) -> Result<usize> {
        self.fields
            .iter()
            .position(|f| f == name)
            .ok_or_else(|| anyhow!("Tushare 返回缺少字段 {}", name))
    }
}

/// Tushare 数据源
pub struct TushareSource {
    client: Client,
    token: String,
}

impl TushareSource {
    pub fn new(client: Client, token: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
        }
    }

    async fn call_api(
        &self,
        api_name: &str,
        params: HashMap<&str, String>,
        fields: &str,
    ) -> Result<TushareTable> {
        let request = TushareRequest {
            api_name,
            token: &self.token,
            params,
            fields: fields.to_string(),
        };

        let response = self
            .client
            .post(TUSHARE_API)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("请求 Tushare {} 失败", api_name))?;

        if !response.status().is_success() {
            bail!("Tushare {} 请求失败: {}", api_name, response.status());
        }

        let result: TushareResponse = response
            .json()
            .await
            .with_context(|| format!("解析 Tushare {} 响应失败", api_name))?;

        if result.code != 0 {
            bail!(
                "Tushare {} 返回错误: {} - {}",
                api_name,
                result.code,
                result.msg.unwrap_or_default()
            );
        }

        Ok(result.data.unwrap_or_default())
    }

    fn range_params(symbol: &MarketSymbol, start: NaiveDate, end: NaiveDate) -> HashMap<&'static str, String> {
        let mut params = HashMap::new();
        params.insert("ts_code", symbol.tushare());
        params.insert("start_date", start.format(DATE_FORMAT).to_string());
        params.insert("end_date", end.format(DATE_FORMAT).to_string());
        params
    }

    async fn fetch_closes(
        &self,
        symbol: &MarketSymbol,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawPriceRecord>> {
        let table = self
            .call_api("daily", Self::range_params(symbol, start, end), "trade_date,close")
            .await?;
        parse_closes(&table)
    }

    async fn fetch_pe(
        &self,
        symbol: &MarketSymbol,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawPeRecord>> {
        let table = self
            .call_api("daily_basic", Self::range_params(symbol, start, end), "trade_date,pe_ttm")
            .await?;
        parse_pe(&table)
    }

    async fn fetch_name(&self, symbol: &MarketSymbol) -> Result<String> {
        let mut params = HashMap::new();
        params.insert("ts_code", symbol.tushare());
        let table = self.call_api("stock_basic", params, "ts_code,name").await?;
        parse_name(&table).ok_or_else(|| anyhow!("Tushare 未找到 {} 的基本信息", symbol))
    }
}

#[async_trait]
impl DataSourceAdapter for TushareSource {
    fn source_label(&self) -> &'static str {
        "Tushare"
    }

    async fn fetch(
        &self,
        symbol: &MarketSymbol,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchedHistory> {
        let (price_records, pe_records) = futures::try_join!(
            self.fetch_closes(symbol, start, end),
            self.fetch_pe(symbol, start, end)
        )?;

        if price_records.is_empty() {
            bail!("Tushare 未返回 {} 的历史数据", symbol);
        }

        let display_name = match self.fetch_name(symbol).await {
            Ok(name) => name,
            Err(e) => {
                log::warn!("获取 {} 名称失败: {}", symbol, e);
                symbol.tushare()
            }
        };

        let latest_pe = latest_trading_day_pe(&price_records, &pe_records);

        Ok(FetchedHistory {
            price_records,
            pe_records,
            display_name,
            latest_pe,
            source: self.source_label().to_string(),
            is_synthetic: false,
        })
    }
}

fn parse_date(value: &Value) -> Option<NaiveDate> {
    value
        .as_str()
        .and_then(|s| NaiveDate::parse_from_str(s, DATE_FORMAT).ok())
}

fn parse_closes(table: &TushareTable) -> Result<Vec<RawPriceRecord>> {
    let date_idx = table.column("trade_date")?;
    let close_idx = table.column("close")?;

    Ok(table
        .items
        .iter()
        .filter_map(|row| {
            let date = parse_date(row.get(date_idx)?)?;
            let close = row.get(close_idx)?.as_f64()?;
            Some(RawPriceRecord { date, close })
        })
        .collect())
}

/// pe_ttm 为 null（亏损股）的行直接跳过
fn parse_pe(table: &TushareTable) -> Result<Vec<RawPeRecord>> {
    let date_idx = table.column("trade_date")?;
    let pe_idx = table.column("pe_ttm")?;

    Ok(table
        .items
        .iter()
        .filter_map(|row| {
            let date = parse_date(row.get(date_idx)?)?;
            let pe = row.get(pe_idx)?.as_f64()?;
            Some(RawPeRecord { date, pe })
        })
        .collect())
}

/// 最新交易日的市盈率
///
/// 最新交易日 pe_ttm 为 null（亏损）时返回 None，不沿用更早的市盈率
fn latest_trading_day_pe(prices: &[RawPriceRecord], pes: &[RawPeRecord]) -> Option<f64> {
    let last_day = prices.iter().map(|r| r.date).max()?;
    pes.iter().find(|r| r.date == last_day).map(|r| r.pe)
}

fn parse_name(table: &TushareTable) -> Option<String> {
    let name_idx = table.column("name").ok()?;
    table
        .items
        .first()
        .and_then(|row| row.get(name_idx))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(json: &str) -> TushareTable {
        let response: TushareResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.code, 0);
        response.data.unwrap()
    }

    #[test]
    fn test_parse_daily_table() {
        let t = table(
            r#"{"code":0,"msg":"","data":{"fields":["trade_date","close"],"items":[["20240103",10.5],["20240102",10.2],["bad",1.0]]}}"#,
        );
        let records = parse_closes(&t).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        assert_eq!(records[0].close, 10.5);
    }

    #[test]
    fn test_parse_pe_skips_null() {
        let t = table(
            r#"{"code":0,"msg":null,"data":{"fields":["trade_date","pe_ttm"],"items":[["20240103",12.3],["20240102",null]]}}"#,
        );
        let records = parse_pe(&t).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].pe, 12.3);
    }

    #[test]
    fn test_missing_column_is_error() {
        let t = table(r#"{"code":0,"data":{"fields":["trade_date"],"items":[]}}"#);
        assert!(parse_closes(&t).is_err());
    }

    #[test]
    fn test_latest_pe_requires_latest_trading_day() {
        let daily = table(
            r#"{"code":0,"data":{"fields":["trade_date","close"],"items":[["20240628",8.0],["20240627",8.1]]}}"#,
        );
        let basic = table(
            r#"{"code":0,"data":{"fields":["trade_date","pe_ttm"],"items":[["20240628",null],["20240627",null],["20240101",35.0]]}}"#,
        );
        let prices = parse_closes(&daily).unwrap();
        let pes = parse_pe(&basic).unwrap();
        assert_eq!(latest_trading_day_pe(&prices, &pes), None);

        let basic = table(
            r#"{"code":0,"data":{"fields":["trade_date","pe_ttm"],"items":[["20240628",12.5],["20240627",12.0]]}}"#,
        );
        let pes = parse_pe(&basic).unwrap();
        assert_eq!(latest_trading_day_pe(&prices, &pes), Some(12.5));
        assert_eq!(latest_trading_day_pe(&[], &pes), None);
    }

    #[test]
    fn test_parse_name() {
        let t = table(
            r#"{"code":0,"data":{"fields":["ts_code","name"],"items":[["600000.SH","浦发银行"]]}}"#,
        );
        assert_eq!(parse_name(&t).as_deref(), Some("浦发银行"));
        assert_eq!(parse_name(&TushareTable::default()), None);
    }

    #[test]
    fn test_range_params() {
        let symbol = MarketSymbol::parse("000001").unwrap();
        let params = TushareSource::range_params(
            &symbol,
            NaiveDate::from_ymd_opt(2021, 1, 4).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
        );
        assert_eq!(params["ts_code"], "000001.SZ");
        assert_eq!(params["start_date"], "20210104");
        assert_eq!(params["end_date"], "20240104");
    }
}
