//! 新浪财经数据源
//!
//! 对接 https://hq.sinajs.cn（实时行情，取股票名称）
//! 和 https://quotes.sina.cn（日K线，取收盘价）

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use chrono_tz::Asia::Shanghai;
use reqwest::Client;

use super::{DataSourceAdapter, FetchedHistory, MarketSymbol};
use crate::models::RawPriceRecord;

/// 新浪实时行情 API
const SINA_REALTIME_API: &str = "https://hq.sinajs.cn/list=";
/// 新浪日K线 API（scale=240 表示日线）
const SINA_KLINE_API: &str =
    "https://quotes.sina.cn/cn/api/jsonp_v2.php/=/CN_MarketDataService.getKLineData";
const SINA_REFERER: &str = "https://finance.sina.com.cn/";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// 新浪财经数据源
pub struct SinaSource {
    client: Client,
}

impl SinaSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// 获取股票名称
    async fn fetch_name(&self, symbol: &MarketSymbol) -> Result<String> {
        let url = format!("{}{}", SINA_REALTIME_API, symbol.sina());
        let response = self
            .client
            .get(&url)
            .header("Referer", SINA_REFERER)
            .header("User-Agent", USER_AGENT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("获取实时行情失败: {}", response.status()));
        }

        // 新浪实时行情为 GBK 编码
        let bytes = response.bytes().await?;
        let text = encoding_rs::GBK.decode(&bytes).0.to_string();
        parse_realtime_name(&text, symbol)
    }

    /// 获取日K线收盘价
    async fn fetch_closes(
        &self,
        symbol: &MarketSymbol,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<RawPriceRecord>> {
        let today = Utc::now().with_timezone(&Shanghai).date_naive();
        let datalen = kline_length(start, end, today).to_string();
        let code = symbol.sina();
        log::debug!("请求新浪日K线: {} datalen={}", code, datalen);

        let response = self
            .client
            .get(SINA_KLINE_API)
            .query(&[
                ("symbol", code.as_str()),
                ("scale", "240"),
                ("ma", "no"),
                ("datalen", datalen.as_str()),
            ])
            .header("Referer", SINA_REFERER)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("获取历史数据失败: {}", response.status()));
        }

        let text = response.text().await?;
        let records = parse_kline_closes(&text)?;
        Ok(records
            .into_iter()
            .filter(|r| r.date >= start && r.date <= end)
            .collect())
    }
}

#[async_trait]
impl DataSourceAdapter for SinaSource {
    fn source_label(&self) -> &'static str {
        "新浪财经"
    }

    async fn fetch(
        &self,
        symbol: &MarketSymbol,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchedHistory> {
        let (name, closes) =
            futures::join!(self.fetch_name(symbol), self.fetch_closes(symbol, start, end));

        let price_records = closes?;
        if price_records.is_empty() {
            return Err(anyhow!("新浪财经未返回 {} 的历史数据", symbol));
        }

        let display_name = name.unwrap_or_else(|e| {
            log::warn!("获取 {} 名称失败: {}", symbol, e);
            symbol.sina().to_uppercase()
        });

        Ok(FetchedHistory {
            price_records,
            pe_records: Vec::new(),
            display_name,
            latest_pe: None,
            source: self.source_label().to_string(),
            is_synthetic: false,
        })
    }
}

/// 覆盖 [start, end] 所需的K线条数，按每周 5 个交易日估算并留余量
///
/// 新浪只返回截至今天的最近 datalen 根K线，因此从 start 一直数到今天
fn kline_length(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> i64 {
    let days = (end.max(today) - start).num_days().max(0);
    days * 5 / 7 + 10
}

/// 解析实时行情中的股票名称
fn parse_realtime_name(data: &str, symbol: &MarketSymbol) -> Result<String> {
    // 格式: var hq_str_sh600000="浦发银行,10.00,10.01,...";
    let start = data.find('"').ok_or_else(|| anyhow!("无法解析响应数据"))?;
    let end = data.rfind('"').ok_or_else(|| anyhow!("无法解析响应数据"))?;
    if end <= start {
        return Err(anyhow!("无法解析响应数据"));
    }
    let content = &data[start + 1..end];

    let name = content.split(',').next().unwrap_or("").trim();
    if name.is_empty() {
        return Err(anyhow!("股票代码 {} 可能无效或已退市", symbol));
    }
    Ok(name.to_string())
}

/// 解析日K线收盘价
fn parse_kline_closes(data: &str) -> Result<Vec<RawPriceRecord>> {
    // 格式: =([{day:"2024-01-02",open:"10.00",high:"10.50",low:"9.80",close:"10.20",volume:"123456"},...]);
    let start = data.find("([").ok_or_else(|| anyhow!("解析历史数据失败"))?;
    let end = data.rfind("])").ok_or_else(|| anyhow!("解析历史数据失败"))?;
    if end <= start {
        return Err(anyhow!("解析历史数据失败"));
    }
    let json_str = &data[start + 1..end + 1];

    let json_data: serde_json::Value = serde_json::from_str(json_str)?;
    let mut records = Vec::new();

    if let Some(arr) = json_data.as_array() {
        for item in arr {
            let date = item["day"]
                .as_str()
                .and_then(|d| NaiveDate::parse_from_str(d.get(..10).unwrap_or(d), "%Y-%m-%d").ok());
            let close = item["close"].as_str().and_then(|c| c.parse::<f64>().ok());

            if let (Some(date), Some(close)) = (date, close) {
                records.push(RawPriceRecord { date, close });
            }
        }
    }

    Ok(records)
}
