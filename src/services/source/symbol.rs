//! 股票代码规范化
//!
//! 支持 600000 / sh600000 / SH600000 / 600000.SH 等写法

use anyhow::{anyhow, bail, Result};
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// 交易所
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exchange {
    Shanghai,
    Shenzhen,
    Beijing,
}

impl Exchange {
    fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "sh" => Some(Self::Shanghai),
            "sz" => Some(Self::Shenzhen),
            "bj" => Some(Self::Beijing),
            _ => None,
        }
    }

    /// 按代码首位推断交易所
    fn infer(code: &str) -> Option<Self> {
        match code.chars().next()? {
            '6' | '9' => Some(Self::Shanghai),
            '0' | '2' | '3' => Some(Self::Shenzhen),
            '4' | '8' => Some(Self::Beijing),
            _ => None,
        }
    }

    fn tag(&self) -> &'static str {
        match self {
            Self::Shanghai => "sh",
            Self::Shenzhen => "sz",
            Self::Beijing => "bj",
        }
    }
}

/// 规范化后的股票代码
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketSymbol {
    pub exchange: Exchange,
    pub code: String,
}

impl MarketSymbol {
    pub fn parse(input: &str) -> Result<Self> {
        let re = symbol_pattern()?;
        let trimmed = input.trim();
        let caps = re
            .captures(trimmed)
            .ok_or_else(|| anyhow!("无效的股票代码: {:?}", input))?;

        let code = caps[2].to_string();
        let prefix = caps.get(1).and_then(|m| Exchange::from_tag(m.as_str()));
        let suffix = caps.get(3).and_then(|m| Exchange::from_tag(m.as_str()));

        let exchange = match (prefix, suffix) {
            (Some(p), Some(s)) if p != s => bail!("股票代码交易所前后缀不一致: {}", trimmed),
            (Some(e), _) | (None, Some(e)) => e,
            (None, None) => Exchange::infer(&code)
                .ok_or_else(|| anyhow!("无法识别股票代码所属交易所: {}", trimmed))?,
        };

        Ok(Self { exchange, code })
    }

    /// 新浪格式，如 sh600000
    pub fn sina(&self) -> String {
        format!("{}{}", self.exchange.tag(), self.code)
    }

    /// Tushare 格式，如 600000.SH
    pub fn tushare(&self) -> String {
        format!("{}.{}", self.code, self.exchange.tag().to_uppercase())
    }
}

/// 代码格式：可选交易所前缀 + 6 位 ASCII 数字 + 可选交易所后缀
fn symbol_pattern() -> Result<&'static Regex> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    if let Some(re) = PATTERN.get() {
        return Ok(re);
    }
    let re = Regex::new(r"^(?i)(sh|sz|bj)?([0-9]{6})(?:\.(sh|sz|bj))?$")?;
    Ok(PATTERN.get_or_init(|| re))
}

impl fmt::Display for MarketSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sina())
    }
}
