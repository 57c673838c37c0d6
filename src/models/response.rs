//! 通用 API 响应模型
//!
//! 所有接口返回统一格式：success / data / message / timestamp

use chrono::Utc;
use chrono_tz::Asia::Shanghai;
use serde::Serialize;

/// 获取北京时间（UTC+8）的 RFC3339 字符串
pub fn beijing_timestamp() -> String {
    Utc::now().with_timezone(&Shanghai).to_rfc3339()
}

/// 统一 API 响应结构
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// 请求是否成功
    pub success: bool,
    /// 响应数据
    pub data: Option<T>,
    /// 响应消息；使用模拟数据时携带提示
    pub message: String,
    /// 响应时间戳（北京时间）
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self::success_with_message(data, "Success".to_string())
    }

    /// 成功响应，附带提示信息
    pub fn success_with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            message,
            timestamp: beijing_timestamp(),
        }
    }

    /// 错误响应
    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message,
            timestamp: beijing_timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shapes() {
        let ok = ApiResponse::success(1);
        assert!(ok.success);
        assert_eq!(ok.data, Some(1));
        assert_eq!(ok.message, "Success");
        assert!(ok.timestamp.ends_with("+08:00"));

        let err = ApiResponse::<i32>::error("bad".to_string());
        assert!(!err.success);
        assert!(err.data.is_none());
    }
}
