// ==========================================
// 货运装车调度核心 - 装车单号生成
// ==========================================
// 格式: <prefix>-<日期段>-<随机后缀>，默认 LOAD-ddMMyy-NNNN
// 说明: 生成时不检查重复，唯一性由存储主键保证
// ==========================================

use chrono::format::{Item, StrftimeItems};
use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// 单号格式参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayIdFormat {
    pub prefix: String,
    pub date_format: String,
    pub suffix_min: u32,
    pub suffix_max: u32,
}

impl Default for DisplayIdFormat {
    fn default() -> Self {
        Self {
            prefix: "LOAD".to_string(),
            date_format: "%d%m%y".to_string(),
            suffix_min: 1000,
            suffix_max: 9999,
        }
    }
}

/// strftime 格式串是否可用（含非法说明符时 chrono 格式化会 panic）
pub fn is_valid_strftime(format: &str) -> bool {
    !format.trim().is_empty()
        && !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

/// 日期段格式是否可用于纯日期（时间类说明符同样无法格式化）
pub fn is_valid_date_format(format: &str) -> bool {
    if !is_valid_strftime(format) {
        return false;
    }
    let mut rendered = String::new();
    NaiveDate::from_ymd_opt(2000, 1, 1)
        .map(|date| write!(rendered, "{}", date.format(format)).is_ok())
        .unwrap_or(false)
}

// ==========================================
// DisplayIdGenerator
// ==========================================
pub struct DisplayIdGenerator {
    format: DisplayIdFormat,
}

impl DisplayIdGenerator {
    pub fn new(format: DisplayIdFormat) -> Self {
        let format = if is_valid_date_format(&format.date_format) {
            format
        } else {
            tracing::warn!(date_format = %format.date_format, "单号日期格式非法，使用默认格式");
            DisplayIdFormat {
                date_format: DisplayIdFormat::default().date_format,
                ..format
            }
        };
        // 上下界颠倒时按交换处理
        let format = if format.suffix_min > format.suffix_max {
            DisplayIdFormat {
                suffix_min: format.suffix_max,
                suffix_max: format.suffix_min,
                ..format
            }
        } else {
            format
        };
        Self { format }
    }

    /// 使用线程随机数生成单号
    pub fn generate(&self, created_on: NaiveDate) -> String {
        let mut rng = rand::thread_rng();
        self.generate_with(created_on, &mut rng)
    }

    /// 使用指定随机源生成单号
    pub fn generate_with<R: Rng + ?Sized>(&self, created_on: NaiveDate, rng: &mut R) -> String {
        let suffix = rng.gen_range(self.format.suffix_min..=self.format.suffix_max);
        format!(
            "{}-{}-{}",
            self.format.prefix,
            created_on.format(&self.format.date_format),
            suffix
        )
    }

    /// 判断字符串是否符合当前单号格式
    ///
    /// 从右侧拆出后缀，再剥离前缀（前缀与日期段均可含 '-'）
    pub fn matches(&self, id: &str) -> bool {
        let (head, suffix) = match id.rsplit_once('-') {
            Some(parts) => parts,
            None => return false,
        };
        let date_part = match head
            .strip_prefix(self.format.prefix.as_str())
            .and_then(|rest| rest.strip_prefix('-'))
        {
            Some(date_part) => date_part,
            None => return false,
        };
        if NaiveDate::parse_from_str(date_part, &self.format.date_format).is_err() {
            return false;
        }
        suffix
            .parse::<u32>()
            .map(|n| n >= self.format.suffix_min && n <= self.format.suffix_max)
            .unwrap_or(false)
    }
}

impl Default for DisplayIdGenerator {
    fn default() -> Self {
        Self::new(DisplayIdFormat::default())
    }
}
