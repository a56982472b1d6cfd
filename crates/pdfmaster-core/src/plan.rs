//! Subscription plan, tool gating and the daily usage quota
//!
//! The quota check runs before a file ever reaches the compiler; the
//! compiler itself only reads the plan.

use std::fmt;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::QuotaLimits;
use crate::error::QuotaError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Pro,
}

impl Plan {
    pub fn from_is_pro(is_pro: bool) -> Self {
        if is_pro {
            Plan::Pro
        } else {
            Plan::Free
        }
    }

    pub fn is_pro(&self) -> bool {
        matches!(self, Plan::Pro)
    }

    /// Whether this plan may use an editor tool
    pub fn allows(&self, tool: Tool) -> bool {
        self.is_pro() || !tool.requires_pro()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Select,
    Text,
    Draw,
    Shape,
    Image,
    Signature,
    Erase,
}

impl Tool {
    pub fn requires_pro(&self) -> bool {
        matches!(
            self,
            Tool::Text | Tool::Draw | Tool::Shape | Tool::Image | Tool::Signature
        )
    }

    pub fn parse(name: &str) -> Option<Self> {
        let tool = match name.trim().to_lowercase().as_str() {
            "select" => Tool::Select,
            "text" => Tool::Text,
            "draw" => Tool::Draw,
            "shape" => Tool::Shape,
            "image" => Tool::Image,
            "signature" => Tool::Signature,
            "erase" => Tool::Erase,
            _ => return None,
        };
        Some(tool)
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tool::Select => "select",
            Tool::Text => "text",
            Tool::Draw => "draw",
            Tool::Shape => "shape",
            Tool::Image => "image",
            Tool::Signature => "signature",
            Tool::Erase => "erase",
        };
        f.write_str(name)
    }
}

/// Exports counted for one calendar day (UTC)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Usage {
    pub date: NaiveDate,
    pub count: u32,
}

impl Usage {
    pub fn today() -> Self {
        Self::on(Utc::now().date_naive())
    }

    pub fn on(date: NaiveDate) -> Self {
        Self { date, count: 0 }
    }

    /// Exports recorded for `date`. A record from another day counts as zero.
    pub fn count_for(&self, date: NaiveDate) -> u32 {
        if self.date == date {
            self.count
        } else {
            0
        }
    }

    /// Count one export on `date`, starting over when the day has changed.
    pub fn increment_on(&mut self, date: NaiveDate) {
        if self.date != date {
            *self = Self::on(date);
        }
        self.count += 1;
    }

    pub fn increment(&mut self) {
        self.increment_on(Utc::now().date_naive());
    }

    pub fn reset(&mut self) {
        *self = Self::today();
    }
}

impl Default for Usage {
    fn default() -> Self {
        Self::today()
    }
}

/// Decide whether a file of `file_size` bytes may be opened.
///
/// Pro plans only have a size ceiling. Free plans hit the daily export limit
/// first, then the (smaller) size ceiling.
pub fn check_file_on(
    plan: Plan,
    usage: &Usage,
    file_size: u64,
    limits: &QuotaLimits,
    today: NaiveDate,
) -> Result<(), QuotaError> {
    match plan {
        Plan::Pro => {
            if file_size > limits.pro_max_bytes {
                return Err(QuotaError::ProFileTooLarge {
                    limit_mb: limits.pro_max_mb(),
                });
            }
        }
        Plan::Free => {
            if usage.count_for(today) >= limits.free_daily_exports {
                return Err(QuotaError::DailyLimit {
                    limit: limits.free_daily_exports,
                });
            }
            if file_size > limits.free_max_bytes {
                return Err(QuotaError::FreeFileTooLarge {
                    limit_mb: limits.free_max_mb(),
                    pro_limit_mb: limits.pro_max_mb(),
                });
            }
        }
    }
    Ok(())
}

pub fn check_file(
    plan: Plan,
    usage: &Usage,
    file_size: u64,
    limits: &QuotaLimits,
) -> Result<(), QuotaError> {
    check_file_on(plan, usage, file_size, limits, Utc::now().date_naive())
}
