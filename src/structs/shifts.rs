use crate::errors::AppError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 志工在收容所的一段班表，時間為 epoch millis 的半開區間 `[start_time, end_time)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shift {
    pub code: String,
    pub worker: String,
    pub shelter: String,
    pub start_time: i64,
    pub end_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facility_info: Option<Value>,
}

impl Shift {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.start_time >= self.end_time {
            return Err(AppError::InvalidShift {
                code: self.code.clone(),
                start_time: self.start_time,
                end_time: self.end_time,
            });
        }

        Ok(())
    }

    /// 是否與 `[start, end)` 有交集
    pub fn overlaps(&self, start: i64, end: i64) -> bool {
        self.start_time < end && start < self.end_time
    }
}

/// POST /shifts 的單筆內容，worker 由 Authorization 帶入
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewShift {
    pub code: String,
    pub shelter: String,
    pub start_time: i64,
    pub end_time: i64,
}

impl NewShift {
    pub fn into_shift(self, worker: &str) -> Result<Shift, AppError> {
        if self.code.trim().is_empty() {
            return Err(AppError::InvalidInput {
                field: "code",
                message: "must not be empty".to_string(),
            });
        }
        if self.shelter.trim().is_empty() {
            return Err(AppError::InvalidInput {
                field: "shelter",
                message: format!("must not be empty (shift {})", self.code),
            });
        }

        let shift = Shift {
            code: self.code,
            worker: worker.to_string(),
            shelter: self.shelter,
            start_time: self.start_time,
            end_time: self.end_time,
            facility_info: None,
        };
        shift.validate()?;

        Ok(shift)
    }
}

/// 某個子區間內同時在班的不重複志工人數
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staffing {
    pub start_time: i64,
    pub end_time: i64,
    pub count: u32,
}

#[derive(Debug, Default, Clone)]
pub struct ShiftFilter {
    pub worker: Option<String>,
    pub shelter: Option<String>,
}

impl ShiftFilter {
    pub fn matches(&self, shift: &Shift) -> bool {
        self.worker.as_ref().is_none_or(|w| *w == shift.worker)
            && self.shelter.as_ref().is_none_or(|s| *s == shift.shelter)
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub shelter: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CountQuery {
    pub start_after: i64,
    pub end_before: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}
