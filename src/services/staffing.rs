use crate::{
    errors::AppError,
    structs::shifts::{Shift, Staffing},
};
use std::collections::HashMap;

/// 計算 `[window_start, window_end)` 內每個子區間同時在班的不重複志工人數
///
/// 班表先裁切到查詢區間，再依邊界時間掃描。同一時間點的所有上下班事件
/// 一起套用後才讀取人數，所以在時間 `T` 的在班集合即為 `start <= T < end`。
/// 人數為 0 的空檔不輸出，相鄰且人數相同的區段會合併。
pub fn compute(
    shifts: &[Shift],
    window_start: i64,
    window_end: i64,
) -> Result<Vec<Staffing>, AppError> {
    if window_start > window_end {
        return Err(AppError::InvalidWindow {
            start: window_start,
            end: window_end,
        });
    }

    for shift in shifts {
        shift.validate()?;
    }

    // (時間, 志工, +1 / -1)
    let mut events: Vec<(i64, &str, i32)> = Vec::with_capacity(shifts.len() * 2);
    for shift in shifts {
        let start = shift.start_time.max(window_start);
        let end = shift.end_time.min(window_end);
        if start >= end {
            continue;
        }
        events.push((start, shift.worker.as_str(), 1));
        events.push((end, shift.worker.as_str(), -1));
    }
    events.sort_unstable_by_key(|&(at, _, _)| at);

    let mut active: HashMap<&str, i32> = HashMap::new();
    let mut result: Vec<Staffing> = Vec::new();
    let mut idx = 0;

    while idx < events.len() {
        let at = events[idx].0;
        while idx < events.len() && events[idx].0 == at {
            let (_, worker, delta) = events[idx];
            let remaining = {
                let counter = active.entry(worker).or_insert(0);
                *counter += delta;
                *counter
            };
            if remaining == 0 {
                active.remove(worker);
            }
            idx += 1;
        }

        // 最後一個邊界之後不會再有人在班
        let Some(&(next, _, _)) = events.get(idx) else {
            break;
        };

        let count = active.len() as u32;
        if count == 0 {
            continue;
        }

        match result.last_mut() {
            Some(prev) if prev.end_time == at && prev.count == count => prev.end_time = next,
            _ => result.push(Staffing {
                start_time: at,
                end_time: next,
                count,
            }),
        }
    }

    Ok(result)
}
