use crate::{
    errors::AppError,
    structs::shifts::{Shift, ShiftFilter},
};
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, FromRow, Pool, Postgres, QueryBuilder};
use std::{collections::HashMap, time::Duration};
use tokio::sync::RwLock;

#[async_trait]
pub trait ShiftStore: Send + Sync {
    /// 批次新增，任一 code 重複則整批不寫入
    async fn add_many(&self, shifts: Vec<Shift>) -> Result<Vec<Shift>, AppError>;

    async fn list(&self, filter: &ShiftFilter) -> Result<Vec<Shift>, AppError>;

    async fn delete(&self, code: &str) -> Result<(), AppError>;

    /// 單一志工在 `[start, end)` 內有交集的班表，供依志工查詢時段使用
    async fn list_for_worker_window(
        &self,
        worker: &str,
        start: i64,
        end: i64,
    ) -> Result<Vec<Shift>, AppError>;

    /// 收容所在 `[start, end)` 內有交集的班表，在班人數統計由此取資料
    async fn list_for_shelter_window(
        &self,
        shelter: &str,
        start: i64,
        end: i64,
    ) -> Result<Vec<Shift>, AppError>;
}

// 同一批裡的 code 也不能重複
fn ensure_unique_codes(shifts: &[Shift]) -> Result<(), AppError> {
    let mut seen = std::collections::HashSet::with_capacity(shifts.len());
    for shift in shifts {
        if !seen.insert(shift.code.as_str()) {
            return Err(AppError::DuplicateCode {
                code: shift.code.clone(),
            });
        }
    }
    Ok(())
}

fn sort_shifts(shifts: &mut [Shift]) {
    shifts.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then_with(|| a.code.cmp(&b.code))
    });
}

/// 開發與測試用，資料只存在記憶體
#[derive(Default)]
pub struct InMemoryShiftStore {
    shifts: RwLock<HashMap<String, Shift>>,
}

impl InMemoryShiftStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn select<F>(&self, predicate: F) -> Vec<Shift>
    where
        F: Fn(&Shift) -> bool,
    {
        let shifts = self.shifts.read().await;
        let mut selected: Vec<Shift> = shifts.values().filter(|s| predicate(*s)).cloned().collect();
        sort_shifts(&mut selected);
        selected
    }
}

#[async_trait]
impl ShiftStore for InMemoryShiftStore {
    async fn add_many(&self, shifts: Vec<Shift>) -> Result<Vec<Shift>, AppError> {
        ensure_unique_codes(&shifts)?;

        let mut stored = self.shifts.write().await;
        if let Some(existing) = shifts.iter().find(|s| stored.contains_key(&s.code)) {
            return Err(AppError::DuplicateCode {
                code: existing.code.clone(),
            });
        }

        for shift in &shifts {
            stored.insert(shift.code.clone(), shift.clone());
        }

        Ok(shifts)
    }

    async fn list(&self, filter: &ShiftFilter) -> Result<Vec<Shift>, AppError> {
        Ok(self.select(|s| filter.matches(s)).await)
    }

    async fn delete(&self, code: &str) -> Result<(), AppError> {
        match self.shifts.write().await.remove(code) {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound {
                code: code.to_string(),
            }),
        }
    }

    async fn list_for_worker_window(
        &self,
        worker: &str,
        start: i64,
        end: i64,
    ) -> Result<Vec<Shift>, AppError> {
        Ok(self
            .select(|s| s.worker == worker && s.overlaps(start, end))
            .await)
    }

    async fn list_for_shelter_window(
        &self,
        shelter: &str,
        start: i64,
        end: i64,
    ) -> Result<Vec<Shift>, AppError> {
        Ok(self
            .select(|s| s.shelter == shelter && s.overlaps(start, end))
            .await)
    }
}

#[derive(FromRow)]
struct ShiftRow {
    code: String,
    worker: String,
    shelter: String,
    start_time: i64,
    end_time: i64,
}

impl From<ShiftRow> for Shift {
    fn from(row: ShiftRow) -> Self {
        Shift {
            code: row.code,
            worker: row.worker,
            shelter: row.shelter,
            start_time: row.start_time,
            end_time: row.end_time,
            facility_info: None,
        }
    }
}

const SELECT_SHIFTS: &str = "SELECT code, worker, shelter, start_time, end_time FROM work_shifts";

/// 以 Postgres 保存班表
#[derive(Clone)]
pub struct PgShiftStore {
    pool: Pool<Postgres>,
}

impl PgShiftStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await?;

        Ok(Self::new(pool))
    }

    pub async fn ensure_schema(&self) -> Result<(), AppError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS work_shifts (
                code TEXT PRIMARY KEY,
                worker TEXT NOT NULL,
                shelter TEXT NOT NULL,
                start_time BIGINT NOT NULL,
                end_time BIGINT NOT NULL,
                CHECK (start_time < end_time)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch(&self, query: &mut QueryBuilder<'_, Postgres>) -> Result<Vec<Shift>, AppError> {
        query.push(" ORDER BY start_time, code");

        let rows = query
            .build_query_as::<ShiftRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Shift::from).collect())
    }
}

#[async_trait]
impl ShiftStore for PgShiftStore {
    async fn add_many(&self, shifts: Vec<Shift>) -> Result<Vec<Shift>, AppError> {
        ensure_unique_codes(&shifts)?;
        if shifts.is_empty() {
            return Ok(shifts);
        }

        let mut tx = self.pool.begin().await?;

        let mut query_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("INSERT INTO work_shifts (code, worker, shelter, start_time, end_time) ");
        query_builder.push_values(shifts.iter(), |mut b, shift| {
            b.push_bind(shift.code.clone())
                .push_bind(shift.worker.clone())
                .push_bind(shift.shelter.clone())
                .push_bind(shift.start_time)
                .push_bind(shift.end_time);
        });

        query_builder
            .build()
            .execute(&mut *tx)
            .await
            .map_err(|err| duplicate_or_database(err, &shifts))?;

        tx.commit().await?;

        Ok(shifts)
    }

    async fn list(&self, filter: &ShiftFilter) -> Result<Vec<Shift>, AppError> {
        let mut query = QueryBuilder::new(SELECT_SHIFTS);
        query.push(" WHERE TRUE");
        if let Some(worker) = &filter.worker {
            query.push(" AND worker = ").push_bind(worker.clone());
        }
        if let Some(shelter) = &filter.shelter {
            query.push(" AND shelter = ").push_bind(shelter.clone());
        }

        self.fetch(&mut query).await
    }

    async fn delete(&self, code: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM work_shifts WHERE code = $1")
            .bind(code)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound {
                code: code.to_string(),
            });
        }

        Ok(())
    }

    async fn list_for_worker_window(
        &self,
        worker: &str,
        start: i64,
        end: i64,
    ) -> Result<Vec<Shift>, AppError> {
        let mut query = QueryBuilder::new(SELECT_SHIFTS);
        query
            .push(" WHERE worker = ")
            .push_bind(worker.to_string())
            .push(" AND start_time < ")
            .push_bind(end)
            .push(" AND end_time > ")
            .push_bind(start);

        self.fetch(&mut query).await
    }

    async fn list_for_shelter_window(
        &self,
        shelter: &str,
        start: i64,
        end: i64,
    ) -> Result<Vec<Shift>, AppError> {
        let mut query = QueryBuilder::new(SELECT_SHIFTS);
        query
            .push(" WHERE shelter = ")
            .push_bind(shelter.to_string())
            .push(" AND start_time < ")
            .push_bind(end)
            .push(" AND end_time > ")
            .push_bind(start);

        self.fetch(&mut query).await
    }
}

// unique violation 轉成 DuplicateCode，其餘維持資料庫錯誤
fn duplicate_or_database(err: sqlx::Error, shifts: &[Shift]) -> AppError {
    let duplicate = err
        .as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation());

    if !duplicate {
        return AppError::from(err);
    }

    // Postgres 的 detail 形如 `Key (code)=(abc) already exists.`
    let code = err
        .as_database_error()
        .and_then(|db_err| {
            db_err
                .try_downcast_ref::<sqlx::postgres::PgDatabaseError>()
                .and_then(|pg| pg.detail())
                .and_then(|detail| {
                    shifts
                        .iter()
                        .find(|s| detail.contains(&format!("=({})", s.code)))
                })
        })
        .map(|s| s.code.clone())
        .unwrap_or_default();

    AppError::DuplicateCode { code }
}
