use crate::{
    config::{AppConfig, FacilitySource},
    repositories::{
        facility::{FacilityInfoProvider, HttpFacilityInfoProvider, StaticFacilityInfo},
        shifts::{InMemoryShiftStore, PgShiftStore, ShiftStore},
    },
};
use anyhow::Context;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    config: Arc<AppConfig>,
    shifts: Arc<dyn ShiftStore>,
    facilities: Arc<dyn FacilityInfoProvider>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        shifts: Arc<dyn ShiftStore>,
        facilities: Arc<dyn FacilityInfoProvider>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            shifts,
            facilities,
        }
    }

    /// 依設定建立 store 與 facility provider
    pub async fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let shifts: Arc<dyn ShiftStore> = match &config.database_url {
            Some(database_url) => {
                let store = PgShiftStore::connect(database_url, config.database_max_connections)
                    .await
                    .context("can't connect to database")?;
                store
                    .ensure_schema()
                    .await
                    .context("can't create work_shifts table")?;
                tracing::info!("using postgres shift store");
                Arc::new(store)
            }
            None => {
                tracing::warn!("DATABASE_URL not set, shifts are kept in memory only");
                Arc::new(InMemoryShiftStore::new())
            }
        };

        let facilities: Arc<dyn FacilityInfoProvider> = match &config.facility {
            FacilitySource::Http { base_url, timeout } => {
                tracing::info!("facility info from {}", base_url);
                Arc::new(
                    HttpFacilityInfoProvider::new(base_url, *timeout)
                        .context("can't build facility http client")?,
                )
            }
            FacilitySource::File(path) => {
                tracing::info!("facility info from {}", path.display());
                Arc::new(StaticFacilityInfo::from_json_file(path)?)
            }
        };

        Ok(Self::new(config, shifts, facilities))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn shift_store(&self) -> &dyn ShiftStore {
        self.shifts.as_ref()
    }

    pub fn facility_provider(&self) -> &dyn FacilityInfoProvider {
        self.facilities.as_ref()
    }
}
