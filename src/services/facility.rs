use crate::{
    errors::AppError, repositories::facility::FacilityInfoProvider, structs::shifts::Shift,
};
use futures::future::try_join_all;
use std::collections::{BTreeSet, HashMap};

/// 把 facility 資訊併入每筆班表，每個 shelter 只查一次，查詢同時進行
pub async fn attach_facility_info(
    provider: &dyn FacilityInfoProvider,
    mut shifts: Vec<Shift>,
) -> Result<Vec<Shift>, AppError> {
    let shelters: BTreeSet<&str> = shifts.iter().map(|s| s.shelter.as_str()).collect();
    tracing::debug!("looking up facility info for {} shelters", shelters.len());

    let infos = try_join_all(shelters.into_iter().map(|shelter| async move {
        provider
            .get_info(shelter)
            .await
            .map(|info| (shelter.to_string(), info))
    }))
    .await?;
    let infos: HashMap<String, _> = infos.into_iter().collect();

    for shift in shifts.iter_mut() {
        shift.facility_info = infos.get(&shift.shelter).cloned();
    }

    Ok(shifts)
}
