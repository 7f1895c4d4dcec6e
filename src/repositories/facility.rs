use crate::errors::AppError;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use std::{collections::HashMap, path::Path, time::Duration};

#[async_trait]
pub trait FacilityInfoProvider: Send + Sync {
    async fn get_info(&self, shelter_id: &str) -> Result<Value, AppError>;
}

/// 向外部 facility API 查詢 `GET {base_url}/shelters/{id}`
pub struct HttpFacilityInfoProvider {
    client: Client,
    base_url: Url,
}

impl HttpFacilityInfoProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let base_url = Url::parse(base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| AppError::InvalidInput {
                field: "FACILITY_API_URL",
                message: format!("{} is not a usable base url", base_url),
            })?;
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, base_url })
    }

    /// shelter id 作為單一路徑片段，保留字元會被編碼
    fn shelter_url(&self, shelter_id: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("shelters").push(shelter_id);
        }
        url
    }
}

#[async_trait]
impl FacilityInfoProvider for HttpFacilityInfoProvider {
    async fn get_info(&self, shelter_id: &str) -> Result<Value, AppError> {
        let url = self.shelter_url(shelter_id);
        tracing::debug!("fetching facility info from {}", url);

        let response = self.client.get(url.clone()).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(AppError::FacilityNotFound {
                shelter: shelter_id.to_string(),
            }),
            status if status.is_success() => Ok(response.json::<Value>().await?),
            status => Err(AppError::FacilityUnavailable(format!(
                "{} responded with {}",
                url, status
            ))),
        }
    }
}

/// 固定的 facility 資料，來源為 JSON 檔或程式內建
#[derive(Default)]
pub struct StaticFacilityInfo {
    infos: HashMap<String, Value>,
}

impl StaticFacilityInfo {
    pub fn new(infos: HashMap<String, Value>) -> Self {
        Self { infos }
    }

    /// 檔案內容為 `{ "<shelter_id>": { ... } }`
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("讀取 {} 失敗", path.display()))?;
        let infos: HashMap<String, Value> = serde_json::from_str(&raw)
            .with_context(|| format!("{} 不是有效的 facility JSON", path.display()))?;

        Ok(Self::new(infos))
    }
}

#[async_trait]
impl FacilityInfoProvider for StaticFacilityInfo {
    async fn get_info(&self, shelter_id: &str) -> Result<Value, AppError> {
        self.infos
            .get(shelter_id)
            .cloned()
            .ok_or_else(|| AppError::FacilityNotFound {
                shelter: shelter_id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;
    use std::io::Write;

    #[tokio::test]
    async fn http_provider_returns_facility_json() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/shelters/existing-shelter-id");
                then.status(200)
                    .header("Content-Type", "application/json")
                    .json_body(json!({"info": "Some facility info for existing-shelter-id"}));
            })
            .await;

        let provider =
            HttpFacilityInfoProvider::new(&format!("{}/", server.base_url()), Duration::from_secs(5))
                .unwrap();
        let info = provider.get_info("existing-shelter-id").await.unwrap();

        assert_eq!(
            info,
            json!({"info": "Some facility info for existing-shelter-id"})
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn http_provider_maps_404_to_facility_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/shelters/unknown");
                then.status(404);
            })
            .await;

        let provider = HttpFacilityInfoProvider::new(&server.base_url(), Duration::from_secs(5))
            .unwrap();
        let err = provider.get_info("unknown").await.unwrap_err();

        assert!(matches!(err, AppError::FacilityNotFound { ref shelter } if shelter == "unknown"));
    }

    #[tokio::test]
    async fn http_provider_maps_server_error_to_unavailable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/shelters/flaky");
                then.status(503);
            })
            .await;

        let provider = HttpFacilityInfoProvider::new(&server.base_url(), Duration::from_secs(5))
            .unwrap();
        let err = provider.get_info("flaky").await.unwrap_err();

        assert!(matches!(err, AppError::FacilityUnavailable(_)));
    }

    #[tokio::test]
    async fn http_provider_encodes_reserved_characters_in_shelter_id() {
        let server = MockServer::start_async().await;
        let nested = server
            .mock_async(|when, then| {
                when.method(GET).path("/shelters/a/b");
                then.status(200).json_body(json!({"info": "wrong"}));
            })
            .await;
        let encoded = server
            .mock_async(|when, then| {
                when.method(GET).path("/shelters/a%2Fb");
                then.status(200).json_body(json!({"info": "a/b"}));
            })
            .await;
        let with_query = server
            .mock_async(|when, then| {
                when.method(GET).path("/shelters/x%3Fy=1");
                then.status(200).json_body(json!({"info": "x?y=1"}));
            })
            .await;

        let provider = HttpFacilityInfoProvider::new(&server.base_url(), Duration::from_secs(5))
            .unwrap();

        assert_eq!(provider.get_info("a/b").await.unwrap(), json!({"info": "a/b"}));
        assert_eq!(
            provider.get_info("x?y=1").await.unwrap(),
            json!({"info": "x?y=1"})
        );
        assert_eq!(nested.hits_async().await, 0);
        encoded.assert_async().await;
        with_query.assert_async().await;
    }

    #[tokio::test]
    async fn http_provider_keeps_base_path() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/v1/shelters/s1");
                then.status(200).json_body(json!({"info": "one"}));
            })
            .await;

        let provider = HttpFacilityInfoProvider::new(
            &format!("{}/api/v1", server.base_url()),
            Duration::from_secs(5),
        )
        .unwrap();

        assert_eq!(provider.get_info("s1").await.unwrap(), json!({"info": "one"}));
        mock.assert_async().await;
    }

    #[test]
    fn http_provider_rejects_unusable_base_url() {
        assert!(matches!(
            HttpFacilityInfoProvider::new("not a url", Duration::from_secs(5)),
            Err(AppError::InvalidInput { .. })
        ));
        assert!(matches!(
            HttpFacilityInfoProvider::new("mailto:facility@example.com", Duration::from_secs(5)),
            Err(AppError::InvalidInput { .. })
        ));
    }

    #[tokio::test]
    async fn static_provider_knows_only_its_shelters() {
        let provider = StaticFacilityInfo::new(HashMap::from([(
            "s1".to_string(),
            json!({"info": "one"}),
        )]));

        assert_eq!(provider.get_info("s1").await.unwrap(), json!({"info": "one"}));
        assert!(matches!(
            provider.get_info("s2").await,
            Err(AppError::FacilityNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn static_provider_loads_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"s1": {{"info": "from file"}}}}"#).unwrap();

        let provider = StaticFacilityInfo::from_json_file(file.path()).unwrap();
        assert_eq!(
            provider.get_info("s1").await.unwrap(),
            json!({"info": "from file"})
        );
    }

    #[test]
    fn static_provider_rejects_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2, 3]").unwrap();

        assert!(StaticFacilityInfo::from_json_file(file.path()).is_err());
    }
}
