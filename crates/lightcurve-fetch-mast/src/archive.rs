use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;

use lightcurve_fetch::{Archive, ArchiveError, LightCurve, TargetId};

use crate::fits::decode_light_curve;
use crate::invoke::{self, InvokeResponse, Observation, Product};

pub const DEFAULT_API_BASE_URL: &str = "https://mast.stsci.edu";
pub const DEFAULT_MISSION: &str = "Kepler";

/// Configuration for the MAST archive client.
#[derive(Debug, Clone)]
pub struct MastArchiveConfig {
    /// `obs_collection` to search, e.g. `Kepler` or `K2`.
    pub mission: String,
    pub api_base_url: Option<String>,
    /// Per-request HTTP timeout. The overall fetch deadline is set by the
    /// dispatcher.
    pub request_timeout: Option<Duration>,
}

impl Default for MastArchiveConfig {
    fn default() -> Self {
        Self {
            mission: DEFAULT_MISSION.to_owned(),
            api_base_url: None,
            request_timeout: None,
        }
    }
}

/// Fetches light curves from the Mikulski Archive for Space Telescopes.
///
/// A fetch is three round trips: search for timeseries observations of
/// the target, list the products of the first one, then download the
/// first light-curve product and decode it.
pub struct MastArchive {
    config: MastArchiveConfig,
    client: reqwest::Client,
}

impl MastArchive {
    pub fn new(config: MastArchiveConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn api_base(&self) -> &str {
        self.config
            .api_base_url
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE_URL)
            .trim_end_matches('/')
    }

    fn with_timeout(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let req = req.header("User-Agent", "lightcurve-fetch");
        match self.config.request_timeout {
            Some(timeout) => req.timeout(timeout),
            None => req,
        }
    }

    async fn invoke<T: DeserializeOwned>(
        &self,
        request: &serde_json::Value,
    ) -> Result<Vec<T>, ArchiveError> {
        let url = format!("{}/api/v0/invoke", self.api_base());
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("request", &request.to_string())
            .finish();

        let resp = self
            .with_timeout(self.client.post(&url))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|e| ArchiveError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ArchiveError::Network(format!(
                "HTTP {}: {}",
                resp.status(),
                url
            )));
        }

        let parsed: InvokeResponse<T> = resp
            .json()
            .await
            .map_err(|e| ArchiveError::Parse(e.to_string()))?;

        if let Some(status) = &parsed.status
            && status.eq_ignore_ascii_case("ERROR")
        {
            return Err(ArchiveError::Other(format!(
                "MAST error: {}",
                parsed.msg.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(parsed.data)
    }

    fn download_url(&self, data_uri: &str) -> Result<url::Url, ArchiveError> {
        let mut url = url::Url::parse(&format!("{}/api/v0.1/Download/file", self.api_base()))
            .map_err(|e| ArchiveError::Other(format!("invalid API base URL: {e}")))?;
        url.query_pairs_mut().append_pair("uri", data_uri);
        Ok(url)
    }

    async fn download(&self, data_uri: &str) -> Result<Vec<u8>, ArchiveError> {
        let url = self.download_url(data_uri)?;

        let resp = self
            .with_timeout(self.client.get(url.clone()))
            .send()
            .await
            .map_err(|e| ArchiveError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ArchiveError::Network(format!(
                "HTTP {}: {}",
                resp.status(),
                url
            )));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ArchiveError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait::async_trait]
impl Archive for MastArchive {
    fn label(&self) -> &str {
        "MAST"
    }

    async fn fetch(&self, target: &TargetId) -> Result<LightCurve, ArchiveError> {
        let name = invoke::target_name(&self.config.mission, target);

        let observations: Vec<Observation> = self
            .invoke(&invoke::search_request(&self.config.mission, &name))
            .await?;
        let Some(obsid) = observations.iter().find_map(Observation::obsid) else {
            return Err(ArchiveError::NotFound(target.clone()));
        };
        tracing::debug!(
            kepler_id = %target,
            %obsid,
            found = observations.len(),
            "found observations"
        );

        let products: Vec<Product> = self.invoke(&invoke::products_request(&obsid)).await?;
        let Some(product) = products.into_iter().find(Product::is_light_curve) else {
            return Err(ArchiveError::NotFound(target.clone()));
        };
        tracing::debug!(kepler_id = %target, uri = %product.data_uri, "downloading light curve");

        let bytes = self.download(&product.data_uri).await?;

        tokio::task::spawn_blocking(move || decode_light_curve(&bytes))
            .await
            .map_err(|e| ArchiveError::Other(format!("FITS decoder stopped: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_url_escapes_the_data_uri() {
        let archive = MastArchive::new(MastArchiveConfig {
            api_base_url: Some("http://localhost:1234/".into()),
            ..Default::default()
        });
        let url = archive
            .download_url("mast:KEPLER/url/missions/kepler/a b_llc.fits")
            .unwrap();
        assert_eq!(url.path(), "/api/v0.1/Download/file");
        assert_eq!(
            url.query_pairs().next().map(|(k, v)| (k.into_owned(), v.into_owned())),
            Some((
                "uri".to_owned(),
                "mast:KEPLER/url/missions/kepler/a b_llc.fits".to_owned()
            ))
        );
    }

    #[test]
    fn default_config_targets_kepler() {
        let config = MastArchiveConfig::default();
        assert_eq!(config.mission, "Kepler");
        assert!(config.api_base_url.is_none());
        assert_eq!(MastArchive::new(config).api_base(), DEFAULT_API_BASE_URL);
    }
}
