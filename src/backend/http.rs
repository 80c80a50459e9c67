//! HTTP implementation of [`Backend`]: form-encoded POSTs, JSON replies.

use super::{
    Backend, BackendError, ExampleFaceRecord, LoadFacesResponse, ProcessPhotoRequest,
    ProcessPhotoResponse,
};
use crate::config::BackendConfig;
use async_trait::async_trait;
use log::debug;
use serde::de::DeserializeOwned;
use url::Url;

pub struct HttpBackend {
    client: reqwest::Client,
    load_faces_url: Url,
    process_photo_url: Url,
}

impl HttpBackend {
    /// Resolve both endpoint URLs against the configured base URL.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| BackendError::Request(format!("invalid base URL: {e}")))?;
        let join = |path: &str| {
            base.join(path)
                .map_err(|e| BackendError::Request(format!("invalid endpoint '{path}': {e}")))
        };
        Ok(Self {
            client: reqwest::Client::new(),
            load_faces_url: join(&config.load_faces_path)?,
            process_photo_url: join(&config.process_photo_path)?,
        })
    }

    async fn post_form<F, T>(&self, url: &Url, form: &F) -> Result<T, BackendError>
    where
        F: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("POST {url}");
        let response = self
            .client
            .post(url.clone())
            .form(form)
            .send()
            .await
            .map_err(|e| BackendError::Request(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status(status.as_u16()));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn load_example_faces(&self, part: &str) -> Result<Vec<ExampleFaceRecord>, BackendError> {
        let response: LoadFacesResponse = self
            .post_form(&self.load_faces_url, &[("partOfFace", part)])
            .await?;
        Ok(response.example_faces)
    }

    async fn process_photo(
        &self,
        request: &ProcessPhotoRequest,
    ) -> Result<ProcessPhotoResponse, BackendError> {
        self.post_form(&self.process_photo_url, request).await
    }
}
