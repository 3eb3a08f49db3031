use std::error::Error;

use imged::web::response::ApiResponse;
use reqwest::{StatusCode, multipart::Form};
use serde::de::DeserializeOwned;

pub struct ApiClient {
    pub url: String,
}

type ApiResult<T> = Result<(StatusCode, ApiResponse<T>), Box<dyn Error>>;

impl ApiClient {
    fn path(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.url)
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
        let status = response.status();
        let body = response.text().await?;
        Ok((status, serde_json::from_str(&body)?))
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        client: &reqwest::Client,
        endpoint: &str,
    ) -> ApiResult<T> {
        Self::parse(client.get(self.path(endpoint)).send().await?).await
    }

    pub async fn get_with_token<T: DeserializeOwned>(
        &self,
        client: &reqwest::Client,
        endpoint: &str,
        token: &str,
    ) -> ApiResult<T> {
        let response = client
            .get(self.path(endpoint))
            .bearer_auth(token)
            .send()
            .await?;
        Self::parse(response).await
    }

    pub async fn post_form<T: DeserializeOwned>(
        &self,
        client: &reqwest::Client,
        endpoint: &str,
        form: &[(&str, &str)],
    ) -> ApiResult<T> {
        Self::parse(client.post(self.path(endpoint)).form(form).send().await?).await
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        client: &reqwest::Client,
        endpoint: &str,
        form: Form,
    ) -> ApiResult<T> {
        let response = client
            .post(self.path(endpoint))
            .multipart(form)
            .send()
            .await?;
        Self::parse(response).await
    }
}
