use async_trait::async_trait;
use reqwest::{Client, Response};
use url::Url;

use crate::api::{add_path, hit_path, list_path, set_favorite_path, BookmarkApi};
use crate::app::{Result, SatchelError};
use crate::config::ServerConfig;
use crate::domain::bookmark::decode_list;
use crate::domain::{BookmarkEntry, QueryKey};

pub struct HttpApi {
    client: Client,
    base_url: Url,
}

impl HttpApi {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let mut base_url = Url::parse(&config.base_url)
            .map_err(|e| SatchelError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        // Endpoints resolve below the base path, so it must end in a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| SatchelError::InvalidUrl(format!("{}: {}", path, e)))
    }

    async fn post(&self, path: &str) -> Result<()> {
        let url = self.endpoint(path)?;
        tracing::debug!("POST {}", url);
        let response = self.client.post(url).send().await?;
        check_status(response)?;
        Ok(())
    }
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(SatchelError::Network(format!(
            "{} returned {}",
            response.url().path(),
            status
        )))
    }
}

#[async_trait]
impl BookmarkApi for HttpApi {
    async fn list(&self, key: &QueryKey) -> Result<Vec<BookmarkEntry>> {
        let url = self.endpoint(&list_path(key))?;
        tracing::debug!("GET {}", url);

        let response = check_status(self.client.get(url).send().await?)?;
        let body = response.bytes().await?;
        Ok(decode_list(&body)?)
    }

    async fn add(&self, url: &str) -> Result<()> {
        self.post(&add_path(url)).await
    }

    async fn hit(&self, url: &str) -> Result<()> {
        self.post(&hit_path(url)).await
    }

    async fn set_favorite(&self, url: &str, is_favorite: bool) -> Result<()> {
        self.post(&set_favorite_path(url, is_favorite)).await
    }
}
