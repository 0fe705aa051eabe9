use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::EntityPk,
    error::{ApiError, ApiException, ErrorCode},
    protocol::{EntityPage, FilterSet, SiblingBundle},
};
use url::Url;

use crate::config::Settings;

/// Data-fetch seam between the entity list session and the backend. A call
/// either succeeds atomically or fails; the session never retries here.
#[async_trait]
pub trait EntityGateway: Send + Sync {
    async fn fetch_page(
        &self,
        locale: &str,
        project: &str,
        resource: &str,
        filters: &FilterSet,
    ) -> Result<EntityPage>;

    async fn fetch_siblings(&self, entity: EntityPk, locale: &str) -> Result<SiblingBundle>;
}

pub struct MissingEntityGateway;

#[async_trait]
impl EntityGateway for MissingEntityGateway {
    async fn fetch_page(
        &self,
        locale: &str,
        project: &str,
        _resource: &str,
        _filters: &FilterSet,
    ) -> Result<EntityPage> {
        Err(anyhow::anyhow!(
            "entity gateway unavailable for locale {locale} project {project}"
        ))
    }

    async fn fetch_siblings(&self, entity: EntityPk, locale: &str) -> Result<SiblingBundle> {
        Err(anyhow::anyhow!(
            "entity gateway unavailable for entity {} locale {locale}",
            entity.0
        ))
    }
}

pub struct HttpEntityGateway {
    http: Client,
    base_url: Url,
}

fn join_pks(pks: &[EntityPk]) -> String {
    pks.iter()
        .map(|pk| pk.0.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

impl HttpEntityGateway {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).context("invalid entity API base url")?;
        Ok(Self {
            http: Client::new(),
            base_url,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url =
            Url::parse(&settings.api_base_url).context("invalid entity API base url")?;
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(settings.request_timeout_secs))
            .build()
            .context("failed to build http client")?;
        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .with_context(|| format!("invalid endpoint path {path}"))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = serde_json::from_str::<ApiError>(&body).unwrap_or_else(|_| {
                ApiError::new(ErrorCode::from_http_status(status.as_u16()), body)
            });
            return Err(ApiException::from(error).into());
        }
        response
            .json::<T>()
            .await
            .with_context(|| format!("malformed response from {url}"))
    }
}

#[async_trait]
impl EntityGateway for HttpEntityGateway {
    async fn fetch_page(
        &self,
        locale: &str,
        project: &str,
        resource: &str,
        filters: &FilterSet,
    ) -> Result<EntityPage> {
        let mut url = self.endpoint("get-entities/")?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("locale", locale);
            query.append_pair("project", project);
            query.append_pair("resource", resource);
            if let Some(ids) = &filters.entity_ids {
                query.append_pair("entity_ids", &join_pks(ids));
            }
            if !filters.exclude_entities.is_empty() {
                query.append_pair("exclude_entities", &join_pks(&filters.exclude_entities));
            }
            if let Some(search) = &filters.search {
                query.append_pair("search", search);
            }
            if let Some(status) = &filters.status {
                query.append_pair("status", status);
            }
            if let Some(extra) = &filters.extra {
                query.append_pair("extra", extra);
            }
            if let Some(tag) = &filters.tag {
                query.append_pair("tag", tag);
            }
            if let Some(author) = &filters.author {
                query.append_pair("author", author);
            }
            if let Some(time) = &filters.time {
                query.append_pair("time", &time.to_query());
            }
        }
        self.get_json(url).await
    }

    async fn fetch_siblings(&self, entity: EntityPk, locale: &str) -> Result<SiblingBundle> {
        let mut url = self.endpoint("get-sibling-entities/")?;
        url.query_pairs_mut()
            .append_pair("entity", &entity.0.to_string())
            .append_pair("locale", locale);
        self.get_json(url).await
    }
}

#[cfg(test)]
#[path = "tests/gateway_tests.rs"]
mod tests;
