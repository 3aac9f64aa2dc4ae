//! Authenticated client for the OBS REST API.
//!
//! Covers the three operations this tool needs: rewriting a package
//! `_service` definition, triggering a service remote run, and polling
//! the project summary until the build settles. See the open-build-service
//! API reference at `/docs/api/api/api.txt` for the endpoints.

use crate::error::{ObsError, Result};
use crate::report::parse_summary;
use crate::status::AggregateStatus;
use reqwest::{Response, StatusCode};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Public openSUSE build service endpoint.
pub const DEFAULT_API_URL: &str = "https://api.opensuse.org";

/// Connection settings for one build-service account and project.
#[derive(Debug, Clone)]
pub struct ObsConfig {
    /// API endpoint, without trailing slash.
    pub api_url: String,
    pub username: String,
    pub password: String,
    /// Project whose build status is watched.
    pub project: String,
}

impl ObsConfig {
    /// Config against the public openSUSE endpoint.
    pub fn new(username: &str, password: &str, project: &str) -> Self {
        ObsConfig {
            api_url: DEFAULT_API_URL.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            project: project.to_string(),
        }
    }

    /// Point the client at a private build-service instance.
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }
}

/// Build-service client. Holds one HTTP session (credentials and cookie
/// jar) for its whole lifetime; not meant to be shared across concurrent
/// callers.
pub struct ObsClient {
    config: ObsConfig,
    http: reqwest::Client,
}

impl ObsClient {
    pub fn new(config: ObsConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("obswatch/", env!("CARGO_PKG_VERSION")))
            .cookie_store(true)
            .build()?;

        Ok(ObsClient { config, http })
    }

    /// Trigger a source-service re-run on the server side.
    ///
    /// `POST /source/<project>/<package>?cmd=runservice` with an empty
    /// body. Any 2xx response is success.
    pub async fn service_remoterun(&self, package: &str) -> Result<()> {
        let url = format!(
            "{}/source/{}/{}?cmd=runservice",
            self.config.api_url, self.config.project, package
        );
        debug!(%url, "triggering service remote run");

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .body("")
            .send()
            .await?;
        check_response(response).await?;
        Ok(())
    }

    /// Rewrite the package `_service` definition so the next remote run
    /// fetches sources from `source_url` at `revision`.
    ///
    /// `PUT /source/<project>/<package>/_service` with a `tar_scm`
    /// service definition as payload.
    pub async fn upload_service(
        &self,
        package: &str,
        source_url: &str,
        revision: &str,
    ) -> Result<()> {
        let url = format!(
            "{}/source/{}/{}/_service",
            self.config.api_url, self.config.project, package
        );
        debug!(%url, %source_url, %revision, "uploading service definition");

        let response = self
            .http
            .put(&url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .body(service_definition(source_url, revision))
            .send()
            .await?;
        check_response(response).await?;
        Ok(())
    }

    /// Fetch the raw project summary report.
    ///
    /// `GET /build/<project>/_result?view=summary`, returned verbatim.
    pub async fn fetch_status_report(&self) -> Result<String> {
        let url = format!(
            "{}/build/{}/_result?view=summary",
            self.config.api_url, self.config.project
        );
        debug!(%url, "fetching status report");

        let response = self
            .http
            .get(&url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await?;
        let response = check_response(response).await?;
        Ok(response.text().await?)
    }

    /// Fetch, parse, and reduce the project status once.
    pub async fn project_status(&self) -> Result<AggregateStatus> {
        let raw = self.fetch_status_report().await?;
        if raw.is_empty() {
            return Err(ObsError::Protocol(format!(
                "got empty status report for project {}",
                self.config.project
            )));
        }
        crate::status::reduce(&parse_summary(&raw))
    }

    /// Poll the project status until it settles, sleeping `interval`
    /// between rounds.
    ///
    /// Progress is surfaced through tracing on every round. There is no
    /// retry cap or overall timeout; the remote build is expected to
    /// eventually publish or fail.
    pub async fn wait_for_publish(&self, interval: Duration) -> Result<AggregateStatus> {
        loop {
            let status = self.project_status().await?;
            if status.is_terminal() {
                if status.reason.is_empty() {
                    info!("build finished, repositories published");
                } else {
                    warn!(reason = %status.reason, "build settled with failures");
                }
                return Ok(status);
            }

            info!(reason = %status.reason, "still building");
            tokio::time::sleep(interval).await;
        }
    }
}

/// Translate transport responses into the error taxonomy: 401 becomes an
/// authentication failure, any other non-2xx a protocol violation with
/// the response body as diagnostic text.
async fn check_response(response: Response) -> Result<Response> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(ObsError::AuthFailure);
    }
    if !status.is_success() {
        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_default();
        return Err(ObsError::Protocol(format!(
            "{} got http error {}: {}",
            url,
            status.as_u16(),
            body
        )));
    }
    Ok(response)
}

fn service_definition(source_url: &str, revision: &str) -> String {
    format!(
        concat!(
            "<services>\n",
            "  <service name=\"tar_scm\">\n",
            "    <param name=\"scm\">git</param>\n",
            "    <param name=\"url\">{}</param>\n",
            "    <param name=\"revision\">{}</param>\n",
            "  </service>\n",
            "</services>\n"
        ),
        xml_escape(source_url),
        xml_escape(revision)
    )
}

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
