use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tracing::info;

use super::router::DocumentUpdater;
use super::types::UpdateError;
use crate::content::{ContentClient, DescriptionUpdate, QueryParams, endpoints};
use crate::convert::{self, CodecError};

/// Derive every stored form from a binary document state
pub fn description_update(state: &[u8]) -> Result<DescriptionUpdate, CodecError> {
    let forms = convert::forms_from_binary(state)?;
    Ok(DescriptionUpdate {
        description_binary: convert::encode_base64(state),
        description_html: forms.description_html,
        description: forms.description,
    })
}

/// Updates workspace-level pages
pub struct WorkspacePageUpdater {
    client: Arc<ContentClient>,
}

impl WorkspacePageUpdater {
    pub fn new(client: Arc<ContentClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DocumentUpdater for WorkspacePageUpdater {
    async fn update(
        &self,
        params: &QueryParams,
        page_id: &str,
        description: Bytes,
        cookie: Option<&str>,
    ) -> Result<(), UpdateError> {
        let path = endpoints::workspace_page(params, page_id)?;
        let body = description_update(&description)?;
        self.client.patch_description(&path, &body, cookie).await?;
        info!(page_id, "Workspace page description updated");
        Ok(())
    }
}

/// Updates pages owned by a teamspace
pub struct TeamspacePageUpdater {
    client: Arc<ContentClient>,
}

impl TeamspacePageUpdater {
    pub fn new(client: Arc<ContentClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DocumentUpdater for TeamspacePageUpdater {
    async fn update(
        &self,
        params: &QueryParams,
        page_id: &str,
        description: Bytes,
        cookie: Option<&str>,
    ) -> Result<(), UpdateError> {
        let path = endpoints::teamspace_page(params, page_id)?;
        let body = description_update(&description)?;
        self.client.patch_description(&path, &body, cookie).await?;
        info!(page_id, "Teamspace page description updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContentConfig;
    use crate::content::EndpointError;
    use crate::convert::{DocumentConverter, HtmlConverter};
    use axum::{
        Json, Router,
        extract::{Path, State},
        http::HeaderMap,
        routing::patch,
    };
    use std::sync::Mutex;
    use tokio::net::TcpListener;

    type Captured = Arc<Mutex<Vec<(String, Option<String>, serde_json::Value)>>>;

    async fn capture(
        State(captured): State<Captured>,
        Path(rest): Path<String>,
        headers: HeaderMap,
        Json(body): Json<serde_json::Value>,
    ) -> &'static str {
        let cookie = headers
            .get("cookie")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        captured.lock().unwrap().push((format!("/{rest}"), cookie, body));
        "{\"message\": \"Updated successfully\"}"
    }

    async fn content_service() -> (Arc<ContentClient>, Captured) {
        let captured: Captured = Arc::default();
        let app = Router::new()
            .route("/{*rest}", patch(capture))
            .with_state(captured.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = ContentConfig {
            base_url: format!("http://{}", addr),
            ..ContentConfig::default()
        };
        (Arc::new(ContentClient::new(&config).unwrap()), captured)
    }

    fn state(html: &str) -> Bytes {
        let converted = HtmlConverter::new().convert(html, "document").unwrap();
        Bytes::from(converted.description_binary)
    }

    #[test]
    fn test_description_update_carries_all_forms() {
        let update = description_update(&state("<p>hi</p>")).unwrap();

        assert_eq!(update.description_html, "<p>hi</p>");
        assert_eq!(update.description["type"], "doc");
        assert!(!update.description_binary.is_empty());
    }

    #[test]
    fn test_description_update_rejects_invalid_state() {
        assert!(description_update(&[0xff, 0xff]).is_err());
    }

    #[tokio::test]
    async fn test_workspace_updater_patches_workspace_endpoint() {
        let (client, captured) = content_service().await;
        let updater = WorkspacePageUpdater::new(client);
        let params = QueryParams::new().with("workspaceSlug", "acme");

        updater
            .update(&params, "p1", state("<h1>T</h1>"), Some("session=1"))
            .await
            .unwrap();

        let captured = captured.lock().unwrap();
        assert_eq!(captured.len(), 1);
        let (path, cookie, body) = &captured[0];
        assert_eq!(path, "/api/workspaces/acme/pages/p1/description/");
        assert_eq!(cookie.as_deref(), Some("session=1"));
        assert_eq!(body["description_html"], "<h1>T</h1>");
    }

    #[tokio::test]
    async fn test_teamspace_updater_requires_teamspace_id() {
        let (client, captured) = content_service().await;
        let updater = TeamspacePageUpdater::new(client);
        let params = QueryParams::new().with("workspaceSlug", "acme");

        let err = updater
            .update(&params, "p1", state("<p>x</p>"), None)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            UpdateError::Endpoint(EndpointError::MissingParam(_))
        ));
        assert!(captured.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_teamspace_updater_patches_teamspace_endpoint() {
        let (client, captured) = content_service().await;
        let updater = TeamspacePageUpdater::new(client);
        let params = QueryParams::new()
            .with("workspaceSlug", "acme")
            .with("teamspaceId", "t1");

        updater
            .update(&params, "p9", state("<p>x</p>"), None)
            .await
            .unwrap();

        let captured = captured.lock().unwrap();
        assert_eq!(
            captured[0].0,
            "/api/workspaces/acme/teamspaces/t1/pages/p9/description/"
        );
        assert!(captured[0].1.is_none());
    }
}
