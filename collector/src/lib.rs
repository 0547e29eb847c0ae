//! HTTP endpoints that record pageview beacons and form submissions as spreadsheet rows.

pub mod beacon;
pub mod config;
pub mod endpoint;
pub mod errors;
pub mod extract;
pub mod form;
pub mod metrics_defs;
pub mod referer;
pub mod responses;
pub mod rows;
pub mod settings;
#[cfg(test)]
mod testutils;

pub use endpoint::{AppState, Destination, Endpoint};
pub use errors::CollectorError;

use axum::{
    Router,
    routing::{any, get},
};
use shared::admin_service::AdminService;
use shared::http::{bind, run_http_service};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Routes the beacon and form paths of `config` to their handlers.
pub fn router(config: &config::Config, state: AppState) -> Router {
    Router::new()
        .route(&config.beacon_path, get(beacon::handle))
        .route(&config.form_path, any(form::handle))
        .with_state(state)
}

/// Serves the collector and its admin listener until `shutdown` resolves.
pub async fn run<S>(config: config::Config, state: AppState, shutdown: S) -> Result<(), CollectorError>
where
    S: Future<Output = ()> + Send + 'static,
{
    config.validate()?;

    for (endpoint, destination) in [(Endpoint::Beacon, &state.beacon), (Endpoint::Form, &state.form)] {
        match destination {
            Destination::Sheet { sheet_title, apex_domain, .. } => tracing::info!(
                endpoint = endpoint.name(),
                sheet = %sheet_title,
                apex_domain = %apex_domain,
                "writes enabled"
            ),
            Destination::Disabled(missing) => tracing::warn!(
                endpoint = endpoint.name(),
                missing = ?missing.missing,
                "writes disabled, spreadsheet configuration incomplete"
            ),
        }
    }

    let ready = Arc::new(AtomicBool::new(false));
    let ready_flag = ready.clone();
    let admin_service: AdminService<_, CollectorError> =
        AdminService::new(move || ready_flag.load(Ordering::Relaxed));
    let admin_listener = bind(&config.admin_listener.host, config.admin_listener.port).await?;

    let listener = bind(&config.listener.host, config.listener.port).await?;
    let app = router(&config, state);
    tracing::info!(
        host = %config.listener.host,
        port = config.listener.port,
        beacon_path = %config.beacon_path,
        form_path = %config.form_path,
        "collector listening"
    );
    ready.store(true, Ordering::Relaxed);

    tokio::select! {
        result = axum::serve(listener, app).with_graceful_shutdown(shutdown) => result?,
        result = run_http_service(admin_listener, admin_service) => result?,
    }

    tracing::info!("collector stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{APEX, complete};
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use sheets::testutils::{MOCK_TOKEN, MockSheets};
    use sheets::{SpreadsheetClient, StaticTokenSource};
    use tower::ServiceExt;

    async fn state_backed_by(mock: &MockSheets) -> AppState {
        let api_url = mock.spawn().await;
        let destination = |endpoint| {
            Destination::with_appender(complete(endpoint), |settings| {
                let client: Arc<dyn sheets::RowAppender> = Arc::new(SpreadsheetClient::new(
                    api_url.clone(),
                    settings.spreadsheet_id.clone(),
                    Arc::new(StaticTokenSource(MOCK_TOKEN.into())),
                ));
                client
            })
        };

        AppState {
            beacon: destination(Endpoint::Beacon),
            form: destination(Endpoint::Form),
            form_body_limit: config::Config::default().form_body_limit,
        }
    }

    #[tokio::test]
    async fn test_end_to_end() {
        let mock = MockSheets::new("example.com analytics")
            .with_sheet(
                "Analytics",
                &["timestamp", "page", "hash", "params", "ua", "locale", "country", "headers"],
            )
            .with_sheet("Forms", &["timestamp", "formName", "formData", "country", "locale", "ua"]);
        let app = router(&config::Config::default(), state_backed_by(&mock).await);

        let response = app
            .clone()
            .oneshot(
                Request::get("/doorbell?pathname=%2Fpricing&hash=%23plans")
                    .header(header::REFERER, format!("https://www.{APEX}/pricing"))
                    .header(header::USER_AGENT, "Mozilla/5.0")
                    .header("x-country", "NL")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::post("/form")
                    .header(header::REFERER, format!("https://{APEX}/contact"))
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from("form-name=Contact&email=a%40b.com"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);

        let appended = mock.appended();
        assert_eq!(appended.len(), 2);

        let (sheet, values) = &appended[0];
        assert_eq!(sheet, "Analytics");
        assert_eq!(&values[1..4], &["/pricing", "#plans", ""]);
        assert_eq!(&values[4..7], &["Mozilla/5.0", "", "NL"]);

        let (sheet, values) = &appended[1];
        assert_eq!(sheet, "Forms");
        assert_eq!(&values[1..3], &["Contact", "form-name=Contact&email=a%40b.com"]);
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let mock = MockSheets::new("doc");
        let app = router(&config::Config::default(), state_backed_by(&mock).await);

        let response = app
            .oneshot(Request::get("/elsewhere").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(mock.request_count(), 0);
    }
}
