use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use log::{error, info, warn};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use url::form_urlencoded;

use crate::azure::MonitorApi;
use crate::error::{ExporterError, Result};
use crate::exposition::PrometheusSink;
use crate::scrape::Scraper;

const LANDING_PAGE: &str = r#"<html>
<head><title>Azure Exporter</title></head>
<body>
<h1>Azure Exporter</h1>
<p><a href="/metrics">Metrics</a></p>
</body>
</html>"#;

/// Query parameter selecting the resources to scrape
pub const TAG_VALUE_PARAM: &str = "tagValue";

/// Serve the landing page and the scrape endpoint until `shutdown` resolves
pub async fn serve<A, F>(addr: SocketAddr, scraper: Arc<Scraper<A>>, shutdown: F) -> Result<()>
where
    A: MonitorApi,
    F: Future<Output = ()>,
{
    let make_svc = make_service_fn(move |_conn| {
        let scraper = scraper.clone();
        async move { Ok::<_, Infallible>(service_fn(move |req| handle(req, scraper.clone()))) }
    });

    let server = Server::try_bind(&addr)
        .map_err(|e| ExporterError::Config(format!("Failed to bind {}: {}", addr, e)))?
        .serve(make_svc);

    info!("azure_exporter listening on {}", addr);

    server
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ExporterError::Other(format!("HTTP server error: {}", e)))
}

/// Route one request
pub async fn handle<A: MonitorApi>(req: Request<Body>, scraper: Arc<Scraper<A>>) -> std::result::Result<Response<Body>, Infallible> {
    if req.method() != Method::GET {
        return Ok(status(StatusCode::METHOD_NOT_ALLOWED));
    }

    let path = req.uri().path().to_string();
    let tag_value = tag_value(req.uri().query()).unwrap_or_default();

    let response = match path.as_str() {
        "/" => html(LANDING_PAGE),
        "/metrics" => scrape(&scraper, &tag_value).await,
        _ => status(StatusCode::NOT_FOUND),
    };
    Ok(response)
}

/// Value of the `tagValue` parameter in a query string
pub fn tag_value(query: Option<&str>) -> Option<String> {
    form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == TAG_VALUE_PARAM)
        .map(|(_, value)| value.into_owned())
}

async fn scrape<A: MonitorApi>(scraper: &Scraper<A>, tag_value: &str) -> Response<Body> {
    if tag_value.is_empty() {
        warn!("Tag value is empty");
    }

    let mut sink = match PrometheusSink::new() {
        Ok(sink) => sink,
        Err(e) => {
            error!("Failed to create metric registry: {}", e);
            return Response::new(Body::empty());
        }
    };

    let started = Instant::now();
    scraper.scrape(tag_value, &mut sink).await;
    info!("Scrape for {} took {:?}", tag_value, started.elapsed());

    match sink.render() {
        Ok((body, content_type)) => {
            let mut response = Response::new(Body::from(body));
            if let Ok(value) = HeaderValue::from_str(&content_type) {
                response.headers_mut().insert(CONTENT_TYPE, value);
            }
            response
        }
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            Response::new(Body::empty())
        }
    }
}

fn html(page: &'static str) -> Response<Body> {
    let mut response = Response::new(Body::from(page));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));
    response
}

fn status(code: StatusCode) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = code;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::azure::models::{MetricDefinition, MetricValue, ResourceDescriptor};
    use crate::azure::{Token, TokenCache, TokenExchange};
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use std::sync::Mutex;

    struct FixedExchange;

    #[async_trait]
    impl TokenExchange for FixedExchange {
        async fn exchange(&self) -> Result<Token> {
            Ok(Token {
                value: "token".to_string(),
                audience: "https://management.azure.com/".to_string(),
                expires_at: Utc::now() + Duration::hours(1),
            })
        }
    }

    #[derive(Default)]
    struct EmptyApi {
        tags: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MonitorApi for EmptyApi {
        async fn list_resources(&self, _token: &Token, tag_value: &str) -> Result<Vec<ResourceDescriptor>> {
            self.tags.lock().unwrap().push(tag_value.to_string());
            if tag_value.is_empty() {
                return Err(ExporterError::Validation("Tag value is empty".to_string()));
            }
            Ok(Vec::new())
        }

        async fn metric_definitions(&self, _token: &Token, _resource_id: &str) -> Result<Vec<MetricDefinition>> {
            Ok(Vec::new())
        }

        async fn metric_values(
            &self,
            _token: &Token,
            _resource_id: &str,
            _metric_names: &str,
            _aggregation: &str,
        ) -> Result<Vec<MetricValue>> {
            Ok(Vec::new())
        }
    }

    fn scraper() -> (Arc<Scraper<EmptyApi>>, Arc<EmptyApi>) {
        let api = Arc::new(EmptyApi::default());
        let tokens = Arc::new(TokenCache::new(FixedExchange));
        (Arc::new(Scraper::new(api.clone(), tokens, "Total")), api)
    }

    async fn get(uri: &str, scraper: Arc<Scraper<EmptyApi>>) -> (StatusCode, String) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = handle(req, scraper).await.unwrap();
        let status = response.status();
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[test]
    fn test_tag_value_parsing() {
        assert_eq!(tag_value(Some("tagValue=shop")), Some("shop".to_string()));
        assert_eq!(tag_value(Some("a=1&tagValue=my%20app")), Some("my app".to_string()));
        assert_eq!(tag_value(Some("tagvalue=shop")), None);
        assert_eq!(tag_value(None), None);
    }

    #[tokio::test]
    async fn test_landing_page() {
        let (scraper, _) = scraper();
        let (status, body) = get("/", scraper).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"<a href="/metrics">Metrics</a>"#));
    }

    #[tokio::test]
    async fn test_metrics_passes_tag_value() {
        let (scraper, api) = scraper();
        let (status, body) = get("/metrics?tagValue=shop", scraper).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("azure_exporter_build_info"));
        assert_eq!(*api.tags.lock().unwrap(), vec!["shop".to_string()]);
    }

    #[tokio::test]
    async fn test_metrics_without_tag_still_answers() {
        let (scraper, api) = scraper();
        let (status, _) = get("/metrics", scraper).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(*api.tags.lock().unwrap(), vec![String::new()]);
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let (scraper, _) = scraper();
        let (status, _) = get("/nope", scraper).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
