//! Uniform request parameters.
//!
//! Handlers receive one shape regardless of how the parameters arrived:
//! GET requests contribute their query-string pairs, POST requests their
//! JSON object body. A POST body that fails to parse is a 422.

use axum::extract::{FromRequest, Request};
use http::Method;
use serde_json::{Map, Value};

use crate::error::ServerError;

/// Largest accepted request body, in bytes.
const BODY_LIMIT: usize = 2 * 1024 * 1024;

/// The unified parameter map handed to every handler.
#[derive(Debug, Clone, Default)]
pub struct Params(pub Map<String, Value>);

impl Params {
    /// Look up a parameter by name.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Look up a string parameter by name.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Whether no parameters were supplied.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S> FromRequest<S> for Params
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        match *req.method() {
            Method::GET => {
                let query = req.uri().query().unwrap_or("");
                let map = url::form_urlencoded::parse(query.as_bytes())
                    .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
                    .collect();
                Ok(Self(map))
            }
            Method::POST => {
                let bytes = axum::body::to_bytes(req.into_body(), BODY_LIMIT)
                    .await
                    .map_err(|e| ServerError::BodyParse(e.to_string()))?;

                if bytes.is_empty() {
                    return Ok(Self::default());
                }

                let value: Value = serde_json::from_slice(&bytes)
                    .map_err(|e| ServerError::BodyParse(e.to_string()))?;

                match value {
                    Value::Object(map) => Ok(Self(map)),
                    _ => Err(ServerError::BodyParse("expected a JSON object".to_string())),
                }
            }
            _ => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use http::StatusCode;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    async fn extract(req: Request) -> Result<Params, ServerError> {
        Params::from_request(req, &()).await
    }

    #[tokio::test]
    async fn test_get_query_params() {
        let req = Request::builder()
            .method(Method::GET)
            .uri("/users?name=mm&age=13")
            .body(Body::empty())
            .unwrap();

        let params = extract(req).await.unwrap();
        assert_eq!(params.get_str("name"), Some("mm"));
        assert_eq!(params.get("age"), Some(&json!("13")));
    }

    #[tokio::test]
    async fn test_get_without_query() {
        let req = Request::builder()
            .method(Method::GET)
            .uri("/users")
            .body(Body::empty())
            .unwrap();

        let params = extract(req).await.unwrap();
        assert!(params.is_empty());
    }

    #[tokio::test]
    async fn test_post_json_body() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/users")
            .body(Body::from(r#"{"name": "xx", "age": 12}"#))
            .unwrap();

        let params = extract(req).await.unwrap();
        assert_eq!(params.get_str("name"), Some("xx"));
        assert_eq!(params.get("age"), Some(&json!(12)));
    }

    #[tokio::test]
    async fn test_post_empty_body() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/users")
            .body(Body::empty())
            .unwrap();

        let params = extract(req).await.unwrap();
        assert!(params.is_empty());
    }

    #[tokio::test]
    async fn test_post_malformed_body_is_unprocessable() {
        use axum::response::IntoResponse;

        let req = Request::builder()
            .method(Method::POST)
            .uri("/users")
            .body(Body::from("not json"))
            .unwrap();

        let err = extract(req).await.unwrap_err();
        assert_eq!(
            err.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[tokio::test]
    async fn test_post_non_object_body_rejected() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/users")
            .body(Body::from("[1, 2, 3]"))
            .unwrap();

        assert!(extract(req).await.is_err());
    }
}
