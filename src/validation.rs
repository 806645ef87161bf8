// Request body extraction with validation
// Every malformed or invalid body becomes a 400 in the API's error format

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::auth::AuthError;

/// JSON body that has been deserialized and passed `Validate`
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(request, state)
            .await
            .map_err(|rejection| AuthError::ValidationError(rejection.body_text()))?;

        value
            .validate()
            .map_err(|errors| AuthError::ValidationError(errors.to_string()))?;

        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::header};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Payload {
        #[validate(email)]
        email: String,
    }

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_body_is_extracted() {
        let ValidatedJson(payload) =
            ValidatedJson::<Payload>::from_request(json_request(r#"{"email":"a@b.com"}"#), &())
                .await
                .unwrap();

        assert_eq!(payload.email, "a@b.com");
    }

    #[tokio::test]
    async fn test_bad_bodies_become_validation_errors() {
        for body in [r#"{"email":"nope"}"#, r#"{"mail":"a@b.com"}"#, "{not json"] {
            let result = ValidatedJson::<Payload>::from_request(json_request(body), &()).await;
            assert!(
                matches!(result, Err(AuthError::ValidationError(_))),
                "body {:?}",
                body
            );
        }
    }
}
