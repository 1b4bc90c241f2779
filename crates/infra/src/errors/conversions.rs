//! Conversions from external infrastructure errors into domain errors.

use std::io::{Error as IoError, ErrorKind};

use bookdesk_domain::BookdeskError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub BookdeskError);

impl From<InfraError> for BookdeskError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<BookdeskError> for InfraError {
    fn from(value: BookdeskError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoBookdeskError {
    fn into_bookdesk(self) -> BookdeskError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → BookdeskError */
/* -------------------------------------------------------------------------- */

impl IntoBookdeskError for HttpError {
    fn into_bookdesk(self) -> BookdeskError {
        if self.is_timeout() {
            return BookdeskError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return BookdeskError::Network("HTTP connection failure".into());
        }

        if self.is_builder() {
            return BookdeskError::Config(format!("invalid HTTP request: {self}"));
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => BookdeskError::Auth(message),
                400..=499 => BookdeskError::InvalidInput(message),
                _ => BookdeskError::Network(message),
            };
        }

        BookdeskError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_bookdesk())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error → BookdeskError */
/* -------------------------------------------------------------------------- */

impl IntoBookdeskError for IoError {
    fn into_bookdesk(self) -> BookdeskError {
        match self.kind() {
            ErrorKind::NotFound => BookdeskError::Storage(format!("file not found: {self}")),
            ErrorKind::PermissionDenied => {
                BookdeskError::Storage(format!("permission denied: {self}"))
            }
            _ => BookdeskError::Storage(self.to_string()),
        }
    }
}

impl From<IoError> for InfraError {
    fn from(value: IoError) -> Self {
        InfraError(value.into_bookdesk())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use reqwest::{Client, StatusCode};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn io_not_found_maps_to_storage_error() {
        let err = IoError::new(ErrorKind::NotFound, "session.json");
        let mapped: BookdeskError = InfraError::from(err).into();
        match mapped {
            BookdeskError::Storage(msg) => assert!(msg.contains("not found")),
            other => panic!("expected storage error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn http_status_401_maps_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(StatusCode::UNAUTHORIZED))
            .mount(&server)
            .await;

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(server.uri()).send().await.unwrap().error_for_status().unwrap_err();

        let mapped: BookdeskError = InfraError::from(error).into();
        match mapped {
            BookdeskError::Auth(msg) => assert!(msg.contains("401")),
            other => panic!("expected auth error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn connection_refused_maps_to_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(format!("http://{addr}")).send().await.unwrap_err();

        let mapped: BookdeskError = InfraError::from(error).into();
        assert!(matches!(mapped, BookdeskError::Network(_)));
    }
}
