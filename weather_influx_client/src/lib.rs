//! # weather_influx_client
//!
//! A small client for the write path of the [InfluxDB 2.x HTTP API][2api].
//!
//! It only covers what the weather importer needs: building [`DataPoint`]s,
//! rendering them as line protocol and posting them to `/api/v2/write`.
//!
//! [2api]: https://docs.influxdata.com/influxdb/v2/api/

mod data_point;

pub use data_point::*;
pub use reqwest::StatusCode;

use async_trait::async_trait;
use reqwest::{
    Body, IntoUrl, Method,
    header::{AUTHORIZATION, HeaderValue},
};
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use std::fmt::Debug;
use tracing::debug;
use url::Url;

/// Primary error type for the [`Client`]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("base URL error: {0}")]
    BaseUrl(#[source] reqwest::Error),

    #[error("request URL error: {0}")]
    RequestUrl(#[from] url::ParseError),

    #[error("auth token cannot be sent as an HTTP header")]
    InvalidToken,

    #[error("failed to read the API response text: {0}")]
    Text(#[source] reqwest::Error),

    #[error("server responded with error [{code}]: {message}")]
    ApiError { code: StatusCode, message: String },

    #[error("failed to send {method} {url} request: {source}")]
    RequestSend {
        method: Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl Error {
    fn request_send(method: Method, url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::RequestSend {
            method,
            url: url.into(),
            source,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Client for the HTTP API of an InfluxDB 2.x compatible server
#[derive(Debug, Clone)]
pub struct Client {
    /// The base URL for making requests to a running server
    base_url: Url,
    /// The token sent in the `Authorization: Token ...` header of each request
    auth_token: Option<Secret<String>>,
    /// A [`reqwest::Client`] for handling HTTP requests
    http_client: reqwest::Client,
}

impl Client {
    /// Create a new [`Client`]
    ///
    /// Any path in `base_url` is kept as a prefix of the API paths, so a
    /// server behind a reverse proxy at `http://host/influx` is reached at
    /// `http://host/influx/api/v2/write`.
    pub fn new<U: IntoUrl>(base_url: U) -> Result<Self> {
        let mut base_url = base_url.into_url().map_err(Error::BaseUrl)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            base_url,
            auth_token: None,
            http_client: reqwest::Client::new(),
        })
    }

    /// Set the token that will be sent with each request to the server
    ///
    /// # Example
    /// ```
    /// # use weather_influx_client::Client;
    /// # fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    /// let client = Client::new("http://localhost:8086")?
    ///     .with_auth_token("secret-token-string");
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_auth_token<S: Into<String>>(mut self, auth_token: S) -> Self {
        self.auth_token = Some(Secret::new(auth_token.into()));
        self
    }

    /// Compose a request to the `/api/v2/write` API
    ///
    /// # Example
    /// ```no_run
    /// # use weather_influx_client::{Client, Precision};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    /// let client = Client::new("http://localhost:8086")?;
    /// client
    ///     .api_v2_write("my-org", "my-bucket")
    ///     .precision(Precision::Second)
    ///     .body("weather,Stadt=Berlin Temperatur=21.5 1700000000")
    ///     .send()
    ///     .await
    ///     .expect("send write request");
    /// # Ok(())
    /// # }
    /// ```
    pub fn api_v2_write(
        &self,
        org: impl Into<String>,
        bucket: impl Into<String>,
    ) -> WriteRequestBuilder<'_, NoBody> {
        WriteRequestBuilder {
            client: self,
            org: org.into(),
            bucket: bucket.into(),
            precision: None,
            body: NoBody,
        }
    }

    /// Bind this client to an organization and bucket, producing a
    /// [`WriteApi`] that writes points with second precision.
    pub fn bucket_writer(
        self,
        org: impl Into<String>,
        bucket: impl Into<String>,
    ) -> BucketWriter {
        BucketWriter {
            client: self,
            org: org.into(),
            bucket: bucket.into(),
        }
    }

    fn auth_header(&self) -> Result<Option<HeaderValue>> {
        self.auth_token
            .as_ref()
            .map(|token| {
                let mut value = HeaderValue::from_str(&format!("Token {}", token.expose_secret()))
                    .map_err(|_| Error::InvalidToken)?;
                value.set_sensitive(true);
                Ok(value)
            })
            .transpose()
    }
}

/// The URL parameters of the request to the `/api/v2/write` API
#[derive(Debug, Serialize)]
struct WriteParams<'a> {
    org: &'a str,
    bucket: &'a str,
    precision: Option<Precision>,
}

impl<'a, B> From<&'a WriteRequestBuilder<'a, B>> for WriteParams<'a> {
    fn from(builder: &'a WriteRequestBuilder<'a, B>) -> Self {
        Self {
            org: &builder.org,
            bucket: &builder.bucket,
            precision: builder.precision,
        }
    }
}

/// Time series precision of the timestamps in a write request body
///
/// Points carry whole seconds, so that is the only precision offered.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum Precision {
    #[serde(rename = "s")]
    Second,
}

/// Builder type for composing a request to `/api/v2/write`
///
/// Produced by [`Client::api_v2_write`]
#[derive(Debug)]
pub struct WriteRequestBuilder<'c, B> {
    client: &'c Client,
    org: String,
    bucket: String,
    precision: Option<Precision>,
    body: B,
}

impl<B> WriteRequestBuilder<'_, B> {
    /// Set the precision
    pub fn precision(mut self, set_to: Precision) -> Self {
        self.precision = Some(set_to);
        self
    }
}

impl<'c> WriteRequestBuilder<'c, NoBody> {
    /// Set the line protocol body of the request
    pub fn body<T: Into<Body>>(self, body: T) -> WriteRequestBuilder<'c, Body> {
        WriteRequestBuilder {
            client: self.client,
            org: self.org,
            bucket: self.bucket,
            precision: self.precision,
            body: body.into(),
        }
    }
}

impl WriteRequestBuilder<'_, Body> {
    /// Send the request to the server
    pub async fn send(self) -> Result<()> {
        let url = self.client.base_url.join("api/v2/write")?;
        let url_str = url.to_string();
        let params = WriteParams::from(&self);
        let mut req = self.client.http_client.post(url).query(&params);
        if let Some(auth) = self.client.auth_header()? {
            req = req.header(AUTHORIZATION, auth);
        }
        let resp = req
            .body(self.body)
            .send()
            .await
            .map_err(|src| Error::request_send(Method::POST, url_str, src))?;
        let status = resp.status();
        match status {
            StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
            code => Err(Error::ApiError {
                code,
                message: resp.text().await.map_err(Error::Text)?,
            }),
        }
    }
}

#[doc(hidden)]
/// Typestate type for [`WriteRequestBuilder`]
#[derive(Debug, Copy, Clone)]
pub struct NoBody;

/// The write side of a store: accepts batches of points and owns the
/// connection they travel over.
///
/// Implementations deliver each batch in the order the points are given.
#[async_trait]
pub trait WriteApi: Debug + Send + Sync {
    /// Hand a batch of points to the transport. Returns once the transport
    /// has accepted them.
    async fn write(&self, points: &[DataPoint]) -> Result<()>;

    /// Release the underlying connection
    async fn close(self) -> Result<()>
    where
        Self: Sized;
}

/// A [`Client`] bound to one organization and bucket
///
/// Produced by [`Client::bucket_writer`]
#[derive(Debug)]
pub struct BucketWriter {
    client: Client,
    org: String,
    bucket: String,
}

#[async_trait]
impl WriteApi for BucketWriter {
    async fn write(&self, points: &[DataPoint]) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }

        let body = line_protocol_body(points);
        debug!(
            org = %self.org,
            bucket = %self.bucket,
            points = points.len(),
            bytes = body.len(),
            "writing line protocol"
        );

        self.client
            .api_v2_write(self.org.as_str(), self.bucket.as_str())
            .precision(Precision::Second)
            .body(body)
            .send()
            .await
    }

    async fn close(self) -> Result<()> {
        debug!(org = %self.org, bucket = %self.bucket, "closing write client");
        // dropping the last handle to the reqwest client shuts down its
        // connection pool
        drop(self.client);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use mockito::{Matcher, Server};

    use crate::{Client, DataPoint, Error, Precision, WriteApi};

    #[tokio::test]
    async fn api_v2_write() {
        let token = "super-secret-token";
        let org = "some-org";
        let bucket = "some-bucket";
        let body = "\
            cpu,host=s1 usage=0.5
            cpu,host=s1,region=us-west usage=0.7";

        let mut mock_server = Server::new_async().await;
        let mock = mock_server
            .mock("POST", "/api/v2/write")
            .match_header("Authorization", format!("Token {token}").as_str())
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("org".into(), org.into()),
                Matcher::UrlEncoded("bucket".into(), bucket.into()),
                Matcher::UrlEncoded("precision".into(), "s".into()),
            ]))
            .match_body(body)
            .with_status(204)
            .create_async()
            .await;

        let client = Client::new(mock_server.url())
            .expect("create client")
            .with_auth_token(token);

        client
            .api_v2_write(org, bucket)
            .precision(Precision::Second)
            .body(body)
            .send()
            .await
            .expect("send write request");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn bucket_writer_sends_points_as_line_protocol() {
        let token = "some-token";

        let mut mock_server = Server::new_async().await;
        let mock = mock_server
            .mock("POST", "/api/v2/write")
            .match_header("Authorization", format!("Token {token}").as_str())
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("org".into(), "o".into()),
                Matcher::UrlEncoded("bucket".into(), "b".into()),
                Matcher::UrlEncoded("precision".into(), "s".into()),
            ]))
            .match_body(
                "\
weather,Stadt=Berlin Luftdruck=1012i,Temperatur=21.5 1700000000
weather,Stadt=Hamburg Luftdruck=1009i,Temperatur=18 1700000600
",
            )
            .with_status(204)
            .expect(1)
            .create_async()
            .await;

        let writer = Client::new(mock_server.url())
            .expect("create client")
            .with_auth_token(token)
            .bucket_writer("o", "b");

        let points = vec![
            DataPoint::builder("weather")
                .tag("Stadt", "Berlin")
                .field("Temperatur", 21.5)
                .field("Luftdruck", 1012_i64)
                .timestamp(1_700_000_000)
                .build(),
            DataPoint::builder("weather")
                .tag("Stadt", "Hamburg")
                .field("Temperatur", 18.0)
                .field("Luftdruck", 1009_i64)
                .timestamp(1_700_000_600)
                .build(),
        ];

        // If the request is incorrect, mockito answers with 501 and `write`
        // fails here; the mock assertion below gives the clearer message, so
        // don't unwrap the result.
        let _result = writer.write(&points).await;

        mock.assert_async().await;
        writer.close().await.expect("close writer");
    }

    #[tokio::test]
    async fn empty_batches_are_not_sent() {
        let mut mock_server = Server::new_async().await;
        let mock = mock_server
            .mock("POST", "/api/v2/write")
            .expect(0)
            .create_async()
            .await;

        let writer = Client::new(mock_server.url())
            .expect("create client")
            .bucket_writer("o", "b");
        writer.write(&[]).await.expect("empty write");

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn server_errors_are_reported() {
        let mut mock_server = Server::new_async().await;
        let _mock = mock_server
            .mock("POST", "/api/v2/write")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body(r#"{"code":"unauthorized","message":"unauthorized access"}"#)
            .create_async()
            .await;

        let writer = Client::new(mock_server.url())
            .expect("create client")
            .with_auth_token("wrong")
            .bucket_writer("o", "b");
        let point = DataPoint::builder("weather")
            .field("Temperatur", 1.0)
            .build();

        let err = writer.write(&[point]).await.unwrap_err();
        match err {
            Error::ApiError { code, message } => {
                assert_eq!(code, reqwest::StatusCode::UNAUTHORIZED);
                assert!(message.contains("unauthorized access"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn base_url_path_is_kept_as_prefix() {
        let mut mock_server = Server::new_async().await;
        let prefixed = mock_server
            .mock("POST", "/influx/api/v2/write")
            .match_query(Matcher::Any)
            .with_status(204)
            .expect(2)
            .create_async()
            .await;
        let root = mock_server
            .mock("POST", "/api/v2/write")
            .match_query(Matcher::Any)
            .with_status(204)
            .expect(0)
            .create_async()
            .await;

        let point = DataPoint::builder("weather")
            .field("Temperatur", 1.0)
            .build();
        for base_url in [
            format!("{}/influx", mock_server.url()),
            format!("{}/influx/", mock_server.url()),
        ] {
            let writer = Client::new(base_url)
                .expect("create client")
                .bucket_writer("o", "b");
            writer.write(&[point.clone()]).await.expect("write point");
        }

        prefixed.assert_async().await;
        root.assert_async().await;
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            Client::new("not a url"),
            Err(Error::BaseUrl(_))
        ));
    }
}
