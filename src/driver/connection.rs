//! Gateway connection.
//!
//! This module provides the `Connection` type, which owns the credentials,
//! the session token and the transport, and exposes the query entry point.

use crate::connection::{ConnectionParams, Credentials, Session, SessionManager};
use crate::error::{ProtocolError, PsdbError, QueryError, TransportError};
use crate::query::{Context, GatewayResponse, ResultSet};
use crate::transport::messages::{CreateSessionRequest, ExecuteRequest};
use crate::transport::{HttpRequest, HttpTransport, Transport, EXECUTE_ENDPOINT, SESSION_ENDPOINT};

/// Content type of every request body.
const JSON_CONTENT_TYPE: &str = "application/json";

/// Fixed client identifier sent as `User-Agent`.
pub const USER_AGENT: &str = concat!("psdb-rs/", env!("CARGO_PKG_VERSION"));

/// Connection to a gateway.
///
/// A connection holds one session and is meant to have at most one query in
/// flight. Every method that can touch the session takes `&mut self`, so
/// sharing a connection between tasks requires external synchronization
/// (or, better, one connection per task).
///
/// # Example
///
/// ```no_run
/// use psdb_rs::Driver;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let driver = Driver::new();
/// let mut connection = driver.open("username=u&password=p&host=db.example.com&backend=psdb")?;
///
/// let mut results = connection.query("SELECT id, name FROM users").await?;
/// let mut row = vec![Vec::new(); results.column_count()];
/// while results.next(&mut row).is_ok() {
///     println!("{}", String::from_utf8_lossy(&row[1]));
/// }
///
/// connection.close()?;
/// # Ok(())
/// # }
/// ```
pub struct Connection {
    /// Transport for gateway exchanges
    transport: Box<dyn Transport>,
    /// Credentials used for the Authorization header
    credentials: Credentials,
    /// Session token state
    session: SessionManager,
    /// Connection parameters
    params: ConnectionParams,
}

impl Connection {
    /// Create a connection using the HTTP transport.
    ///
    /// No request is sent; the session is created by the first query.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the HTTP client cannot be initialized.
    pub fn from_params(params: ConnectionParams) -> Result<Self, TransportError> {
        let transport = HttpTransport::from_params(&params)?;
        Ok(Self::with_transport(params, Box::new(transport)))
    }

    /// Create a connection over a custom transport.
    pub fn with_transport(params: ConnectionParams, transport: Box<dyn Transport>) -> Self {
        let credentials = Credentials::new(params.username.clone(), params.password().to_string());

        Self {
            transport,
            credentials,
            session: SessionManager::new(),
            params,
        }
    }

    /// Execute a query and return its decoded results.
    ///
    /// Creates a session first if none is held.
    ///
    /// # Errors
    ///
    /// Returns `PsdbError` for transport, protocol or gateway-reported failures.
    pub async fn query(&mut self, sql: &str) -> Result<ResultSet, PsdbError> {
        self.query_context(&Context::background(), sql).await
    }

    /// Execute a query bounded by a cancellation context.
    ///
    /// # Errors
    ///
    /// In addition to the errors of [`Connection::query`], returns
    /// `TransportError::Cancelled` or `DeadlineExceeded` if `ctx` finishes
    /// before an exchange does.
    pub async fn query_context(&mut self, ctx: &Context, sql: &str) -> Result<ResultSet, PsdbError> {
        if !self.session.is_active() {
            self.create_session(ctx).await?;
        }

        let session = self.session.current().ok_or(ProtocolError::MissingSession)?;
        let body = serde_json::to_vec(&ExecuteRequest::new(sql, session.as_raw()))
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        let request = self.build_request(EXECUTE_ENDPOINT, body);
        let body = self.send_request(ctx, request).await?;

        let mut response = GatewayResponse::parse(&body)?;
        if let Some(session) = response.take_session() {
            self.session.replace(session);
        }

        response.into_result_set()
    }

    /// Create a new session, replacing any session currently held.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::MissingSession` if the response carries no
    /// session object, `QueryError` if the gateway reports an error.
    pub async fn create_session(&mut self, ctx: &Context) -> Result<(), PsdbError> {
        let body = serde_json::to_vec(&CreateSessionRequest::default())
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        let request = self.build_request(SESSION_ENDPOINT, body);
        let body = self.send_request(ctx, request).await?;

        let mut response = GatewayResponse::parse(&body)?;
        let received = match response.take_session() {
            Some(session) => {
                self.session.replace(session);
                true
            }
            None => false,
        };

        response.check_error()?;
        if !received {
            return Err(ProtocolError::MissingSession.into());
        }

        Ok(())
    }

    /// Drop the current session; the next query creates a new one.
    pub fn reset_session(&mut self) {
        self.session.clear();
    }

    /// Get the current session, if any.
    pub fn session(&self) -> Option<&Session> {
        self.session.current()
    }

    /// Check if a session is held.
    pub fn has_session(&self) -> bool {
        self.session.is_active()
    }

    /// Prepared statements are not supported.
    ///
    /// # Errors
    ///
    /// Always returns `QueryError::NotImplemented`.
    pub fn prepare(&self, _sql: &str) -> Result<(), PsdbError> {
        Err(QueryError::NotImplemented {
            operation: "Prepare",
        }
        .into())
    }

    /// Transactions are not supported.
    ///
    /// # Errors
    ///
    /// Always returns `QueryError::NotImplemented`.
    pub fn begin(&self) -> Result<(), PsdbError> {
        Err(QueryError::NotImplemented { operation: "Begin" }.into())
    }

    /// Transactions are not supported.
    ///
    /// # Errors
    ///
    /// Always returns `QueryError::NotImplemented`.
    pub fn rollback(&self) -> Result<(), PsdbError> {
        Err(QueryError::NotImplemented {
            operation: "Rollback",
        }
        .into())
    }

    /// Get connection parameters.
    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    /// Close the connection. Clears the session; safe to call repeatedly.
    pub fn close(&mut self) -> Result<(), PsdbError> {
        self.session.clear();
        Ok(())
    }

    /// Build a gateway request with the standard headers.
    fn build_request(&self, endpoint: &str, body: Vec<u8>) -> HttpRequest {
        HttpRequest::post(self.params.endpoint_url(endpoint), body)
            .with_header("Host", self.params.host.as_str())
            .with_header("Content-Type", JSON_CONTENT_TYPE)
            .with_header("User-Agent", USER_AGENT)
            .with_header("Authorization", self.credentials.authorization_header())
    }

    /// Send a request and return the body of a successful response.
    async fn send_request(
        &self,
        ctx: &Context,
        request: HttpRequest,
    ) -> Result<Vec<u8>, TransportError> {
        let endpoint = request.url.clone();
        tracing::debug!(
            %endpoint,
            host = %self.params.host,
            backend = %self.params.backend,
            "sending gateway request"
        );

        let response = ctx
            .run(self.transport.send(&self.params.backend, request))
            .await?;

        tracing::debug!(
            %endpoint,
            status = response.status,
            bytes = response.body.len(),
            "received gateway response"
        );

        response.into_success_body()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("host", &self.params.host)
            .field("backend", &self.params.backend)
            .field("username", &self.params.username)
            .field("has_session", &self.session.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionBuilder;
    use crate::error::ErrorKind;
    use crate::transport::HttpResponse;
    use async_trait::async_trait;
    use mockall::{mock, Sequence};
    use std::time::Duration;

    mock! {
        pub Gateway {}

        #[async_trait]
        impl Transport for Gateway {
            async fn send(&self, backend: &str, request: HttpRequest) -> Result<HttpResponse, TransportError>;
        }
    }

    const SESSION_1: &str = r#"{"signature":"sig-1","vitessSession":{"autocommit":true}}"#;
    const SESSION_2: &str = r#"{"signature":"sig-2","vitessSession":{"autocommit":true}}"#;

    fn params() -> ConnectionParams {
        ConnectionBuilder::new()
            .host("db.example.com")
            .backend("psdb")
            .username("u")
            .password("p")
            .build()
            .unwrap()
    }

    fn connection(mock: MockGateway) -> Connection {
        Connection::with_transport(params(), Box::new(mock))
    }

    fn is_session_request(request: &HttpRequest) -> bool {
        request.url.ends_with("/CreateSession")
    }

    fn is_execute_request(request: &HttpRequest) -> bool {
        request.url.ends_with("/Execute")
    }

    fn ok(body: String) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse::new(200, body))
    }

    fn result_body(session: Option<&str>) -> String {
        let session = session
            .map(|s| format!(r#""session":{},"#, s))
            .unwrap_or_default();
        format!(
            r#"{{{}"result":{{"fields":[{{"name":"n","type":"INT64"}}],"rows":[{{"lengths":["1"],"values":"MQ=="}}]}}}}"#,
            session
        )
    }

    #[tokio::test]
    async fn test_first_query_bootstraps_session() {
        let mut mock = MockGateway::new();
        let mut seq = Sequence::new();

        mock.expect_send()
            .withf(|backend, request| backend == "psdb" && is_session_request(request))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, request| {
                assert_eq!(request.body, b"{}");
                ok(format!(r#"{{"session":{}}}"#, SESSION_1))
            });

        mock.expect_send()
            .withf(|_, request| is_execute_request(request))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, request| {
                let expected = format!(r#"{{"query":"SELECT 1","session":{}}}"#, SESSION_1);
                assert_eq!(String::from_utf8(request.body).unwrap(), expected);
                ok(result_body(None))
            });

        let mut conn = connection(mock);
        assert!(!conn.has_session());

        let mut results = conn.query("SELECT 1").await.unwrap();
        assert_eq!(results.columns(), vec!["n"]);

        let mut dest = vec![Vec::new()];
        results.next(&mut dest).unwrap();
        assert_eq!(dest[0], b"1");
        assert!(conn.has_session());
    }

    #[tokio::test]
    async fn test_later_queries_reuse_session() {
        let mut mock = MockGateway::new();

        mock.expect_send()
            .withf(|_, request| is_session_request(request))
            .times(1)
            .returning(|_, _| ok(format!(r#"{{"session":{}}}"#, SESSION_1)));

        mock.expect_send()
            .withf(|_, request| is_execute_request(request))
            .times(3)
            .returning(|_, _| ok(result_body(None)));

        let mut conn = connection(mock);
        for _ in 0..3 {
            conn.query("SELECT 1").await.unwrap();
        }
        assert_eq!(conn.session().unwrap().as_bytes(), SESSION_1.as_bytes());
    }

    #[tokio::test]
    async fn test_execute_rotates_session() {
        let mut mock = MockGateway::new();
        let mut seq = Sequence::new();

        mock.expect_send()
            .withf(|_, request| is_session_request(request))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| ok(format!(r#"{{"session":{}}}"#, SESSION_1)));

        mock.expect_send()
            .withf(|_, request| is_execute_request(request))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| ok(result_body(Some(SESSION_2))));

        // The rotated session is replayed verbatim on the next execute
        mock.expect_send()
            .withf(|_, request| {
                is_execute_request(request)
                    && String::from_utf8_lossy(&request.body).contains(SESSION_2)
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| ok(result_body(None)));

        let mut conn = connection(mock);
        conn.query("SELECT 1").await.unwrap();
        assert_eq!(conn.session().unwrap().as_bytes(), SESSION_2.as_bytes());

        conn.query("SELECT 1").await.unwrap();
        assert_eq!(conn.session().unwrap().as_bytes(), SESSION_2.as_bytes());
    }

    #[tokio::test]
    async fn test_error_response_rotates_session_and_fails() {
        let mut mock = MockGateway::new();

        mock.expect_send()
            .withf(|_, request| is_session_request(request))
            .times(1)
            .returning(|_, _| ok(format!(r#"{{"session":{}}}"#, SESSION_1)));

        mock.expect_send()
            .withf(|_, request| is_execute_request(request))
            .times(1)
            .returning(|_, _| {
                ok(format!(
                    r#"{{"session":{},"error":{{"message":"table not found"}},"result":{{"fields":[],"rows":[]}}}}"#,
                    SESSION_2
                ))
            });

        let mut conn = connection(mock);
        let err = conn.query("SELECT * FROM missing").await.unwrap_err();

        assert!(matches!(
            err,
            PsdbError::Query(QueryError::Server(ref m)) if m == "table not found"
        ));
        assert_eq!(conn.session().unwrap().as_bytes(), SESSION_2.as_bytes());
    }

    #[tokio::test]
    async fn test_missing_session_fails_query() {
        let mut mock = MockGateway::new();

        mock.expect_send()
            .withf(|_, request| is_session_request(request))
            .times(1)
            .returning(|_, _| ok("{}".to_string()));

        let mut conn = connection(mock);
        let err = conn.query("SELECT 1").await.unwrap_err();

        assert!(matches!(err, PsdbError::Protocol(ProtocolError::MissingSession)));
        assert!(!conn.has_session());
    }

    #[tokio::test]
    async fn test_session_creation_error_is_reported() {
        let mut mock = MockGateway::new();

        mock.expect_send()
            .times(1)
            .returning(|_, _| ok(r#"{"error":{"message":"invalid credentials"}}"#.to_string()));

        let mut conn = connection(mock);
        let err = conn.query("SELECT 1").await.unwrap_err();
        assert!(matches!(err, PsdbError::Query(QueryError::Server(_))));
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let mut mock = MockGateway::new();

        mock.expect_send()
            .times(1)
            .returning(|_, _| Ok(HttpResponse::new(401, "bad credentials")));

        let mut conn = connection(mock);
        let err = conn.query("SELECT 1").await.unwrap_err();

        assert!(matches!(
            err,
            PsdbError::Transport(TransportError::HttpStatus { status: 401, ref body }) if body == "bad credentials"
        ));
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[tokio::test]
    async fn test_network_error_propagates() {
        let mut mock = MockGateway::new();

        mock.expect_send()
            .times(1)
            .returning(|_, _| Err(TransportError::RequestFailed("connection refused".to_string())));

        let mut conn = connection(mock);
        let err = conn.query("SELECT 1").await.unwrap_err();
        assert!(matches!(err, PsdbError::Transport(TransportError::RequestFailed(_))));
    }

    #[tokio::test]
    async fn test_invalid_json_is_protocol_error() {
        let mut mock = MockGateway::new();

        mock.expect_send()
            .withf(|_, request| is_session_request(request))
            .times(1)
            .returning(|_, _| ok(format!(r#"{{"session":{}}}"#, SESSION_1)));
        mock.expect_send()
            .withf(|_, request| is_execute_request(request))
            .times(1)
            .returning(|_, _| ok("upstream connect error".to_string()));

        let mut conn = connection(mock);
        let err = conn.query("SELECT 1").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
    }

    #[tokio::test]
    async fn test_request_headers() {
        let mut mock = MockGateway::new();

        mock.expect_send()
            .times(1)
            .returning(|_, request| {
                assert_eq!(request.method, "POST");
                assert_eq!(
                    request.url,
                    "https://db.example.com/psdb.v1alpha1.Database/CreateSession"
                );
                assert_eq!(request.header("Host"), Some("db.example.com"));
                assert_eq!(request.header("Content-Type"), Some("application/json"));
                assert_eq!(request.header("User-Agent"), Some(USER_AGENT));
                assert_eq!(request.header("Authorization"), Some("Basic dTpw"));
                ok(format!(r#"{{"session":{}}}"#, SESSION_1))
            });

        let mut conn = connection(mock);
        conn.create_session(&Context::background()).await.unwrap();
        assert!(conn.has_session());
    }

    #[tokio::test]
    async fn test_query_text_is_json_escaped() {
        let mut mock = MockGateway::new();

        mock.expect_send()
            .withf(|_, request| is_session_request(request))
            .returning(|_, _| ok(format!(r#"{{"session":{}}}"#, SESSION_1)));
        mock.expect_send()
            .withf(|_, request| is_execute_request(request))
            .times(1)
            .returning(|_, request| {
                let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
                assert_eq!(body["query"], "SELECT \"a\\b\"\n\tFROM t");
                ok(result_body(None))
            });

        let mut conn = connection(mock);
        conn.query("SELECT \"a\\b\"\n\tFROM t").await.unwrap();
    }

    #[tokio::test]
    async fn test_reset_session_forces_new_session() {
        let mut mock = MockGateway::new();

        mock.expect_send()
            .withf(|_, request| is_session_request(request))
            .times(2)
            .returning(|_, _| ok(format!(r#"{{"session":{}}}"#, SESSION_1)));
        mock.expect_send()
            .withf(|_, request| is_execute_request(request))
            .times(2)
            .returning(|_, _| ok(result_body(None)));

        let mut conn = connection(mock);
        conn.query("SELECT 1").await.unwrap();
        conn.reset_session();
        assert!(!conn.has_session());
        conn.query("SELECT 1").await.unwrap();
    }

    #[tokio::test]
    async fn test_unsupported_operations_send_nothing() {
        let mut mock = MockGateway::new();
        mock.expect_send().times(0);

        let conn = connection(mock);

        for result in [conn.prepare("SELECT ?"), conn.begin(), conn.rollback()] {
            let err = result.unwrap_err();
            assert!(matches!(err, PsdbError::Query(QueryError::NotImplemented { .. })));
            assert_eq!(err.kind(), ErrorKind::Capability);
        }
    }

    #[tokio::test]
    async fn test_close_clears_session() {
        let mut mock = MockGateway::new();
        mock.expect_send()
            .times(1)
            .returning(|_, _| ok(format!(r#"{{"session":{}}}"#, SESSION_1)));

        let mut conn = connection(mock);
        conn.create_session(&Context::background()).await.unwrap();
        assert!(conn.has_session());

        conn.close().unwrap();
        conn.close().unwrap();
        assert!(!conn.has_session());
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_aborts_exchange() {
        let mut mock = MockGateway::new();
        mock.expect_send().times(0);

        let mut conn = connection(mock);
        let ctx = Context::with_timeout(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(20)).await;

        let err = conn.query_context(&ctx, "SELECT 1").await.unwrap_err();
        assert!(matches!(err, PsdbError::Transport(TransportError::DeadlineExceeded)));
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }

    #[tokio::test]
    async fn test_cancelled_context_fails_before_sending() {
        let mut mock = MockGateway::new();
        mock.expect_send().times(0);

        let mut conn = connection(mock);
        let (ctx, handle) = Context::with_cancel();
        handle.cancel();

        let err = conn.query_context(&ctx, "SELECT 1").await.unwrap_err();
        assert!(matches!(err, PsdbError::Transport(TransportError::Cancelled)));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let mock = MockGateway::new();
        let conn = connection(mock);
        let debug = format!("{:?}", conn);
        assert!(debug.contains("db.example.com"));
        assert!(!debug.contains("Basic"));
    }
}
