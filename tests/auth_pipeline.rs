// End-to-end tests for the verification and forwarding pipeline using a
// capturing stand-in for the upstream HTTP client.
#[cfg(test)]
mod test {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::{
        body::Body as AxumBody,
        http::{HeaderMap, StatusCode},
    };
    use hyper::{Request, Response};
    use jsonwebtoken::{EncodingKey, Header, encode};
    use projects_gateway::{
        adapters::HttpHandler,
        config::GatewayConfig,
        core::GatewayService,
        ports::http_client::{HttpClient, HttpClientError, HttpClientResult},
    };
    use serde_json::json;

    const SECRET: &str = "a-test-secret-of-at-least-32-characters";

    #[derive(Debug, Clone)]
    struct RecordedRequest {
        uri: String,
        method: String,
        headers: HeaderMap,
    }

    struct MockHttpClient {
        requests: Mutex<Vec<RecordedRequest>>,
        outcome: MockOutcome,
    }

    enum MockOutcome {
        Ok(StatusCode),
        Timeout(u64),
        ConnectionRefused,
    }

    impl MockHttpClient {
        fn new(outcome: MockOutcome) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                outcome,
            }
        }

        fn recorded(&self) -> Vec<RecordedRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn send_request(
            &self,
            req: Request<AxumBody>,
        ) -> HttpClientResult<Response<AxumBody>> {
            self.requests.lock().unwrap().push(RecordedRequest {
                uri: req.uri().to_string(),
                method: req.method().to_string(),
                headers: req.headers().clone(),
            });

            match self.outcome {
                MockOutcome::Ok(status) => Ok(Response::builder()
                    .status(status)
                    .body(AxumBody::empty())
                    .unwrap()),
                MockOutcome::Timeout(secs) => Err(HttpClientError::Timeout(secs)),
                MockOutcome::ConnectionRefused => Err(HttpClientError::ConnectionError(
                    "connection refused".to_string(),
                )),
            }
        }
    }

    fn build_handler(outcome: MockOutcome) -> (HttpHandler, Arc<MockHttpClient>) {
        let config = GatewayConfig::builder()
            .listen_addr("127.0.0.1:8080")
            .secret(SECRET)
            .exempt_prefix("/projects/graphql")
            .route(
                "/projects-cell/projects",
                "http://projects:8080",
                "/api/v1/projects",
            )
            .route("/projects/graphql", "http://search:8080", "/graphql")
            .build()
            .unwrap();

        let gateway = Arc::new(GatewayService::new(Arc::new(config)));
        let mock = Arc::new(MockHttpClient::new(outcome));
        let handler = HttpHandler::new(gateway, mock.clone() as Arc<dyn HttpClient>);
        (handler, mock)
    }

    fn mint_token(sub: &str, role: &str, exp_offset_secs: i64) -> String {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64;
        encode(
            &Header::default(),
            &json!({"sub": sub, "role": role, "iat": now, "exp": now + exp_offset_secs}),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn authed_request(uri: &str, token: &str) -> Request<AxumBody> {
        Request::builder()
            .uri(uri)
            .header("authorization", format!("Bearer {token}"))
            .body(AxumBody::empty())
            .unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn verified_identity_is_injected_into_upstream_request() {
        let (handler, mock) = build_handler(MockOutcome::Ok(StatusCode::OK));
        let token = mint_token("user-42", "admin", 300);

        let response = handler
            .handle_request(authed_request("/projects-cell/projects/7", &token))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let recorded = mock.recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].uri, "http://projects:8080/api/v1/projects/7");
        assert_eq!(recorded[0].headers.get("x-user-id").unwrap(), "user-42");
        assert_eq!(recorded[0].headers.get("x-user-role").unwrap(), "admin");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn spoofed_identity_headers_are_overwritten() {
        let (handler, mock) = build_handler(MockOutcome::Ok(StatusCode::OK));
        let token = mint_token("alice", "member", 300);

        let req = Request::builder()
            .uri("/projects-cell/projects")
            .header("authorization", format!("Bearer {token}"))
            .header("x-user-id", "mallory")
            .header("x-user-role", "superadmin")
            .body(AxumBody::empty())
            .unwrap();

        handler.handle_request(req).await.unwrap();

        let recorded = mock.recorded();
        assert_eq!(recorded[0].headers.get("x-user-id").unwrap(), "alice");
        assert_eq!(recorded[0].headers.get("x-user-role").unwrap(), "member");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn expired_token_is_rejected_before_any_upstream_call() {
        let (handler, mock) = build_handler(MockOutcome::Ok(StatusCode::OK));
        let token = mint_token("alice", "member", -300);

        let response = handler
            .handle_request(authed_request("/projects-cell/projects", &token))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(mock.recorded().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn garbage_token_is_rejected() {
        let (handler, mock) = build_handler(MockOutcome::Ok(StatusCode::OK));

        let response = handler
            .handle_request(authed_request(
                "/projects-cell/projects",
                "not.a.real-token",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(mock.recorded().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn wrong_signature_is_rejected() {
        let (handler, mock) = build_handler(MockOutcome::Ok(StatusCode::OK));
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let forged = encode(
            &Header::default(),
            &json!({"sub": "alice", "role": "admin", "exp": now + 300}),
            &EncodingKey::from_secret(b"another-secret-that-is-long-enough-too"),
        )
        .unwrap();

        let response = handler
            .handle_request(authed_request("/projects-cell/projects", &forged))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(mock.recorded().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn exempt_path_forwards_without_identity_headers() {
        let (handler, mock) = build_handler(MockOutcome::Ok(StatusCode::OK));

        // No credential at all, plus a spoofing attempt
        let req = Request::builder()
            .uri("/projects/graphql")
            .method("POST")
            .header("x-user-id", "mallory")
            .body(AxumBody::empty())
            .unwrap();

        let response = handler.handle_request(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let recorded = mock.recorded();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].method, "POST");
        assert_eq!(recorded[0].uri, "http://search:8080/graphql");
        assert!(recorded[0].headers.get("x-user-id").is_none());
        assert!(recorded[0].headers.get("x-user-role").is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn upstream_timeout_maps_to_gateway_timeout() {
        let (handler, _mock) = build_handler(MockOutcome::Timeout(30));
        let token = mint_token("alice", "member", 300);

        let response = handler
            .handle_request(authed_request("/projects-cell/projects", &token))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn upstream_connection_failure_maps_to_bad_gateway() {
        let (handler, _mock) = build_handler(MockOutcome::ConnectionRefused);
        let token = mint_token("alice", "member", 300);

        let response = handler
            .handle_request(authed_request("/projects-cell/projects", &token))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn forwarded_context_headers_are_set_for_upstream() {
        let (handler, mock) = build_handler(MockOutcome::Ok(StatusCode::OK));
        let token = mint_token("alice", "member", 300);

        let req = Request::builder()
            .uri("/projects-cell/projects")
            .header("authorization", format!("Bearer {token}"))
            .header("host", "gateway.example.com")
            .body(AxumBody::empty())
            .unwrap();

        handler.handle_request(req).await.unwrap();

        let recorded = mock.recorded();
        assert_eq!(
            recorded[0].headers.get("x-forwarded-host").unwrap(),
            "gateway.example.com"
        );
        assert_eq!(recorded[0].headers.get("x-forwarded-proto").unwrap(), "http");
        // Authorization still travels upstream; only hop-by-hop headers are removed
        assert!(recorded[0].headers.get("authorization").is_some());
    }
}
