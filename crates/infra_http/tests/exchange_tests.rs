//! Reqwest exchange against a local mock payer

use std::sync::Arc;
use std::time::Duration;

use infra_http::*;
use payer_registry::{InsuranceProvider, ProtocolStandard, ProviderDefinition, RestDialect};

fn provider(endpoint: &str, standards: Vec<ProtocolStandard>) -> InsuranceProvider {
    let mut def = ProviderDefinition::new("acme", "Acme Health", endpoint, standards);
    def.payer_id = Some("ACME01".to_string());
    def.edi_path = Some("x12".to_string());
    def.api_key_env = Some("ACME_API_KEY".to_string());
    InsuranceProvider::from_definition(def, |name| {
        (name == "ACME_API_KEY").then(|| "key-123".to_string())
    })
    .unwrap()
}

fn transport(attempts: u32) -> HttpTransport {
    let exchange = ReqwestExchange::new(&ClientConfig::default()).unwrap();
    HttpTransport::new(
        Arc::new(exchange),
        RetryPolicy::new(attempts, Backoff::Fixed(Duration::from_millis(5))),
        Duration::from_secs(5),
    )
}

mod edi_posts {
    use super::*;

    #[tokio::test]
    async fn test_edi_post_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/x12")
            .match_header("content-type", EDI_CONTENT_TYPE)
            .match_header("authorization", "Bearer key-123")
            .match_header("x-api-key", mockito::Matcher::Missing)
            .match_body("ISA|00~")
            .with_status(200)
            .with_body("ISA|reply~")
            .create_async()
            .await;

        let provider = provider(&server.url(), vec![ProtocolStandard::Edi270271]);
        let request = PayerRequest::edi(&provider, "ISA|00~".to_string());
        let delivery = transport(3).execute(&request).await.unwrap();

        assert_eq!(delivery.reply.body, "ISA|reply~");
        assert_eq!(delivery.attempts, 1);
        mock.assert_async().await;
    }
}

mod rest_calls {
    use super::*;

    #[tokio::test]
    async fn test_json_post_carries_api_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/claims")
            .match_header("content-type", "application/json")
            .match_header("accept", "application/json")
            .match_header("x-api-key", "key-123")
            .match_header("authorization", "Bearer key-123")
            .with_status(201)
            .with_body(r#"{"status":"submitted"}"#)
            .create_async()
            .await;

        let provider = provider(&server.url(), vec![ProtocolStandard::Rest]);
        let request = PayerRequest::post_json(
            &provider,
            RestDialect::Json,
            "/claims",
            &serde_json::json!({"claim_number": "CLM-1"}),
        )
        .unwrap();
        let delivery = transport(3).execute(&request).await.unwrap();

        assert_eq!(delivery.reply.status, 201);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fhir_dialect_content_type() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/claims/CLM-1/status")
            .match_header("accept", "application/fhir+json")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let provider = provider(&server.url(), vec![ProtocolStandard::Fhir]);
        let request = PayerRequest::get_json(&provider, RestDialect::Fhir, "claims/CLM-1/status");
        transport(1).execute(&request).await.unwrap();
        mock.assert_async().await;
    }
}

mod status_handling {
    use super::*;

    #[tokio::test]
    async fn test_persistent_503_exhausts_budget() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/eligibility")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;

        let provider = provider(&server.url(), vec![ProtocolStandard::Rest]);
        let request =
            PayerRequest::post_json(&provider, RestDialect::Json, "/eligibility", &serde_json::json!({}))
                .unwrap();
        let err = transport(3).execute(&request).await.unwrap_err();

        assert!(matches!(err, TransportError::Exhausted { attempts: 3, .. }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_4xx_surfaces_immediately() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/preauthorizations")
            .with_status(400)
            .with_body("missing member id")
            .expect(1)
            .create_async()
            .await;

        let provider = provider(&server.url(), vec![ProtocolStandard::Rest]);
        let request = PayerRequest::post_json(
            &provider,
            RestDialect::Json,
            "/preauthorizations",
            &serde_json::json!({}),
        )
        .unwrap();
        let err = transport(3).execute(&request).await.unwrap_err();

        assert_eq!(
            err,
            TransportError::Rejected {
                status: 400,
                body: "missing member id".to_string()
            }
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_connection_refused_exhausts() {
        let provider = provider("http://127.0.0.1:9", vec![ProtocolStandard::Rest]);
        let request = PayerRequest::get_json(&provider, RestDialect::Json, "/claims/X/status");
        let err = transport(2).execute(&request).await.unwrap_err();
        assert!(matches!(err, TransportError::Exhausted { attempts: 2, .. }));
    }
}
