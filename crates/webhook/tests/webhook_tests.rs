//! Webhook verification and dispatch

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use core_kernel::{GatewayError, ProviderId};
use payer_registry::{ProtocolStandard, ProviderDefinition, ProviderRegistry};
use webhook::*;

const SECRET: &str = "whsec_aetna_2024";

fn registry() -> Arc<ProviderRegistry> {
    let mut signed = ProviderDefinition::new("aetna", "Aetna", "https://api.aetna.test", vec![ProtocolStandard::Rest]);
    signed.webhook_secret_env = Some("AETNA_WEBHOOK_SECRET".to_string());
    let unsigned = ProviderDefinition::new("cigna", "Cigna", "https://api.cigna.test", vec![ProtocolStandard::Rest]);

    let registry = ProviderRegistry::from_definitions_with(vec![signed, unsigned], |name| {
        (name == "AETNA_WEBHOOK_SECRET").then(|| SECRET.to_string())
    })
    .unwrap();
    Arc::new(registry)
}

#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<(ProviderId, WebhookNotification)>>,
}

#[async_trait]
impl WebhookHandler for Recorder {
    async fn handle(&self, provider_id: &ProviderId, notification: WebhookNotification) -> Result<(), GatewayError> {
        self.seen.lock().unwrap().push((provider_id.clone(), notification));
        Ok(())
    }
}

mod verify {
    use super::*;

    #[test]
    fn test_correct_signature_is_accepted() {
        let verifier = WebhookVerifier::new(registry());
        let payload = br#"{"event":"claim.status_changed","claim_number":"CLM-1","status":"paid"}"#;
        let signature = sign(SECRET.as_bytes(), payload);
        assert!(verifier.verify_signature(payload, &signature, "aetna"));
    }

    #[test]
    fn test_fails_closed() {
        let verifier = WebhookVerifier::new(registry());
        let payload = b"{}";
        let signature = sign(SECRET.as_bytes(), payload);

        assert!(!verifier.verify_signature(payload, &signature, "unknown"));
        assert!(!verifier.verify_signature(payload, &signature, "cigna"));
        assert!(!verifier.verify_signature(payload, "not-hex", "aetna"));
        assert!(!verifier.verify_signature(payload, "", "aetna"));
        assert!(!verifier.verify_signature(payload, &sign(b"other", payload), "aetna"));
    }
}

mod dispatch {
    use super::*;

    #[tokio::test]
    async fn test_verified_notification_reaches_handler() {
        let verifier = WebhookVerifier::new(registry());
        let recorder = Recorder::default();
        let payload = br#"{"event":"preauth.decision","pre_auth_number":"PA-7","status":"approved","approval_amount":1400}"#;
        let signature = format!("sha256={}", sign(SECRET.as_bytes(), payload));

        let outcome = verifier.dispatch("aetna", payload, &signature, &recorder).await.unwrap();

        assert_eq!(outcome, WebhookOutcome::Delivered { event: "preauth.decision" });
        let seen = recorder.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0.as_str(), "aetna");
    }

    #[tokio::test]
    async fn test_bad_signature_never_reaches_handler() {
        let verifier = WebhookVerifier::new(registry());
        let recorder = Recorder::default();
        let payload = br#"{"event":"preauth.decision","pre_auth_number":"PA-7","status":"approved"}"#;

        let outcome = verifier.dispatch("aetna", payload, "00ff", &recorder).await.unwrap();

        assert_eq!(outcome, WebhookOutcome::Rejected(SignatureFailure::Mismatch));
        assert!(recorder.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_signed_garbage_is_protocol_error() {
        let verifier = WebhookVerifier::new(registry());
        let payload = b"not json";
        let signature = sign(SECRET.as_bytes(), payload);

        let err = verifier
            .dispatch("aetna", payload, &signature, &Recorder::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Protocol(_)));
    }
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn payload_mutation_is_detected(
            payload in proptest::collection::vec(any::<u8>(), 1..256),
            index in any::<prop::sample::Index>(),
            flip in 1u8..=255,
        ) {
            let verifier = WebhookVerifier::new(registry());
            let signature = sign(SECRET.as_bytes(), &payload);
            prop_assert!(verifier.verify_signature(&payload, &signature, "aetna"));

            let mut mutated = payload.clone();
            let i = index.index(mutated.len());
            mutated[i] ^= flip;
            prop_assert!(!verifier.verify_signature(&mutated, &signature, "aetna"));
        }

        #[test]
        fn signature_mutation_is_detected(
            payload in proptest::collection::vec(any::<u8>(), 0..128),
            index in any::<prop::sample::Index>(),
            flip in 1u8..=255,
        ) {
            let verifier = WebhookVerifier::new(registry());
            let mut raw = hex::decode(sign(SECRET.as_bytes(), &payload)).unwrap();
            let i = index.index(raw.len());
            raw[i] ^= flip;
            prop_assert!(!verifier.verify_signature(&payload, &hex::encode(raw), "aetna"));
        }
    }
}
