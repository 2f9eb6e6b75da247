// Integration tests for translation fallback and message correlation
//
// Providers are in-memory fakes; delays run on tokio's paused clock.

mod common;

use anyhow::Result;
use common::{EchoProvider, FailingProvider, FixedProvider};
use lingua_rooms::conversation::LanguagePair;
use lingua_rooms::translation::{
    CorrelatorEvent, TranslateParams, TranslationCorrelator, TranslationOutcome,
    TranslationProvider, TranslationResponse, TranslationStatus, Translator,
};
use lingua_rooms::TranslationError;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::time::Duration;

fn translator(providers: Vec<Arc<dyn TranslationProvider>>) -> Arc<Translator> {
    Arc::new(Translator::new(providers, Duration::from_secs(10)))
}

fn created_id(events: &[CorrelatorEvent]) -> String {
    match events.first() {
        Some(CorrelatorEvent::Created(message)) => message.id.clone(),
        other => panic!("expected created event, got {:?}", other),
    }
}

#[tokio::test]
async fn test_fallback_uses_first_successful_provider() -> Result<()> {
    let a = FailingProvider::new("a");
    let b = FailingProvider::new("b");
    let c = FixedProvider::new("hola", 0.95);
    let mut correlator = TranslationCorrelator::new(translator(vec![
        a.clone() as Arc<dyn TranslationProvider>,
        b.clone(),
        c.clone(),
    ]));

    let events = correlator.commit("hello", &LanguagePair::new("en", "es"), "alice");
    let id = created_id(&events);
    assert_eq!(events.len(), 1);

    let outcome = correlator.next_outcome().await.expect("outcome");
    match correlator.apply(outcome) {
        Some(CorrelatorEvent::Translated(message)) => {
            assert_eq!(message.id, id);
            assert_eq!(message.translated_content.as_deref(), Some("hola"));
            assert_eq!(message.confidence, Some(0.95));
            assert!(message.translation_error.is_none());
        }
        other => panic!("expected translation, got {:?}", other),
    }

    assert_eq!(a.calls.load(Ordering::SeqCst), 1);
    assert_eq!(b.calls.load(Ordering::SeqCst), 1);
    assert_eq!(c.calls.load(Ordering::SeqCst), 1);
    assert_eq!(correlator.pending_count(), 0);

    Ok(())
}

#[tokio::test]
async fn test_same_language_skips_translation() {
    let provider = FixedProvider::new("unused", 0.5);
    let mut correlator = TranslationCorrelator::new(translator(vec![provider.clone() as Arc<dyn TranslationProvider>]));

    let events = correlator.commit("good morning", &LanguagePair::new("en", "en"), "alice");

    assert_eq!(events.len(), 2);
    match &events[1] {
        CorrelatorEvent::Translated(message) => {
            assert_eq!(message.translated_content.as_deref(), Some("good morning"));
            assert_eq!(message.confidence, Some(1.0));
        }
        other => panic!("expected translation, got {:?}", other),
    }
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    assert_eq!(correlator.pending_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_translations_match_their_own_message() -> Result<()> {
    // The Spanish request finishes after the French one
    let echo = EchoProvider::new(&[
        ("es", Duration::from_millis(500)),
        ("fr", Duration::from_millis(100)),
    ]);
    let mut correlator = TranslationCorrelator::new(translator(vec![echo.clone() as Arc<dyn TranslationProvider>]));

    let m1 = created_id(&correlator.commit("one", &LanguagePair::new("en", "es"), "alice"));
    // Active languages change before M1's response arrives
    let m2 = created_id(&correlator.commit("two", &LanguagePair::new("en", "fr"), "alice"));

    let mut order = Vec::new();
    for _ in 0..2 {
        let outcome = correlator.next_outcome().await.expect("outcome");
        match correlator.apply(outcome) {
            Some(CorrelatorEvent::Translated(message)) => order.push(message.id),
            other => panic!("expected translation, got {:?}", other),
        }
    }
    assert_eq!(order, vec![m2.clone(), m1.clone()]);

    let first = correlator.log().get(&m1).expect("m1");
    assert_eq!(first.target_lang, "es");
    assert_eq!(first.translated_content.as_deref(), Some("es:one"));

    let second = correlator.log().get(&m2).expect("m2");
    assert_eq!(second.target_lang, "fr");
    assert_eq!(second.translated_content.as_deref(), Some("fr:two"));

    Ok(())
}

#[tokio::test]
async fn test_exhausted_providers_mark_message_failed() -> Result<()> {
    let mut correlator = TranslationCorrelator::new(translator(vec![
        FailingProvider::new("a") as Arc<dyn TranslationProvider>,
        FailingProvider::new("b"),
    ]));

    let id = created_id(&correlator.commit("hello", &LanguagePair::new("en", "de"), "alice"));

    let outcome = correlator.next_outcome().await.expect("outcome");
    match correlator.apply(outcome) {
        Some(CorrelatorEvent::Failed { message_id, error }) => {
            assert_eq!(message_id, id);
            assert_eq!(error, TranslationError::ServiceUnavailable { attempts: 2 });
            assert_eq!(error.code(), "translation_unavailable");
        }
        other => panic!("expected failure, got {:?}", other),
    }

    // Original content stays visible with an error marker
    let message = correlator.log().get(&id).expect("message");
    assert_eq!(message.content, "hello");
    assert!(message.translated_content.is_none());
    assert!(message.translation_error.is_some());
    assert_eq!(correlator.status(&id), Some(TranslationStatus::Failed));
    assert!(correlator.request(&id).is_none());
    assert_eq!(correlator.pending_count(), 0);

    Ok(())
}

#[tokio::test]
async fn test_settled_requests_are_released() -> Result<()> {
    let mut correlator = TranslationCorrelator::new(translator(vec![
        FixedProvider::new("hola", 0.8) as Arc<dyn TranslationProvider>,
    ]));
    let languages = LanguagePair::new("en", "es");

    let mut ids = Vec::new();
    for n in 0..20 {
        ids.push(created_id(&correlator.commit(&format!("line {}", n), &languages, "alice")));
    }
    assert_eq!(correlator.pending_count(), 20);
    assert_eq!(correlator.status(&ids[0]), Some(TranslationStatus::Pending));
    assert!(correlator.request(&ids[0]).is_some());

    for _ in 0..20 {
        let outcome = correlator.next_outcome().await.expect("outcome");
        assert!(matches!(
            correlator.apply(outcome),
            Some(CorrelatorEvent::Translated(_))
        ));
    }

    assert_eq!(correlator.pending_count(), 0);
    assert_eq!(correlator.log().len(), 20);
    for id in &ids {
        assert!(correlator.request(id).is_none());
        assert_eq!(correlator.status(id), Some(TranslationStatus::Complete));
    }
    assert_eq!(correlator.status("msg-unknown"), None);

    Ok(())
}

#[tokio::test]
async fn test_translation_applied_at_most_once() -> Result<()> {
    let mut correlator =
        TranslationCorrelator::new(translator(vec![
        FixedProvider::new("bonjour", 0.9) as Arc<dyn TranslationProvider>,
    ]));

    let id = created_id(&correlator.commit("hello", &LanguagePair::new("en", "fr"), "alice"));

    let early = TranslationOutcome {
        message_id: id.clone(),
        result: Ok(TranslationResponse {
            translated_text: "salut".to_string(),
            confidence: 0.7,
            detected_language: None,
            alternatives: Vec::new(),
        }),
    };
    assert!(matches!(
        correlator.apply(early),
        Some(CorrelatorEvent::Translated(_))
    ));

    // The real response arrives afterwards and is discarded
    let outcome = correlator.next_outcome().await.expect("outcome");
    assert!(correlator.apply(outcome).is_none());

    let message = correlator.log().get(&id).expect("message");
    assert_eq!(message.translated_content.as_deref(), Some("salut"));

    Ok(())
}

#[tokio::test]
async fn test_outcome_for_unknown_message_is_ignored() {
    let mut correlator = TranslationCorrelator::new(translator(Vec::new()));

    let outcome = TranslationOutcome {
        message_id: "msg-unknown".to_string(),
        result: Err(TranslationError::ServiceUnavailable { attempts: 0 }),
    };

    assert!(correlator.apply(outcome).is_none());
    assert!(correlator.log().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_slow_provider_times_out_and_falls_back() -> Result<()> {
    let slow = EchoProvider::new(&[("es", Duration::from_secs(30))]);
    let backup = FixedProvider::new("hola", 0.95);
    let translator = Translator::new(
        vec![slow.clone() as Arc<dyn TranslationProvider>, backup.clone()],
        Duration::from_secs(10),
    );

    let params = TranslateParams::new("hello", &LanguagePair::new("en", "es"));
    let response = translator.translate(&params).await?;

    assert_eq!(response.translated_text, "hola");
    assert_eq!(slow.calls.load(Ordering::SeqCst), 1);
    assert_eq!(backup.calls.load(Ordering::SeqCst), 1);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_timeout_on_every_provider_is_service_unavailable() {
    let slow = EchoProvider::new(&[("es", Duration::from_secs(30))]);
    let translator = Translator::new(vec![slow as Arc<dyn TranslationProvider>], Duration::from_secs(10));

    let params = TranslateParams::new("hello", &LanguagePair::new("en", "es"));
    let result = translator.translate(&params).await;

    assert_eq!(
        result.unwrap_err(),
        TranslationError::ServiceUnavailable { attempts: 1 }
    );
}

#[tokio::test]
async fn test_confidence_is_clamped() -> Result<()> {
    let translator = Translator::new(
        vec![FixedProvider::new("hola", 1.7) as Arc<dyn TranslationProvider>],
        Duration::from_secs(10),
    );

    let params = TranslateParams::new("hello", &LanguagePair::new("en", "es"));
    let response = translator.translate(&params).await?;

    assert_eq!(response.confidence, 1.0);
    Ok(())
}

#[tokio::test]
async fn test_remote_messages_are_ingested_once() {
    let mut correlator = TranslationCorrelator::new(translator(Vec::new()));
    let message = lingua_rooms::Message::new("hola", &LanguagePair::new("es", "en"), "bob");

    assert!(correlator.ingest(message.clone()));
    assert!(!correlator.ingest(message));
    assert_eq!(correlator.log().len(), 1);
}
