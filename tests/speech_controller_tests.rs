// Integration tests for the speech controller task
//
// Runs the controller against a scripted recognizer with tokio's clock
// paused, so debounce windows and silence timers elapse instantly.

mod common;

use anyhow::Result;
use common::{final_result, scripted_recognizer as scripted};
use lingua_rooms::speech::{
    RecognitionEvent, SpeechCapability, SpeechController, SpeechSettings, SpeechStatus,
    SpeechUpdate, StopReason,
};
use lingua_rooms::SpeechErrorKind;
use tokio::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_final_result_then_silence_stop_and_restart() -> Result<()> {
    let (capability, mut streams) = scripted(None);
    let (controller, mut channels) = SpeechController::spawn(capability, SpeechSettings::default());
    let mut status = controller.subscribe();

    controller.start();
    status.wait_for(|s| *s == SpeechStatus::Listening).await?;
    let events = streams.recv().await.expect("recognizer started");

    events.send(final_result("hello", 0.9)).await?;
    match channels.updates.recv().await {
        Some(SpeechUpdate::Final(utterance)) => assert_eq!(utterance.transcript, "hello"),
        other => panic!("expected final utterance, got {:?}", other),
    }

    // Nothing else arrives; the 5 second silence timer fires
    assert_eq!(
        channels.updates.recv().await,
        Some(SpeechUpdate::Ended(StopReason::Silence))
    );
    assert_eq!(controller.status(), SpeechStatus::Stopped);

    controller.start();
    status.wait_for(|s| *s == SpeechStatus::Listening).await?;
    assert!(streams.recv().await.is_some());

    controller.shutdown().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_low_confidence_final_produces_no_update() -> Result<()> {
    let (capability, mut streams) = scripted(None);
    let (controller, mut channels) = SpeechController::spawn(capability, SpeechSettings::default());
    let mut status = controller.subscribe();

    controller.start();
    status.wait_for(|s| *s == SpeechStatus::Listening).await?;
    let events = streams.recv().await.expect("recognizer started");

    events.send(final_result("hi", 0.3)).await?;
    events.send(final_result("hello", 0.9)).await?;

    match channels.updates.recv().await {
        Some(SpeechUpdate::Final(utterance)) => assert_eq!(utterance.transcript, "hello"),
        other => panic!("expected final utterance, got {:?}", other),
    }
    assert_eq!(controller.status(), SpeechStatus::Listening);

    controller.shutdown().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_rapid_start_stop_collapses_to_last_request() -> Result<()> {
    let (capability, mut streams) = scripted(None);
    let (controller, _channels) = SpeechController::spawn(capability, SpeechSettings::default());
    let mut status = controller.subscribe();

    controller.start();
    controller.stop();
    controller.start();
    controller.start();

    status.wait_for(|s| *s == SpeechStatus::Listening).await?;
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert!(streams.recv().await.is_some());
    assert!(streams.try_recv().is_err());

    controller.shutdown().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_errors_arrive_on_separate_channel() -> Result<()> {
    let (capability, _streams) = scripted(Some(SpeechErrorKind::NotAllowed));
    let (controller, mut channels) = SpeechController::spawn(capability, SpeechSettings::default());

    controller.start();

    assert_eq!(
        channels.errors.recv().await,
        Some(SpeechErrorKind::NotAllowed)
    );
    assert_eq!(controller.status(), SpeechStatus::Error);
    assert!(channels.updates.try_recv().is_err());

    controller.shutdown().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_recoverable_error_restarts_recognizer() -> Result<()> {
    let (capability, mut streams) = scripted(None);
    let (controller, mut channels) = SpeechController::spawn(capability, SpeechSettings::default());
    let mut status = controller.subscribe();

    controller.start();
    status.wait_for(|s| *s == SpeechStatus::Listening).await?;
    let first = streams.recv().await.expect("recognizer started");

    first
        .send(RecognitionEvent::Error(SpeechErrorKind::Network))
        .await?;

    let second = streams.recv().await.expect("recognizer restarted");
    second.send(final_result("back again", 0.95)).await?;

    match channels.updates.recv().await {
        Some(SpeechUpdate::Final(utterance)) => assert_eq!(utterance.transcript, "back again"),
        other => panic!("expected final utterance, got {:?}", other),
    }
    assert!(channels.errors.try_recv().is_err());

    controller.shutdown().await;
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_unsupported_capability_reports_once() -> Result<()> {
    let (controller, mut channels) =
        SpeechController::spawn(SpeechCapability::Unavailable, SpeechSettings::default());

    controller.start();
    assert_eq!(
        channels.errors.recv().await,
        Some(SpeechErrorKind::Unsupported)
    );

    controller.start();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(channels.errors.try_recv().is_err());
    assert_eq!(controller.status(), SpeechStatus::Idle);

    controller.shutdown().await;
    Ok(())
}
