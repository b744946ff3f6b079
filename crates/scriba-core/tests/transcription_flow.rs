//! Integration tests for the full submit cycle: authenticate, upload,
//! configure, submit, format. Uses the placeholder backend so no network or
//! API key is required.

use scriba_core::{
    format_transcript, hash_password, verify_password, AudioUpload, Language, PlaceholderBackend,
    ScribaError, SessionStore, Transcript, TranscriptionBackend, TranscriptionOptions, Utterance,
};

fn interview_transcript() -> Transcript {
    Transcript {
        text: "Hello Hi".to_string(),
        utterances: vec![
            Utterance {
                speaker: "A".to_string(),
                text: "Hello".to_string(),
            },
            Utterance {
                speaker: "B".to_string(),
                text: "Hi".to_string(),
            },
        ],
    }
}

#[tokio::test]
async fn full_flow_with_speaker_recognition() {
    let sessions = SessionStore::new();
    let backend = PlaceholderBackend::with_transcript(interview_transcript());

    // Authenticate
    let id = sessions.create();
    let password_hash = hash_password("operator-secret");
    assert!(verify_password("operator-secret", &password_hash));
    sessions.set_authenticated(&id);

    // Upload + configure
    let upload = AudioUpload::new("interview.mp3", vec![0u8; 128]);
    upload.validate().unwrap();
    let options = TranscriptionOptions {
        language: Language::En,
        speaker_recognition: true,
    };

    // Submit with the in-flight guard held
    let guard = sessions.begin_transcription(&id).unwrap();
    assert!(sessions.begin_transcription(&id).is_none());
    let transcript = backend.transcribe(&upload, &options).await.unwrap();
    drop(guard);

    // Format + store
    let formatted = format_transcript(&transcript, &options);
    assert_eq!(formatted, "**Speaker A**: Hello\n\n\n**Speaker B**: Hi");
    sessions.store_transcript(&id, formatted.clone(), upload.download_name());

    let session = sessions.get(&id).unwrap();
    assert_eq!(session.transcript, formatted);
    assert_eq!(session.download_name.as_deref(), Some("interview.txt"));
}

#[tokio::test]
async fn service_error_leaves_session_untouched() {
    let sessions = SessionStore::new();
    let backend = PlaceholderBackend::with_error("Transcoding failed");

    let id = sessions.create();
    sessions.set_authenticated(&id);

    let upload = AudioUpload::new("interview.wav", vec![0u8; 64]);
    let options = TranscriptionOptions::default();

    let guard = sessions.begin_transcription(&id).unwrap();
    let err = backend.transcribe(&upload, &options).await.unwrap_err();
    drop(guard);

    match err {
        ScribaError::Service(msg) => assert_eq!(msg, "Transcoding failed"),
        other => panic!("expected Service error, got {:?}", other),
    }

    // The failure was returned, not stored, and the guard is free again.
    let session = sessions.get(&id).unwrap();
    assert_eq!(session.transcript, "");
    assert!(session.download_name.is_none());
    assert!(sessions.begin_transcription(&id).is_some());
}

#[tokio::test]
async fn cancelled_submit_releases_the_in_flight_guard() {
    let sessions = SessionStore::new();
    let id = sessions.create();
    sessions.set_authenticated(&id);

    // A submit whose service call outlives the client: the future is dropped
    // mid-await, the way axum drops a handler on disconnect.
    let submit = async {
        let _guard = sessions.begin_transcription(&id).unwrap();
        tokio::time::sleep(std::time::Duration::from_secs(60)).await;
    };
    let cancelled = tokio::time::timeout(std::time::Duration::from_millis(50), submit).await;
    assert!(cancelled.is_err());

    // The dropped future released the guard; the session is not wedged.
    assert!(sessions.begin_transcription(&id).is_some());
}

#[tokio::test]
async fn empty_upload_is_rejected_before_any_service_call() {
    let backend = PlaceholderBackend::new();
    let upload = AudioUpload::new("interview.mp3", Vec::new());

    let err = upload.validate().unwrap_err();
    assert!(matches!(err, ScribaError::EmptyUpload));

    // Validation failed, so the caller never invokes the backend.
    assert_eq!(backend.calls(), 0);
}
