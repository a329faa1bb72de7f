//! Providers against local HTTP fixtures.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::routing::{get, post};
use base64::Engine as _;
use narrator_core::{
    ClipPath, LocalServer, NarrationUnit, ProviderConfig, ProviderId, ServerReadiness, ServerState,
};
use narrator_voice::providers::{
    CloudClipProvider, ElevenLabsProvider, GoogleProvider, SelfHostedProvider,
};
use narrator_voice::{AudioCache, AudioFormat, PlayableAudio, SpeechProvider, VoiceError};
use reqwest::Client;

// ── Fixtures ───────────────────────────────────────────────────────

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

struct Fixed(ServerState);

impl ServerReadiness for Fixed {
    fn server_state(&self, _server: LocalServer) -> ServerState {
        self.0
    }
}

fn config(id: ProviderId, base_url: &str) -> ProviderConfig {
    ProviderConfig {
        base_url: Some(base_url.to_string()),
        ..ProviderConfig::defaults_for(id)
    }
}

fn clip_bytes(audio: PlayableAudio) -> (Vec<u8>, AudioFormat) {
    match audio {
        PlayableAudio::Clip(clip) => (clip.bytes().to_vec(), clip.format()),
        PlayableAudio::Utterance { .. } => panic!("expected fetched audio"),
    }
}

// ── Cloud clips ────────────────────────────────────────────────────

#[tokio::test]
async fn cloud_fetches_clip_once_and_serves_repeats_from_cache() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let base = serve(Router::new().route(
        "/audio/daniel/en/moves/knight-f3.mp3",
        get(move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                "ID3-knight-f3"
            }
        }),
    ))
    .await;

    let cache = Arc::new(AudioCache::new());
    let provider = CloudClipProvider::new(Client::new(), Arc::clone(&cache));
    let config = config(ProviderId::Cloud, &format!("{base}/audio"));
    let unit = NarrationUnit::clip(ClipPath::new("moves/knight-f3"), 350);

    let first = provider.resolve(&unit, &config).await.unwrap();
    let second = provider.resolve(&unit, &config).await.unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(cache.len(), 1);
    let (bytes, format) = clip_bytes(first);
    assert_eq!(bytes, b"ID3-knight-f3");
    assert_eq!(format, AudioFormat::Mp3);
    assert_eq!(clip_bytes(second).0, bytes);
}

#[tokio::test]
async fn cloud_missing_clip_is_unavailable_and_not_cached() {
    let base = serve(Router::new()).await;
    let cache = Arc::new(AudioCache::new());
    let provider = CloudClipProvider::new(Client::new(), Arc::clone(&cache));
    let config = config(ProviderId::Cloud, &base);

    let err = provider
        .resolve(&NarrationUnit::clip(ClipPath::new("numbers/61"), 150), &config)
        .await
        .unwrap_err();

    assert!(matches!(err, VoiceError::Unavailable(path) if path == "numbers/61"));
    assert!(cache.is_empty());
}

#[tokio::test]
async fn cloud_refetches_after_the_endpoint_changes() {
    let route = "/daniel/en/moves/knight-f3.mp3";
    let old = serve(Router::new().route(route, get(|| async { "ID3-old" }))).await;
    let new = serve(Router::new().route(route, get(|| async { "ID3-new" }))).await;

    let cache = Arc::new(AudioCache::new());
    let provider = CloudClipProvider::new(Client::new(), Arc::clone(&cache));
    let unit = NarrationUnit::clip(ClipPath::new("moves/knight-f3"), 350);

    let before = provider
        .resolve(&unit, &config(ProviderId::Cloud, &old))
        .await
        .unwrap();
    let after = provider
        .resolve(&unit, &config(ProviderId::Cloud, &new))
        .await
        .unwrap();

    assert_eq!(clip_bytes(before).0, b"ID3-old");
    assert_eq!(clip_bytes(after).0, b"ID3-new");
    assert_eq!(cache.len(), 2);
}

// ── Self-hosted servers ────────────────────────────────────────────

fn kitten_router(hits: Arc<AtomicUsize>) -> Router {
    Router::new()
        .route(
            "/api/tts",
            get(move |Query(params): Query<HashMap<String, String>>| {
                let hits = Arc::clone(&hits);
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    format!(
                        "RIFF|{}|{}",
                        params.get("text").cloned().unwrap_or_default(),
                        params.get("voice").cloned().unwrap_or_default()
                    )
                }
            }),
        )
        .route(
            "/api/voices",
            get(|| async {
                axum::Json(serde_json::json!({
                    "expr-voice-2-m": {"name": "Expr Voice 2 (male)", "language": "en", "tts_name": "kittentts"},
                    "expr-voice-2-f": {"name": "Expr Voice 2 (female)", "language": "en", "tts_name": "kittentts"}
                }))
            }),
        )
}

#[tokio::test]
async fn kittentts_synthesizes_with_text_and_voice_query() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = serve(kitten_router(Arc::clone(&hits))).await;
    let provider = SelfHostedProvider::kittentts(
        Client::new(),
        Arc::new(AudioCache::new()),
        Arc::new(Fixed(ServerState::Running)),
    );
    let config = config(ProviderId::KittenTts, &base);

    let audio = provider
        .resolve(&NarrationUnit::text("Knight f3", 350), &config)
        .await
        .unwrap();

    let (bytes, format) = clip_bytes(audio);
    assert_eq!(bytes, b"RIFF|Knight f3|expr-voice-2-m");
    assert_eq!(format, AudioFormat::Wav);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn kittentts_clip_units_are_spoken_as_their_phrase() {
    let base = serve(kitten_router(Arc::new(AtomicUsize::new(0)))).await;
    let provider = SelfHostedProvider::kittentts(
        Client::new(),
        Arc::new(AudioCache::new()),
        Arc::new(Fixed(ServerState::Running)),
    );

    let audio = provider
        .resolve(
            &NarrationUnit::clip(ClipPath::new("moves/castles-kingside"), 350),
            &config(ProviderId::KittenTts, &base),
        )
        .await
        .unwrap();

    assert_eq!(clip_bytes(audio).0, b"RIFF|castles kingside|expr-voice-2-m");
}

#[tokio::test]
async fn kittentts_lists_voices() {
    let base = serve(kitten_router(Arc::new(AtomicUsize::new(0)))).await;
    let provider = SelfHostedProvider::kittentts(
        Client::new(),
        Arc::new(AudioCache::new()),
        Arc::new(Fixed(ServerState::Running)),
    );

    let voices = provider
        .list_voices(&config(ProviderId::KittenTts, &base))
        .await
        .unwrap();

    let ids: Vec<_> = voices.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, ["expr-voice-2-f", "expr-voice-2-m"]);
    assert_eq!(voices[1].name, "Expr Voice 2 (male)");
}

#[tokio::test]
async fn server_that_is_not_running_gets_no_request() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = serve(kitten_router(Arc::clone(&hits))).await;

    for state in [ServerState::Idle, ServerState::Starting] {
        let provider = SelfHostedProvider::opentts(
            Client::new(),
            Arc::new(AudioCache::new()),
            Arc::new(Fixed(state)),
        );
        let err = provider
            .resolve(
                &NarrationUnit::text("Bishop b5", 350),
                &config(ProviderId::OpenTts, &base),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, VoiceError::ProviderNotReady(LocalServer::OpenTts)));
    }

    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

// ── Commercial providers ───────────────────────────────────────────

#[tokio::test]
async fn elevenlabs_sends_key_header_and_json_body() {
    let base = serve(Router::new().route(
        "/v1/text-to-speech/21m00Tcm4TlvDq8ikWAM",
        post(
            |headers: HeaderMap, axum::Json(body): axum::Json<serde_json::Value>| async move {
                if headers.get("xi-api-key").and_then(|v| v.to_str().ok()) != Some("sk-test") {
                    return Err(StatusCode::UNAUTHORIZED);
                }
                let text = body["text"].as_str().unwrap_or_default().to_string();
                let model = body["model_id"].as_str().unwrap_or_default().to_string();
                Ok(format!("ID3|{text}|{}", !model.is_empty()))
            },
        ),
    ))
    .await;
    let provider = ElevenLabsProvider::new(Client::new(), Arc::new(AudioCache::new()));

    let good = ProviderConfig {
        api_key: Some("sk-test".to_string()),
        ..config(ProviderId::ElevenLabs, &base)
    };
    let audio = provider
        .resolve(&NarrationUnit::text("Rook takes e4, check", 0), &good)
        .await
        .unwrap();
    assert_eq!(clip_bytes(audio).0, b"ID3|Rook takes e4, check|true");
}

#[tokio::test]
async fn elevenlabs_rejected_key_is_not_cached() {
    let base = serve(Router::new().route(
        "/v1/text-to-speech/21m00Tcm4TlvDq8ikWAM",
        post(|| async { StatusCode::UNAUTHORIZED }),
    ))
    .await;
    let cache = Arc::new(AudioCache::new());
    let provider = ElevenLabsProvider::new(Client::new(), Arc::clone(&cache));
    let config = ProviderConfig {
        api_key: Some("sk-wrong".to_string()),
        ..config(ProviderId::ElevenLabs, &base)
    };

    let err = provider
        .resolve(&NarrationUnit::text("Good move", 0), &config)
        .await
        .unwrap_err();

    assert!(matches!(err, VoiceError::Unavailable(_)));
    assert!(cache.is_empty());
}

#[tokio::test]
async fn google_decodes_base64_audio_content() {
    let base = serve(Router::new().fallback(
        |uri: Uri, Query(params): Query<HashMap<String, String>>| async move {
            if uri.path() != "/v1/text:synthesize" || params.get("key").map(String::as_str) != Some("g-key") {
                return Err(StatusCode::NOT_FOUND);
            }
            let audio = base64::engine::general_purpose::STANDARD.encode(b"ID3-google");
            Ok(axum::Json(serde_json::json!({ "audioContent": audio })))
        },
    ))
    .await;
    let provider = GoogleProvider::new(Client::new(), Arc::new(AudioCache::new()));
    let config = ProviderConfig {
        api_key: Some("g-key".to_string()),
        ..config(ProviderId::Google, &base)
    };

    let audio = provider
        .resolve(&NarrationUnit::text("Blunder", 0), &config)
        .await
        .unwrap();

    let (bytes, format) = clip_bytes(audio);
    assert_eq!(bytes, b"ID3-google");
    assert_eq!(format, AudioFormat::Mp3);
}
