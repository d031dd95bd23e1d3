//! Round-trips against a real Postgres instance. These run only when
//! TEST_DATABASE_URL is set; everywhere else they skip so the suite stays
//! self-contained.

use chrono::Utc;

use paceline_backend::{
    db::connection::create_pool,
    models::session::{Session, SessionStatus},
    models::voice_message::{CreateVoiceMessageRequest, TriggerType},
    repositories::{PgStore, SessionStore, VoiceMessageStore},
    types::{EventId, UserId},
};

async fn test_store() -> Option<PgStore> {
    let url = match std::env::var("TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("TEST_DATABASE_URL not set; skipping Postgres store test");
            return None;
        }
    };
    let pool = create_pool(&url).await.expect("connect to test database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("run migrations");
    Some(PgStore::new(pool))
}

#[tokio::test]
async fn session_round_trip_and_cas() {
    let Some(store) = test_store().await else {
        return;
    };

    let mut session = Session::register(EventId::new(), UserId::new(), Utc::now());
    SessionStore::create(&store, &session)
        .await
        .expect("create session");

    let loaded = store
        .find_by_id(session.id)
        .await
        .expect("find")
        .expect("present");
    assert_eq!(loaded.status, SessionStatus::Registered);
    assert_eq!(loaded.user_id, session.user_id);
    assert!(loaded.last_known_location.is_none());
    assert!(loaded.locations.is_empty());

    let by_pair = store
        .find_by_event_and_user(session.event_id, session.user_id)
        .await
        .expect("find by pair")
        .expect("present");
    assert_eq!(by_pair.id, session.id);

    // Winning and losing CAS writes.
    let expected = session.version;
    session.start(Utc::now(), Utc::now()).expect("start");
    session.elapsed_distance_meters = 42.5;
    session.version += 1;
    assert!(store.update(&session, expected).await.expect("write"));
    assert!(!store.update(&session, expected).await.expect("stale write"));

    let reloaded = store
        .find_by_id(session.id)
        .await
        .expect("find")
        .expect("present");
    assert_eq!(reloaded.status, SessionStatus::Active);
    assert_eq!(reloaded.elapsed_distance_meters, 42.5);
    assert_eq!(reloaded.version, session.version);
}

#[tokio::test]
async fn voice_message_fires_exactly_once() {
    let Some(store) = test_store().await else {
        return;
    };

    let session = Session::register(EventId::new(), UserId::new(), Utc::now());
    SessionStore::create(&store, &session)
        .await
        .expect("create session");

    let message = CreateVoiceMessageRequest {
        sender_name: "Ada".to_string(),
        audio_file_url: "https://storage.example.com/cheers/ada.webm".to_string(),
        trigger_type: TriggerType::Distance,
        trigger_value: 1.0,
    }
    .into_message(session.id, Utc::now());
    VoiceMessageStore::create(&store, &message)
        .await
        .expect("create message");

    let pending = store
        .unfired_for_session(session.id)
        .await
        .expect("pending");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].trigger_type, TriggerType::Distance);

    let now = Utc::now();
    assert!(store.mark_fired(message.id, now).await.expect("first fire"));
    assert!(!store.mark_fired(message.id, now).await.expect("second fire"));

    let pending = store
        .unfired_for_session(session.id)
        .await
        .expect("pending after fire");
    assert!(pending.is_empty());
}
