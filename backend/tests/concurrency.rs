//! Races the per-session serialization is supposed to win: overlapping
//! deliveries of the same batch, and an update in flight while the runner
//! stops the session.

use std::sync::Arc;

use paceline_backend::{
    error::AppError,
    models::location::LocationSample,
    models::session::SessionStatus,
    models::voice_message::{CreateVoiceMessageRequest, TriggerType},
    repositories::MemoryStore,
    services::tracker::SessionTracker,
    types::{EventId, SessionId, UserId},
};

fn sample(latitude: f64, longitude: f64, secs: i64) -> LocationSample {
    LocationSample {
        latitude,
        longitude,
        timestamp: (secs * 1000).to_string(),
    }
}

fn cheer(miles: f64) -> CreateVoiceMessageRequest {
    CreateVoiceMessageRequest {
        sender_name: "Ada".to_string(),
        audio_file_url: "https://storage.example.com/cheers/ada.webm".to_string(),
        trigger_type: TriggerType::Distance,
        trigger_value: miles,
    }
}

async fn active_session(tracker: &SessionTracker) -> (SessionId, UserId) {
    let user = UserId::new();
    let session = tracker
        .register(EventId::new(), user)
        .await
        .expect("register");
    tracker
        .start_session(session.id, user, None)
        .await
        .expect("start");
    (session.id, user)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_duplicate_updates_fire_each_trigger_once() {
    let store = Arc::new(MemoryStore::new());
    let tracker = Arc::new(SessionTracker::new(store.clone(), store));
    let (session_id, user) = active_session(&tracker).await;

    for miles in [0.1, 0.2, 0.3] {
        tracker
            .create_voice_message(session_id, cheer(miles))
            .await
            .expect("create cheer");
    }

    // Four overlapping deliveries of the same big batch, as sent by a
    // device that never saw its acknowledgements.
    let mut handles = Vec::new();
    for _ in 0..4 {
        let tracker = tracker.clone();
        handles.push(tokio::spawn(async move {
            tracker
                .update_session(
                    session_id,
                    user,
                    vec![sample(44.9778, -93.2650, 0), sample(44.9859, -93.2650, 300)],
                    300,
                )
                .await
        }));
    }

    let mut fired_total = 0usize;
    for handle in handles {
        let outcome = handle.await.expect("join").expect("update");
        fired_total += outcome.messages_to_play.len();
    }

    // Every cheer fires, and no interleaving can fire one twice.
    assert_eq!(fired_total, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn update_racing_stop_is_totally_ordered() {
    let store = Arc::new(MemoryStore::new());
    let tracker = Arc::new(SessionTracker::new(store.clone(), store));
    let (session_id, user) = active_session(&tracker).await;

    let update_task = {
        let tracker = tracker.clone();
        tokio::spawn(async move {
            tracker
                .update_session(
                    session_id,
                    user,
                    vec![sample(44.9778, -93.2650, 0), sample(44.9779, -93.2651, 5)],
                    5,
                )
                .await
        })
    };
    let stop_task = {
        let tracker = tracker.clone();
        tokio::spawn(async move { tracker.stop_session(session_id, user, None, None).await })
    };

    let update_result = update_task.await.expect("join update");
    let stopped = stop_task.await.expect("join stop").expect("stop");
    assert_eq!(stopped.status, SessionStatus::Completed);

    let final_session = tracker
        .get_session(session_id, user)
        .await
        .expect("final read");
    assert_eq!(final_session.status, SessionStatus::Completed);

    match update_result {
        // The update landed before the stop became visible; its distance
        // survives into the completed session.
        Ok(outcome) => {
            assert!(
                (final_session.elapsed_distance_meters - outcome.session.elapsed_distance_meters)
                    .abs()
                    < 1e-9
            );
        }
        // The stop won; the update was rejected whole.
        Err(AppError::InvalidState(_)) => {
            assert_eq!(final_session.elapsed_distance_meters, 0.0);
        }
        Err(other) => panic!("unexpected update outcome: {other:?}"),
    }
}
