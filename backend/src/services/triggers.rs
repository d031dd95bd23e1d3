//! Trigger evaluation for per-session voice messages.
//!
//! Selection is pure: given the post-update totals, every unfired message
//! whose threshold is crossed is due in the same evaluation, so a single
//! large batch that jumps past several thresholds fires all of them at
//! once. The exactly-once guarantee lives in the store's conditional
//! `mark_fired` write, not here.

use crate::models::voice_message::{TriggerType, VoiceMessage};

/// Returns the messages due at the given totals, in deterministic order:
/// distance triggers before time triggers, ascending threshold, id as the
/// final tiebreak.
pub fn due_messages(
    messages: &[VoiceMessage],
    distance_meters: f64,
    elapsed_seconds: i64,
) -> Vec<VoiceMessage> {
    let mut due: Vec<VoiceMessage> = messages
        .iter()
        .filter(|message| message.is_due(distance_meters, elapsed_seconds))
        .cloned()
        .collect();

    due.sort_by(|a, b| {
        type_rank(a.trigger_type)
            .cmp(&type_rank(b.trigger_type))
            .then(a.trigger_value.total_cmp(&b.trigger_value))
            .then_with(|| a.id.cmp(&b.id))
    });

    due
}

fn type_rank(trigger_type: TriggerType) -> u8 {
    match trigger_type {
        TriggerType::Distance => 0,
        TriggerType::Time => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SessionId, VoiceMessageId};
    use chrono::Utc;

    fn message(trigger_type: TriggerType, trigger_value: f64) -> VoiceMessage {
        VoiceMessage {
            id: VoiceMessageId::new(),
            session_id: SessionId::new(),
            sender_name: "Ada".to_string(),
            audio_file_url: "https://storage.example.com/cheers/ada.webm".to_string(),
            trigger_type,
            trigger_value,
            fired_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn one_jump_fires_every_crossed_threshold() {
        let messages = vec![
            message(TriggerType::Distance, 500.0),
            message(TriggerType::Distance, 1000.0),
            message(TriggerType::Distance, 1500.0),
        ];
        let due = due_messages(&messages, 1600.0, 0);
        assert_eq!(due.len(), 3);
    }

    #[test]
    fn uncrossed_thresholds_stay_pending() {
        let messages = vec![
            message(TriggerType::Distance, 500.0),
            message(TriggerType::Distance, 5000.0),
        ];
        let due = due_messages(&messages, 1600.0, 0);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].trigger_value, 500.0);
    }

    #[test]
    fn fired_messages_are_excluded() {
        let mut fired = message(TriggerType::Distance, 500.0);
        fired.fired_at = Some(Utc::now());
        let messages = vec![fired, message(TriggerType::Distance, 1000.0)];

        let due = due_messages(&messages, 1600.0, 0);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].trigger_value, 1000.0);
    }

    #[test]
    fn exact_threshold_counts_as_crossed() {
        let messages = vec![message(TriggerType::Time, 300.0)];
        assert_eq!(due_messages(&messages, 0.0, 300).len(), 1);
        assert_eq!(due_messages(&messages, 0.0, 299).len(), 0);
    }

    #[test]
    fn output_order_is_deterministic() {
        let messages = vec![
            message(TriggerType::Time, 60.0),
            message(TriggerType::Distance, 1500.0),
            message(TriggerType::Distance, 500.0),
            message(TriggerType::Time, 30.0),
        ];
        let due = due_messages(&messages, 2000.0, 120);
        let order: Vec<(TriggerType, f64)> =
            due.iter().map(|m| (m.trigger_type, m.trigger_value)).collect();
        assert_eq!(
            order,
            vec![
                (TriggerType::Distance, 500.0),
                (TriggerType::Distance, 1500.0),
                (TriggerType::Time, 30.0),
                (TriggerType::Time, 60.0),
            ]
        );
    }

    #[test]
    fn distance_and_time_triggers_evaluate_independently() {
        let messages = vec![
            message(TriggerType::Distance, 1000.0),
            message(TriggerType::Time, 600.0),
        ];
        // Distance crossed, time not.
        let due = due_messages(&messages, 1200.0, 60);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].trigger_type, TriggerType::Distance);
    }
}
