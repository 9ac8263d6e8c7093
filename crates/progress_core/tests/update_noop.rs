use std::time::Instant;

use progress_core::{update, IndicatorState, Msg, RawNotification};
use serde_json::json;

#[test]
fn update_after_teardown_is_noop() {
    let (state, _) = update(IndicatorState::new(), Msg::Teardown);
    let messages = vec![
        Msg::Started,
        Msg::PushReceived {
            notifications: vec![RawNotification::new(
                "web_progress",
                json!([{"state": "ongoing", "code": "j1"}]),
            )],
            at: Instant::now(),
        },
        Msg::MenuToggled { open: true },
        Msg::Teardown,
    ];

    for msg in messages {
        let (next, effects) = update(state.clone(), msg);
        assert_eq!(state, next);
        assert!(effects.is_empty());
    }
}
