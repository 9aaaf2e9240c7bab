#![cfg(feature = "serde")]

use swarm_tools::{TraceEvent, TraceLog};

#[test]
fn trace_log_json_roundtrip() {
    let log = TraceLog {
        events: vec![
            TraceEvent::new(1, "goap.plan.call").with_label("farm").with_a(0),
            TraceEvent::new(2, "goap.exec.start").with_label("gather_seeds").with_a(1).with_b(3),
            TraceEvent::new(9, "goap.exec.replan").with_label("plan_exhausted"),
        ],
    };

    let json = serde_json::to_string(&log).expect("serialize");
    let roundtrip: TraceLog = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(roundtrip, log);
}
