use std::cell::RefCell;
use std::rc::Rc;

use swarm_core::Blackboard;
use swarm_tools::{
    emit, NullTraceSink, TraceEvent, TraceLog, TraceSink, TracingSink, VecTraceSink, TRACE_LOG,
    TRACE_SINK,
};

#[derive(Clone, Default)]
struct SharedSink(Rc<RefCell<Vec<TraceEvent>>>);

impl TraceSink for SharedSink {
    fn emit(&mut self, event: TraceEvent) {
        self.0.borrow_mut().push(event);
    }
}

#[test]
fn emit_is_a_no_op_without_collaborators() {
    let mut bb = Blackboard::new();
    emit(&mut bb, TraceEvent::new(0, "goap.exec.start"));
    assert!(bb.is_empty());
}

#[test]
fn emit_fans_out_to_log_and_sink() {
    let mut bb = Blackboard::new();
    bb.set(TRACE_LOG, TraceLog::default());
    let sink = SharedSink::default();
    let shared = sink.0.clone();
    bb.set(TRACE_SINK, Box::new(sink) as Box<dyn TraceSink>);

    emit(
        &mut bb,
        TraceEvent::new(4, "goap.exec.failure")
            .with_label("till_soil")
            .with_a(2)
            .with_b(3),
    );
    emit(&mut bb, TraceEvent::new(5, "goap.exec.replan").with_label("action_failed"));

    let log = bb.get(TRACE_LOG).unwrap();
    assert_eq!(log.tags(), vec!["goap.exec.failure", "goap.exec.replan"]);
    assert_eq!(log.count("goap.exec.failure"), 1);
    assert!(log.contains("goap.exec.replan"));
    assert_eq!(log.events[0].label, "till_soil");
    assert_eq!((log.events[0].a, log.events[0].b), (2, 3));

    let streamed = shared.borrow();
    assert_eq!(streamed.len(), 2);
    assert_eq!(streamed[1].label, "action_failed");
}

#[test]
fn forwarding_sinks_accept_events_without_a_subscriber() {
    let mut sinks: Vec<Box<dyn TraceSink>> = vec![
        Box::new(TracingSink { agent: 9 }),
        Box::new(NullTraceSink),
    ];
    for sink in sinks.iter_mut() {
        sink.emit(TraceEvent::new(1, "goap.plan.call").with_label("farm"));
    }
}

#[test]
fn vec_sink_keeps_events_in_order() {
    let mut sink = VecTraceSink::default();
    for tick in 0..3 {
        sink.emit(TraceEvent::new(tick, "goap.exec.start").with_a(tick));
    }

    let ticks: Vec<u64> = sink.events.iter().map(|e| e.tick).collect();
    assert_eq!(ticks, vec![0, 1, 2]);
    assert!(sink.events.iter().all(|e| e.a == e.tick));
}
