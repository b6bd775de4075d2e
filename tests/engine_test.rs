//! End-to-end scenarios through the full engine.

use chrono::{Duration, Utc};
use examguard::config::MonitorConfig;
use examguard::core::AckOutcome;
use examguard::engine::{Directive, ExitReason, ProctorEngine};
use examguard::session::{CALIBRATION_POINTS, SAMPLES_PER_POINT};
use examguard::signal::{
    ActivityEvent, ActivityKind, ClipboardPayload, FullscreenEvent, MouseLeaveEvent, ProctorEvent,
    TrackerSample,
};
use examguard::WarningLevel;
use pretty_assertions::assert_eq;

fn calibrated_engine() -> ProctorEngine {
    let mut engine = ProctorEngine::new(MonitorConfig::default());
    for point in 0..CALIBRATION_POINTS.len() {
        for _ in 0..SAMPLES_PER_POINT {
            engine.record_calibration_sample(point).unwrap();
        }
    }
    engine
}

fn fallback_engine() -> ProctorEngine {
    let mut config = MonitorConfig::default();
    config.guards.gaze_tracking = false;
    ProctorEngine::new(config)
}

fn feed(engine: &mut ProctorEngine, sample: TrackerSample, n: usize) -> Vec<Directive> {
    let mut all = vec![];
    for _ in 0..n {
        all.extend(engine.handle(&ProctorEvent::Tracker(sample)));
    }
    all
}

#[test]
fn all_good_stream_stays_normal() {
    let mut engine = calibrated_engine();
    let directives = feed(&mut engine, TrackerSample::detected(960.0, 540.0), 5000);
    assert_eq!(directives, vec![]);

    let status = engine.status(Utc::now());
    assert_eq!(status.warning_level, WarningLevel::Normal);
    assert_eq!(status.gaze_out_of_bounds, 0);
    assert_eq!(status.face_out_of_bounds, 0);
}

#[test]
fn escalation_fires_on_the_crossing_sample() {
    let mut engine = calibrated_engine();
    let bad = TrackerSample::detected(-100.0, 540.0);

    assert_eq!(feed(&mut engine, bad, 80), vec![]);
    assert_eq!(
        feed(&mut engine, bad, 1),
        vec![Directive::ShowWarning {
            level: WarningLevel::Warned
        }]
    );
}

#[test]
fn sustained_violations_terminate_exactly_once() {
    let mut engine = calibrated_engine();
    let directives = feed(&mut engine, TrackerSample::face_missing(), 5000);

    let exits: Vec<_> = directives
        .iter()
        .filter(|d| matches!(d, Directive::ForceExit { .. }))
        .collect();
    assert_eq!(exits.len(), 1);
    assert_eq!(
        exits[0],
        &Directive::ForceExit {
            reason: ExitReason::GazeThreshold
        }
    );

    // The gate closed again: nothing counts after termination.
    let after = engine.audit().snapshot().tracker_samples;
    feed(&mut engine, TrackerSample::face_missing(), 100);
    assert_eq!(engine.audit().snapshot().tracker_samples, after);
}

#[test]
fn warning_then_partial_recovery_then_acknowledge() {
    // 81 face-missing samples raise the first warning, 40 good samples decay
    // the counter to 41, the acknowledgment hides the modal without clearing
    // the level, and the next bad sample brings the modal straight back.
    let mut engine = calibrated_engine();

    let directives = feed(&mut engine, TrackerSample::face_missing(), 81);
    assert_eq!(
        directives,
        vec![Directive::ShowWarning {
            level: WarningLevel::Warned
        }]
    );

    let directives = feed(&mut engine, TrackerSample::detected(960.0, 540.0), 40);
    assert_eq!(directives, vec![]);
    assert_eq!(engine.status(Utc::now()).face_out_of_bounds, 41);

    assert_eq!(engine.acknowledge(), AckOutcome::Retained);
    assert_eq!(engine.status(Utc::now()).warning_level, WarningLevel::Warned);

    let directives = feed(&mut engine, TrackerSample::face_missing(), 1);
    assert_eq!(
        directives,
        vec![Directive::ShowWarning {
            level: WarningLevel::Warned
        }]
    );
}

#[test]
fn acknowledge_after_full_recovery_clears() {
    let mut engine = calibrated_engine();
    feed(&mut engine, TrackerSample::face_missing(), 81);
    feed(&mut engine, TrackerSample::detected(960.0, 540.0), 70);
    assert_eq!(engine.status(Utc::now()).face_out_of_bounds, 11);

    assert_eq!(engine.acknowledge(), AckOutcome::Cleared);
    assert_eq!(engine.status(Utc::now()).warning_level, WarningLevel::Normal);
}

#[test]
fn paste_decision_matrix() {
    let mut engine = calibrated_engine();
    let now = Utc::now();

    // Plain text copied outside the exam: blocked.
    let external = engine.handle(&ProctorEvent::Paste {
        clipboard: Some(ClipboardPayload::external("answer from the internet")),
        timestamp: now,
    });
    assert_eq!(
        external,
        vec![Directive::BlockPaste {
            formats: vec![String::from("text/plain")]
        }]
    );

    // Content copied inside the editor: allowed.
    let tag = engine.handle(&ProctorEvent::Copy {
        selection: Some(String::from("let total = 0;")),
        timestamp: now,
    });
    let payload = match tag.as_slice() {
        [Directive::TagClipboard { payload }] => payload.clone(),
        other => panic!("expected TagClipboard, got {other:?}"),
    };
    let internal = engine.handle(&ProctorEvent::Paste {
        clipboard: Some(payload),
        timestamp: now,
    });
    assert_eq!(internal, vec![Directive::AllowPaste]);

    // Unreadable clipboard: blocked, fail closed.
    let unreadable = engine.handle(&ProctorEvent::Paste {
        clipboard: None,
        timestamp: now,
    });
    assert_eq!(unreadable, vec![Directive::BlockPaste { formats: vec![] }]);
}

#[test]
fn mouse_leave_truth_table() {
    let mut engine = calibrated_engine();
    let now = Utc::now();
    let cases = [
        // (related_target_is_null, document_hidden, expect_reminder)
        (true, false, true),
        (true, true, false),
        (false, false, false),
        (false, true, false),
    ];

    for (related_null, hidden, expect) in cases {
        let directives = engine.handle(&ProctorEvent::MouseLeave(MouseLeaveEvent {
            related_target_is_null: related_null,
            document_hidden: hidden,
            timestamp: now,
        }));
        let expected = if expect {
            vec![Directive::ShowFocusReminder]
        } else {
            vec![]
        };
        assert_eq!(directives, expected, "case ({related_null}, {hidden})");
    }
}

#[test]
fn fullscreen_loss_and_recovery() {
    let mut engine = calibrated_engine();

    // Baseline event from the initial fullscreen request.
    assert_eq!(
        engine.handle(&ProctorEvent::Fullscreen(FullscreenEvent::new(true))),
        vec![]
    );
    assert_eq!(
        engine.handle(&ProctorEvent::Fullscreen(FullscreenEvent::new(false))),
        vec![Directive::RequireFullscreen]
    );
    assert_eq!(
        engine.handle(&ProctorEvent::Fullscreen(FullscreenEvent::new(true))),
        vec![Directive::DismissFullscreenPrompt]
    );
    assert_eq!(engine.audit().snapshot().fullscreen_violations, 1);
}

#[test]
fn inactivity_ladder_in_fallback_mode() {
    let mut engine = fallback_engine();
    let start = Utc::now();

    assert_eq!(engine.tick(start + Duration::seconds(2)), vec![]);
    assert_eq!(
        engine.tick(start + Duration::seconds(4)),
        vec![Directive::ShowWarning {
            level: WarningLevel::Warned
        }]
    );

    // Any activity clears the level and restarts the clock.
    let directives = engine.handle(&ProctorEvent::Activity(ActivityEvent {
        kind: ActivityKind::Scroll,
        timestamp: start + Duration::seconds(5),
    }));
    assert_eq!(directives, vec![Directive::DismissWarning]);

    assert_eq!(engine.tick(start + Duration::seconds(7)), vec![]);
    assert_eq!(
        engine.tick(start + Duration::seconds(9)),
        vec![Directive::ShowWarning {
            level: WarningLevel::Warned
        }]
    );
    assert_eq!(
        engine.tick(start + Duration::seconds(36)),
        vec![Directive::ShowWarning {
            level: WarningLevel::Severe
        }]
    );
    assert_eq!(
        engine.tick(start + Duration::seconds(187)),
        vec![Directive::ForceExit {
            reason: ExitReason::Inactivity
        }]
    );
}

#[test]
fn tracker_events_ignored_in_fallback_mode() {
    let mut engine = fallback_engine();
    let directives = feed(&mut engine, TrackerSample::face_missing(), 200);
    assert_eq!(directives, vec![]);
    assert_eq!(engine.audit().snapshot().tracker_samples, 0);
}

#[test]
fn audit_trail_records_the_session_story() {
    let mut engine = calibrated_engine();
    feed(&mut engine, TrackerSample::face_missing(), 81);
    engine.handle(&ProctorEvent::Paste {
        clipboard: None,
        timestamp: Utc::now(),
    });
    engine.force_exit(ExitReason::Operator);

    let trail = engine.audit().trail();
    assert_eq!(trail.len(), 3);
    let snapshot = engine.audit().snapshot();
    assert_eq!(snapshot.warnings_shown, 1);
    assert_eq!(snapshot.blocked_pastes, 1);
    assert_eq!(snapshot.forced_exits, 1);
}
