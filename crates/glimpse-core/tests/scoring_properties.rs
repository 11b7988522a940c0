//! Property-based tests for the scorer.

use chrono::{Duration, Utc};
use proptest::prelude::*;

use glimpse_core::rotation::{score_all, score_presentation, Hour, Jitter, RotationContext};
use glimpse_core::{LastShown, Presentation};

fn arb_context() -> impl Strategy<Value = RotationContext> {
    (
        0u8..24,
        0u32..12,
        proptest::option::of(-600i64..600),
        0u32..200,
    )
        .prop_map(|(hour, meetings_today, next_meeting_minutes, unread_count)| RotationContext {
            hour: Hour(hour),
            meetings_today,
            next_meeting_minutes,
            unread_count,
        })
}

fn arb_last_shown() -> impl Strategy<Value = Option<LastShown>> {
    proptest::option::of((0usize..6, 0i64..200).prop_map(|(idx, secs_ago)| LastShown {
        presentation: Presentation::ALL[idx],
        at: Utc::now() - Duration::seconds(secs_ago),
    }))
}

proptest! {
    #[test]
    fn scores_are_never_negative(ctx in arb_context(), last in arb_last_shown(), seed in any::<u64>()) {
        let now = Utc::now();
        let mut jitter = Jitter::seeded(5.0, seed);
        for p in Presentation::ALL {
            let scored = score_presentation(p, &ctx, last.as_ref(), now, 90, &mut jitter);
            prop_assert!(scored.score >= 0.0, "{p} scored {}", scored.score);
        }
    }

    #[test]
    fn gated_meeting_prep_clamps_to_zero(
        ctx in arb_context(),
        gate in prop_oneof![
            Just(None),
            (16i64..600).prop_map(Some),
            (-600i64..1).prop_map(Some),
        ],
    ) {
        let ctx = RotationContext { next_meeting_minutes: gate, ..ctx };
        let scored = score_presentation(
            Presentation::MeetingPrep,
            &ctx,
            None,
            Utc::now(),
            90,
            &mut Jitter::disabled(),
        );
        prop_assert_eq!(scored.score, 0.0);
    }

    #[test]
    fn gated_meeting_prep_never_beats_a_positive_competitor(ctx in arb_context(), seed in any::<u64>()) {
        let ctx = RotationContext { next_meeting_minutes: None, ..ctx };
        let now = Utc::now();
        let ranked = score_all(&ctx, None, now, 90, &mut Jitter::seeded(5.0, seed));
        if ranked[0].presentation == Presentation::MeetingPrep {
            prop_assert!(ranked.iter().all(|s| s.score <= 0.0));
        }
    }

    #[test]
    fn same_seed_scores_identically(ctx in arb_context(), last in arb_last_shown(), seed in any::<u64>()) {
        let now = Utc::now();
        let a = score_all(&ctx, last.as_ref(), now, 90, &mut Jitter::seeded(5.0, seed));
        let b = score_all(&ctx, last.as_ref(), now, 90, &mut Jitter::seeded(5.0, seed));
        prop_assert_eq!(a, b);
    }

    #[test]
    fn disabled_jitter_is_fully_deterministic(ctx in arb_context(), last in arb_last_shown()) {
        let now = Utc::now();
        let a = score_all(&ctx, last.as_ref(), now, 90, &mut Jitter::disabled());
        let b = score_all(&ctx, last.as_ref(), now, 90, &mut Jitter::disabled());
        prop_assert_eq!(a, b);
    }

    #[test]
    fn ranking_is_sorted_descending(ctx in arb_context(), last in arb_last_shown(), seed in any::<u64>()) {
        let now = Utc::now();
        let ranked = score_all(&ctx, last.as_ref(), now, 90, &mut Jitter::seeded(5.0, seed));
        prop_assert_eq!(ranked.len(), 6);
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
    }
}
