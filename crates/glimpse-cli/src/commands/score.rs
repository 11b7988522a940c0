//! Presentation scoring command for debugging the selection policy.

use chrono::Utc;

use glimpse_core::rotation::{score_all, Hour, Jitter, RotationContext};

pub fn run(
    hour: u8,
    meetings: u32,
    next_meeting: Option<i64>,
    unread: u32,
    seed: Option<u64>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if hour > 23 {
        return Err(format!("hour must be 0-23, got {hour}").into());
    }

    let ctx = RotationContext {
        hour: Hour(hour),
        meetings_today: meetings,
        next_meeting_minutes: next_meeting,
        unread_count: unread,
    };

    let mut jitter = match seed {
        Some(seed) => Jitter::seeded(5.0, seed),
        None => Jitter::disabled(),
    };
    let ranking = score_all(&ctx, None, Utc::now(), 90, &mut jitter);

    if json {
        println!("{}", serde_json::to_string_pretty(&ranking)?);
        return Ok(());
    }

    println!("=== Presentation Scores ===\n");
    for (i, scored) in ranking.iter().enumerate() {
        let marker = if i == 0 { "*" } else { " " };
        println!(
            "{} {}. {:18} {:6.1}  {}",
            marker,
            i + 1,
            scored.presentation.to_string(),
            scored.score,
            scored.reason
        );
    }

    println!("\nContext:");
    println!("  Hour: {hour}:00");
    println!("  Meetings today: {meetings}");
    match next_meeting {
        Some(minutes) => println!("  Next meeting in: {minutes} min"),
        None => println!("  Next meeting: none"),
    }
    println!("  Unread messages: {unread}");

    Ok(())
}
