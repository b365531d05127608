//! Pure scoring functions: per-answer XP reward and two-player outcome.

use shared::models::{MatchQuestion, PlayerProfile, RawResult, ScoreOutcome};

/// Answers at or beyond this many seconds earn no time bonus.
pub const MAX_ANSWER_SECS: f64 = 30.0;
/// Per-level reward decay.
const LEVEL_ALPHA: f64 = 0.05;
/// Weight of the distance-to-next-level bonus.
const GATE_BETA: f64 = 0.3;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// XP reward for a single answered question.
///
/// An incorrect answer always yields 0. For a correct one the base
/// `xp_gain` is scaled by 1 plus three bonuses: a time bonus falling
/// linearly from 1 at t=0 to 0 at [`MAX_ANSWER_SECS`] (out-of-range times
/// clamp), a level bonus `1/(1 + 0.05·level)` shrinking as the player
/// levels up, and a gatekeeping bonus `0.3·(N − X)/N` growing with the
/// distance from the next level. Rounded to two decimals.
pub fn answer_reward(
    correct: bool,
    xp_gain: f64,
    elapsed_secs: f64,
    level: u32,
    xp: f64,
    xp_to_next: f64,
) -> f64 {
    if !correct {
        return 0.0;
    }
    let elapsed = elapsed_secs.clamp(0.0, MAX_ANSWER_SECS);
    let time_component = (MAX_ANSWER_SECS - elapsed) / MAX_ANSWER_SECS;
    let level_component = 1.0 / (1.0 + LEVEL_ALPHA * f64::from(level));
    let gate_component = if xp_to_next > 0.0 {
        GATE_BETA * (xp_to_next - xp) / xp_to_next
    } else {
        0.0
    };
    round2(xp_gain * (1.0 + time_component + level_component + gate_component))
}

/// Total XP one side earned in a session: their ordered answers scored
/// against the delivered questions with their own profile.
pub fn session_reward(
    result: &RawResult,
    questions: &[MatchQuestion],
    profile: &PlayerProfile,
) -> f64 {
    let total = result
        .answers
        .iter()
        .zip(questions)
        .map(|(answer, question)| {
            answer_reward(
                answer.correct,
                question.question.xp_gain,
                answer.elapsed_secs,
                profile.level,
                profile.xp,
                profile.xp_to_next,
            )
        })
        .sum();
    round2(total)
}

/// Two-player outcome from each side's session XP and total time. Higher
/// XP wins outright; on an XP tie the strictly lower time wins; on a full
/// tie side one is declared the winner — the historical tie-break, kept
/// for compatibility. It is an acknowledged asymmetry, not a fairness rule.
pub fn match_outcome(xp_one: f64, time_one: f64, xp_two: f64, time_two: f64) -> ScoreOutcome {
    let side_one_won = if xp_one != xp_two {
        xp_one > xp_two
    } else {
        time_one <= time_two
    };
    ScoreOutcome {
        xp_side_one: xp_one,
        xp_side_two: xp_two,
        side_one_won,
        combined_xp: round2(xp_one + xp_two),
    }
}
