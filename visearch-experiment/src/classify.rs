use visearch_core::{Feedback, ResponseKey};

/// Responses faster than this are anticipations
pub const MIN_RT_MS: f64 = 200.0;
/// Responses slower than this count as misses
pub const MAX_RT_MS: f64 = 2000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Response {
    pub key: ResponseKey,
    pub reaction_time_ms: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub correct: bool,
    pub feedback: Feedback,
}

/// Scores a response against the expected key.
///
/// Timing checks come first: a response outside the accepted RT range is
/// incorrect even when the key matches.
pub fn classify(response: Option<Response>, expected: ResponseKey) -> Classification {
    let incorrect = |feedback| Classification {
        correct: false,
        feedback,
    };
    match response {
        None => incorrect(Feedback::TooSlow),
        Some(r) if r.reaction_time_ms < MIN_RT_MS => incorrect(Feedback::TooFast),
        Some(r) if r.reaction_time_ms > MAX_RT_MS => incorrect(Feedback::TooSlow),
        Some(r) if r.key == expected => Classification {
            correct: true,
            feedback: Feedback::Correct,
        },
        Some(_) => incorrect(Feedback::Wrong),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use visearch_core::{Target, Version};

    fn respond(key: ResponseKey, ms: f64) -> Option<Response> {
        Some(Response {
            key,
            reaction_time_ms: ms,
        })
    }

    #[test]
    fn no_response_is_too_slow() {
        let c = classify(None, ResponseKey::LeftShift);
        assert!(!c.correct);
        assert_eq!(c.feedback, Feedback::TooSlow);
    }

    #[test]
    fn fast_response_never_counts() {
        for key in [ResponseKey::LeftShift, ResponseKey::RightShift] {
            let c = classify(respond(key, 199.9), ResponseKey::LeftShift);
            assert_eq!(
                c,
                Classification {
                    correct: false,
                    feedback: Feedback::TooFast
                }
            );
        }
    }

    #[test]
    fn version_a_fast_triangle() {
        let expected = Version::A.expected_key(Target::Triangle);
        let c = classify(respond(ResponseKey::LeftShift, 150.0), expected);
        assert!(!c.correct);
        assert_eq!(c.feedback.message(), "too fast");
    }

    #[test]
    fn version_b_diamond_left() {
        let expected = Version::B.expected_key(Target::Diamond);
        let c = classify(respond(ResponseKey::LeftShift, 600.0), expected);
        assert!(c.correct);
        assert_eq!(c.feedback, Feedback::Correct);
    }

    #[test]
    fn slow_response_overrides_match() {
        let c = classify(respond(ResponseKey::LeftShift, 2000.5), ResponseKey::LeftShift);
        assert_eq!(c.feedback, Feedback::TooSlow);
        assert!(!c.correct);
    }

    #[test]
    fn boundaries_are_accepted() {
        assert!(classify(respond(ResponseKey::RightShift, 200.0), ResponseKey::RightShift).correct);
        assert!(classify(respond(ResponseKey::RightShift, 2000.0), ResponseKey::RightShift).correct);
        let wrong = classify(respond(ResponseKey::LeftShift, 500.0), ResponseKey::RightShift);
        assert_eq!(wrong.feedback, Feedback::Wrong);
    }
}
