use courier_core::{Handler, MatchGroups, Pattern, ReplyStream, RequestContext, replies};

/// Answers `ping` with `PONG`.
pub struct PingHandler {
    pattern: Pattern,
}

impl PingHandler {
    pub const PATTERN: &'static str = r"(?i)\s*ping\s*";

    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Pattern::new(Self::PATTERN)?,
        })
    }
}

impl Handler for PingHandler {
    fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    fn handle(&self, _ctx: &RequestContext, _groups: MatchGroups) -> ReplyStream {
        replies(["PONG"])
    }

    fn name(&self) -> &str {
        "ping"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern() {
        let handler = PingHandler::new().unwrap();
        for input in ["ping", "PING", "  Ping \n"] {
            assert!(handler.pattern().full_match(input).is_some(), "{input:?}");
        }
        for input in ["pingpong", "ping me", "pong"] {
            assert!(handler.pattern().full_match(input).is_none(), "{input:?}");
        }
    }
}
