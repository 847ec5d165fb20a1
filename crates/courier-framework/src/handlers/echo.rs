use courier_core::{Handler, MatchGroups, Pattern, ReplyStream, RequestContext, no_replies, replies};

/// Replies with whatever follows `echo` or `/echo`.
pub struct EchoHandler {
    pattern: Pattern,
}

impl EchoHandler {
    pub const PATTERN: &'static str = r"(?s)^/?echo\s+(.+)$";

    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Pattern::new(Self::PATTERN)?,
        })
    }
}

impl Handler for EchoHandler {
    fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    fn handle(&self, _ctx: &RequestContext, groups: MatchGroups) -> ReplyStream {
        match groups.get(1) {
            Some(text) => replies([text.to_string()]),
            None => no_replies(),
        }
    }

    fn name(&self) -> &str {
        "echo"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::Platform;
    use futures::StreamExt;

    async fn run(input: &str) -> Option<Vec<String>> {
        let handler = EchoHandler::new().unwrap();
        let groups = handler.pattern().full_match(input)?;
        let ctx = RequestContext::new(Platform::Line, "R", input);
        let out = handler.handle(&ctx, groups).collect::<Vec<_>>().await;
        Some(out.into_iter().map(Result::unwrap).collect())
    }

    #[tokio::test]
    async fn test_matched() {
        let cases = [
            ("echo Hello", "Hello"),
            ("/echo Hello", "Hello"),
            ("/echo   Hello", "Hello"),
            ("/echo 안녕하세요", "안녕하세요"),
            ("/echo こんにちは", "こんにちは"),
            ("/echo Hello Hello", "Hello Hello"),
            ("/echo Hello\nHello", "Hello\nHello"),
        ];
        for (input, expected) in cases {
            assert_eq!(run(input).await, Some(vec![expected.to_string()]), "{input:?}");
        }
    }

    #[tokio::test]
    async fn test_not_matched() {
        for input in ["eko Hello", "/eko Hello", "echo", "say echo Hello"] {
            assert_eq!(run(input).await, None, "{input:?}");
        }
    }
}
