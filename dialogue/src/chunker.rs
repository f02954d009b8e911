//! Splitting streamed completions into chat bubbles.
//!
//! Chat-like personas answer in several short messages instead of one long
//! one. Fragments from the completion stream are re-cut at natural breaks and
//! each bubble is released with a small delay, so the client can render them
//! as if they were typed one after another.

use std::time::Duration;

use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::time::{sleep, Instant};
use tracing::warn;
use zoey_core::{TextStream, ZoeyError, ZoeyResult};

/// Separator written after every bubble on the wire
pub const CHUNK_DELIMITER: &str = "\n---CHUNK---\n";

/// A buffer must be longer than this before a natural break releases it
pub const MIN_BUBBLE_CHARS: usize = 15;

/// A buffer longer than this is released even without a natural break
pub const MAX_BUBBLE_CHARS: usize = 150;

const BREAK_EMOJIS: [char; 8] = ['😊', '😄', '😃', '😀', '🤔', '💭', '💡', '🎉'];

/// Whether `buffer` ends at a point where a bubble may end
pub fn is_natural_break(buffer: &str) -> bool {
    if buffer.trim().ends_with(['.', '!', '?']) {
        return true;
    }

    if buffer
        .trim_end()
        .chars()
        .last()
        .is_some_and(|c| BREAK_EMOJIS.contains(&c))
    {
        return true;
    }

    buffer.contains("\n\n")
}

/// Wire form of a bubble
pub fn frame_bubble(bubble: &str) -> String {
    format!("{}{}", bubble.trim(), CHUNK_DELIMITER)
}

/// Incremental bubble splitter
///
/// Bubbles are returned untrimmed, so concatenating everything returned by
/// [`Chunker::push`] and [`Chunker::finish`] gives back the input exactly.
#[derive(Debug, Default)]
pub struct Chunker {
    buffer: String,
    chars: usize,
}

impl Chunker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one fragment, returning the bubbles it completes
    pub fn push(&mut self, fragment: &str) -> Vec<String> {
        let mut bubbles = Vec::new();

        for c in fragment.chars() {
            self.buffer.push(c);
            self.chars += 1;

            let ready = (self.chars > MIN_BUBBLE_CHARS && is_natural_break(&self.buffer))
                || self.chars > MAX_BUBBLE_CHARS;

            // Whitespace-only buffers keep growing until real text arrives
            if ready && !self.buffer.trim().is_empty() {
                bubbles.push(std::mem::take(&mut self.buffer));
                self.chars = 0;
            }
        }

        bubbles
    }

    /// Remainder at end of stream, if any
    pub fn finish(&mut self) -> Option<String> {
        self.chars = 0;
        if self.buffer.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.buffer))
        }
    }
}

/// Minimum spacing between released bubbles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub min_delay: Duration,
    pub target_gap: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(150),
            target_gap: Duration::from_millis(300),
        }
    }
}

impl Pacing {
    /// How long to wait before releasing a bubble, given the time since the previous one
    pub fn delay_after(&self, since: Duration) -> Option<Duration> {
        let delay = self.target_gap.saturating_sub(since).max(self.min_delay);
        (since < delay).then_some(delay)
    }
}

/// Re-cut a fragment stream into framed, paced bubbles
///
/// The final remainder is released without a delay. An upstream error ends
/// the stream after whatever was buffered has been sent.
pub fn bubble_stream(fragments: TextStream, pacing: Pacing) -> BoxStream<'static, ZoeyResult<String>> {
    let mut fragments = fragments;

    let stream = async_stream::stream! {
        let mut chunker = Chunker::new();
        let mut last = Instant::now();
        let mut failure = None;

        while let Some(fragment) = fragments.next().await {
            let fragment = match fragment {
                Ok(fragment) => fragment,
                Err(e) => {
                    warn!(error = %e, "Completion stream failed");
                    failure = Some(e);
                    break;
                }
            };

            for bubble in chunker.push(&fragment) {
                if let Some(delay) = pacing.delay_after(last.elapsed()) {
                    sleep(delay).await;
                }
                yield Ok::<String, ZoeyError>(frame_bubble(&bubble));
                last = Instant::now();
            }
        }

        if let Some(rest) = chunker.finish() {
            if !rest.trim().is_empty() {
                yield Ok(frame_bubble(&rest));
            }
        }

        if let Some(e) = failure {
            yield Err(e);
        }
    };

    stream.boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn chunk_all(fragments: &[&str]) -> Vec<String> {
        let mut chunker = Chunker::new();
        let mut bubbles: Vec<String> = fragments.iter().flat_map(|f| chunker.push(f)).collect();
        bubbles.extend(chunker.finish());
        bubbles
    }

    fn fragments(parts: &[&str]) -> TextStream {
        let parts: Vec<ZoeyResult<String>> = parts.iter().map(|p| Ok(p.to_string())).collect();
        stream::iter(parts).boxed()
    }

    #[test]
    fn test_natural_breaks() {
        assert!(is_natural_break("How are you?  "));
        assert!(is_natural_break("That is great 🎉 "));
        assert!(is_natural_break("first\n\nsecond"));
        assert!(!is_natural_break("Hello there"));
        assert!(!is_natural_break("Love it ❤️"));
    }

    #[test]
    fn test_splits_after_emoji() {
        let bubbles = chunk_all(&["Hello there! I'm doing great today 😊 What about you?"]);
        assert_eq!(
            bubbles,
            vec!["Hello there! I'm doing great today 😊", " What about you?"]
        );
    }

    #[test]
    fn test_short_sentences_are_merged() {
        // "Hi!" is too short to stand on its own
        let bubbles = chunk_all(&["Hi! ", "How has your week been so far?"]);
        assert_eq!(bubbles, vec!["Hi! How has your week been so far?"]);
    }

    #[test]
    fn test_long_text_is_cut() {
        let text = "a".repeat(400);
        let bubbles = chunk_all(&[&text]);
        assert_eq!(bubbles.len(), 3);
        assert_eq!(bubbles[0].chars().count(), MAX_BUBBLE_CHARS + 1);
        assert_eq!(bubbles.concat(), text);
    }

    #[test]
    fn test_lossless_across_fragment_boundaries() {
        let parts = [
            "Oh no, ", "that sounds rough. ", "Want to talk ", "about it? ", "🤔", "\n\n", "I'm here", " for you!",
            "   ",
        ];
        let bubbles = chunk_all(&parts);
        assert_eq!(bubbles.concat(), parts.concat());
        assert!(bubbles.len() > 1);
    }

    #[test]
    fn test_whitespace_is_not_a_bubble() {
        let mut chunker = Chunker::new();
        assert!(chunker.push(&" ".repeat(200)).is_empty());
        assert_eq!(chunker.finish(), Some(" ".repeat(200)));
        assert_eq!(chunker.finish(), None);
    }

    #[test]
    fn test_frame_bubble() {
        assert_eq!(frame_bubble(" What about you?"), "What about you?\n---CHUNK---\n");
    }

    #[test]
    fn test_pacing_delay() {
        let pacing = Pacing::default();
        assert_eq!(pacing.delay_after(Duration::ZERO), Some(Duration::from_millis(300)));
        assert_eq!(pacing.delay_after(Duration::from_millis(100)), Some(Duration::from_millis(200)));
        assert_eq!(pacing.delay_after(Duration::from_millis(149)), Some(Duration::from_millis(151)));
        assert_eq!(pacing.delay_after(Duration::from_millis(200)), None);
        assert_eq!(pacing.delay_after(Duration::from_secs(2)), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bubble_stream_frames_and_paces() {
        let started = Instant::now();
        let output: Vec<String> = bubble_stream(
            fragments(&["Hello there! I'm doing great ", "today 😊 What about you?"]),
            Pacing::default(),
        )
        .map(|item| item.unwrap())
        .collect()
        .await;

        assert_eq!(
            output,
            vec![
                "Hello there! I'm doing great today 😊\n---CHUNK---\n",
                "What about you?\n---CHUNK---\n",
            ]
        );
        // Both bubbles complete while scanning, each waits the full gap
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(600), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(650), "elapsed {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_final_remainder_is_not_delayed() {
        let started = Instant::now();
        let output: Vec<String> = bubble_stream(fragments(&["hey you"]), Pacing::default())
            .map(|item| item.unwrap())
            .collect()
            .await;

        assert_eq!(output, vec!["hey you\n---CHUNK---\n"]);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_upstream_error_flushes_then_fails() {
        let parts: Vec<ZoeyResult<String>> = vec![
            Ok("partial answer".to_string()),
            Err(ZoeyError::StreamError("connection reset".to_string())),
        ];
        let output: Vec<ZoeyResult<String>> = bubble_stream(stream::iter(parts).boxed(), Pacing::default())
            .collect()
            .await;

        assert_eq!(output.len(), 2);
        assert_eq!(output[0].as_deref().unwrap(), "partial answer\n---CHUNK---\n");
        assert!(output[1].is_err());
    }
}
