//! Line sources for interactive execution.
//!
//! Manual cases and the `ask` mode policy read operator input one line at a
//! time through `LineSource`, so the same code path runs against stdin in the
//! binary and against a scripted queue in tests.

use std::collections::VecDeque;
use std::io::{self, BufRead};
use std::thread;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::debug;

#[async_trait]
pub trait LineSource: Send {
    /// Shows `prompt` and returns the next line without its terminator.
    /// `Ok(None)` means the input is exhausted.
    async fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;
}

/// Reads operator input line by line, prompting on standard output.
///
/// The blocking reads happen on a dedicated thread that forwards every line
/// over a channel, so an interrupted prompt never leaves a read pending on
/// the runtime. Lines that arrive for a prompt that was interrupted are
/// discarded before the next prompt is shown.
pub struct StdinLines {
    lines: mpsc::UnboundedReceiver<io::Result<String>>,
    waiting: bool,
}

impl StdinLines {
    pub fn new() -> io::Result<Self> {
        Self::from_reader(io::BufReader::new(io::stdin()))
    }

    pub fn from_reader<R>(reader: R) -> io::Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        thread::Builder::new()
            .name("sparring-input".into())
            .spawn(move || {
                for line in reader.lines() {
                    let failed = line.is_err();
                    if tx.send(line).is_err() || failed {
                        break;
                    }
                }
            })?;
        Ok(Self {
            lines: rx,
            waiting: false,
        })
    }
}

#[async_trait]
impl LineSource for StdinLines {
    async fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        if self.waiting {
            while let Ok(stale) = self.lines.try_recv() {
                debug!(?stale, "Discarding input meant for an interrupted prompt");
            }
        }

        let mut stdout = tokio::io::stdout();
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;

        self.waiting = true;
        let line = self.lines.recv().await.transpose();
        self.waiting = false;
        line
    }
}

/// Replays a fixed list of lines and records every prompt it was shown.
#[derive(Debug, Default)]
pub struct ScriptedLines {
    lines: VecDeque<String>,
    prompts: Vec<String>,
}

impl ScriptedLines {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
        }
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

#[async_trait]
impl LineSource for ScriptedLines {
    async fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.prompts.push(prompt.to_owned());
        Ok(self.lines.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::sync::mpsc as std_mpsc;
    use std::time::Duration;

    /// Blocking reader fed line by line from the test.
    struct Feed {
        chunks: std_mpsc::Receiver<Vec<u8>>,
        pending: Vec<u8>,
    }

    impl Read for Feed {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.pending.is_empty() {
                match self.chunks.recv() {
                    Ok(chunk) => self.pending = chunk,
                    Err(_) => return Ok(0),
                }
            }
            let n = buf.len().min(self.pending.len());
            buf[..n].copy_from_slice(&self.pending[..n]);
            self.pending.drain(..n);
            Ok(n)
        }
    }

    fn feed() -> (std_mpsc::Sender<Vec<u8>>, StdinLines) {
        let (tx, rx) = std_mpsc::channel();
        let reader = io::BufReader::new(Feed {
            chunks: rx,
            pending: Vec::new(),
        });
        (tx, StdinLines::from_reader(reader).unwrap())
    }

    #[tokio::test]
    async fn reader_thread_forwards_lines_until_eof() {
        let (tx, mut input) = feed();
        tx.send(b"one\ntwo\n".to_vec()).unwrap();
        drop(tx);

        assert_eq!(input.read_line("> ").await.unwrap().as_deref(), Some("one"));
        assert_eq!(input.read_line("> ").await.unwrap().as_deref(), Some("two"));
        assert_eq!(input.read_line("> ").await.unwrap(), None);
    }

    #[tokio::test]
    async fn line_for_an_interrupted_prompt_is_discarded() {
        let (tx, mut input) = feed();

        let interrupted =
            tokio::time::timeout(Duration::from_millis(50), input.read_line("a> ")).await;
        assert!(interrupted.is_err());

        // Typed while nobody was asking.
        tx.send(b"stale\n".to_vec()).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let late = tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            late.send(b"fresh\n".to_vec()).unwrap();
        });
        assert_eq!(
            input.read_line("b> ").await.unwrap().as_deref(),
            Some("fresh")
        );
    }

    #[tokio::test]
    async fn scripted_lines_replay_in_order() {
        let mut input = ScriptedLines::new(["hello", "exit"]);
        assert_eq!(input.read_line("a> ").await.unwrap().as_deref(), Some("hello"));
        assert_eq!(input.read_line("b> ").await.unwrap().as_deref(), Some("exit"));
        assert_eq!(input.read_line("a> ").await.unwrap(), None);
        assert_eq!(input.prompts(), ["a> ", "b> ", "a> "]);
        assert_eq!(input.remaining(), 0);
    }
}
