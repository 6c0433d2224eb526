use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// External control signals consumed by the capture loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    CaptureNow,
    Quit,
}

/// Trigger events collected during one tick, coalesced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub capture_requested: bool,
    pub quit_requested: bool,
}

impl TickInput {
    pub fn record(&mut self, trigger: Trigger) {
        match trigger {
            Trigger::CaptureNow => self.capture_requested = true,
            Trigger::Quit => self.quit_requested = true,
        }
    }
}

/// Map an input line to a trigger (`s` = capture now, `q` = quit)
pub fn parse_command(line: &str) -> Option<Trigger> {
    match line.trim().to_ascii_lowercase().as_str() {
        "s" | "save" | "capture" => Some(Trigger::CaptureNow),
        "q" | "quit" | "exit" => Some(Trigger::Quit),
        _ => None,
    }
}

/// Take every pending event without waiting.
///
/// A closed channel is not a quit signal; the loop keeps running on its timer.
pub fn drain(rx: &mut UnboundedReceiver<Trigger>) -> TickInput {
    let mut input = TickInput::default();
    loop {
        match rx.try_recv() {
            Ok(trigger) => input.record(trigger),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
        }
    }
    input
}

/// Read commands from stdin until it closes
pub fn spawn_stdin_listener(tx: UnboundedSender<Trigger>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match parse_command(&line) {
                    Some(trigger) => {
                        if tx.send(trigger).is_err() {
                            break;
                        }
                    }
                    None if line.trim().is_empty() => {}
                    None => warn!(input = line.trim(), "unknown command, use 's' or 'q'"),
                },
                Ok(None) => {
                    debug!("stdin closed, manual triggers disabled");
                    break;
                }
                Err(e) => {
                    warn!("failed to read stdin: {}", e);
                    break;
                }
            }
        }
    })
}

/// Turn Ctrl-C into a quit trigger
pub fn spawn_ctrl_c_listener(tx: UnboundedSender<Trigger>) -> JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received");
            let _ = tx.send(Trigger::Quit);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("s"), Some(Trigger::CaptureNow));
        assert_eq!(parse_command(" S \n"), Some(Trigger::CaptureNow));
        assert_eq!(parse_command("q"), Some(Trigger::Quit));
        assert_eq!(parse_command("quit"), Some(Trigger::Quit));
        assert_eq!(parse_command("x"), None);
        assert_eq!(parse_command(""), None);
    }

    #[test]
    fn test_drain_coalesces_events() {
        let (tx, mut rx) = unbounded_channel();
        tx.send(Trigger::CaptureNow).unwrap();
        tx.send(Trigger::CaptureNow).unwrap();

        let input = drain(&mut rx);
        assert!(input.capture_requested);
        assert!(!input.quit_requested);

        assert_eq!(drain(&mut rx), TickInput::default());
    }

    #[test]
    fn test_drain_sees_quit_alongside_capture() {
        let (tx, mut rx) = unbounded_channel();
        tx.send(Trigger::CaptureNow).unwrap();
        tx.send(Trigger::Quit).unwrap();

        let input = drain(&mut rx);
        assert!(input.capture_requested && input.quit_requested);
    }

    #[test]
    fn test_drain_on_closed_channel() {
        let (tx, mut rx) = unbounded_channel::<Trigger>();
        drop(tx);
        assert_eq!(drain(&mut rx), TickInput::default());
    }

    #[test]
    fn test_drain_sees_sends_from_spawned_task() {
        tokio_test::block_on(async {
            let (tx, mut rx) = unbounded_channel();
            tokio::spawn(async move {
                tx.send(Trigger::Quit).unwrap();
            })
            .await
            .unwrap();

            assert!(drain(&mut rx).quit_requested);
        });
    }
}
