use std::{fmt::Write, io::BufRead, thread};

use tokio::sync::mpsc::Sender;
use trip_broadcaster_lib::view::{PanelAction, PanelView, FOOTER, SUBTITLE, TITLE};

use crate::broadcaster::Command;

const WIDTH: usize = 44;

pub fn parse_command(line: &str) -> Option<Command> {
    match line.trim().to_ascii_lowercase().as_str() {
        "start" | "s" => Some(Command::Start),
        "stop" | "end" | "e" => Some(Command::Stop),
        "quit" | "exit" | "q" => Some(Command::Quit),
        _ => None,
    }
}

pub fn render_panel(view: &PanelView) -> String {
    let mut out = String::new();
    let rule = "=".repeat(WIDTH);
    let indicator = if view.live { "(*) LIVE" } else { "( ) idle" };

    // Writing to a String cannot fail.
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "{:<w$}{indicator}", TITLE, w = WIDTH - indicator.len());
    let _ = writeln!(out, "{}", SUBTITLE.to_uppercase());
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "OPERATION STATUS");
    let _ = writeln!(out, "  {}", view.status);

    if let Some((lat, lng)) = &view.coordinates {
        let _ = writeln!(out, "{}", "-".repeat(WIDTH));
        let _ = writeln!(out, "{:<22}{}", "LATITUDE", "LONGITUDE");
        let _ = writeln!(out, "{:<22}{}", lat, lng);
    }

    let hint = match view.action {
        PanelAction::StartSession => "start",
        PanelAction::EndSession => "stop",
    };
    let _ = writeln!(out, "{}", "-".repeat(WIDTH));
    let _ = writeln!(out, "[ {} ]  type `{hint}`, or `quit`", view.action.label());
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "{FOOTER}");

    out
}

/// Reads commands on a plain thread. A read blocked on the terminal must not
/// hold up runtime shutdown once the console quits.
pub fn spawn_command_reader<R>(input: R, commands: Sender<Command>) -> thread::JoinHandle<()>
where
    R: BufRead + Send + 'static,
{
    thread::spawn(move || {
        if let Err(err) = read_commands(input, commands) {
            tracing::error!("Failed to read commands: {}", err);
        }
    })
}

/// Forwards operator commands until input ends or `quit` is read. Blocks, so
/// must not run on a runtime worker.
pub fn read_commands<R>(input: R, commands: Sender<Command>) -> std::io::Result<()>
where
    R: BufRead,
{
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let Some(command) = parse_command(&line) else {
            println!("Unknown command {:?}. Use start, stop or quit.", line.trim());
            continue;
        };

        if commands.blocking_send(command).is_err() || command == Command::Quit {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{
        io::{self, BufReader, Read},
        sync::mpsc as std_mpsc,
        time::{Duration, Instant},
    };

    use tokio::sync::mpsc;
    use trip_broadcaster_lib::{coordinate::Coordinate, status::TripStatus};

    use super::*;

    #[test]
    fn commands() {
        assert_eq!(parse_command("start"), Some(Command::Start));
        assert_eq!(parse_command("  STOP \n"), Some(Command::Stop));
        assert_eq!(parse_command("q"), Some(Command::Quit));
        assert_eq!(parse_command("go"), None);
    }

    #[test]
    fn idle_panel() {
        let panel = render_panel(&PanelView::new(false, TripStatus::Ready, None));

        assert!(panel.contains("Bus Console"));
        assert!(panel.contains("( ) idle"));
        assert!(panel.contains("Ready to start trip"));
        assert!(panel.contains("[ START SESSION ]"));
        assert!(!panel.contains("LATITUDE"));
        assert!(panel.ends_with("Keep this active so your friends can see where you are on the map.\n"));
    }

    #[test]
    fn live_panel_with_fix() {
        let view = PanelView::new(true, TripStatus::Sending, Some(Coordinate::new(40.0, -74.0)));
        let panel = render_panel(&view);

        assert!(panel.contains("(*) LIVE"));
        assert!(panel.contains("LATITUDE"));
        assert!(panel.contains("40.000000"));
        assert!(panel.contains("-74.000000"));
        assert!(panel.contains("[ END SESSION ]"));
    }

    #[test]
    fn reads_until_quit() {
        let input = BufReader::new("start\n\nbogus\nstop\nquit\nstart\n".as_bytes());
        let (tx, mut rx) = mpsc::channel(8);

        read_commands(input, tx).unwrap();

        assert_eq!(rx.blocking_recv(), Some(Command::Start));
        assert_eq!(rx.blocking_recv(), Some(Command::Stop));
        assert_eq!(rx.blocking_recv(), Some(Command::Quit));
        assert_eq!(rx.blocking_recv(), None);
    }

    /// A terminal nobody types into. Reads block until the sender is dropped.
    struct IdleTerminal(std_mpsc::Receiver<()>);

    impl Read for IdleTerminal {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            let _ = self.0.recv();
            Ok(0)
        }
    }

    #[test]
    fn quit_does_not_wait_for_pending_input() {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let (typing, idle) = std_mpsc::channel::<()>();
        let (commands, mut commands_rx) = mpsc::channel(8);

        let _reader = spawn_command_reader(BufReader::new(IdleTerminal(idle)), commands.clone());

        // Same path as ctrl-c in main: another sender asks to quit.
        let received = runtime.block_on(async move {
            commands.send(Command::Quit).await.unwrap();
            commands_rx.recv().await
        });
        assert_eq!(received, Some(Command::Quit));

        let closing = Instant::now();
        drop(runtime);
        assert!(closing.elapsed() < Duration::from_secs(1));

        drop(typing);
    }
}
