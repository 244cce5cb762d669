//! A line-based chess duel in the terminal.
//!
//! ```text
//! console-duel solo
//! console-duel host [port]
//! console-duel join <host> [port]
//! ```
//!
//! Type moves as `e2e4` (or `e7e8q`), a lone square to select a piece,
//! `a`/`b` to pick a side, `=q` to answer a promotion prompt, and
//! `cancel`, `new` or `exit`.

use duelnet::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

fn parse_args(args: &[String]) -> Result<SessionConfig, String> {
    let port = |s: Option<&String>| -> Result<u16, String> {
        match s {
            None => Ok(DEFAULT_PORT),
            Some(p) => p.parse().map_err(|_| format!("bad port: {p}")),
        }
    };
    match args.first().map(String::as_str) {
        None | Some("solo") => Ok(SessionConfig::solo()),
        Some("host") => Ok(SessionConfig::host(port(args.get(1))?)),
        Some("join") => {
            let host = args.get(1).ok_or("join needs a host")?;
            Ok(SessionConfig::join(host.clone(), port(args.get(2))?))
        }
        Some(other) => Err(format!("unknown mode: {other}")),
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

fn parse_command(line: &str) -> Option<Intent> {
    let line = line.trim().to_ascii_lowercase();
    match line.as_str() {
        "" => None,
        "a" => Some(Intent::ChooseColor(Side::A)),
        "b" => Some(Intent::ChooseColor(Side::B)),
        "cancel" => Some(Intent::Cancel),
        "new" => Some(Intent::NewGame),
        "exit" | "quit" => Some(Intent::Exit),
        s if s.starts_with('=') => s[1..]
            .chars()
            .next()
            .and_then(PromotionPiece::from_letter)
            .map(Intent::Promote),
        s if s.len() == 2 => s.parse::<Square>().ok().map(Intent::SelectSquare),
        s => s.parse::<Move>().ok().map(Intent::SubmitMove),
    }
}

/// Reads stdin lines on a task of their own so the frame loop never waits.
fn spawn_stdin() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

// ---------------------------------------------------------------------------
// Frontend
// ---------------------------------------------------------------------------

struct Console {
    input: mpsc::UnboundedReceiver<String>,
    shown: Option<SessionState>,
    selected: Option<Square>,
    prompting: bool,
    redraw: bool,
}

impl Console {
    fn draw_board<R: RulesEngine>(&self, session: &Session<R>) {
        let rules = session.game().rules();
        let bottom = session.side_at_bottom();
        let ranks: Vec<u8> = match bottom {
            Side::A => (0..8).rev().collect(),
            Side::B => (0..8).collect(),
        };
        let files: Vec<u8> = match bottom {
            Side::A => (0..8).collect(),
            Side::B => (0..8).rev().collect(),
        };

        let (a, b) = session.clocks().snapshot();
        println!();
        println!("  B {}", format_clock(b));
        for &rank in &ranks {
            let row: String = files
                .iter()
                .map(|&file| {
                    match Square::new(file, rank).and_then(|sq| rules.piece_at(sq)) {
                        Some(piece) => piece.symbol(),
                        None => '.',
                    }
                })
                .flat_map(|c| [' ', c])
                .collect();
            println!("{}{row}", rank + 1);
        }
        let legend: String = files
            .iter()
            .flat_map(|&f| [' ', char::from(b'a' + f)])
            .collect();
        println!(" {legend}");
        println!("  A {}", format_clock(a));
        println!("  {:?} to move", rules.side_to_move());
    }
}

fn format_clock(secs: f64) -> String {
    let secs = secs.max(0.0);
    let whole = secs.floor() as u64;
    format!("{:02}:{:02}.{}", whole / 60, whole % 60, ((secs - secs.floor()) * 10.0) as u64)
}

impl<R: RulesEngine> Frontend<R> for Console {
    fn intents(&mut self) -> Vec<Intent> {
        let mut out = Vec::new();
        while let Ok(line) = self.input.try_recv() {
            if line.trim() == "board" {
                self.redraw = true;
                continue;
            }
            match parse_command(&line) {
                Some(intent) => out.push(intent),
                None if !line.trim().is_empty() => println!("?? {}", line.trim()),
                None => {}
            }
        }
        out
    }

    fn render(&mut self, session: &Session<R>, events: &[SessionEvent]) {
        if self.shown != Some(session.state()) {
            self.shown = Some(session.state());
            match session.state() {
                SessionState::Connecting => {
                    if let Some(addr) = session.listen_addr() {
                        println!("waiting on {}:{} ...", local_ip(), addr.port());
                    }
                }
                SessionState::ColorSelect => println!("pick a side: a or b"),
                SessionState::Playing => self.redraw = true,
                other => println!("[{other}]"),
            }
        }

        for event in events {
            match event {
                SessionEvent::PeerConnected { peer } => println!("peer connected from {peer}"),
                SessionEvent::PeerChoseColor(side) => println!("peer chose {side:?}"),
                SessionEvent::ColorsResolved { local } => println!("you play {local:?}"),
                SessionEvent::MovePlayed { mv, check, .. } => {
                    println!("{}{}", mv.to_notation(), if *check { "+" } else { "" });
                    self.redraw = true;
                }
                SessionEvent::MoveRejected { notation, reason, .. } => {
                    println!("rejected {notation}: {reason}");
                }
                SessionEvent::PeerLeft => println!("your opponent left"),
                SessionEvent::GameOver(terminal) => println!("{terminal}. new or exit?"),
            }
        }

        let selected = session.selection().map(|sel| sel.from);
        if selected != self.selected {
            self.selected = selected;
            if let Some(sel) = session.selection() {
                let targets: Vec<String> = sel.targets.iter().map(Square::to_string).collect();
                println!("{} -> {}", sel.from, targets.join(" "));
            }
        }
        let prompting = session.pending_promotion().is_some();
        if prompting && !self.prompting {
            println!("promote to? =q =r =b =n");
        }
        self.prompting = prompting;

        if self.redraw {
            self.redraw = false;
            self.draw_board(session);
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() {
    duelnet::init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match parse_args(&args) {
        Ok(config) => config,
        Err(msg) => {
            eprintln!("{msg}\nusage: console-duel [solo | host [port] | join <host> [port]]");
            std::process::exit(2);
        }
    };
    info!(role = %config.role(), "starting");

    let mut console = Console {
        input: spawn_stdin(),
        shown: None,
        selected: None,
        prompting: false,
        redraw: false,
    };
    let frames = FrameConfig {
        rate_hz: 30,
        ..Default::default()
    };

    match run_match(config, ChessRules::new, &mut console, frames).await {
        Ok(exit) => info!(?exit, "bye"),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
    // The stdin reader is parked in a blocking read; don't wait for it.
    std::process::exit(0);
}
