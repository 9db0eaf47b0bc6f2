//! Terminal Connect Four against whoever else is connected to the relay.
//!
//! Usage: `dropfour-console [RELAY_ADDR]`, then type a column (`0`-`6`),
//! `s` to surrender, `r` to vote for a rematch, `q` to quit the session.

use dropfour::prelude::*;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play(usize),
    Surrender,
    Rematch,
    Quit,
    Help,
}

fn parse_command(line: &str) -> Result<Command, String> {
    match line.trim() {
        "s" => Ok(Command::Surrender),
        "r" => Ok(Command::Rematch),
        "q" => Ok(Command::Quit),
        "h" | "?" | "" => Ok(Command::Help),
        other => match other.parse::<usize>() {
            Ok(column) if column < COLS => Ok(Command::Play(column)),
            _ => Err(format!("unknown command {other:?}, columns are 0-{}", COLS - 1)),
        },
    }
}

const HELP: &str = "0-6 drop a marker, s surrender, r rematch, q quit";

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn status<S: Substrate>(game: &Orchestrator<S>) -> String {
    let you = game
        .state()
        .local_player()
        .map_or_else(String::new, |player| format!(" (you are {player})"));
    match game.phase() {
        Phase::Lobby => "in the lobby".to_string(),
        Phase::Playing if game.is_my_turn() => format!("your move{you}"),
        Phase::Playing => format!("waiting for the opponent{you}"),
        Phase::Ended(outcome) => format!("{outcome}. r for a rematch, q to leave"),
        Phase::NegotiatingRematch(_) if game.state().votes().local => {
            "waiting for the opponent to accept the rematch".to_string()
        }
        Phase::NegotiatingRematch(_) => "the opponent wants a rematch. r to accept".to_string(),
    }
}

fn render<S: Substrate>(game: &Orchestrator<S>) {
    println!("\n{}\n{}", game.board(), status(game));
}

fn describe(event: GameEvent) -> String {
    match event {
        GameEvent::OpponentMoved(placement) => {
            format!("{} dropped into column {}", placement.player, placement.column)
        }
        GameEvent::GameOver(outcome) => format!("game over: {outcome}"),
        GameEvent::OpponentVotedRematch => "the opponent voted for a rematch".to_string(),
        GameEvent::RematchStarted { local_player } => {
            format!("rematch started, you are {local_player}")
        }
        GameEvent::OpponentLeft(departure) => format!("the opponent {departure}"),
    }
}

// ---------------------------------------------------------------------------
// Session loop
// ---------------------------------------------------------------------------

/// What the console does after a failed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recovery {
    /// A rejected action: tell the user and keep playing.
    Report,
    /// The channel is unusable: drop the session and go back to the lobby.
    BackToLobby,
}

fn recovery(err: &DropfourError) -> Recovery {
    match err {
        DropfourError::Session(SessionError::Transport(_) | SessionError::Protocol(_)) => {
            Recovery::BackToLobby
        }
        DropfourError::Session(_) => Recovery::Report,
        _ => Recovery::BackToLobby,
    }
}

/// Pause before looking for an opponent again after a failed attempt.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Applies one command. Rejected actions are printed; anything else is
/// handed back so the caller can drop the session.
async fn run_command<S: Substrate>(
    game: &mut Orchestrator<S>,
    command: Command,
) -> Result<(), DropfourError> {
    let result = match command {
        Command::Play(column) => game.play(column).await.map(drop),
        Command::Surrender => game.surrender().await.map(drop),
        Command::Rematch => game.vote_rematch().await.map(drop),
        Command::Quit => game.quit().await,
        Command::Help => {
            println!("{HELP}");
            return Ok(());
        }
    };
    if let Err(e) = result {
        match recovery(&e) {
            Recovery::Report => println!("{e}"),
            Recovery::BackToLobby => return Err(e),
        }
    }
    if game.phase().in_session() {
        render(game);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
    let relay = RelaySubstrate::connect(&addr).await?;
    let mut game = Orchestrator::new(relay, DropfourConfig::default());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        println!("looking for an opponent on {addr}...");
        let found = tokio::select! {
            found = game.find_match() => found,
            _ = tokio::signal::ctrl_c() => return Ok(()),
        };
        let role = match found {
            Ok(role) => role,
            Err(e) => {
                println!("no match: {e}");
                tokio::time::sleep(RETRY_DELAY).await;
                continue;
            }
        };
        println!("paired as {role}. {HELP}");
        render(&game);

        while game.phase().in_session() {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        // stdin closed
                        if let Err(e) = game.quit().await {
                            tracing::warn!(error = %e, "quit on exit failed");
                        }
                        return Ok(());
                    };
                    let command = match parse_command(&line) {
                        Ok(command) => command,
                        Err(message) => {
                            println!("{message}");
                            continue;
                        }
                    };
                    if let Err(e) = run_command(&mut game, command).await {
                        tracing::warn!(error = %e, "dropping session");
                        // Already in the lobby if the failure ended the session.
                        let _ = game.leave_session().await;
                        println!("connection lost: {e}");
                    }
                }
                event = game.next_event() => {
                    let Some(event) = event else { break };
                    println!("{}", describe(event));
                    if game.phase().in_session() {
                        render(&game);
                    }
                }
            }
        }
        println!("back in the lobby");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dropfour_transport::TransportError;

    #[test]
    fn test_parse_command_columns() {
        assert_eq!(parse_command("0"), Ok(Command::Play(0)));
        assert_eq!(parse_command(" 6\n"), Ok(Command::Play(6)));
    }

    #[test]
    fn test_parse_command_rejects_out_of_range() {
        let err = parse_command("7").unwrap_err();
        assert!(err.contains("0-6"));
        assert!(parse_command("-1").is_err());
        assert!(parse_command("x").is_err());
    }

    #[test]
    fn test_parse_command_letters() {
        assert_eq!(parse_command("s"), Ok(Command::Surrender));
        assert_eq!(parse_command("r"), Ok(Command::Rematch));
        assert_eq!(parse_command("q"), Ok(Command::Quit));
        assert_eq!(parse_command(""), Ok(Command::Help));
    }

    #[test]
    fn test_recovery_rejected_action_is_reported() {
        let not_your_turn: DropfourError = SessionError::NotYourTurn.into();
        let full: DropfourError = SessionError::Rejected(PlaceError::ColumnFull(3)).into();

        assert_eq!(recovery(&not_your_turn), Recovery::Report);
        assert_eq!(recovery(&full), Recovery::Report);
    }

    #[test]
    fn test_recovery_failed_matchmaking_returns_to_lobby() {
        let closed: DropfourError = MatchmakingError::LobbyClosed.into();

        assert_eq!(recovery(&closed), Recovery::BackToLobby);
    }

    #[test]
    fn test_recovery_lost_channel_returns_to_lobby() {
        let gone = TransportError::ConnectionClosed("relay went away".into());
        let on_send: DropfourError = SessionError::Transport(gone).into();
        let direct: DropfourError =
            TransportError::ConnectionClosed("relay went away".into()).into();

        assert_eq!(recovery(&on_send), Recovery::BackToLobby);
        assert_eq!(recovery(&direct), Recovery::BackToLobby);
    }

    #[test]
    fn test_describe_departure() {
        assert_eq!(
            describe(GameEvent::OpponentLeft(Departure::Involuntary)),
            "the opponent disconnected"
        );
        assert_eq!(
            describe(GameEvent::OpponentLeft(Departure::Voluntary)),
            "the opponent left the game"
        );
    }

    #[test]
    fn test_describe_game_over() {
        let text = describe(GameEvent::GameOver(Outcome::Resigned { by: Player::Two }));
        assert_eq!(text, "game over: player 2 resigned, player 1 wins");
    }
}
