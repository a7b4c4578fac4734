//! Interactive console driving the shell.
//!
//! One command per line. The console stands in for the embedded UI and,
//! through the host commands, for the game's lifecycle hooks, so the
//! whole connect flow can be exercised from a terminal.

use session_core::coordinator::CoordinatorHandle;

use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader, stdin};

/// Read commands until the input closes or an exit is requested.
pub async fn run(handle: CoordinatorHandle) {
    print_help();

    let mut lines = BufReader::new(stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if !dispatch(&handle, line.trim()).await {
                    break;
                }
            }
            Ok(None) => {
                info!("Console input closed, requesting exit");
                if let Err(error) = handle.exit().await {
                    warn!("Exit request failed: {error}");
                }
                break;
            }
            Err(error) => {
                warn!("Console read failed: {error}");
                break;
            }
        }
    }
}

/// Handle one line; returns false when the console should stop reading.
async fn dispatch(handle: &CoordinatorHandle, line: &str) -> bool {
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    let result = match command {
        "" => Ok(()),
        "help" => {
            print_help();
            Ok(())
        }
        "connect" if !rest.is_empty() => handle.connect_to(rest).await,
        "connect" => {
            println!("Usage: connect <address | -joincode>");
            Ok(())
        }
        "cancel" => handle.cancel_connect().await,
        "disconnect" => handle.disconnect().await,
        "auth" => handle.handle_auth_payload(rest).await,
        "card" if !rest.is_empty() => handle.submit_card_response(rest).await,
        "card" => {
            println!("Usage: card <response json>");
            Ok(())
        }
        "load" => handle.game_request_load().await,
        "world" => handle.session_finalized_load().await,
        "shutdown" => handle.shutdown_session().await,
        "kill" => {
            let reason = if rest.is_empty() {
                "Connection dropped."
            } else {
                rest
            };
            handle.network_killed(reason).await
        }
        "status" => match handle.is_connecting().await {
            Ok(connecting) => {
                println!("connecting: {connecting}");
                Ok(())
            }
            Err(error) => Err(error),
        },
        "exit" | "quit" => {
            if let Err(error) = handle.exit().await {
                warn!("Exit request failed: {error}");
            }
            return false;
        }
        _ => {
            println!("Unknown command: {line} (try 'help')");
            Ok(())
        }
    };

    match result {
        Ok(()) => true,
        Err(error) => {
            // The coordinator is gone; nothing left to drive.
            warn!("Command failed: {error}");
            false
        }
    }
}

fn print_help() {
    println!("Commands:");
    println!("  connect <address | -joincode>   start a connect attempt");
    println!("  cancel                          abort the current attempt");
    println!("  disconnect                      leave the current server");
    println!("  auth [payload]                  deliver an auth payload");
    println!("  card <response json>            answer a connection card");
    println!("  load | world | shutdown         simulate host lifecycle hooks");
    println!("  kill [reason]                   simulate a network kill");
    println!("  status                          show the in-flight flag");
    println!("  exit                            quit");
}
