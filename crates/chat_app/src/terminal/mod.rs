//! Line-oriented terminal front end.

mod input;
mod render;

use std::io::BufRead;
use std::thread;

use chat_core::{find_model, model_catalog};
use chat_logging::{chat_debug, chat_info};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::session::{CancelHandle, ChatSession, View};

use input::{parse_command, Command, HELP};
pub use render::TerminalView;

/// Reads commands until `/quit`, end of input, or Ctrl-C while idle.
pub async fn run<V: View>(session: &mut ChatSession<V>) {
    let shutdown = CancellationToken::new();
    spawn_interrupt_watcher(session.cancel_handle(), shutdown.clone());
    let mut lines = spawn_stdin_reader();

    println!("Type a message, or /help for commands.");
    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            line = lines.recv() => line,
        };
        let Some(line) = line else {
            break;
        };

        match parse_command(&line) {
            Command::Prompt(text) => {
                session.submit(&text).await;
                discard_typed_ahead(&mut lines);
            }
            Command::SelectModel(id) => match find_model(&id) {
                Some(model) => session.select_model(model),
                None => println!("unknown model {id:?}; /models lists the choices"),
            },
            Command::ListModels => print_models(&session.state().selected_model().id),
            Command::Clear => session.clear().await,
            Command::ToggleTheme => session.toggle_theme(),
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
            Command::Empty => {}
            Command::Unknown(raw) => println!("unknown command {raw:?}; try /help"),
        }
    }
    chat_info!("leaving chat loop");
}

/// Input is disabled while a reply streams: lines typed meanwhile are dropped.
fn discard_typed_ahead(lines: &mut mpsc::UnboundedReceiver<String>) {
    let mut dropped = 0;
    while lines.try_recv().is_ok() {
        dropped += 1;
    }
    if dropped > 0 {
        chat_debug!("dropped {} lines typed while streaming", dropped);
        println!("(ignored {dropped} line(s) typed while the reply was streaming)");
    }
}

fn print_models(selected_id: &str) {
    for model in model_catalog() {
        let marker = if model.id == selected_id { '*' } else { ' ' };
        println!(
            "{marker} {:<16} {} - {} (context: {} tokens)",
            model.id, model.name, model.description, model.context_length
        );
    }
}

/// Blocking stdin lives on its own thread so the runtime never waits on it.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Ctrl-C cancels the streaming reply; when nothing streams it ends the session.
fn spawn_interrupt_watcher(cancel: CancelHandle, shutdown: CancellationToken) {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if !cancel.request_cancel() {
                shutdown.cancel();
                break;
            }
        }
    });
}
