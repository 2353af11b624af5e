//! Follow the forum live.

use anyhow::Result;
use chrono::Utc;
use std::future::Future;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use askhive_client::{ConnectionStatus, ForumService, Phase, Snapshot, Transport};

use super::render;

/// Run the watch command until `shutdown` resolves.
///
/// With a transport the persistent connection is used; without one the
/// question list is polled. The full list is reprinted on every change.
pub async fn run<T: Transport>(
    service: &ForumService<T>,
    transport: Option<T>,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    if let Some(user) = service.restore_session().await? {
        info!(user = %user.username, "watching as signed-in user");
    }

    let (tx, mut changes) = mpsc::unbounded_channel();
    let subscription = service.subscribe(move |snapshot: &Snapshot| {
        let _ = tx.send(snapshot.clone());
    });

    let mut status = match transport {
        Some(transport) => Some(service.start_live(transport).await?),
        None => {
            service.start_polling().await?;
            None
        }
    };
    println!("Watching for questions. Press Ctrl-C to stop.");

    tokio::pin!(shutdown);
    let outcome = loop {
        tokio::select! {
            _ = &mut shutdown => break Ok(()),
            Some(snapshot) = changes.recv() => {
                println!();
                print!("{}", render(&snapshot, Utc::now()));
            }
            next = next_status(&mut status) => match next {
                Some(current) if current.persistent_failure => {
                    break Err(anyhow::anyhow!(
                        "Connection lost; gave up after {} reconnect attempts",
                        current.attempt
                    ));
                }
                Some(current) => report(current),
                None => status = None,
            },
        }
    };

    service.unsubscribe(subscription);
    service.shutdown().await;
    println!("Stopped.");
    outcome
}

/// Next connection status change. Never resolves when there is no
/// connection to follow; `None` once the connection is gone.
async fn next_status(
    status: &mut Option<watch::Receiver<ConnectionStatus>>,
) -> Option<ConnectionStatus> {
    match status {
        Some(rx) => match rx.changed().await {
            Ok(()) => Some(*rx.borrow_and_update()),
            Err(_) => None,
        },
        None => std::future::pending().await,
    }
}

fn report(status: ConnectionStatus) {
    match status.phase {
        Phase::Open => info!("connected"),
        Phase::Connecting if status.attempt > 0 => {
            info!(attempt = status.attempt, "reconnecting")
        }
        Phase::Disconnected if !status.torn_down => warn!("connection lost"),
        _ => {}
    }
}
