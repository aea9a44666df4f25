//! Math Duel Demo
//!
//! Runs both variants against the in-process store: a scripted local
//! split-screen duel, then a matchmade duel where two clients race
//! every question.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use math_duel::{
    GameProfile, MemoryStore, PlayerRef, RoomStore, SessionController, VERSION,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    info!("Math Duel v{}", VERSION);

    demo_local_duel().await?;
    demo_matchmade_duel().await?;

    Ok(())
}

/// Split-screen duel: both seats on one controller, Alice sweeps.
async fn demo_local_duel() -> Result<()> {
    info!("=== Local Split-Screen Duel ===");

    let store = Arc::new(MemoryStore::new());
    let mut controller = SessionController::new(store, GameProfile::local());

    controller.new_local_match().await?;
    controller.set_player_name(0, "Alice").await?;
    controller.set_player_name(1, "Bob").await?;
    controller.start_game().await?;

    let mut snapshots = controller.subscribe();
    let _ = snapshots.wait_for(|s| s.started).await;

    loop {
        let state = controller.state();
        if state.ended {
            break;
        }
        let question = match state.current_question() {
            Some(q) => q.clone(),
            None => {
                let _ = snapshots.changed().await;
                continue;
            }
        };
        info!(
            "Q{}: {} + {} = ?  options {:?}",
            state.current_question_index + 1,
            question.a,
            question.b,
            question.options
        );

        // Bob guesses wrong first; nothing happens. Alice answers.
        let miss = question.options.iter().find(|o| **o != question.answer());
        if let Some(miss) = miss {
            controller.submit_answer(PlayerRef::Seat(1), *miss).await?;
        }
        let target = state.current_question_index + 1;
        controller
            .submit_answer(PlayerRef::Seat(0), question.answer())
            .await?;
        let _ = snapshots
            .wait_for(|s| s.current_question_index >= target || s.ended)
            .await;
    }

    let state = controller.state();
    info!(
        "Final: {} {} - {} {}",
        state.players[0].name, state.players[0].score, state.players[1].score, state.players[1].name
    );
    match state.winner() {
        Some(winner) => info!("Winner: {}", winner.name),
        None if state.is_tie() => info!("It's a tie"),
        None => info!("No winner"),
    }

    controller.reset_session().await?;
    Ok(())
}

/// Matchmade duel: two clients on one store, racing every question.
async fn demo_matchmade_duel() -> Result<()> {
    info!("=== Matchmade Duel ===");

    let store: Arc<dyn RoomStore> = Arc::new(MemoryStore::new());
    let mut alice = SessionController::new(Arc::clone(&store), GameProfile::networked());
    let mut bob = SessionController::new(Arc::clone(&store), GameProfile::networked());

    alice.join_or_create_room("Alice").await?;
    info!("Alice waiting: {}", alice.state().waiting_for_opponent);

    bob.join_or_create_room("Bob").await?;

    // Wait until both clients see the started match with its questions
    let mut alice_rx = alice.subscribe();
    let mut bob_rx = bob.subscribe();
    let _ = alice_rx.wait_for(|s| s.started && !s.questions.is_empty()).await;
    let _ = bob_rx.wait_for(|s| s.started && !s.questions.is_empty()).await;

    let room_id = alice
        .context()
        .map(|ctx| ctx.room_id.clone())
        .unwrap_or_default();

    loop {
        let state = alice.state();
        if state.ended {
            break;
        }
        let index = state.current_question_index;
        let answer = match state.current_question() {
            Some(q) => q.answer(),
            None => {
                let _ = alice_rx.changed().await;
                continue;
            }
        };

        // Both clients submit the correct answer concurrently; the
        // store commits exactly one credit for the index.
        let alice_id = PlayerRef::Id(alice.context().unwrap().local_player.clone().unwrap());
        let bob_id = PlayerRef::Id(bob.context().unwrap().local_player.clone().unwrap());
        let (a, b) = tokio::join!(
            alice.submit_answer(alice_id, answer),
            bob.submit_answer(bob_id, answer),
        );
        a?;
        b?;

        let _ = alice_rx
            .wait_for(|s| s.current_question_index > index || s.ended)
            .await;
    }

    let _ = bob_rx.wait_for(|s| s.ended).await;
    let state = alice.state();
    let total: u32 = state.players.iter().map(|p| p.score).sum();
    info!(
        "Final: {} {} - {} {} (total credits: {})",
        state.players[0].name, state.players[0].score, state.players[1].score, state.players[1].name, total
    );
    match state.winner() {
        Some(winner) => info!("Winner: {}", winner.name),
        None if state.is_tie() => info!("It's a tie"),
        None => info!("No winner"),
    }

    if let Some(room) = store.get(&room_id).await? {
        info!("Final room record:\n{}", serde_json::to_string_pretty(&room)?);
    }

    Ok(())
}
