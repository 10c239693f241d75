// handlers/protected/mod.rs - Identity-scoped handlers (bearer token required)
//
// Every route here sits behind `require_auth`. Handlers receive the caller as
// `Extension<AuthUser>` and pass `user.subject` into every store call; a
// document owned by someone else is answered exactly like a missing one.

pub mod strategies;
pub mod threads;

use futures::future::try_join_all;

use crate::api::StrategyWithCards;
use crate::database::DocumentStore;
use crate::error::ApiError;
use crate::models::{AttachedCard, Strategy, Thread};
use crate::types::SubjectId;

/// The strategy linked to an owned thread: its explicit `strategy_id`, else the
/// caller's most recent strategy pointing back at the thread.
pub(crate) async fn linked_strategy(
    store: &dyn DocumentStore,
    subject: &SubjectId,
    thread: &Thread,
) -> Result<Option<Strategy>, ApiError> {
    if let Some(strategy_id) = thread.strategy_id.as_deref() {
        if let Some(strategy) = store.get_strategy(subject, strategy_id).await? {
            return Ok(Some(strategy));
        }
    }
    Ok(store.get_strategy_by_thread(subject, &thread.id).await?)
}

/// Resolve a strategy's attachments to cards. Attachments whose card no
/// longer exists are skipped.
pub(crate) async fn with_cards(
    store: &dyn DocumentStore,
    strategy: Strategy,
) -> Result<StrategyWithCards, ApiError> {
    let lookups = strategy.attachments.iter().map(|a| store.get_card(&a.card_id));
    let found = try_join_all(lookups).await?;

    let cards = strategy
        .attachments
        .iter()
        .zip(found)
        .filter_map(|(attachment, card)| {
            if card.is_none() {
                tracing::warn!(
                    "Strategy {} references missing card {}",
                    strategy.id,
                    attachment.card_id
                );
            }
            card.map(|c| AttachedCard::new(c, attachment))
        })
        .collect();

    Ok(StrategyWithCards::new(strategy, cards))
}

pub(crate) fn thread_not_found(thread_id: &str) -> ApiError {
    ApiError::not_found(format!("Thread not found: {}", thread_id))
}

pub(crate) fn strategy_not_found(strategy_id: &str) -> ApiError {
    ApiError::not_found(format!("Strategy not found: {}", strategy_id))
}
