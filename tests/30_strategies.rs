mod common;

use anyhow::Result;
use reqwest::StatusCode;

use common::{card, strategy, thread, token_for, TestServer};

async fn seeded() -> Result<TestServer> {
    let server = TestServer::spawn().await?;
    let store = &server.store;

    store.insert_card(card("c1")).await;
    store.insert_card(card("c2")).await;

    store.insert_thread(thread("t-alice", "alice", None, 0)).await;
    store.insert_thread(thread("t-bob", "bob", Some("s-bob"), 0)).await;

    store.insert_strategy(strategy("s-alice", Some("alice"), Some("t-alice"), &["c1", "c2", "c-gone"], 20)).await;
    store.insert_strategy(strategy("s-alice-2", Some("alice"), None, &[], 10)).await;
    store.insert_strategy(strategy("s-bob", Some("bob"), Some("t-bob"), &["c1"], 30)).await;
    store.insert_strategy(strategy("s-orphan", None, None, &[], 40)).await;

    Ok(server)
}

#[tokio::test]
async fn list_strategies_is_scoped_to_caller() -> Result<()> {
    let server = seeded().await?;

    let (status, body) = server.get("/api/strategies", Some(&token_for("alice"))).await?;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["s-alice", "s-alice-2"]);
    Ok(())
}

#[tokio::test]
async fn get_strategy_merges_cards() -> Result<()> {
    let server = seeded().await?;

    let (status, body) = server.get("/api/strategies/s-alice", Some(&token_for("alice"))).await?;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    assert_eq!(data["strategy"]["id"], "s-alice");
    // The dangling attachment is dropped
    assert_eq!(data["card_count"], 2);
    assert_eq!(data["cards"][0]["id"], "c1");
    assert_eq!(data["cards"][0]["type"], "entry.rule_trigger");
    assert_eq!(data["cards"][0]["role"], "entry");
    assert_eq!(data["cards"][1]["id"], "c2");
    Ok(())
}

#[tokio::test]
async fn foreign_and_ownerless_strategies_are_not_found() -> Result<()> {
    let server = seeded().await?;
    let alice = token_for("alice");

    for id in ["s-bob", "s-orphan", "s-none"] {
        let (status, body) = server.get(&format!("/api/strategies/{}", id), Some(&alice)).await?;
        assert_eq!(status, StatusCode::NOT_FOUND, "strategy {}", id);
        assert_eq!(body["message"], format!("Strategy not found: {}", id));
    }
    Ok(())
}

#[tokio::test]
async fn strategy_by_thread() -> Result<()> {
    let server = seeded().await?;

    let (status, body) = server
        .get("/api/strategies/threads/t-alice/strategy", Some(&token_for("alice")))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["strategy"]["id"], "s-alice");
    assert_eq!(body["data"]["card_count"], 2);
    Ok(())
}

#[tokio::test]
async fn strategy_by_foreign_thread_is_not_found() -> Result<()> {
    let server = seeded().await?;

    // Bob's thread has a strategy, but Alice must not learn that
    let (status, body) = server
        .get("/api/strategies/threads/t-bob/strategy", Some(&token_for("alice")))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Thread not found: t-bob");
    Ok(())
}

#[tokio::test]
async fn strategy_by_thread_without_strategy() -> Result<()> {
    let server = seeded().await?;
    server.store.insert_thread(common::thread("t-empty", "alice", None, 0)).await;

    let (status, body) = server
        .get("/api/strategies/threads/t-empty/strategy", Some(&token_for("alice")))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No strategy found for thread: t-empty");
    Ok(())
}

#[tokio::test]
async fn list_with_thread_filter() -> Result<()> {
    let server = seeded().await?;
    let alice = token_for("alice");

    let (status, body) = server.get("/api/strategies?thread_id=t-alice", Some(&alice)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["strategy"]["id"], "s-alice");

    let (status, _) = server.get("/api/strategies?thread_id=t-bob", Some(&alice)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn malformed_query_uses_error_envelope() -> Result<()> {
    let server = seeded().await?;

    let (status, body) = server
        .get(
            "/api/strategies?thread_id=t-alice&thread_id=t-bob",
            Some(&token_for("alice")),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    Ok(())
}
