//! End-to-end tests: host page ⇄ editor frame

use anyhow::Result;
use quiz_common::{EditorConfig, SequentialIdGenerator};
use quiz_editor::{EditSession, ItemField, Mutation, UiCommand};
use quiz_protocol::{window_pair, EditorCommand, HostSync, MessagePort, ProtocolError};
use quiz_schema::ItemKind;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn session() -> EditSession {
    EditSession::with_id_generator(
        EditorConfig::default(),
        Box::new(SequentialIdGenerator::new("id")),
    )
}

/// Handshake, then start the sync loop on its own task
async fn start_editor() -> Result<(
    MessagePort,
    JoinHandle<EditSession>,
    mpsc::Sender<EditorCommand>,
)> {
    let (mut frame, mut host) = window_pair(8);

    let editor = tokio::spawn(async move {
        let sync = HostSync::connect(&mut frame, session()).await?;
        let (commands_tx, commands) = sync.command_channel();
        let driver = tokio::spawn(sync.run(commands));
        Ok::<_, ProtocolError>((driver, commands_tx))
    });

    let port = host.accept().await?;
    let (driver, commands) = editor.await??;
    Ok((port, driver, commands))
}

#[tokio::test]
async fn test_full_session_over_message_port() -> Result<()> {
    init_tracing();
    let (mut port, driver, commands) = start_editor().await?;

    port.post(&json!({
        "message": "set-state",
        "data": {
            "id": "quiz-1",
            "items": [{
                "id": "item-1",
                "quizId": "quiz-1",
                "type": "open",
                "order": 0
            }]
        },
        "valid": true
    }))?;
    port.post(&json!({ "message": "set-language", "data": "en-US" }))?;
    port.post(&json!({ "message": "no-such-message" }))?;

    commands
        .send(EditorCommand::Apply(Mutation::EditItem {
            item_id: "item-1".into(),
            field: ItemField::Title("How many?".into()),
        }))
        .await?;

    let message = port.recv().await.expect("current-state");
    assert_eq!(message["message"], "current-state");
    assert_eq!(message["data"]["private_spec"]["items"][0]["title"], "How many?");
    assert_eq!(message["valid"], true);

    commands
        .send(EditorCommand::Apply(Mutation::EditItem {
            item_id: "item-1".into(),
            field: ItemField::ValidityRegex("(".into()),
        }))
        .await?;
    let message = port.recv().await.expect("current-state");
    assert_eq!(message["valid"], false);

    commands
        .send(EditorCommand::Ui(UiCommand::SetAdvancedEditing {
            item_id: "item-1".into(),
            open: true,
        }))
        .await?;
    commands.send(EditorCommand::ReportHeight(300.0)).await?;
    commands.send(EditorCommand::ReportHeight(300.0)).await?;

    // The UI command posts nothing, and the repeated height is dropped
    let message = port.recv().await.expect("height-changed");
    assert_eq!(message, json!({ "message": "height-changed", "data": 300.0 }));

    drop(commands);
    drop(port);
    let session = driver.await?;

    assert_eq!(session.language(), Some("en-US"));
    assert!(session.state()?.variables().items["item-1"].advanced_editing);
    Ok(())
}

#[tokio::test]
async fn test_second_set_state_replaces_quiz() -> Result<()> {
    init_tracing();
    let (mut port, driver, commands) = start_editor().await?;

    port.post(&json!({ "message": "set-state", "data": null, "valid": true }))?;
    port.post(&json!({
        "message": "set-state",
        "data": {
            "id": "quiz-2",
            "items": [{
                "id": "item-1",
                "quizId": "quiz-2",
                "type": "multiple-choice",
                "order": 0,
                "options": [{ "id": "option-1", "order": 0, "title": "Yes" }]
            }]
        },
        "valid": true
    }))?;

    commands
        .send(EditorCommand::Apply(Mutation::CreateItem {
            quiz_id: "quiz-2".into(),
            item_id: "item-2".into(),
            kind: ItemKind::Essay,
        }))
        .await?;

    let message = port.recv().await.expect("current-state");
    let quiz = &message["data"]["private_spec"];
    assert_eq!(quiz["id"], "quiz-2");
    assert_eq!(quiz["items"][0]["options"][0]["quizItemId"], "item-1");

    drop(commands);
    drop(port);
    driver.await?;
    Ok(())
}

#[tokio::test]
async fn test_malformed_set_state_is_never_answered_with_old_quiz() -> Result<()> {
    init_tracing();
    let (mut port, driver, commands) = start_editor().await?;

    port.post(&json!({ "message": "set-state", "data": null, "valid": true }))?;
    port.post(&json!({
        "message": "set-state",
        "data": { "id": "quiz-2", "items": [{ "id": "item-1" }] },
        "valid": true
    }))?;

    commands
        .send(EditorCommand::Apply(Mutation::CreateItem {
            quiz_id: "id-1".into(),
            item_id: "item-9".into(),
            kind: ItemKind::Essay,
        }))
        .await?;
    commands.send(EditorCommand::ReportHeight(200.0)).await?;

    // The failed mutation posted nothing ahead of the height
    let message = port.recv().await.expect("height-changed");
    assert_eq!(message["message"], "height-changed");

    drop(commands);
    drop(port);
    let session = driver.await?;
    assert!(!session.is_initialized());
    Ok(())
}

#[tokio::test]
async fn test_sync_keeps_running_while_host_does_not_read() -> Result<()> {
    init_tracing();
    let (port, driver, commands) = start_editor().await?;

    port.post(&json!({ "message": "set-state", "data": { "id": "quiz-1" }, "valid": true }))?;
    for n in 0..200 {
        commands
            .send(EditorCommand::Apply(Mutation::CreateItem {
                quiz_id: "quiz-1".into(),
                item_id: format!("item-{}", n),
                kind: ItemKind::Open,
            }))
            .await?;
    }
    while commands.capacity() < commands.max_capacity() {
        tokio::task::yield_now().await;
    }
    port.post(&json!({ "message": "set-language", "data": "sv-SE" }))?;

    drop(commands);
    drop(port);
    let session = driver.await?;

    assert_eq!(session.state()?.tables().items.len(), 200);
    assert_eq!(session.language(), Some("sv-SE"));
    Ok(())
}

#[tokio::test]
async fn test_failed_mutation_posts_nothing() -> Result<()> {
    init_tracing();
    let (mut frame, mut host) = window_pair(8);

    let editor = tokio::spawn(async move { HostSync::connect(&mut frame, session()).await });
    let mut port = host.accept().await?;
    let mut sync = editor.await??;

    sync.handle(json!({ "message": "set-state", "data": null, "valid": true }))?;

    let result = sync.edit(|session| session.delete_option("missing"));
    assert!(result.is_err());

    sync.report_height(120.0);
    let message = port.recv().await.expect("height-changed");
    assert_eq!(message["message"], "height-changed");
    Ok(())
}
