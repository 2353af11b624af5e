//! One-shot question commands.

use anyhow::{Context, Result};
use chrono::Utc;

use askhive_client::{ForumService, Transport};
use askhive_types::QuestionId;

use super::render;

/// Pick up the stored session, if any. Questions can be read without one.
async fn resume<T: Transport>(service: &ForumService<T>) -> Result<()> {
    service
        .restore_session()
        .await
        .context("Failed to restore session")?;
    Ok(())
}

/// Run the list command.
pub async fn list<T: Transport>(service: &ForumService<T>) -> Result<()> {
    resume(service).await?;
    service.refresh().await.context("Failed to fetch questions")?;
    print!("{}", render(&service.snapshot(), Utc::now()));
    Ok(())
}

/// Run the ask command.
pub async fn ask<T: Transport>(service: &ForumService<T>, message: &str) -> Result<()> {
    if message.trim().is_empty() {
        anyhow::bail!("Question text must not be empty");
    }
    resume(service).await?;
    let question = service.submit_question(message).await?;
    println!("Posted question #{}.", question.id);
    Ok(())
}

/// Run the answer command.
pub async fn answer<T: Transport>(
    service: &ForumService<T>,
    id: QuestionId,
    message: &str,
) -> Result<()> {
    if message.trim().is_empty() {
        anyhow::bail!("Answer text must not be empty");
    }
    resume(service).await?;
    let answer = service.answer(id, message).await?;
    println!("Posted answer #{} to question #{id}.", answer.id);
    Ok(())
}

/// Run the mark-answered command.
pub async fn mark_answered<T: Transport>(service: &ForumService<T>, id: QuestionId) -> Result<()> {
    resume(service).await?;
    // Known locally, so a forbidden change is refused without a request.
    service.refresh().await.context("Failed to fetch questions")?;
    let question = service.mark_answered(id).await?;
    println!("Question #{} is now {}.", question.id, question.status);
    Ok(())
}

/// Run the escalate command.
pub async fn escalate<T: Transport>(service: &ForumService<T>, id: QuestionId) -> Result<()> {
    resume(service).await?;
    service.refresh().await.context("Failed to fetch questions")?;
    let question = service.escalate(id).await?;
    println!("Question #{} is now {}.", question.id, question.status);
    Ok(())
}

/// Run the suggest command.
pub async fn suggest<T: Transport>(service: &ForumService<T>, id: QuestionId) -> Result<()> {
    resume(service).await?;
    let text = service
        .request_suggestion(id)
        .await
        .context("Suggestion failed")?;
    println!("Suggested answer for #{id}:");
    println!();
    println!("{text}");
    Ok(())
}
