use duet_core::Message;

use crate::commands::common::{
    open_service, outcome_message, require_auth, require_user_id, resolve_contact,
};
use crate::error::CliError;

pub async fn run_messages(contact: &str, global_profile: Option<&str>) -> Result<(), CliError> {
    let (service, _profile_name) = open_service(global_profile).await?;
    require_auth(&service).await?;

    let identity = service.identity().await;
    let user_id = require_user_id(&identity)?;
    let entry = resolve_contact(&identity, contact)?;

    outcome_message(
        service
            .fetch_messages(&user_id, &entry.contact_id, &entry.username)
            .await,
    )?;

    let messages = service.messages().await;
    if messages.is_empty() {
        println!("No messages with '{}' yet.", entry.username);
        return Ok(());
    }

    println!("Conversation with '{}':", entry.username);
    for message in &messages {
        println!("{}", format_message_line(message, identity.id.as_deref()));
    }
    Ok(())
}

fn format_message_line(message: &Message, own_id: Option<&str>) -> String {
    let direction = if own_id == Some(message.from.as_str()) {
        "you"
    } else {
        "them"
    };
    format!(
        "[{}] {}: {}",
        message.sent_at.format("%Y-%m-%d %H:%M"),
        direction,
        message.content
    )
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn message_at(from: &str) -> Message {
        Message {
            id: "m1".to_string(),
            from: from.to_string(),
            to: "other".to_string(),
            content: "hello".to_string(),
            sent_at: chrono::Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap(),
            version: 0,
        }
    }

    #[test]
    fn format_marks_own_messages() {
        let line = format_message_line(&message_at("u1"), Some("u1"));
        assert_eq!(line, "[2024-01-15 10:30] you: hello");
    }

    #[test]
    fn format_marks_contact_messages() {
        let line = format_message_line(&message_at("c1"), Some("u1"));
        assert_eq!(line, "[2024-01-15 10:30] them: hello");
    }
}
