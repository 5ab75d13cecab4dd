//! 入站载荷校验
//!
//! 使用 `validator` 对参与者和消息载荷做纯校验，一次性收集全部违反的规则。
//! 缺失字段按空字符串处理，从而与"为空"一起汇报，而不是在反序列化阶段被拒绝。

use serde::Deserialize;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::errors::{DomainError, DomainResult};
use crate::message::MessageKind;
use crate::value_objects::ParticipantName;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ParticipantPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
}

/// 客户端提交（或编辑）的消息；`from` 来自请求头而非请求体
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct MessagePayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "from must not be empty"))]
    pub from: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "to must not be empty"))]
    pub to: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "text must not be empty"))]
    pub text: String,
    #[serde(default, rename = "type")]
    #[validate(custom(function = "validate_client_kind"))]
    pub kind: String,
}

/// 校验通过的消息字段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidMessage {
    pub from: ParticipantName,
    pub to: String,
    pub text: String,
    pub kind: MessageKind,
}

fn validate_client_kind(kind: &str) -> Result<(), ValidationError> {
    match kind.parse::<MessageKind>() {
        Ok(parsed) if parsed.is_client_settable() => Ok(()),
        _ => Err(ValidationError::new("message_kind")
            .with_message("type must be one of message, private_message".into())),
    }
}

pub fn validate_participant(payload: &ParticipantPayload) -> DomainResult<ParticipantName> {
    payload.validate().map_err(into_domain_error)?;
    Ok(ParticipantName::new(payload.name.clone()))
}

pub fn validate_message(payload: &MessagePayload) -> DomainResult<ValidMessage> {
    payload.validate().map_err(into_domain_error)?;
    let kind = payload
        .kind
        .parse::<MessageKind>()
        .map_err(|err| DomainError::validation_failed(vec![err.to_string()]))?;

    Ok(ValidMessage {
        from: ParticipantName::new(payload.from.clone()),
        to: payload.to.clone(),
        text: payload.text.clone(),
        kind,
    })
}

fn into_domain_error(errors: ValidationErrors) -> DomainError {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|(a, _), (b, _)| a.cmp(b));

    let violations = fields
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| match &error.message {
                Some(message) => message.to_string(),
                None => format!("{field}: {}", error.code),
            })
        })
        .collect();

    DomainError::validation_failed(violations)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(from: &str, to: &str, text: &str, kind: &str) -> MessagePayload {
        MessagePayload {
            from: from.into(),
            to: to.into(),
            text: text.into(),
            kind: kind.into(),
        }
    }

    #[test]
    fn empty_name_is_rejected() {
        let err = validate_participant(&ParticipantPayload::default()).unwrap_err();
        assert_eq!(
            err,
            DomainError::validation_failed(vec!["name must not be empty".into()])
        );
    }

    #[test]
    fn single_character_name_is_accepted() {
        let name = validate_participant(&ParticipantPayload { name: "a".into() }).unwrap();
        assert_eq!(name.as_str(), "a");
    }

    #[test]
    fn message_reports_every_violation() {
        let err = validate_message(&payload("", "", "", "shout")).unwrap_err();
        match err {
            DomainError::ValidationFailed { violations } => {
                assert_eq!(violations.len(), 4);
                assert!(violations.contains(&"from must not be empty".to_string()));
                assert!(violations.contains(&"to must not be empty".to_string()));
                assert!(violations.contains(&"text must not be empty".to_string()));
                assert!(violations
                    .contains(&"type must be one of message, private_message".to_string()));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn status_type_is_not_client_settable() {
        let err = validate_message(&payload("alice", "Todos", "hi", "status")).unwrap_err();
        assert!(matches!(err, DomainError::ValidationFailed { .. }));
    }

    #[test]
    fn private_message_is_accepted() {
        let valid = validate_message(&payload("alice", "bob", "psst", "private_message")).unwrap();
        assert_eq!(valid.kind, MessageKind::PrivateMessage);
        assert_eq!(valid.from.as_str(), "alice");
    }

    #[test]
    fn missing_fields_deserialize_as_empty() {
        let payload: MessagePayload = serde_json::from_str(r#"{"text":"hi"}"#).unwrap();
        let err = validate_message(&payload).unwrap_err();
        match err {
            DomainError::ValidationFailed { violations } => assert_eq!(violations.len(), 3),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
