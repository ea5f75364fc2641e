//! Tests for request validation.

use relay_core::{CompletionRequest, Error, Message};

#[test]
fn empty_messages_rejected() {
    let req = CompletionRequest::from_messages(vec![]);
    assert!(matches!(req.validate(), Err(Error::BadRequest(_))));
}

#[test]
fn temperature_range_enforced() {
    let req = CompletionRequest::from_messages(vec![Message::user("hi")]).with_temperature(2.5);
    assert!(req.validate().is_err());

    let req = CompletionRequest::from_messages(vec![Message::user("hi")]).with_temperature(2.0);
    assert!(req.validate().is_ok());
}

#[test]
fn top_p_range_enforced() {
    let mut req = CompletionRequest::from_messages(vec![Message::user("hi")]);
    req.top_p = Some(1.2);
    assert!(req.validate().is_err());

    req.top_p = Some(0.9);
    assert!(req.validate().is_ok());
}

#[test]
fn empty_model_means_unspecified() {
    let req = CompletionRequest::from_messages(vec![Message::user("hi")]);
    assert!(req.model.is_empty());
    let json = serde_json::to_string(&req).unwrap();
    assert!(!json.contains("\"model\""));
}
