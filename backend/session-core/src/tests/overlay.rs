// Unit tests for the overlay message wire contract
// The tag names and payload shapes are consumed by the frontend; these
// tests pin the exact JSON

use crate::overlay::{CardPrompt, ConnectProgress, OverlayMessage};

use serde_json::json;

/// **VALUE**: Pins the serialized form of the unit-variant message.
///
/// **WHY THIS MATTERS**: The frontend routes on the `type` tag; renaming
/// the variant or changing the tag casing breaks the connecting screen
/// silently.
///
/// **BUG THIS CATCHES**: Would catch the `rename_all` attribute being
/// dropped, which would emit `"Connecting"` instead of `"connecting"`.
#[test]
fn given_connecting_message_when_serialized_then_tag_only_object() {
    // GIVEN: The connecting message
    let message = OverlayMessage::Connecting;

    // WHEN: Serializing it
    let value = serde_json::to_value(&message).unwrap();

    // THEN: The JSON is the bare tagged object
    assert_eq!(value, json!({ "type": "connecting" }));
}

/// **VALUE**: Pins the failure message shape.
///
/// **WHY THIS MATTERS**: The frontend shows `message` verbatim; a field
/// rename leaves the user with an empty error dialog.
///
/// **BUG THIS CATCHES**: Would catch `message` drifting to `reason` or
/// similar.
#[test]
fn given_connect_failed_when_serialized_then_message_field_present() {
    // GIVEN: A failure with a server-provided message
    let message = OverlayMessage::ConnectFailed {
        message: "Connection refused by server".to_string(),
    };

    // WHEN: Serializing it
    let value = serde_json::to_value(&message).unwrap();

    // THEN: The tag is camelCase and the message is verbatim
    assert_eq!(
        value,
        json!({
            "type": "connectFailed",
            "message": "Connection refused by server"
        })
    );
}

/// **VALUE**: Pins the progress shape, including the nested `data`
/// object.
///
/// **WHY THIS MATTERS**: Progress updates are the highest-volume message;
/// the frontend reads `data.message`, `data.count` and `data.total` to
/// drive the progress bar.
///
/// **BUG THIS CATCHES**: Would catch the progress fields being flattened
/// into the top-level object.
#[test]
fn given_connect_status_when_serialized_then_nested_data_object() {
    // GIVEN: A mid-connect progress update
    let message = OverlayMessage::ConnectStatus {
        data: ConnectProgress {
            message: "Downloading content".to_string(),
            count: 3,
            total: 10,
        },
    };

    // WHEN: Serializing it
    let value = serde_json::to_value(&message).unwrap();

    // THEN: The progress rides inside `data`
    assert_eq!(
        value,
        json!({
            "type": "connectStatus",
            "data": {
                "message": "Downloading content",
                "count": 3,
                "total": 10
            }
        })
    );
}

/// **VALUE**: Pins the card prompt shape with the card document embedded
/// as-is.
///
/// **WHY THIS MATTERS**: The card document belongs to the server; the
/// overlay renders it directly. Re-encoding it as a string would make the
/// frontend parse JSON twice.
///
/// **BUG THIS CATCHES**: Would catch the card being serialized as an
/// escaped string instead of an object.
#[test]
fn given_connect_card_when_serialized_then_document_embedded() {
    // GIVEN: A card prompt wrapping a server document
    let message = OverlayMessage::ConnectCard {
        data: CardPrompt {
            card: json!({ "type": "AdaptiveCard", "version": "1.0" }),
        },
    };

    // WHEN: Serializing it
    let value = serde_json::to_value(&message).unwrap();

    // THEN: The document is embedded, not stringified
    assert_eq!(
        value,
        json!({
            "type": "connectCard",
            "data": {
                "card": { "type": "AdaptiveCard", "version": "1.0" }
            }
        })
    );
}

/// **VALUE**: Pins the remaining tags in one sweep.
///
/// **WHY THIS MATTERS**: `authPayload`, `setServerAddress` and
/// `setWarningMessage` each have exactly one consumer in the frontend
/// keyed on the tag string.
///
/// **BUG THIS CATCHES**: Would catch any one of the three tags drifting
/// during an enum reshuffle.
#[test]
fn given_remaining_messages_when_serialized_then_tags_match_contract() {
    // GIVEN / WHEN / THEN: Each message against its pinned JSON
    assert_eq!(
        serde_json::to_value(OverlayMessage::AuthPayload {
            data: "token=abc".to_string()
        })
        .unwrap(),
        json!({ "type": "authPayload", "data": "token=abc" })
    );
    assert_eq!(
        serde_json::to_value(OverlayMessage::SetServerAddress {
            data: "myserver.example:30120".to_string()
        })
        .unwrap(),
        json!({ "type": "setServerAddress", "data": "myserver.example:30120" })
    );
    assert_eq!(
        serde_json::to_value(OverlayMessage::SetWarningMessage {
            message: "Connection to the server was lost".to_string()
        })
        .unwrap(),
        json!({ "type": "setWarningMessage", "message": "Connection to the server was lost" })
    );
}
