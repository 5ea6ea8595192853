//! Editor panel tests: the message the host posts and the page it loads.
use codeagent::webview::{self, PanelMessage};

#[test]
fn selection_message_matches_host_format() {
    let message = PanelMessage::set_selection("let x = \"quoted\";\n");
    let value: serde_json::Value = serde_json::from_str(&message.to_json().unwrap()).unwrap();
    assert_eq!(
        value,
        serde_json::json!({ "command": "setSelection", "code": "let x = \"quoted\";\n" })
    );
}

#[test]
fn unknown_commands_are_rejected() {
    let parsed = serde_json::from_str::<PanelMessage>(r#"{"command":"runTests"}"#);
    assert!(parsed.is_err());
}

#[test]
fn default_panel_is_locked_to_its_nonce() {
    let nonce = webview::generate_nonce();
    let html = webview::panel_html(webview::DEFAULT_SCRIPT, &nonce, "'self'").unwrap();

    assert!(html.contains(&format!("'nonce-{nonce}'")));
    assert!(html.contains(&format!(r#"nonce="{nonce}""#)));
    assert!(html.contains("default-src 'none'"));
    assert!(html.contains(webview::KERNEL_URL));
    assert!(html.contains("st.chat_input"));
}
