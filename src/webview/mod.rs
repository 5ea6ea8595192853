//! Editor panel page.
//!
//! The editor extension opens a sandboxed panel that boots an in-browser
//! Python interpreter, mounts a fixed app script, and receives the user's
//! current selection as a posted message. This module generates that page
//! and the message payload; the extension host itself lives elsewhere.
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};

/// Interpreter kernel and app loader the panel imports.
pub const KERNEL_URL: &str = "https://cdn.jsdelivr.net/npm/@stlite/kernel@0.5.0/+esm";
pub const APP_URL: &str = "https://cdn.jsdelivr.net/npm/@stlite/app@0.5.0/+esm";

/// Path the script is mounted at inside the interpreter.
pub const SCRIPT_PATH: &str = "/app/main.py";

const NONCE_LEN: usize = 32;

/// Default app script: a chat view that echoes what was asked.
pub const DEFAULT_SCRIPT: &str = r#"import streamlit as st

st.set_page_config(page_title="Code Agent", layout="wide")
st.title("Code Agent")
st.caption("Running in the editor panel.")

if "messages" not in st.session_state:
    st.session_state.messages = []

for message in st.session_state.messages:
    with st.chat_message(message["role"]):
        st.markdown(message["content"])

if prompt := st.chat_input("What would you like to analyze?"):
    st.session_state.messages.append({"role": "user", "content": prompt})
    with st.chat_message("user"):
        st.markdown(prompt)

if st.sidebar.button("Clear chat"):
    st.session_state.messages = []
    st.rerun()
"#;

/// Messages the editor host posts into the panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum PanelMessage {
    /// The text currently selected in the active editor.
    SetSelection { code: String },
}

impl PanelMessage {
    pub fn set_selection(code: impl Into<String>) -> Self {
        Self::SetSelection { code: code.into() }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Random alphanumeric nonce for the panel's script tag.
pub fn generate_nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LEN)
        .map(char::from)
        .collect()
}

/// Build the panel HTML.
///
/// `csp_source` is the host's resource origin; only it and the CDN may
/// serve scripts. `script` is embedded as a JSON string literal, so any
/// Python source is safe to pass.
pub fn panel_html(script: &str, nonce: &str, csp_source: &str) -> serde_json::Result<String> {
    // `</` would close the script element early.
    let script_literal = serde_json::to_string(script)?.replace("</", "<\\/");
    let path_literal = serde_json::to_string(SCRIPT_PATH)?;

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<meta http-equiv="Content-Security-Policy" content="default-src 'none'; style-src {csp_source} 'unsafe-inline'; script-src {csp_source} https://cdn.jsdelivr.net 'nonce-{nonce}' 'unsafe-eval'; connect-src *;">
<title>Code Agent</title>
<style>
html, body, #root {{ margin: 0; padding: 0; height: 100%; }}
#root {{ display: flex; flex-direction: column; }}
</style>
</head>
<body>
<div id="root"></div>
<script type="module" nonce="{nonce}">
import {{ StliteKernel }} from "{KERNEL_URL}";
import {{ StliteApp }} from "{APP_URL}";

const kernel = await StliteKernel.load({{
  files: {{ [{path_literal}]: {script_literal} }},
  requirements: [],
}});
new StliteApp(kernel, document.getElementById("root"));

window.addEventListener("message", (event) => {{
  const message = event.data;
  if (message && message.command === "setSelection") {{
    window.codeAgentSelection = message.code;
    console.log("Received selection:", message.code);
  }}
}});

window.addEventListener("beforeunload", () => kernel.dispose());
</script>
</body>
</html>
"#
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_selection_wire_format() {
        let json = PanelMessage::set_selection("fn main() {}").to_json().unwrap();
        assert_eq!(json, r#"{"command":"setSelection","code":"fn main() {}"}"#);

        let back: PanelMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, PanelMessage::set_selection("fn main() {}"));
    }

    #[test]
    fn nonces_are_alphanumeric_and_fresh() {
        let a = generate_nonce();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, generate_nonce());
    }

    #[test]
    fn panel_embeds_script_and_csp() {
        let html = panel_html("print('</script>')", "abc123", "vscode-resource:").unwrap();
        assert!(html.contains("script-src vscode-resource: https://cdn.jsdelivr.net 'nonce-abc123'"));
        assert!(html.contains(r#"<script type="module" nonce="abc123">"#));
        assert!(html.contains(r#"["/app/main.py"]"#));
        assert!(html.contains(r#"print('<\/script>')"#));
        assert_eq!(html.matches("</script>").count(), 1);
        assert!(html.contains(r#"message.command === "setSelection""#));
    }
}
