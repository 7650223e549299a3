//! Embedded single-file chat page served at GET /ui.

/// Self-contained HTML/JS chat client for the Cambium API.
///
/// Creates a session on load, renders the transcript after every exchange,
/// and disables the input with a spinner while a reply is pending.
pub const CHAT_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Cambium Chat</title>
<style>
  :root { --bg: #f5f5f4; --panel: #ffffff; --accent: #0f766e; --text: #1c1917; }
  * { box-sizing: border-box; }
  body { margin: 0; font-family: system-ui, sans-serif; background: var(--bg); color: var(--text); }
  main { max-width: 720px; margin: 0 auto; padding: 1rem; display: flex; flex-direction: column; height: 100vh; }
  h1 { font-size: 1.1rem; margin: 0 0 .75rem; }
  #log { flex: 1; overflow-y: auto; display: flex; flex-direction: column; gap: .5rem; padding: .25rem; }
  .turn { max-width: 80%; padding: .6rem .8rem; border-radius: .75rem; white-space: pre-wrap; }
  .assistant { background: var(--panel); border: 1px solid #e7e5e4; align-self: flex-start; }
  .user { background: var(--accent); color: #fff; align-self: flex-end; }
  form { display: flex; gap: .5rem; padding-top: .75rem; }
  input { flex: 1; padding: .6rem .8rem; border: 1px solid #d6d3d1; border-radius: .5rem; font-size: 1rem; }
  button { padding: .6rem 1rem; border: 0; border-radius: .5rem; background: var(--accent); color: #fff; cursor: pointer; }
  button:disabled { opacity: .5; cursor: wait; }
  #status { font-size: .8rem; color: #78716c; min-height: 1.1rem; }
</style>
</head>
<body>
<main>
  <h1>Cambium Chat</h1>
  <div id="log"></div>
  <div id="status"></div>
  <form id="form">
    <input id="input" autocomplete="off" placeholder="Ask me about Cambium..." required>
    <button id="send" type="submit">Send</button>
  </form>
</main>
<script>
const log = document.getElementById('log');
const form = document.getElementById('form');
const input = document.getElementById('input');
const send = document.getElementById('send');
const status = document.getElementById('status');
let sessionId = null;

function render(transcript) {
  log.innerHTML = '';
  for (const turn of transcript) {
    const div = document.createElement('div');
    div.className = 'turn ' + turn.role;
    div.textContent = turn.content;
    log.appendChild(div);
  }
  log.scrollTop = log.scrollHeight;
}

async function init() {
  status.textContent = 'Loading the knowledge base...';
  const resp = await fetch('/sessions', { method: 'POST' });
  const body = await resp.json();
  sessionId = body.id;
  render(body.transcript);
  status.textContent = '';
}

form.addEventListener('submit', async (e) => {
  e.preventDefault();
  const message = input.value.trim();
  if (!message || !sessionId) return;
  send.disabled = true;
  input.disabled = true;
  status.textContent = 'Thinking...';
  try {
    const resp = await fetch(`/sessions/${sessionId}/messages`, {
      method: 'POST',
      headers: { 'Content-Type': 'application/json' },
      body: JSON.stringify({ message }),
    });
    const body = await resp.json();
    if (resp.ok) {
      render(body.transcript);
      input.value = '';
      status.textContent = '';
    } else {
      status.textContent = body.message || 'Request failed; your message is kept for retry.';
    }
  } catch (err) {
    status.textContent = 'Network error; your message is kept for retry.';
  } finally {
    send.disabled = false;
    input.disabled = false;
    input.focus();
  }
});

init();
</script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_html_is_self_contained() {
        assert!(CHAT_HTML.contains("<!DOCTYPE html>"));
        assert!(CHAT_HTML.contains("/sessions"));
        // No external assets: everything inlined.
        assert!(!CHAT_HTML.contains("src=\"http"));
        assert!(!CHAT_HTML.contains("href=\"http"));
    }
}
