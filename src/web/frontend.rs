//! Embedded HTML/CSS/JS shell for the dashboard.
//!
//! Pages are rendered server-side; the shell only swaps markup in and out.
//! No external assets, no build tools, no CDN dependencies.

/// The dashboard shell. `{{NAV}}`, `{{PAGE}}`, `{{STATUS}}` and
/// `{{INTERVAL_MS}}` are filled in by [`index_html`].
const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Code Agent</title>
<style>
:root {
  --bg: #0d1117;
  --surface: #161b22;
  --border: #30363d;
  --text: #e6edf3;
  --text-muted: #8b949e;
  --accent: #58a6ff;
  --green: #3fb950;
  --yellow: #d29922;
  --red: #f85149;
  --purple: #bc8cff;
  --radius: 8px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
  --mono: 'SF Mono', 'Cascadia Code', 'Fira Code', monospace;
}

* { margin: 0; padding: 0; box-sizing: border-box; }
body {
  background: var(--bg);
  color: var(--text);
  font-family: var(--font);
  font-size: 14px;
  line-height: 1.5;
}

/* Layout */
.app {
  max-width: 1200px;
  margin: 0 auto;
  padding: 24px;
}

header {
  display: flex;
  align-items: center;
  justify-content: space-between;
  margin-bottom: 24px;
  padding-bottom: 16px;
  border-bottom: 1px solid var(--border);
}

header h1 {
  font-size: 22px;
  font-weight: 600;
}

header h1 .logo {
  color: var(--accent);
  font-family: var(--mono);
  font-weight: 700;
}

#connection-status, .status {
  display: inline-flex;
  align-items: center;
  gap: 6px;
  padding: 4px 10px;
  border-radius: 12px;
  font-size: 12px;
  background: var(--surface);
  border: 1px solid var(--border);
}

.status-dot {
  width: 8px;
  height: 8px;
  border-radius: 50%;
  background: var(--text-muted);
}
.status-dot.online { background: var(--green); }
.status-dot.offline { background: var(--red); }

/* Navigation */
nav {
  display: flex;
  flex-wrap: wrap;
  gap: 4px;
  margin-bottom: 24px;
  background: var(--surface);
  border-radius: var(--radius);
  padding: 4px;
  border: 1px solid var(--border);
}

.nav-item {
  flex: 1;
  padding: 8px 12px;
  border-radius: 6px;
  color: var(--text-muted);
  text-align: center;
  text-decoration: none;
  font-size: 13px;
  font-weight: 500;
  white-space: nowrap;
  transition: all 0.15s;
}
.nav-item:hover { color: var(--text); background: rgba(255,255,255,0.04); }
.nav-item.active { background: var(--accent); color: #fff; }

/* Cards */
.card {
  background: var(--surface);
  border: 1px solid var(--border);
  border-radius: var(--radius);
  padding: 20px;
  margin-bottom: 16px;
}
.card.hero { padding: 32px; }
.card.clickable { cursor: pointer; }
.card.clickable:hover { border-color: var(--accent); }
.card.empty, .card.placeholder { color: var(--text-muted); text-align: center; }
.card.error { border-color: var(--red); color: var(--red); }
.card.tall { min-height: 240px; }

.section-title {
  font-size: 16px;
  font-weight: 600;
  margin-bottom: 12px;
}
.section-title.underline {
  padding-bottom: 8px;
  border-bottom: 1px solid var(--border);
}
.subtitle, .muted { color: var(--text-muted); }
.small { font-size: 12px; }
.accent { color: var(--accent); }
.success { color: var(--green); }
.bright { color: var(--text); font-weight: 600; }
.clamp { display: -webkit-box; -webkit-line-clamp: 2; -webkit-box-orient: vertical; overflow: hidden; }
.prewrap, .summary-body { white-space: pre-wrap; }
.left { text-align: left; }
.divider { border-top: 1px solid var(--border); margin: 16px 0; }

.row { display: flex; align-items: center; justify-content: space-between; }
.row.gap, .card.row.gap { gap: 12px; justify-content: flex-start; }
.grow { flex: 1; }
.stack > * + * { margin-top: 12px; }
.grid-main { display: grid; grid-template-columns: repeat(auto-fit, minmax(240px, 1fr)); gap: 16px; }
.grid-3 { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 16px; margin-bottom: 16px; }
.grid-2 { display: grid; grid-template-columns: repeat(auto-fit, minmax(320px, 1fr)); gap: 16px; }
.page header { margin-bottom: 20px; padding-bottom: 0; border: none; display: block; }
.page h1 { font-size: 20px; font-weight: 600; }
.card h3 { font-size: 15px; font-weight: 600; margin-bottom: 12px; }

/* Forms */
.input-group { margin-bottom: 14px; }
.input-label {
  display: block;
  font-size: 12px;
  color: var(--text-muted);
  margin-bottom: 4px;
}
input[type=text], textarea, select {
  width: 100%;
  padding: 8px 10px;
  background: var(--bg);
  color: var(--text);
  border: 1px solid var(--border);
  border-radius: 6px;
  font-family: var(--font);
  font-size: 13px;
}
input:focus, textarea:focus, select:focus { outline: none; border-color: var(--accent); }
label.check { display: flex; gap: 8px; align-items: center; margin-bottom: 14px; }

.btn {
  padding: 8px 16px;
  border: 1px solid var(--border);
  border-radius: 6px;
  font-size: 13px;
  font-weight: 500;
  cursor: pointer;
  transition: all 0.15s;
}
.btn.wide { width: 100%; }
.btn-primary { background: var(--accent); border-color: var(--accent); color: #fff; }
.btn-secondary { background: var(--surface); color: var(--text); }
.btn-danger { background: transparent; border-color: var(--red); color: var(--red); }
.btn:disabled { opacity: 0.5; cursor: not-allowed; }

/* Results */
.badge {
  display: inline-block;
  padding: 2px 8px;
  border-radius: 10px;
  font-size: 11px;
  border: 1px solid var(--purple);
  color: var(--purple);
}
.chips { display: flex; flex-wrap: wrap; gap: 6px; }
.chip {
  padding: 2px 10px;
  border-radius: 12px;
  background: var(--bg);
  border: 1px solid var(--border);
  font-size: 12px;
}
.code-block, .snippet {
  font-family: var(--mono);
  font-size: 12px;
  background: var(--bg);
  border: 1px solid var(--border);
  border-radius: 6px;
  padding: 10px;
  overflow-x: auto;
  white-space: pre-wrap;
}
.snippet-source { font-size: 12px; color: var(--accent); margin-top: 8px; }
.preview-image { max-width: 100%; border-radius: 6px; }
.action-item { display: flex; gap: 12px; align-items: flex-start; }
.action-note { font-size: 12px; color: var(--text-muted); }
.env-info { font-family: var(--mono); font-size: 12px; color: var(--text-muted); }
</style>
</head>
<body>
<div class="app">
  <header>
    <h1><span class="logo">&lt;/&gt;</span> Code Agent</h1>
    <div id="connection-status">{{STATUS}}</div>
  </header>
  <nav id="nav">{{NAV}}</nav>
  <main id="page-content">{{PAGE}}</main>
</div>

<script>
const HEALTH_INTERVAL_MS = {{INTERVAL_MS}};

// ---------------------------------------------------------------------------
// Server calls
// ---------------------------------------------------------------------------
async function api(method, path, body) {
  const opts = { method, headers: {} };
  if (body) {
    opts.headers['Content-Type'] = 'application/json';
    opts.body = JSON.stringify(body);
  }
  const res = await fetch(path, opts);
  return res.json();
}

function replace(id, html) {
  const el = document.getElementById(id);
  if (el) el.innerHTML = html;
}

function showPage(rendered) {
  replace('page-content', rendered.html);
  replace('nav', rendered.nav);
  if (rendered.scroll_top) window.scrollTo(0, 0);
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------
async function navigate(id) {
  try {
    showPage(await api('GET', '/pages/' + encodeURIComponent(id)));
  } catch (e) {
    alert('Failed to load page: ' + e.message);
  }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------
function collectFields() {
  const payload = {};
  document.querySelectorAll('#page-content [data-field]').forEach(el => {
    payload[el.dataset.field] = el.type === 'checkbox' ? el.checked : el.value;
  });
  const selected = [];
  document.querySelectorAll('#page-content .action-check:checked').forEach(el => {
    selected.push(Number(el.dataset.idx));
  });
  payload.selected = selected;
  return payload;
}

function applyReply(reply) {
  (reply.fragments || []).forEach(f => replace(f.target, f.html));
  if (reply.navigate) showPage(reply.navigate);
  if (reply.control) {
    const btn = document.getElementById(reply.control.id);
    if (btn) {
      btn.disabled = !reply.control.enabled;
      btn.textContent = reply.control.label;
    }
  }
  if (reply.alert) alert(reply.alert);
  if (reply.reload) window.location.reload();
}

async function runAction(action, source) {
  if (source && source.dataset.confirm && !confirm(source.dataset.confirm)) return;

  const payload = collectFields();
  if (source && source.dataset.id) payload.id = source.dataset.id;

  const button = source && source.tagName === 'BUTTON' ? source : null;
  if (button) setBusy(button);
  try {
    const reply = await api('POST', '/actions/' + action, payload);
    if (button && !reply.control) setIdle(button);
    applyReply(reply);
  } catch (e) {
    alert('Request failed: ' + e.message);
    if (button) setIdle(button);
  }
}

// Busy buttons carry their in-flight label in data-busy.
function setBusy(button) {
  button.disabled = true;
  if (button.dataset.busy) {
    button.dataset.idle = button.textContent;
    button.textContent = button.dataset.busy;
  }
}

function setIdle(button) {
  button.disabled = false;
  if (button.dataset.idle) button.textContent = button.dataset.idle;
}

document.addEventListener('click', e => {
  const nav = e.target.closest('[data-nav], .nav-item[data-page]');
  if (nav) {
    e.preventDefault();
    navigate(nav.dataset.nav || nav.dataset.page);
    return;
  }
  const btn = e.target.closest('[data-action]');
  if (btn && !btn.disabled) {
    e.preventDefault();
    runAction(btn.dataset.action, btn);
  }
});

document.addEventListener('input', e => {
  const el = e.target.closest('[data-live]');
  if (el) runAction(el.dataset.live, null);
});

document.addEventListener('change', e => {
  const el = e.target.closest('[data-change]');
  if (el) runAction(el.dataset.change, null);
});

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------
async function refreshStatus() {
  try {
    const status = await api('GET', '/status');
    replace('connection-status', status.html);
    replace('dash-status', status.html);
  } catch (e) {
    // Dashboard server gone; leave the last known state.
  }
}

setInterval(refreshStatus, HEALTH_INTERVAL_MS);
</script>
</body>
</html>
"##;

/// The full dashboard document with the given regions filled in.
pub fn index_html(nav: &str, page: &str, status: &str, interval_ms: u128) -> String {
    INDEX_HTML
        .replace("{{NAV}}", nav)
        .replace("{{STATUS}}", status)
        .replace("{{INTERVAL_MS}}", &interval_ms.to_string())
        .replace("{{PAGE}}", page)
}
