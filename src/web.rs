use colored::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::analysis::{AnalysisView, AnalyzeRejected};
use crate::chat::{ChatView, SendRejected};
use crate::config::AppConfig;
use crate::dataset::ProblemSet;
use crate::dispatch::Dispatcher;
use crate::error::CoachError;
use crate::languages::LANGUAGES;
use crate::sessions::{
    insert_analysis, insert_chat, new_session_store, with_analysis, with_chat, AnalysisSnapshot,
    ChatSnapshot, SessionStore,
};

const MAX_HEAD_BYTES: usize = 16 * 1024;
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Embedded single-page UI: problem pane, editor, output pane and the
/// floating chat widget.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Code Coach</title>
<style>
*{margin:0;padding:0;box-sizing:border-box}
body{background:#0f172a;color:#e2e8f0;font-family:'Inter',system-ui,sans-serif;min-height:100vh;display:flex;flex-direction:column}
header{padding:14px 24px;border-bottom:1px solid #1e293b;display:flex;align-items:center;gap:12px}
header h1{font-size:1.1rem;color:#a78bfa}
header input{background:#020617;border:1px solid #334155;color:#e2e8f0;padding:6px 10px;border-radius:6px;width:120px}
#problem{padding:16px 24px}
#problem h2{font-size:1.4rem;font-weight:600}
#problem .desc{color:#94a3b8;font-size:.9rem;margin-top:8px;white-space:pre-line}
.workspace{display:grid;grid-template-columns:1fr 1fr;gap:0;margin:0 24px 24px;border:1px solid #1e293b;border-radius:12px;overflow:hidden;flex:1}
.pane{display:flex;flex-direction:column;min-height:70vh}
.pane:first-child{border-right:1px solid #1e293b}
.bar{display:flex;align-items:center;justify-content:space-between;padding:8px 16px;background:#020617}
select{background:#0f172a;border:1px solid #334155;color:#e2e8f0;padding:4px 8px;border-radius:6px}
#editor{flex:1;background:#0b1120;color:#e2e8f0;border:none;padding:14px;font-family:'Fira Code',monospace;font-size:.85rem;resize:none;tab-size:4}
#editor:focus{outline:none}
.btn{border:none;padding:6px 14px;border-radius:6px;font-size:.85rem;cursor:pointer;color:#fff;background:#7c3aed}
.btn:hover{background:#6d28d9}
.btn:disabled{background:#334155;color:#64748b;cursor:not-allowed}
#output{padding:16px 24px;overflow-y:auto;max-height:80vh;font-size:.875rem;line-height:1.6}
#output.err{color:#f87171}
.md table{border-collapse:collapse;margin:8px 0}
.md th,.md td{border:1px solid #334155;padding:4px 8px}
.md h1,.md h2,.md h3{margin:10px 0 6px}
.md code{background:#1e293b;padding:1px 4px;border-radius:4px}
.md pre{background:#1e293b;padding:10px;border-radius:6px;overflow-x:auto}
#chat-toggle{position:fixed;bottom:65px;right:16px;background:#7c3aed;color:#fff;border-radius:999px;padding:14px 18px;cursor:pointer;box-shadow:0 8px 24px #0008}
#chat{position:fixed;bottom:65px;right:16px;width:24rem;background:#111827;border-radius:10px;box-shadow:0 8px 24px #000a;display:none;flex-direction:column}
#chat.open{display:flex}
#chat .head{display:flex;justify-content:space-between;align-items:center;padding:14px;border-bottom:1px solid #374151}
#chat .head span{cursor:pointer;color:#9ca3af}
#messages{padding:14px;max-height:20rem;overflow-y:auto;display:flex;flex-direction:column;gap:10px}
.msg{padding:10px;border-radius:6px;font-size:.85rem}
.msg.user{background:#2563eb;text-align:right}
.msg.assistant{background:#374151}
.msg b{display:block;margin-bottom:4px}
#chat-error{color:#ef4444;padding:0 14px 8px;font-size:.85rem}
#chat .foot{display:flex;gap:8px;padding:14px;border-top:1px solid #374151}
#chat-input{flex:1;background:#1f2937;border:1px solid #374151;color:#fff;padding:6px 10px;border-radius:6px}
</style>
</head>
<body>
<header>
  <h1>Code Coach</h1>
  <input id="pid" placeholder="problem id">
  <button class="btn" id="load">Open</button>
</header>
<section id="problem"><h2>Loading...</h2><div class="desc"></div></section>
<div class="workspace">
  <div class="pane">
    <div class="bar"><select id="lang"></select></div>
    <textarea id="editor" spellcheck="false"></textarea>
  </div>
  <div class="pane">
    <div class="bar"><span>Output</span><button class="btn" id="analyze" disabled>Analyze</button></div>
    <div id="output" class="md"></div>
  </div>
</div>

<div id="chat-toggle">Chat Support</div>
<div id="chat">
  <div class="head"><strong>Saksham Chat Bot</strong><span id="chat-close">&#x2715;</span></div>
  <div id="messages"></div>
  <div id="chat-error"></div>
  <div class="foot">
    <input id="chat-input" type="text" placeholder="Type your message...">
    <button class="btn" id="chat-send" disabled>Send</button>
  </div>
</div>

<script>
const $=s=>document.querySelector(s);
const api=async(method,url,body)=>{
  const r=await fetch(url,{method,headers:{'Content-Type':'application/json'},body:body===undefined?undefined:JSON.stringify(body)});
  const data=await r.json().catch(()=>({}));
  return {ok:r.ok,status:r.status,data};
};

// -- analysis view --
let view=null;
async function loadLanguages(){
  const {data}=await api('GET','/api/languages');
  $('#lang').innerHTML='';
  for(const l of data){const o=document.createElement('option');o.value=l.id;o.textContent=l.name;$('#lang').appendChild(o);}
}
function showAnalysis(s){
  view=s;
  if(s.problem){
    $('#problem h2').textContent=s.problem.title;
    $('#problem .desc').textContent=s.problem.problem_description;
  }
  $('#lang').value=s.language;
  if(document.activeElement!==$('#editor')) $('#editor').value=s.source;
  $('#analyze').disabled=!s.can_analyze;
  $('#analyze').textContent=s.loading?'Analyzing...':'Analyze';
  $('#output').innerHTML=s.output_html;
  $('#output').classList.toggle('err',s.error);
}
async function mount(id){
  $('#problem h2').textContent='Loading...';$('#problem .desc').textContent='';
  $('#analyze').disabled=true;view=null;
  const r=await api('POST','/api/analysis',{problem_id:id});
  if(r.ok) showAnalysis(r.data);
}
async function pushSource(extra){
  if(!view) return;
  const r=await api('PUT','/api/analysis/'+view.id+'/source',Object.assign({text:$('#editor').value},extra||{}));
  if(r.ok) showAnalysis(r.data);
}
$('#lang').onchange=()=>pushSource({language:$('#lang').value});
$('#editor').onchange=()=>pushSource();
$('#analyze').onclick=async()=>{
  if(!view) return;
  await pushSource();
  $('#analyze').disabled=true;$('#analyze').textContent='Analyzing...';$('#output').innerHTML='';
  const r=await api('POST','/api/analysis/'+view.id+'/run');
  if(r.data&&r.data.id) showAnalysis(r.data);
};
$('#load').onclick=()=>{const id=$('#pid').value.trim();if(id){history.replaceState(null,'','?problem='+encodeURIComponent(id));mount(id);}};

// -- chat widget --
let chat=null;
function showChat(s){
  chat=s;
  $('#chat').classList.toggle('open',s.open);
  $('#chat-toggle').style.display=s.open?'none':'block';
  const box=$('#messages');box.innerHTML='';
  for(const m of s.messages){
    const d=document.createElement('div');d.className='msg '+m.sender;
    d.innerHTML='<b>'+m.label+':</b><div class="md">'+m.html+'</div>';
    box.appendChild(d);
  }
  box.scrollTop=box.scrollHeight;
  $('#chat-error').textContent=s.error||'';
  $('#chat-input').disabled=s.loading;
  syncSend();
}
function syncSend(){
  const busy=chat&&chat.loading;
  $('#chat-send').disabled=busy||!$('#chat-input').value.trim();
  $('#chat-send').textContent=busy?'Sending...':'Send';
}
async function ensureChat(){
  if(chat) return;
  const r=await api('POST','/api/chat');
  if(r.ok) chat=r.data;
}
async function toggleChat(){
  await ensureChat();
  const r=await api('POST','/api/chat/'+chat.id+'/toggle');
  if(r.ok) showChat(r.data);
}
$('#chat-toggle').onclick=toggleChat;
$('#chat-close').onclick=toggleChat;
$('#chat-input').oninput=syncSend;
async function sendChat(){
  const text=$('#chat-input').value;
  if(!text.trim()||!chat||chat.loading) return;
  $('#chat-input').value='';
  chat.loading=true;
  chat.messages.push({sender:'user',label:'You',html:text.replace(/&/g,'&amp;').replace(/</g,'&lt;').replace(/>/g,'&gt;')});
  chat.error=null;
  showChat(chat);
  const r=await api('POST','/api/chat/'+chat.id+'/messages',{text});
  if(r.data&&r.data.id) showChat(r.data);
}
$('#chat-send').onclick=sendChat;
$('#chat-input').onkeydown=e=>{if(e.key==='Enter')sendChat();};

loadLanguages().then(()=>{
  const id=new URLSearchParams(location.search).get('problem');
  if(id){$('#pid').value=id;mount(id);}
});
</script>
</body>
</html>"##;

// ---------------------------------------------------------------------------
// HTTP plumbing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl HttpResponse {
    pub fn html(body: &str) -> Self {
        Self { status: 200, content_type: "text/html; charset=utf-8", body: body.to_string() }
    }

    pub fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self { status, content_type: "application/json", body },
            Err(e) => Self::error(500, &e.to_string()),
        }
    }

    pub fn error(status: u16, message: &str) -> Self {
        Self::json_raw(status, serde_json::json!({ "error": message }).to_string())
    }

    fn json_raw(status: u16, body: String) -> Self {
        Self { status, content_type: "application/json", body }
    }

    pub fn not_found() -> Self {
        Self::error(404, "not found")
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nAccess-Control-Allow-Origin: *\r\nConnection: close\r\n\r\n{}",
            self.status,
            reason_phrase(self.status),
            self.content_type,
            self.body.len(),
            self.body,
        )
        .into_bytes()
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        413 => "Payload Too Large",
        503 => "Service Unavailable",
        _ => "Internal Server Error",
    }
}

/// Read one HTTP/1.1 request (head plus `Content-Length` body).
///
/// Returns `Ok(None)` when the peer closes before sending anything.
pub async fn read_request<R>(stream: &mut R) -> Result<Option<HttpRequest>, CoachError>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::with_capacity(4096);
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            if buf.is_empty() {
                return Ok(None);
            }
            return Err(CoachError::BadRequest("connection closed mid-request".into()));
        }
        buf.extend_from_slice(&chunk[..n]);

        let mut headers = [httparse::EMPTY_HEADER; 32];
        let mut req = httparse::Request::new(&mut headers);
        let status = req.parse(&buf).map_err(|e| CoachError::BadRequest(e.to_string()))?;
        let head_len = match status {
            httparse::Status::Partial => {
                if buf.len() > MAX_HEAD_BYTES {
                    return Err(CoachError::BadRequest("request head too large".into()));
                }
                continue;
            }
            httparse::Status::Complete(len) => len,
        };

        let method = req.method.unwrap_or("GET").to_string();
        let target = req.path.unwrap_or("/").to_string();
        let content_length = req
            .headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case("content-length"))
            .and_then(|h| std::str::from_utf8(h.value).ok())
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if content_length > MAX_BODY_BYTES {
            return Err(CoachError::BadRequest("request body too large".into()));
        }

        let mut body = buf[head_len..].to_vec();
        while body.len() < content_length {
            let n = stream.read(&mut chunk).await?;
            if n == 0 {
                return Err(CoachError::BadRequest("truncated request body".into()));
            }
            body.extend_from_slice(&chunk[..n]);
        }
        body.truncate(content_length);

        let path = match target.split_once('?') {
            Some((p, _)) => p.to_string(),
            None => target,
        };
        return Ok(Some(HttpRequest { method, path, body }));
    }
}

fn parse_body<T: for<'de> Deserialize<'de> + Default>(body: &[u8]) -> Result<T, HttpResponse> {
    if body.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| HttpResponse::error(400, &format!("invalid JSON: {e}")))
}

// ---------------------------------------------------------------------------
// Application routes
// ---------------------------------------------------------------------------

/// Shared state of the running server.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub dispatcher: Dispatcher,
    pub store: SessionStore,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, CoachError> {
        let dispatcher = Dispatcher::new(&config.inference)?;
        let store = new_session_store(config.server.max_views);
        Ok(Self { config: Arc::new(config), dispatcher, store })
    }
}

#[derive(Debug, Default, Deserialize)]
struct MountAnalysis {
    #[serde(default)]
    problem_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct SourceEdit {
    text: Option<String>,
    language: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChatInput {
    #[serde(default)]
    text: String,
}

/// Dispatch one parsed request to its handler.
pub async fn route(state: &AppState, req: &HttpRequest) -> HttpResponse {
    let segments: Vec<&str> = req.path.split('/').filter(|s| !s.is_empty()).collect();
    match (req.method.as_str(), segments.as_slice()) {
        ("GET", []) => HttpResponse::html(INDEX_HTML),
        ("GET", ["api", "languages"]) => HttpResponse::json(200, &LANGUAGES),
        ("POST", ["api", "analysis"]) => mount_analysis(state, &req.body).await,
        ("GET", ["api", "analysis", id]) => {
            with_analysis(&state.store, id, |v| AnalysisSnapshot::of(id, v))
                .map_or_else(HttpResponse::not_found, |s| HttpResponse::json(200, &s))
        }
        ("PUT", ["api", "analysis", id, "source"]) => edit_source(state, id, &req.body),
        ("POST", ["api", "analysis", id, "run"]) => run_analysis(state, id).await,
        ("POST", ["api", "chat"]) => {
            let view = ChatView::from_config(&state.config);
            match insert_chat(&state.store, view) {
                Some(id) => with_chat(&state.store, &id, |v| ChatSnapshot::of(&id, v))
                    .map_or_else(HttpResponse::not_found, |s| HttpResponse::json(200, &s)),
                None => HttpResponse::error(503, "too many views in flight"),
            }
        }
        ("GET", ["api", "chat", id]) => with_chat(&state.store, id, |v| ChatSnapshot::of(id, v))
            .map_or_else(HttpResponse::not_found, |s| HttpResponse::json(200, &s)),
        ("POST", ["api", "chat", id, "toggle"]) => with_chat(&state.store, id, |v| {
            v.toggle();
            ChatSnapshot::of(id, v)
        })
        .map_or_else(HttpResponse::not_found, |s| HttpResponse::json(200, &s)),
        ("POST", ["api", "chat", id, "messages"]) => send_chat(state, id, &req.body).await,
        (_, ["api", ..]) | ("GET", _) => HttpResponse::not_found(),
        _ => HttpResponse::error(405, "method not allowed"),
    }
}

async fn mount_analysis(state: &AppState, body: &[u8]) -> HttpResponse {
    let input: MountAnalysis = match parse_body(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let problems = match ProblemSet::load(&state.config.dataset.source).await {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "failed to load problem dataset");
            return HttpResponse::error(503, "problem dataset unavailable");
        }
    };
    let view = AnalysisView::mount(
        input.problem_id,
        state.config.inference.analysis_model.clone(),
        &problems,
    );
    if !view.is_ready() {
        return HttpResponse::error(404, "problem not found");
    }
    match insert_analysis(&state.store, view) {
        Some(id) => with_analysis(&state.store, &id, |v| AnalysisSnapshot::of(&id, v))
            .map_or_else(HttpResponse::not_found, |s| HttpResponse::json(200, &s)),
        None => HttpResponse::error(503, "too many views in flight"),
    }
}

fn edit_source(state: &AppState, id: &str, body: &[u8]) -> HttpResponse {
    let edit: SourceEdit = match parse_body(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let result = with_analysis(&state.store, id, |v| {
        if let Some(lang) = &edit.language {
            if v.select_language(lang).is_none() {
                return Err(HttpResponse::error(400, "unknown language"));
            }
        }
        if let Some(text) = &edit.text {
            v.set_source(text.clone());
        }
        Ok(AnalysisSnapshot::of(id, v))
    });
    match result {
        None => HttpResponse::not_found(),
        Some(Err(resp)) => resp,
        Some(Ok(snapshot)) => HttpResponse::json(200, &snapshot),
    }
}

async fn run_analysis(state: &AppState, id: &str) -> HttpResponse {
    let pending = match with_analysis(&state.store, id, |v| v.begin_analysis()) {
        None => return HttpResponse::not_found(),
        Some(Err(AnalyzeRejected::NotReady)) => return HttpResponse::error(409, "problem not loaded"),
        Some(Err(AnalyzeRejected::InFlight)) => return HttpResponse::error(409, "analysis already running"),
        Some(Ok(p)) => p,
    };
    let outcome = state.dispatcher.send(&pending).await;
    with_analysis(&state.store, id, |v| {
        v.complete_analysis(outcome);
        AnalysisSnapshot::of(id, v)
    })
    .map_or_else(HttpResponse::not_found, |s| HttpResponse::json(200, &s))
}

async fn send_chat(state: &AppState, id: &str, body: &[u8]) -> HttpResponse {
    let input: ChatInput = match parse_body(body) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let pending = match with_chat(&state.store, id, |v| {
        if v.loading() {
            // Keep the widget's own input untouched while a reply is pending.
            return Err(SendRejected::InFlight);
        }
        v.set_input(input.text);
        v.begin_send()
    }) {
        None => return HttpResponse::not_found(),
        Some(Err(SendRejected::EmptyInput)) => return HttpResponse::error(400, "message is empty"),
        Some(Err(SendRejected::InFlight)) => return HttpResponse::error(409, "a reply is still pending"),
        Some(Ok(p)) => p,
    };
    let outcome = state.dispatcher.send(&pending).await;
    with_chat(&state.store, id, |v| {
        v.complete_send(outcome);
        ChatSnapshot::of(id, v)
    })
    .map_or_else(HttpResponse::not_found, |s| HttpResponse::json(200, &s))
}

async fn handle_connection(mut stream: tokio::net::TcpStream, state: AppState) -> Result<(), CoachError> {
    let response = match read_request(&mut stream).await {
        Ok(Some(req)) => {
            debug!(method = %req.method, path = %req.path, "request");
            route(&state, &req).await
        }
        Ok(None) => return Ok(()),
        Err(CoachError::BadRequest(msg)) => HttpResponse::error(400, &msg),
        Err(e) => return Err(e),
    };
    stream.write_all(&response.to_bytes()).await?;
    Ok(())
}

/// Bind `127.0.0.1:port` and serve until the process is stopped.
pub async fn serve(config: AppConfig, port: u16) -> Result<(), CoachError> {
    let listener = TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    let state = AppState::new(config)?;

    info!(
        port,
        dataset = %state.config.dataset.source,
        endpoint = %state.dispatcher.endpoint(),
        "web UI listening"
    );
    eprintln!("{}", format!("  Web UI running at http://localhost:{}", port).bright_green());
    eprintln!("{}", "  Press Ctrl+C to stop.".bright_blue());

    loop {
        let (stream, addr) = listener.accept().await?;
        let state = state.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, state).await {
                warn!(peer = %addr, error = %e, "connection error");
            }
        });
    }
}
