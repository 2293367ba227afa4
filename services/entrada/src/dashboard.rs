//! Web dashboard with JSON API endpoints

use axum::extract::State;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::record::ProductEntry;
use crate::state::{ConnectionState, StateHandle};

/// Dashboard application state
#[derive(Clone)]
pub struct DashboardState {
    pub state: StateHandle,
}

/// Build the dashboard axum router
pub fn build_router(state: StateHandle) -> Router {
    let dashboard_state = DashboardState { state };

    let api = Router::new()
        .route("/api/entries", get(entries_handler))
        .route("/api/status", get(status_handler))
        .layer(CorsLayer::permissive());

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .merge(api)
        .with_state(dashboard_state)
}

/// Escape text for use inside HTML element content and quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn connection_colors(connection: ConnectionState) -> (&'static str, &'static str) {
    match connection {
        ConnectionState::Connected => ("#155724", "#d4edda"),
        ConnectionState::Disconnected => ("#721c24", "#f8d7da"),
        ConnectionState::Connecting => ("#383d41", "#e2e3e5"),
    }
}

fn render_card(entry: &ProductEntry) -> String {
    format!(
        r#"<div style="border: 1px solid #dee2e6; border-radius: 0.5rem; padding: 1rem; box-shadow: 0 1px 3px rgba(0,0,0,0.1);">
                <h3 style="margin: 0 0 0.5rem 0;">Producto: {}</h3>
                <p style="margin: 0.2rem 0;">Área: {}</p>
                <p style="margin: 0.2rem 0;">Clave Producto: {}</p>
                <p style="margin: 0.2rem 0;">Peso Neto: {}</p>
                <p style="margin: 0.2rem 0;">Piezas: {}</p>
                <p style="margin: 0.2rem 0;">Unidad de Medida: {}</p>
                <p style="margin: 0.2rem 0;">Fecha de Entrada: {}</p>
            </div>"#,
        escape_html(&entry.product_name),
        escape_html(&entry.area),
        escape_html(&entry.product_code),
        escape_html(&entry.net_weight),
        escape_html(&entry.pieces),
        escape_html(&entry.uom),
        escape_html(&entry.entry_date),
    )
}

fn render_image(entry: Option<&ProductEntry>) -> String {
    match entry {
        Some(entry) => format!(
            r#"<div style="text-align: center; margin-top: 1.5rem; padding: 0.5rem; box-shadow: 0 2px 6px rgba(0,0,0,0.2);">
                <img src="{}" alt="Imagen del Producto" style="max-width: 100%; height: auto; border-radius: 8px;">
            </div>"#,
            escape_html(&entry.image)
        ),
        None => String::new(),
    }
}

async fn index_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;

    let (color, bg) = connection_colors(state.connection);
    let cards: String = state.entries.iter().map(render_card).collect();
    let image = render_image(state.newest());

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Entradas de Almacén</title>
    <script>
        function esc(s) {{
            return String(s)
                .replace(/&/g, '&amp;')
                .replace(/</g, '&lt;')
                .replace(/>/g, '&gt;')
                .replace(/"/g, '&quot;')
                .replace(/'/g, '&#39;');
        }}
        function refreshData() {{
            fetch('/api/status')
                .then(r => r.json())
                .then(s => {{
                    const colors = {{
                        'connected': ['#155724', '#d4edda'],
                        'disconnected': ['#721c24', '#f8d7da'],
                    }};
                    const [color, bg] = colors[s.connection] || ['#383d41', '#e2e3e5'];
                    const badge = document.getElementById('connection');
                    badge.textContent = s.connection_label;
                    badge.style.color = color;
                    badge.style.backgroundColor = bg;
                    document.getElementById('counters').textContent =
                        `${{s.messages_received}} recibidos, ${{s.entries_added}} agregados, ${{s.messages_dropped}} descartados`;
                }});
            fetch('/api/entries')
                .then(r => r.json())
                .then(entries => {{
                    document.getElementById('entries').innerHTML = entries.map(e => `<div style="border: 1px solid #dee2e6; border-radius: 0.5rem; padding: 1rem; box-shadow: 0 1px 3px rgba(0,0,0,0.1);">
                        <h3 style="margin: 0 0 0.5rem 0;">Producto: ${{esc(e.product_name)}}</h3>
                        <p style="margin: 0.2rem 0;">Área: ${{esc(e.area)}}</p>
                        <p style="margin: 0.2rem 0;">Clave Producto: ${{esc(e.product_code)}}</p>
                        <p style="margin: 0.2rem 0;">Peso Neto: ${{esc(e.net_weight)}}</p>
                        <p style="margin: 0.2rem 0;">Piezas: ${{esc(e.pieces)}}</p>
                        <p style="margin: 0.2rem 0;">Unidad de Medida: ${{esc(e.uom)}}</p>
                        <p style="margin: 0.2rem 0;">Fecha de Entrada: ${{esc(e.entry_date)}}</p>
                    </div>`).join('');
                    document.getElementById('image').innerHTML = entries.length === 0 ? '' :
                        `<div style="text-align: center; margin-top: 1.5rem; padding: 0.5rem; box-shadow: 0 2px 6px rgba(0,0,0,0.2);">
                            <img src="${{esc(entries[0].image)}}" alt="Imagen del Producto" style="max-width: 100%; height: auto; border-radius: 8px;">
                        </div>`;
                }});
        }}
        setInterval(refreshData, 3000);
    </script>
</head>
<body style="font-family: system-ui, sans-serif; max-width: 1140px; margin: 0 auto; padding: 1rem;">
    <h1 style="text-align: center;">Entradas de Almacén</h1>
    <p style="text-align: center;">
        <span id="connection" style="display: inline-block; padding: 0.25em 0.6em; border-radius: 0.25rem; font-size: 0.85em; font-weight: 600; color: {color}; background-color: {bg};">{connection}</span>
        <span id="counters" style="margin-left: 0.5rem; color: #6c757d;">{received} recibidos, {added} agregados, {dropped} descartados</span>
    </p>
    <section id="entries" style="display: grid; grid-template-columns: repeat(auto-fill, minmax(300px, 1fr)); gap: 1.5rem;">{cards}</section>
    <section id="image">{image}</section>
</body>
</html>"#,
        color = color,
        bg = bg,
        connection = state.connection,
        received = state.messages_received,
        added = state.entries_added,
        dropped = state.messages_dropped,
        cards = cards,
        image = image,
    );

    Html(html)
}

async fn entries_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;
    let entries: Vec<ProductEntry> = state.entries.iter().cloned().collect();
    axum::Json(entries)
}

async fn status_handler(State(dashboard): State<DashboardState>) -> impl IntoResponse {
    let state = dashboard.state.read().await;

    axum::Json(serde_json::json!({
        "connection": state.connection,
        "connection_label": state.connection.to_string(),
        "messages_received": state.messages_received,
        "entries_added": state.entries_added,
        "messages_dropped": state.messages_dropped,
        "entries": state.entries.len(),
        "history_size": state.history_max_size,
        "uptime_seconds": state.started_at.elapsed().as_secs(),
    }))
}

async fn health_handler() -> impl IntoResponse {
    "OK"
}
