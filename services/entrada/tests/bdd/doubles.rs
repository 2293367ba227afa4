//! Test doubles for the HTTP API and the real-time hub

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use entrada::hub::{Hub, HubMessage};
use entrada::io::{HttpClient, HttpResponse};
use serde_json::{json, Value};

/// Serves product records and image payloads from in-memory tables
#[derive(Debug, Default, Clone)]
pub struct FakeCatalog {
    products: Arc<Mutex<HashMap<String, String>>>,
    images: Arc<Mutex<HashMap<String, String>>>,
    pub requests: Arc<Mutex<Vec<String>>>,
}

impl FakeCatalog {
    pub fn add_product(&self, epc: &str, name: &str, print_card: &str) {
        let body = json!({
            "fecha": "2024-03-11",
            "area": "PT",
            "claveProducto": format!("CLV-{}", epc),
            "nombreProducto": name,
            "pesoNeto": 498.5,
            "piezas": 1200,
            "uom": "PZA",
            "fechaEntrada": "2024-03-11T08:15:00",
            "productPrintCard": print_card,
        });
        self.products
            .lock()
            .unwrap()
            .insert(epc.to_string(), body.to_string());
    }

    pub fn add_image(&self, print_card: &str, payload: &str) {
        let body = json!({ "imageBase64": payload });
        self.images
            .lock()
            .unwrap()
            .insert(print_card.to_string(), body.to_string());
    }

    fn respond(&self, url: &str) -> HttpResponse {
        if let Some((_, epc)) = url.split_once("/api/socket/") {
            return match self.products.lock().unwrap().get(epc) {
                Some(body) => HttpResponse {
                    status: 200,
                    body: body.clone(),
                },
                None => HttpResponse {
                    status: 404,
                    body: "Not Found".to_string(),
                },
            };
        }

        if let Some((_, print_card)) = url.split_once("/api/Image/") {
            let body = self
                .images
                .lock()
                .unwrap()
                .get(print_card)
                .cloned()
                .unwrap_or_else(|| "{}".to_string());
            return HttpResponse { status: 200, body };
        }

        HttpResponse {
            status: 404,
            body: "Not Found".to_string(),
        }
    }
}

#[async_trait::async_trait]
impl HttpClient for FakeCatalog {
    async fn get(&self, url: &str) -> entrada::Result<HttpResponse> {
        self.requests.lock().unwrap().push(format!("GET {}", url));
        Ok(self.respond(url))
    }

    async fn post(&self, url: &str) -> entrada::Result<HttpResponse> {
        self.requests.lock().unwrap().push(format!("POST {}", url));
        Ok(HttpResponse {
            status: 404,
            body: "Not Found".to_string(),
        })
    }
}

/// A hub that replays announcements, then stays open, recording every call
#[derive(Debug)]
pub struct RecordingHub {
    calls: Mutex<Vec<String>>,
    script: Mutex<VecDeque<HubMessage>>,
    accept: bool,
    connected: AtomicBool,
}

impl RecordingHub {
    pub fn new(accept: bool, epcs: &[String]) -> Self {
        let script = epcs
            .iter()
            .map(|epc| HubMessage::Invocation {
                target: "sendEpc".to_string(),
                arguments: vec![json!({ "epc": epc })],
            })
            .collect();

        Self {
            calls: Mutex::new(Vec::new()),
            script: Mutex::new(script),
            accept,
            connected: AtomicBool::new(false),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl Hub for RecordingHub {
    async fn connect(&self) -> entrada::Result<()> {
        self.record("connect".to_string());
        if !self.accept {
            return Err(entrada::EntradaError::Hub("connection refused".to_string()));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn invoke(&self, method: &str, arguments: Vec<Value>) -> entrada::Result<()> {
        let args: Vec<&str> = arguments.iter().filter_map(Value::as_str).collect();
        self.record(format!("{} {}", method, args.join(" ")));
        Ok(())
    }

    async fn ping(&self) -> entrada::Result<()> {
        Ok(())
    }

    async fn next_message(&self) -> Option<HubMessage> {
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(message) => Some(message),
            None => std::future::pending().await,
        }
    }

    async fn close(&self) -> entrada::Result<()> {
        self.record("close".to_string());
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}
