use std::io::Cursor;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use serde_json::Value;

pub const API_TOKEN: &str = "test-token";

#[derive(Debug, Clone, Copy)]
pub enum LlmBehavior {
    /// One bullet block per catalogue page, keyed on the page heading.
    Books,
    /// Every completion request fails with 503.
    Unavailable,
}

/// Serves two catalogue pages, a cover image, a chat completion endpoint and a
/// captioning endpoint from a single local server.
pub struct CatalogueStub {
    pub base_url: String,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

const PAGE_ONE: &str = r#"<!doctype html>
<html>
  <head><title>All products | Books to Scrape</title></head>
  <body>
    <h1>ALPHAPAGE</h1>
    <ol class="row">
      <li><article class="product_pod">
        <h3><a href="catalogue/a-light-in-the-attic_1000/index.html" title="A Light in the Attic">A Light in the ...</a></h3>
        <p class="star-rating Three"></p>
        <div class="product_price"><p class="price_color">£51.77</p></div>
      </article></li>
    </ol>
  </body>
</html>
"#;

const PAGE_TWO: &str = r#"<!doctype html>
<html>
  <head><title>All products | Books to Scrape</title></head>
  <body>
    <h1>BETAPAGE</h1>
    <ol class="row">
      <li><article class="product_pod">
        <h3><a href="tipping-the-velvet_999/index.html" title="Tipping the Velvet">Tipping the Velvet</a></h3>
        <p class="star-rating One"></p>
        <div class="product_price"><p class="price_color">£53.74</p></div>
      </article></li>
    </ol>
  </body>
</html>
"#;

const PAGE_ONE_BOOKS: &str = "Here are the books I found:\n\n\
- Title: A Light in the Attic\n  \
Price: £51.77\n  \
Rating: Three\n  \
Availability: In stock\n  \
Cover: media/cover-1.png\n";

const PAGE_TWO_BOOKS: &str = "- Title: Tipping the Velvet\n  \
Price: £53.74\n  \
Rating: Not available\n  \
Availability: In stock\n  \
Cover: ../media/missing.png\n";

pub const COVER_CAPTION: &str = "a red square book cover";

fn cover_png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(4, 6, image::Rgb([180, 20, 20]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .expect("encode cover png");
    buf.into_inner()
}

impl CatalogueStub {
    pub fn spawn(behavior: LlmBehavior) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start catalogue stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}");
        let cover = cover_png();

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let path = request.url().to_string();
                let method = request.method().clone();

                let response = match (method, path.as_str()) {
                    (tiny_http::Method::Get, "/") => html_response(PAGE_ONE),
                    (tiny_http::Method::Get, "/catalogue/page-2.html") => html_response(PAGE_TWO),
                    (tiny_http::Method::Get, "/media/cover-1.png") => {
                        tiny_http::Response::from_data(cover.clone())
                            .with_header(header("Content-Type", "image/png"))
                    }
                    (tiny_http::Method::Post, "/v1/chat/completions") => {
                        completion_response(&mut request, behavior)
                    }
                    (tiny_http::Method::Post, "/models/test/captioner") => {
                        caption_response(&request)
                    }
                    _ => tiny_http::Response::from_string("not found").with_status_code(404),
                };

                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }
}

impl Drop for CatalogueStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn header(name: &str, value: &str) -> tiny_http::Header {
    tiny_http::Header::from_bytes(name.as_bytes(), value.as_bytes()).expect("build header")
}

fn html_response(body: &str) -> tiny_http::Response<Cursor<Vec<u8>>> {
    tiny_http::Response::from_string(body)
        .with_header(header("Content-Type", "text/html; charset=utf-8"))
}

fn json_response(body: &Value) -> tiny_http::Response<Cursor<Vec<u8>>> {
    tiny_http::Response::from_string(body.to_string())
        .with_header(header("Content-Type", "application/json"))
}

fn is_authorized(request: &tiny_http::Request) -> bool {
    let expected = format!("Bearer {API_TOKEN}");
    request
        .headers()
        .iter()
        .any(|h| h.field.equiv("Authorization") && h.value.as_str() == expected)
}

fn completion_response(
    request: &mut tiny_http::Request,
    behavior: LlmBehavior,
) -> tiny_http::Response<Cursor<Vec<u8>>> {
    if !is_authorized(request) {
        return json_response(&serde_json::json!({ "error": { "message": "unauthorized" } }))
            .with_status_code(401);
    }
    if matches!(behavior, LlmBehavior::Unavailable) {
        return json_response(&serde_json::json!({ "error": "Model is overloaded" }))
            .with_status_code(503);
    }

    let mut body = String::new();
    if request.as_reader().read_to_string(&mut body).is_err() {
        return tiny_http::Response::from_string("invalid request body").with_status_code(400);
    }
    let Ok(parsed) = serde_json::from_str::<Value>(&body) else {
        return tiny_http::Response::from_string("invalid json").with_status_code(400);
    };
    let prompt = parsed
        .pointer("/messages/0/content")
        .and_then(|v| v.as_str())
        .unwrap_or_default();

    let text = if prompt.contains("ALPHAPAGE") {
        PAGE_ONE_BOOKS
    } else if prompt.contains("BETAPAGE") {
        PAGE_TWO_BOOKS
    } else {
        return tiny_http::Response::from_string("unknown page").with_status_code(400);
    };

    json_response(&serde_json::json!({
        "id": "chatcmpl-stub",
        "object": "chat.completion",
        "model": parsed.get("model").cloned().unwrap_or(Value::String("stub-model".to_owned())),
        "choices": [
            {
                "index": 0,
                "message": { "role": "assistant", "content": text },
                "finish_reason": "stop"
            }
        ]
    }))
}

fn caption_response(request: &tiny_http::Request) -> tiny_http::Response<Cursor<Vec<u8>>> {
    if !is_authorized(request) {
        return tiny_http::Response::from_string("unauthorized").with_status_code(401);
    }
    let is_png = request
        .headers()
        .iter()
        .any(|h| h.field.equiv("Content-Type") && h.value.as_str() == "image/png");
    if !is_png {
        return tiny_http::Response::from_string("expected image/png").with_status_code(415);
    }
    json_response(&serde_json::json!([{ "generated_text": COVER_CAPTION }]))
}
