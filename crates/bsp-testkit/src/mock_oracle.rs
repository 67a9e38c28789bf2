//! Stateful mock of the Library of Babel HTTP surface.
//!
//! `search` assigns each page text a deterministic coordinate (derived
//! from its SHA-256) and remembers the mapping; `browse` serves the page
//! back, wrapped in the same markup the real service uses. Failure
//! injection knobs cover the retry paths.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use sha2::{Digest, Sha256};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use bsp_core::Coordinate;

#[derive(Debug, Default)]
struct OracleState {
    /// Coordinate key -> stored page text.
    pages: HashMap<String, String>,
    fail_searches: u32,
    fail_fetches: u32,
}

fn coordinate_key(c: &Coordinate) -> String {
    format!("{}:{}:{}:{}:{}", c.hexagon, c.wall, c.shelf, c.volume, c.page)
}

/// Derive the deterministic coordinate a page text "lives at".
#[must_use]
pub fn derived_coordinate(page_text: &str) -> Coordinate {
    let digest = Sha256::digest(page_text.as_bytes());
    Coordinate {
        hexagon: hex::encode(&digest[..12]),
        wall: digest[12] % 4 + 1,
        shelf: digest[13] % 5 + 1,
        volume: digest[14] % 32 + 1,
        page: (u16::from(digest[15]) | u16::from(digest[16]) << 8) % 410 + 1,
    }
}

struct SearchResponder {
    state: Arc<Mutex<OracleState>>,
}

impl Respond for SearchResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut state = self.state.lock().expect("oracle state poisoned");
        if state.fail_searches > 0 {
            state.fail_searches -= 1;
            return ResponseTemplate::new(503);
        }

        let Some(content) = form_field(&request.body, "content") else {
            return ResponseTemplate::new(400).set_body_string("missing content field");
        };

        let coordinate = derived_coordinate(&content);
        state.pages.insert(coordinate_key(&coordinate), content);

        let html = format!(
            "<html><body><div class=\"location\">\
             <a class=\"intext\" onclick=\"postform('{}','{}','{}','{}','{}')\">\
             exact match</a></div></body></html>",
            coordinate.hexagon, coordinate.wall, coordinate.shelf, coordinate.volume,
            coordinate.page
        );
        ResponseTemplate::new(200).set_body_string(html)
    }
}

struct BrowseResponder {
    state: Arc<Mutex<OracleState>>,
}

impl Respond for BrowseResponder {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let mut state = self.state.lock().expect("oracle state poisoned");
        if state.fail_fetches > 0 {
            state.fail_fetches -= 1;
            return ResponseTemplate::new(503);
        }

        let query: HashMap<String, String> = request
            .url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let key = format!(
            "{}:{}:{}:{}:{}",
            query.get("hex").map_or("", String::as_str),
            query.get("wall").map_or("", String::as_str),
            query.get("shelf").map_or("", String::as_str),
            query.get("volume").map_or("", String::as_str),
            query.get("page").map_or("", String::as_str),
        );

        match state.pages.get(&key) {
            Some(page) => {
                // The real service wraps the page body in display newlines.
                let mut wrapped = String::with_capacity(page.len() + page.len() / 80 + 1);
                for (i, c) in page.chars().enumerate() {
                    if i > 0 && i % 80 == 0 {
                        wrapped.push('\n');
                    }
                    wrapped.push(c);
                }
                ResponseTemplate::new(200).set_body_string(format!(
                    "<html><body><pre id=\"textblock\">{wrapped}</pre></body></html>"
                ))
            }
            None => ResponseTemplate::new(404).set_body_string("no such page"),
        }
    }
}

fn form_field(body: &[u8], name: &str) -> Option<String> {
    url::form_urlencoded::parse(body)
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

/// An in-process Library of Babel.
pub struct MockOracle {
    server: MockServer,
    state: Arc<Mutex<OracleState>>,
}

impl MockOracle {
    /// Start the mock service and mount both endpoints.
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let state = Arc::new(Mutex::new(OracleState::default()));

        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(SearchResponder {
                state: Arc::clone(&state),
            })
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/browse"))
            .respond_with(BrowseResponder {
                state: Arc::clone(&state),
            })
            .mount(&server)
            .await;

        Self { server, state }
    }

    /// Base URL to point a client at.
    #[must_use]
    pub fn base_url(&self) -> String {
        self.server.uri()
    }

    /// Make the next `n` search calls fail with 503.
    pub fn fail_next_searches(&self, n: u32) {
        self.state.lock().expect("oracle state poisoned").fail_searches = n;
    }

    /// Make the next `n` browse calls fail with 503.
    pub fn fail_next_fetches(&self, n: u32) {
        self.state.lock().expect("oracle state poisoned").fail_fetches = n;
    }

    /// Number of distinct pages stored so far.
    #[must_use]
    pub fn stored_page_count(&self) -> usize {
        self.state.lock().expect("oracle state poisoned").pages.len()
    }

    /// Corrupt the stored page at a coordinate: its payload is decoded,
    /// one byte is flipped, and the page is re-encoded in place. The
    /// result decodes cleanly but fails the chunk hash check.
    ///
    /// Returns whether a page was found to corrupt.
    pub fn corrupt_page(&self, coordinate: &Coordinate) -> bool {
        let mut state = self.state.lock().expect("oracle state poisoned");
        let Some(page) = state.pages.get_mut(&coordinate_key(coordinate)) else {
            return false;
        };
        let mut payload = bsp_codec::decode_page(page).expect("stored page decodes");
        if payload.is_empty() {
            payload.push(0xff);
        } else {
            payload[0] ^= 0xff;
        }
        *page = bsp_codec::encode_page(&payload).expect("tampered payload re-encodes");
        true
    }
}
