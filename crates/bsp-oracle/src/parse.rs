//! Defensive HTML extraction for the two oracle responses.
//!
//! The parser pulls out only the fields it needs and tolerates unrelated
//! markup changes; any deviation from the expected structure is a protocol
//! error.

use std::sync::OnceLock;

use regex::Regex;

use bsp_codec::is_alphabet_text;
use bsp_core::{Coordinate, PAGE_SIZE};

use crate::error::OracleError;

/// Coordinate embedded in the search result page:
/// `postform('hexagon','wall','shelf','volume','page')`.
fn postform_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"postform\('([0-9a-z]+)','(\d+)','(\d+)','(\d+)','(\d+)'\)")
            .expect("postform pattern is valid")
    })
}

/// Page body in the browse result: `<pre id="textblock">...</pre>`.
fn textblock_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)<pre[^>]*\bid="textblock"[^>]*>(.*?)</pre>"#)
            .expect("textblock pattern is valid")
    })
}

/// Extract the canonical coordinate from a search response.
///
/// # Errors
///
/// Returns [`OracleError::Protocol`] if the coordinate fragment is missing
/// or any field fails to parse into its domain.
pub fn parse_search_response(html: &str) -> Result<Coordinate, OracleError> {
    let captures = postform_regex()
        .captures(html)
        .ok_or_else(|| protocol("no coordinate found in search response"))?;

    let hexagon = &captures[1];
    let wall = parse_field(&captures[2], "wall")?;
    let shelf = parse_field(&captures[3], "shelf")?;
    let volume = parse_field(&captures[4], "volume")?;
    let page = parse_field(&captures[5], "page")?;

    Coordinate::new(hexagon, wall, shelf, volume, page).map_err(|e| protocol(&e.to_string()))
}

/// Extract the 3200-symbol page body from a browse response.
///
/// Newlines the service inserts for display are stripped before
/// validation.
///
/// # Errors
///
/// Returns [`OracleError::Protocol`] if the body is missing, has the wrong
/// length, or contains a non-alphabet symbol.
pub fn parse_browse_response(html: &str) -> Result<String, OracleError> {
    let captures = textblock_regex()
        .captures(html)
        .ok_or_else(|| protocol("no page body found in browse response"))?;

    let body: String = captures[1]
        .chars()
        .filter(|c| *c != '\n' && *c != '\r')
        .collect();

    if body.len() != PAGE_SIZE {
        return Err(protocol(&format!(
            "page body is {} symbols, expected {PAGE_SIZE}",
            body.len()
        )));
    }
    if !is_alphabet_text(&body) {
        return Err(protocol("page body contains non-alphabet symbols"));
    }
    Ok(body)
}

fn parse_field<T: std::str::FromStr>(raw: &str, name: &str) -> Result<T, OracleError> {
    raw.parse()
        .map_err(|_| protocol(&format!("coordinate field {name} out of range: {raw}")))
}

fn protocol(reason: &str) -> OracleError {
    OracleError::Protocol {
        reason: reason.to_string(),
    }
}
