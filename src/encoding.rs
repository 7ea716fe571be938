//! Text-safe transport encodings for envelopes.

use anyhow::{Context, Result};
use base64::{Engine, engine::general_purpose::STANDARD};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Base64,
    Hex,
}

impl Encoding {
    /// Encodes raw envelope bytes. Output ends with a newline.
    pub fn encode(self, data: &[u8]) -> Vec<u8> {
        let mut text = match self {
            Encoding::Base64 => STANDARD.encode(data),
            Encoding::Hex => hex::encode(data),
        };
        text.push('\n');
        text.into_bytes()
    }

    /// Decodes encoded input, ignoring surrounding whitespace.
    pub fn decode(self, text: &[u8]) -> Result<Vec<u8>> {
        let text = text.trim_ascii();
        match self {
            Encoding::Base64 => STANDARD.decode(text).context("input is not valid base64"),
            Encoding::Hex => hex::decode(text).context("input is not valid hex"),
        }
    }
}
