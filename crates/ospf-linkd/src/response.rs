//! Extraction of the CLI text block from a device reply.
//!
//! NETCONF devices wrap operational CLI output as
//! `<data><cli-oper-data-block><item><exec>..</exec><response>..</response></item></cli-oper-data-block></data>`.
//! One query should yield exactly one `<response>`; more than one is
//! tolerated and reported through [`ResponseBlock::section_count`].

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::error::{DiscoveryError, Result};

static OPER_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<cli-oper-data-block(?:\s[^>]*)?>(.*?)</cli-oper-data-block>")
        .expect("Invalid regex pattern")
});

static RESPONSE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<response(?:\s[^>]*)?>(.*?)</response>").expect("Invalid regex pattern")
});

static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(lt|gt|quot|apos|amp|#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6});")
        .expect("Invalid regex pattern")
});

static CDATA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\s*<!\[CDATA\[(.*)\]\]>\s*$").expect("Invalid regex pattern"));

/// Text block extracted from a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseBlock {
    /// Text of the first response section.
    pub text: String,
    /// Number of response sections found in the envelope.
    pub section_count: usize,
}

impl ResponseBlock {
    pub fn single(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            section_count: 1,
        }
    }

    /// True when the envelope carried more than one section.
    pub fn is_anomalous(&self) -> bool {
        self.section_count > 1
    }
}

/// Turns a raw session reply into the CLI text block it carries.
pub trait ResponseParser: Send + Sync {
    fn extract_block(&self, raw: &str) -> Result<ResponseBlock>;

    /// Extracts the block holding neighbor-table lines.
    fn extract_neighbor_block(&self, raw: &str) -> Result<ResponseBlock> {
        self.extract_block(raw)
    }
}

/// Parser for replies that are already bare CLI output.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextParser;

impl ResponseParser for PlainTextParser {
    fn extract_block(&self, raw: &str) -> Result<ResponseBlock> {
        Ok(ResponseBlock::single(raw.replace('\r', "")))
    }
}

/// Parser for NETCONF `<rpc-reply>` envelopes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetconfReplyParser;

impl ResponseParser for NetconfReplyParser {
    fn extract_block(&self, raw: &str) -> Result<ResponseBlock> {
        let raw = raw.replace('\r', "");

        let mut oper_blocks = OPER_BLOCK_RE
            .captures_iter(&raw)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .peekable();
        if oper_blocks.peek().is_none() {
            return Err(DiscoveryError::Response(
                "reply has no <cli-oper-data-block>".to_string(),
            ));
        }

        // sections are counted across every oper block of the envelope
        let mut sections = oper_blocks.flat_map(|block| {
            RESPONSE_RE
                .captures_iter(block)
                .filter_map(|c| c.get(1).map(|m| m.as_str()))
        });

        let first = sections.next().ok_or_else(|| {
            DiscoveryError::Response("reply has no <response> section".to_string())
        })?;
        let section_count = 1 + sections.count();

        let text = match cdata_body(first) {
            Some(body) => body.to_string(),
            None => unescape_xml(first).replace('\r', ""),
        };

        Ok(ResponseBlock {
            text,
            section_count,
        })
    }
}

/// Returns the body of a section wrapped in `<![CDATA[...]]>`.
fn cdata_body(text: &str) -> Option<&str> {
    CDATA_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Decodes the predefined XML entities and numeric character references
/// in one pass. Undecodable references are left as they are.
fn unescape_xml(text: &str) -> String {
    ENTITY_RE
        .replace_all(text, |caps: &Captures<'_>| {
            let entity = &caps[1];
            let decoded = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "amp" => Some('&'),
                _ => match entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                    Some(hex) => u32::from_str_radix(hex, 16).ok().and_then(char::from_u32),
                    None => entity
                        .strip_prefix('#')
                        .and_then(|dec| dec.parse::<u32>().ok())
                        .and_then(char::from_u32),
                },
            };
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}
