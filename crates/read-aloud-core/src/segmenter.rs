//! Article discovery and sentence segmentation.
//!
//! The segmenter turns an HTML document into the ordered [`SentenceUnit`]
//! list the playback controller consumes. It runs once per content load.

use crate::config::AppConfig;
use crate::error::{ReadAloudError, Result};
use crate::sentence::{SentenceUnit, SourceRef};
use crate::text_utils::{clean_text, split_sentences, split_sentences_and_blank_lines};
use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, info, warn};

/// Selectors tried in order when no explicit content selector is configured.
pub const ARTICLE_CANDIDATES: &[&str] = &[
    "article",
    "main",
    "[role=\"main\"]",
    ".article-content",
    ".article-body",
    ".post-content",
    ".entry-content",
    ".content-area",
    ".page-content",
    ".single-content",
    "#content",
    "#article",
    "#post-content",
];

/// Elements whose contents are never rendered as text.
const NON_RENDERED_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Blocks shorter than this are decoration (bullets, stray glyphs).
const MIN_BLOCK_CHARS: usize = 2;

#[derive(Debug, Clone)]
pub struct Segmenter {
    selector: Option<String>,
    block_selector: String,
    min_article_chars: usize,
}

impl Segmenter {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            selector: Some(config.content_selector.trim().to_string()).filter(|s| !s.is_empty()),
            block_selector: config.block_selector.clone(),
            min_article_chars: config.min_article_chars,
        }
    }

    pub fn with_selector(mut self, selector: Option<String>) -> Self {
        if let Some(selector) = selector.filter(|s| !s.trim().is_empty()) {
            self.selector = Some(selector);
        }
        self
    }

    /// Segment a full HTML document. Fails with `NoContentFound` when no
    /// article root can be located or it yields no sentences.
    pub fn segment_html(&self, html: &str) -> Result<Vec<SentenceUnit>> {
        let document = Html::parse_document(html);
        let root = self.find_article(&document).ok_or_else(|| {
            warn!(
                selector = self.selector.as_deref().unwrap_or("<auto>"),
                "No article content found"
            );
            ReadAloudError::NoContentFound
        })?;

        let sentences = self.segment(root)?;
        if sentences.is_empty() {
            warn!("Article root contained no sentences");
            return Err(ReadAloudError::NoContentFound);
        }
        info!(
            sentences = sentences.len(),
            paragraphs = sentences.iter().filter(|s| s.is_paragraph_start).count(),
            "Segmented article"
        );
        Ok(sentences)
    }

    /// Segment an already located article root.
    pub fn segment(&self, root: ElementRef<'_>) -> Result<Vec<SentenceUnit>> {
        let block_selector = parse_selector(&self.block_selector)?;
        let blocks: Vec<ElementRef<'_>> = root
            .select(&block_selector)
            .filter(|block| !inside_non_rendered(*block))
            .collect();

        if blocks.is_empty() {
            debug!("No text-bearing blocks; splitting raw article text");
            let raw = rendered_text(root);
            return Ok(split_sentences_and_blank_lines(&raw)
                .into_iter()
                .map(|text| clean_text(&text))
                .filter(|text| !text.is_empty())
                .enumerate()
                .map(|(idx, text)| SentenceUnit::new(text, None, idx == 0))
                .collect());
        }

        let mut sentences = Vec::new();
        for (ordinal, block) in blocks.into_iter().enumerate() {
            let text = clean_text(&rendered_text(block));
            if text.chars().count() < MIN_BLOCK_CHARS {
                continue;
            }
            let source_ref = SourceRef {
                ordinal,
                tag: block.value().name().to_string(),
            };
            let mut pieces = split_sentences(&text);
            if pieces.is_empty() {
                pieces.push(text);
            }
            for (idx, piece) in pieces.into_iter().enumerate() {
                sentences.push(SentenceUnit::new(piece, Some(source_ref.clone()), idx == 0));
            }
        }
        Ok(sentences)
    }

    fn find_article<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        if let Some(selector) = &self.selector {
            let parsed = match Selector::parse(selector) {
                Ok(parsed) => parsed,
                Err(err) => {
                    warn!(%selector, "Invalid content selector: {err}");
                    return None;
                }
            };
            return document.select(&parsed).next();
        }

        ARTICLE_CANDIDATES.iter().find_map(|candidate| {
            let parsed = Selector::parse(candidate).ok()?;
            let element = document.select(&parsed).next()?;
            let chars = rendered_text(element).trim().chars().count();
            if chars > self.min_article_chars {
                debug!(candidate, chars, "Selected article root");
                Some(element)
            } else {
                None
            }
        })
    }
}

/// Text a reader would see: every descendant text node except those under
/// script, style and similar elements.
fn rendered_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    push_rendered_text(element, &mut out);
    out
}

fn push_rendered_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    if !is_non_rendered(child) {
                        push_rendered_text(child, out);
                    }
                }
            }
            _ => {}
        }
    }
}

fn is_non_rendered(element: ElementRef<'_>) -> bool {
    NON_RENDERED_TAGS.contains(&element.value().name())
}

fn inside_non_rendered(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(is_non_rendered)
}

fn parse_selector(raw: &str) -> Result<Selector> {
    Selector::parse(raw).map_err(|err| {
        warn!(selector = raw, "Invalid block selector: {err}");
        ReadAloudError::NoContentFound
    })
}
