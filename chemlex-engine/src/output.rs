//! Output trees handed to structure builders

use chemlex_core::{TokenNode, WordRole};
use serde::{Deserialize, Serialize};

/// One fully annotated interpretation of a name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputTree {
    /// The parsed name
    pub name: String,
    /// Word rule that segmented it
    pub rule: String,
    /// Words in order
    pub words: Vec<WordNode>,
}

impl OutputTree {
    /// Total number of nodes: words, chunks, tokens and literal text nodes
    pub fn node_count(&self) -> usize {
        self.words.iter().map(WordNode::node_count).sum()
    }
}

/// One word of an interpretation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordNode {
    /// Role assigned by the word rule
    pub role: WordRole,
    /// Word text as segmented
    pub text: String,
    /// Literal text or tokenized chunks
    pub content: WordContent,
}

impl WordNode {
    fn node_count(&self) -> usize {
        1 + match &self.content {
            WordContent::Text(_) => 1,
            WordContent::Chunks(chunks) => chunks.iter().map(|c| 1 + c.tokens.len()).sum(),
        }
    }

    /// Chunks of a tokenized word; empty for literal words
    pub fn chunks(&self) -> &[ChunkNode] {
        match &self.content {
            WordContent::Text(_) => &[],
            WordContent::Chunks(chunks) => chunks,
        }
    }
}

/// Literal words carry their text; all others carry chunks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WordContent {
    /// Literal word, kept verbatim
    Text(String),
    /// Tokenized word
    Chunks(Vec<ChunkNode>),
}

/// Role of a chunk within its word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChunkKind {
    /// A linking unit attached to something else
    Substituent,
    /// The principal unit of a full word
    Head,
}

/// Tokens between two boundary symbols
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkNode {
    /// Linking unit or head
    pub kind: ChunkKind,
    /// Emitted tokens; suppressed ones are absent
    pub tokens: Vec<TokenNode>,
}

impl ChunkNode {
    /// Concatenated token text
    pub fn text(&self) -> String {
        self.tokens.iter().map(|t| t.text.as_str()).collect()
    }
}
