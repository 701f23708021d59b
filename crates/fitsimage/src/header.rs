//! Header cards and the ordered card sequence of a primary HDU.

use std::str;

use crate::block::{pad_to_block, BLOCK_SIZE, CARDS_PER_BLOCK, CARD_SIZE, HEADER_PAD_BYTE};
use crate::error::{Error, Result};
use crate::value::{check_text, check_value, format_value, parse_comment_only, parse_value};
use crate::value::{Value, VALUE_FIELD_LEN};

const END_KEYWORD: &[u8; 8] = b"END     ";
const BLANK_KEYWORD: &[u8; 8] = b"        ";

/// Turn a user-supplied keyword name into the padded 8-byte field.
///
/// Names are case-insensitive and stored upper-case. Returns `None` for an
/// empty name, a name longer than eight characters, or one containing
/// characters outside `A-Z 0-9 - _`.
pub fn keyword_field(name: &str) -> Option<[u8; 8]> {
    let name = name.trim();
    if name.is_empty() || name.len() > 8 {
        return None;
    }
    let mut field = *BLANK_KEYWORD;
    for (slot, b) in field.iter_mut().zip(name.bytes()) {
        let b = b.to_ascii_uppercase();
        if !matches!(b, b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_') {
            return None;
        }
        *slot = b;
    }
    Some(field)
}

/// One 80-column header record.
///
/// Cards read from a file remember their original text and are written back
/// unchanged until their value or comment is modified.
#[derive(Debug, Clone)]
pub struct Card {
    keyword: [u8; 8],
    value: Option<Value>,
    comment: Option<String>,
    image: Option<[u8; CARD_SIZE]>,
}

impl PartialEq for Card {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Card {
    /// Build a valued card. Fails if the keyword name is not a valid FITS name.
    pub fn new(name: &str, value: Value, comment: Option<&str>) -> Result<Card> {
        let keyword =
            keyword_field(name).ok_or_else(|| Error::Write(format!("invalid keyword name '{name}'")))?;
        check_value(&value)?;
        comment.map(check_text).transpose()?;
        Ok(Card {
            keyword,
            value: Some(value),
            comment: comment.map(String::from),
            image: None,
        })
    }

    /// Build a commentary card (`COMMENT`, `HISTORY` or blank keyword).
    pub fn commentary(keyword: [u8; 8], text: &str) -> Card {
        Card {
            keyword,
            value: None,
            comment: (!text.is_empty()).then(|| text.to_string()),
            image: None,
        }
    }

    /// A card whose 80 columns are all blank.
    pub fn blank() -> Card {
        Card::commentary(*BLANK_KEYWORD, "")
    }

    /// Keyword without trailing padding.
    pub fn keyword_str(&self) -> &str {
        let end = self
            .keyword
            .iter()
            .rposition(|&b| b != b' ')
            .map_or(0, |i| i + 1);
        str::from_utf8(&self.keyword[..end]).unwrap_or("")
    }

    /// The raw 8-byte keyword field.
    pub fn keyword(&self) -> &[u8; 8] {
        &self.keyword
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Returns `true` if this card is the END marker.
    pub fn is_end(&self) -> bool {
        &self.keyword == END_KEYWORD
    }

    /// Returns `true` for a blank card.
    ///
    /// Two definitions are accepted: the whole 80-column text is empty, or
    /// the keyword field is exactly eight spaces.
    pub fn is_blank(&self) -> bool {
        let text_empty = self.to_bytes().iter().all(|&b| b == b' ' || b == 0);
        text_empty || &self.keyword == BLANK_KEYWORD
    }

    /// Returns `true` if the card's keyword equals `field`.
    pub fn has_keyword(&self, field: &[u8; 8]) -> bool {
        &self.keyword == field
    }

    /// Replace the value, and the comment when one is given.
    ///
    /// Fails, leaving the card untouched, when the value does not fit the
    /// card or either text is not printable ASCII.
    pub fn set_value(&mut self, value: Value, comment: Option<&str>) -> Result<()> {
        check_value(&value)?;
        comment.map(check_text).transpose()?;
        self.value = Some(value);
        if let Some(c) = comment {
            self.comment = Some(c.to_string());
        }
        self.image = None;
        Ok(())
    }

    /// Render the card as 80 bytes.
    pub fn to_bytes(&self) -> [u8; CARD_SIZE] {
        if let Some(image) = self.image {
            return image;
        }
        let mut buf = [b' '; CARD_SIZE];
        buf[..8].copy_from_slice(&self.keyword);
        match (&self.value, &self.comment) {
            (Some(value), comment) => {
                buf[8] = b'=';
                buf[9] = b' ';
                let mut field = format_value(value);
                if let Some(c) = comment {
                    append_comment(&mut field, c);
                }
                buf[10..].copy_from_slice(&field);
            }
            (None, Some(text)) => {
                let bytes = text.as_bytes();
                let len = bytes.len().min(CARD_SIZE - 8);
                buf[8..8 + len].copy_from_slice(&bytes[..len]);
            }
            (None, None) => {}
        }
        buf
    }
}

/// Write ` / comment` after the value content of a formatted field,
/// truncating the comment to the remaining space.
fn append_comment(field: &mut [u8; VALUE_FIELD_LEN], comment: &str) {
    let content_end = field
        .iter()
        .rposition(|&b| b != b' ')
        .map_or(0, |i| i + 1)
        .max(20);
    let start = content_end + 3;
    if start >= VALUE_FIELD_LEN {
        return;
    }
    field[content_end + 1] = b'/';
    let bytes = comment.as_bytes();
    let len = bytes.len().min(VALUE_FIELD_LEN - start);
    field[start..start + len].copy_from_slice(&bytes[..len]);
}

/// Parse a single 80-byte card.
///
/// Cards with non-standard keywords are kept as opaque text rather than
/// rejected, so they survive a read-modify-write cycle.
pub fn parse_card(bytes: &[u8; CARD_SIZE]) -> Card {
    let mut keyword = [b' '; 8];
    keyword.copy_from_slice(&bytes[..8]);

    let standard = keyword
        .iter()
        .all(|b| matches!(b, b'A'..=b'Z' | b'0'..=b'9' | b' ' | b'-' | b'_'));
    let commentary = matches!(&keyword, b"COMMENT " | b"HISTORY " | b"        ");

    let (value, comment) = if standard && !commentary && &bytes[8..10] == b"= " {
        match parse_value(&bytes[10..]) {
            Some((value, comment)) => (Some(value), comment),
            None => (None, parse_comment_only(&bytes[10..])),
        }
    } else {
        let text = String::from_utf8_lossy(&bytes[8..]);
        let text = text.trim_end();
        (None, (!text.is_empty()).then(|| text.to_string()))
    };

    Card {
        keyword,
        value,
        comment,
        image: Some(*bytes),
    }
}

/// The 80-byte END card.
pub fn end_card() -> [u8; CARD_SIZE] {
    let mut buf = [b' '; CARD_SIZE];
    buf[..3].copy_from_slice(b"END");
    buf
}

/// Ordered header cards of one HDU.
///
/// The END marker is never stored in the sequence; [`Header::serialize`]
/// appends exactly one, so the header always ends with a single END card no
/// matter how cards were inserted or deleted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    cards: Vec<Card>,
}

impl Header {
    pub fn new() -> Header {
        Header::default()
    }

    /// Build a header from cards, discarding any END markers among them.
    pub fn from_cards(cards: Vec<Card>) -> Header {
        Header {
            cards: cards.into_iter().filter(|c| !c.is_end()).collect(),
        }
    }

    /// Parse header blocks from the start of `data`.
    ///
    /// Returns the header and the number of bytes it occupies, always a
    /// multiple of [`BLOCK_SIZE`].
    pub fn parse(data: &[u8]) -> Result<(Header, usize)> {
        if data.len() < BLOCK_SIZE {
            return Err(Error::InvalidHeader("shorter than one header block"));
        }
        let mut cards = Vec::new();
        for (block_idx, block) in data.chunks_exact(BLOCK_SIZE).enumerate() {
            for raw in block.chunks_exact(CARD_SIZE) {
                let mut bytes = [0u8; CARD_SIZE];
                bytes.copy_from_slice(raw);
                let card = parse_card(&bytes);
                if card.is_end() {
                    return Ok((Header { cards }, (block_idx + 1) * BLOCK_SIZE));
                }
                cards.push(card);
            }
        }
        Err(Error::InvalidHeader("END card not found"))
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    /// First card with the given keyword (case-insensitive).
    pub fn find(&self, name: &str) -> Option<&Card> {
        self.position(name).map(|i| &self.cards[i])
    }

    /// Index of the first card with the given keyword (case-insensitive).
    pub fn position(&self, name: &str) -> Option<usize> {
        let field = keyword_field(name)?;
        self.cards.iter().position(|c| c.has_keyword(&field))
    }

    /// Update the first card named `name`, or append a new card.
    ///
    /// On update, a `None` comment keeps the existing comment.
    pub fn set(&mut self, name: &str, value: Value, comment: Option<&str>) -> Result<()> {
        match self.position(name) {
            Some(i) => self.cards[i].set_value(value, comment),
            None => {
                self.cards.push(Card::new(name, value, comment)?);
                Ok(())
            }
        }
    }

    /// Append a card at the end of the header.
    pub fn push(&mut self, card: Card) {
        if !card.is_end() {
            self.cards.push(card);
        }
    }

    /// Insert a card at `index` (clamped to the current length).
    pub fn insert(&mut self, index: usize, card: Card) {
        if !card.is_end() {
            let index = index.min(self.cards.len());
            self.cards.insert(index, card);
        }
    }

    /// Remove the first card named `name`. Returns whether one was removed.
    pub fn remove_first(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(i) => {
                self.cards.remove(i);
                true
            }
            None => false,
        }
    }

    /// Remove every card named `name`, returning how many were removed.
    pub fn remove_all(&mut self, name: &str) -> usize {
        match keyword_field(name) {
            Some(field) => self.sweep(|c| c.has_keyword(&field)),
            None => 0,
        }
    }

    /// Remove every blank card, returning how many were removed.
    pub fn remove_blank(&mut self) -> usize {
        self.sweep(Card::is_blank)
    }

    /// Keep the cards `doomed` rejects, rebuilding the sequence once.
    fn sweep(&mut self, doomed: impl Fn(&Card) -> bool) -> usize {
        let keep: Vec<usize> = (0..self.cards.len())
            .filter(|&i| !doomed(&self.cards[i]))
            .collect();
        let removed = self.cards.len() - keep.len();
        if removed > 0 {
            let mut old: Vec<Option<Card>> = std::mem::take(&mut self.cards)
                .into_iter()
                .map(Some)
                .collect();
            self.cards = keep.iter().filter_map(|&i| old[i].take()).collect();
            log::debug!("header sweep removed {removed} card(s)");
        }
        removed
    }

    /// Serialize as whole header blocks terminated by a single END card.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity((self.cards.len() / CARDS_PER_BLOCK + 1) * BLOCK_SIZE);
        for card in &self.cards {
            buf.extend_from_slice(&card.to_bytes());
        }
        buf.extend_from_slice(&end_card());
        pad_to_block(&mut buf, HEADER_PAD_BYTE);
        buf
    }
}
