//! Prefix-code tables
//!
//! A [`CodeTable`] is the flat symbol-to-bits mapping derived from a Huffman tree.
//! It is the only artifact needed to decode a payload; the tree itself is dropped
//! after derivation. The placeholder leaf of a single-symbol tree is kept in its own
//! slot instead of borrowing a value from the `char` alphabet.

use crate::config::TableFormat;
use crate::error::CodecError;
use crate::frequency::FrequencyTable;
use crate::tree::{build_tree, Node, Symbol};
use bincode::Options;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Longest code a [`Code`] can hold.
pub const MAX_CODE_LEN: u32 = u64::BITS;

/// A codeword of up to 64 bits, stored right-aligned in `bits` with the first
/// emitted bit as the most significant of the `len` low bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Code {
    bits: u64,
    len: u32,
}

impl Code {
    pub const EMPTY: Code = Code { bits: 0, len: 0 };

    pub fn bits(&self) -> u64 {
        self.bits
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append one bit. Returns `None` once the code would exceed [`MAX_CODE_LEN`].
    pub fn push(self, bit: bool) -> Option<Self> {
        if self.len >= MAX_CODE_LEN {
            return None;
        }
        Some(Code {
            bits: (self.bits << 1) | bit as u64,
            len: self.len + 1,
        })
    }

    pub fn is_prefix_of(&self, other: &Code) -> bool {
        if self.len > other.len {
            return false;
        }
        let shift = other.len - self.len;
        // shift may be 64 only when self is empty
        shift == MAX_CODE_LEN || other.bits >> shift == self.bits
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in (0..self.len).rev() {
            let bit = if (self.bits >> i) & 1 == 1 { '1' } else { '0' };
            write!(f, "{}", bit)?;
        }
        Ok(())
    }
}

impl FromStr for Code {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.chars().try_fold(Code::EMPTY, |code, c| {
            let bit = match c {
                '0' => false,
                '1' => true,
                other => {
                    return Err(CodecError::InvalidTable(format!(
                        "unexpected character {:?} in code {:?}",
                        other, s
                    )))
                }
            };
            code.push(bit).ok_or_else(|| {
                CodecError::InvalidTable(format!("code {:?} exceeds {} bits", s, MAX_CODE_LEN))
            })
        })
    }
}

impl Serialize for Code {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Code {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Persisted shape of a [`CodeTable`]; validated on the way back in.
#[derive(Serialize, Deserialize)]
struct TableRepr {
    codes: BTreeMap<char, Code>,
    placeholder: Option<Code>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TableRepr", into = "TableRepr")]
pub struct CodeTable {
    codes: BTreeMap<char, Code>,
    placeholder: Option<Code>,
}

impl CodeTable {
    /// Count, build and derive in one step.
    pub fn build(freq: &FrequencyTable) -> Result<Self, CodecError> {
        let tree = build_tree(freq)?;
        Self::from_tree(&tree)
    }

    /// Depth-first walk: `0` on the left edge, `1` on the right edge.
    pub fn from_tree(root: &Node) -> Result<Self, CodecError> {
        if root.is_leaf() {
            return Err(CodecError::InvalidTable(
                "a bare leaf root has no well-defined code".into(),
            ));
        }
        let mut table = CodeTable {
            codes: BTreeMap::new(),
            placeholder: None,
        };
        table.assign(root, Code::EMPTY)?;
        debug!(
            symbols = table.codes.len(),
            placeholder = table.placeholder.is_some(),
            max_code_len = table.max_code_len(),
            "derived code table"
        );
        Ok(table)
    }

    fn assign(&mut self, node: &Node, prefix: Code) -> Result<(), CodecError> {
        match node {
            Node::Leaf { symbol, .. } => {
                match symbol {
                    Symbol::Char(c) => {
                        self.codes.insert(*c, prefix);
                    }
                    Symbol::Placeholder => self.placeholder = Some(prefix),
                }
                Ok(())
            }
            Node::Internal { left, right, .. } => {
                let too_deep = || {
                    CodecError::InvalidTable(format!("tree deeper than {} levels", MAX_CODE_LEN))
                };
                self.assign(left, prefix.push(false).ok_or_else(too_deep)?)?;
                self.assign(right, prefix.push(true).ok_or_else(too_deep)?)
            }
        }
    }

    pub fn get(&self, symbol: char) -> Option<Code> {
        self.codes.get(&symbol).copied()
    }

    pub fn placeholder(&self) -> Option<Code> {
        self.placeholder
    }

    /// Number of real symbols (the placeholder is not counted).
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, Code)> + '_ {
        self.codes.iter().map(|(&c, &code)| (c, code))
    }

    fn all_codes(&self) -> impl Iterator<Item = Code> + '_ {
        self.codes.values().copied().chain(self.placeholder)
    }

    pub fn max_code_len(&self) -> u32 {
        self.all_codes().map(|c| c.len()).max().unwrap_or(0)
    }

    /// Inverted mapping used by the unpacker.
    pub fn decode_map(&self) -> HashMap<Code, Symbol> {
        self.iter()
            .map(|(c, code)| (code, Symbol::Char(c)))
            .chain(self.placeholder.map(|code| (code, Symbol::Placeholder)))
            .collect()
    }

    /// Number of payload bits needed to encode a text with the given frequencies.
    pub fn encoded_bits(&self, freq: &FrequencyTable) -> Result<u64, CodecError> {
        freq.iter().try_fold(0u64, |acc, (c, n)| {
            let code = self.get(c).ok_or(CodecError::UnknownSymbol(c))?;
            Ok(acc + code.len() as u64 * n)
        })
    }

    /// Check the invariants a decodable table must hold.
    pub fn validate(&self) -> Result<(), CodecError> {
        if self.codes.is_empty() {
            return Err(CodecError::InvalidTable("no symbols".into()));
        }
        let mut codes: Vec<Code> = self.all_codes().collect();
        if codes.iter().any(Code::is_empty) {
            return Err(CodecError::InvalidTable("empty code".into()));
        }
        // after a lexicographic sort any prefix relation shows up between neighbours
        codes.sort_by_cached_key(|c| c.to_string());
        for pair in codes.windows(2) {
            if pair[0].is_prefix_of(&pair[1]) {
                return Err(CodecError::InvalidTable(format!(
                    "code {} is a prefix of {}",
                    pair[0], pair[1]
                )));
            }
        }
        Ok(())
    }

    pub fn serialize(&self, format: TableFormat) -> Result<Vec<u8>, CodecError> {
        let bytes = match format {
            TableFormat::Json => serde_json::to_vec(self)?,
            TableFormat::Bincode => bincode::serialize(self)?,
        };
        Ok(bytes)
    }

    /// Decode and validate a persisted table. Syntax errors surface as
    /// [`CodecError::Serialization`], invariant violations as [`CodecError::InvalidTable`].
    pub fn deserialize(bytes: &[u8], format: TableFormat) -> Result<Self, CodecError> {
        let repr: TableRepr = match format {
            TableFormat::Json => serde_json::from_slice(bytes)?,
            TableFormat::Bincode => bincode::DefaultOptions::new()
                .with_fixint_encoding()
                .reject_trailing_bytes()
                .deserialize(bytes)?,
        };
        CodeTable::try_from(repr)
    }

    /// Human-readable `{ "symbol": "bits" }` rendering of the real symbols.
    pub fn to_json_pretty(&self) -> Result<String, CodecError> {
        Ok(serde_json::to_string_pretty(&self.codes)?)
    }
}

impl TryFrom<TableRepr> for CodeTable {
    type Error = CodecError;

    fn try_from(repr: TableRepr) -> Result<Self, Self::Error> {
        let table = CodeTable {
            codes: repr.codes,
            placeholder: repr.placeholder,
        };
        table.validate()?;
        Ok(table)
    }
}

impl From<CodeTable> for TableRepr {
    fn from(table: CodeTable) -> Self {
        TableRepr {
            codes: table.codes,
            placeholder: table.placeholder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> Code {
        s.parse().unwrap()
    }

    #[test]
    fn test_code_parse_and_display() {
        let c = code("0110");
        assert_eq!(c.len(), 4);
        assert_eq!(c.bits(), 0b0110);
        assert_eq!(c.to_string(), "0110");
        assert!("012".parse::<Code>().is_err());
        assert!("0".repeat(65).parse::<Code>().is_err());
        assert_eq!("1".repeat(64).parse::<Code>().unwrap().bits(), u64::MAX);
    }

    #[test]
    fn test_code_prefix() {
        assert!(code("01").is_prefix_of(&code("011")));
        assert!(code("011").is_prefix_of(&code("011")));
        assert!(!code("01").is_prefix_of(&code("001")));
        assert!(!code("011").is_prefix_of(&code("01")));
        assert!(Code::EMPTY.is_prefix_of(&"1".repeat(64).parse().unwrap()));
    }

    #[test]
    fn test_single_symbol_table() {
        let table = CodeTable::build(&FrequencyTable::count("aaaa")).unwrap();
        assert_eq!(table.get('a'), Some(code("0")));
        assert_eq!(table.placeholder(), Some(code("1")));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_abracadabra_code_lengths() {
        let table = CodeTable::build(&FrequencyTable::count("abracadabra")).unwrap();
        let len = |c| table.get(c).unwrap().len();
        assert_eq!(len('a'), 1);
        assert!(len('c') >= len('b'));
        assert!(len('d') >= len('r'));
        assert_eq!(len('c'), table.max_code_len());
        assert_eq!(len('d'), table.max_code_len());
        assert!(table.placeholder().is_none());
        table.validate().unwrap();
    }

    #[test]
    fn test_encoded_bits() {
        let freq = FrequencyTable::count("abracadabra");
        let table = CodeTable::build(&freq).unwrap();
        let expected: u64 = "abracadabra"
            .chars()
            .map(|c| table.get(c).unwrap().len() as u64)
            .sum();
        assert_eq!(table.encoded_bits(&freq).unwrap(), expected);
        assert!(matches!(
            table.encoded_bits(&FrequencyTable::count("z")),
            Err(CodecError::UnknownSymbol('z'))
        ));
    }

    #[test]
    fn test_bare_leaf_rejected() {
        let leaf = Node::leaf(Symbol::Char('a'), 3);
        assert!(matches!(
            CodeTable::from_tree(&leaf),
            Err(CodecError::InvalidTable(_))
        ));
    }

    #[test]
    fn test_json_roundtrip() {
        let table = CodeTable::build(&FrequencyTable::count("hello, world")).unwrap();
        let bytes = table.serialize(TableFormat::Json).unwrap();
        let back = CodeTable::deserialize(&bytes, TableFormat::Json).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn test_bincode_roundtrip_keeps_placeholder() {
        let table = CodeTable::build(&FrequencyTable::count("zzz")).unwrap();
        let bytes = table.serialize(TableFormat::Bincode).unwrap();
        let back = CodeTable::deserialize(&bytes, TableFormat::Bincode).unwrap();
        assert_eq!(back, table);
        assert_eq!(back.placeholder(), Some(code("1")));
    }

    #[test]
    fn test_json_is_key_value_text() {
        let table = CodeTable::build(&FrequencyTable::count("aaaa")).unwrap();
        let json = String::from_utf8(table.serialize(TableFormat::Json).unwrap()).unwrap();
        assert_eq!(json, r#"{"codes":{"a":"0"},"placeholder":"1"}"#);
        assert_eq!(table.to_json_pretty().unwrap(), "{\n  \"a\": \"0\"\n}");
    }

    #[test]
    fn test_deserialize_rejects_prefix_clash() {
        let json = br#"{"codes":{"a":"0","b":"01"},"placeholder":null}"#;
        let err = CodeTable::deserialize(json, TableFormat::Json).unwrap_err();
        assert!(matches!(err, CodecError::InvalidTable(_)));
        assert!(err.to_string().contains("prefix"));
    }

    #[test]
    fn test_deserialize_syntax_error_is_serialization() {
        let err = CodeTable::deserialize(b"{\"codes\":", TableFormat::Json).unwrap_err();
        assert!(matches!(err, CodecError::Serialization(_)));
        let err = CodeTable::deserialize(br#"{"codes":{"a":"2"},"placeholder":null}"#, TableFormat::Json)
            .unwrap_err();
        assert!(matches!(err, CodecError::Serialization(_)));
    }

    #[test]
    fn test_bincode_rejects_trailing_bytes() {
        let table = CodeTable::build(&FrequencyTable::count("abc")).unwrap();
        let mut bytes = table.serialize(TableFormat::Bincode).unwrap();
        bytes.extend_from_slice(&[0xde, 0xad]);
        let err = CodeTable::deserialize(&bytes, TableFormat::Bincode).unwrap_err();
        assert!(matches!(err, CodecError::Serialization(_)));
    }

    #[test]
    fn test_invalid_bincode_table_is_invalid_table() {
        // bincode of a table with a duplicated code
        let mut codes = BTreeMap::new();
        codes.insert('a', code("0"));
        codes.insert('b', code("0"));
        let bytes = bincode::serialize(&TableRepr {
            codes,
            placeholder: None,
        })
        .unwrap();
        let err = CodeTable::deserialize(&bytes, TableFormat::Bincode).unwrap_err();
        assert!(matches!(err, CodecError::InvalidTable(_)));
    }

    #[test]
    fn test_deserialize_rejects_bad_tables() {
        for json in [
            r#"{"codes":{},"placeholder":null}"#,
            r#"{"codes":{"a":""},"placeholder":null}"#,
            r#"{"codes":{"a":"0","b":"0"},"placeholder":null}"#,
            r#"{"codes":{"a":"0"},"placeholder":"0"}"#,
        ] {
            let result = CodeTable::deserialize(json.as_bytes(), TableFormat::Json);
            assert!(
                matches!(result, Err(CodecError::InvalidTable(_))),
                "{} gave {:?}",
                json,
                result
            );
        }
    }

    #[test]
    fn test_decode_map_inverts_table() {
        let table = CodeTable::build(&FrequencyTable::count("aab")).unwrap();
        let inverse = table.decode_map();
        assert_eq!(inverse.len(), 2);
        for (c, code) in table.iter() {
            assert_eq!(inverse[&code], Symbol::Char(c));
        }
    }
}
