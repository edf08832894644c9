//! Bencoding
//!
//! Dictionaries keep their keys in a `BTreeMap`, so encoded keys always come
//! out in the raw byte order the format requires.

use std::collections::BTreeMap;

/// A bencoded value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Integer(i64),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Dict(BTreeMap<Vec<u8>, Value>),
}

impl Value {
    /// Empty dictionary
    pub fn dict() -> Self {
        Value::Dict(BTreeMap::new())
    }

    /// Insert into a dictionary; no-op on other variants
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        if let Value::Dict(map) = self {
            map.insert(key.as_bytes().to_vec(), value.into());
        }
    }

    /// Look up a dictionary entry
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Dict(map) => map.get(key.as_bytes()),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Serialize to bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            Value::Integer(n) => {
                out.push(b'i');
                out.extend_from_slice(n.to_string().as_bytes());
                out.push(b'e');
            }
            Value::Bytes(bytes) => encode_bytes(bytes, out),
            Value::List(items) => {
                out.push(b'l');
                for item in items {
                    item.encode_into(out);
                }
                out.push(b'e');
            }
            Value::Dict(map) => {
                out.push(b'd');
                for (key, value) in map {
                    encode_bytes(key, out);
                    value.encode_into(out);
                }
                out.push(b'e');
            }
        }
    }
}

fn encode_bytes(bytes: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(bytes.len().to_string().as_bytes());
    out.push(b':');
    out.extend_from_slice(bytes);
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Integer(i64::try_from(n).unwrap_or(i64::MAX))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Bytes(s.as_bytes().to_vec())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Bytes(s.into_bytes())
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Parse one complete bencoded value
///
/// Trailing bytes after the value are an error.
pub fn decode(input: &[u8]) -> Result<Value, String> {
    let mut parser = Parser { input, pos: 0 };
    let value = parser.value()?;
    if parser.pos != input.len() {
        return Err(format!("trailing data at offset {}", parser.pos));
    }
    Ok(value)
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn value(&mut self) -> Result<Value, String> {
        match self.peek() {
            Some(b'i') => {
                self.pos += 1;
                let digits = self.until(b'e')?;
                let n = digits
                    .parse::<i64>()
                    .map_err(|_| format!("bad integer '{}' at offset {}", digits, self.pos))?;
                Ok(Value::Integer(n))
            }
            Some(b'l') => {
                self.pos += 1;
                let mut items = Vec::new();
                while self.peek() != Some(b'e') {
                    items.push(self.value()?);
                }
                self.pos += 1;
                Ok(Value::List(items))
            }
            Some(b'd') => {
                self.pos += 1;
                let mut map = BTreeMap::new();
                while self.peek() != Some(b'e') {
                    let key = self.bytes()?;
                    let value = self.value()?;
                    map.insert(key, value);
                }
                self.pos += 1;
                Ok(Value::Dict(map))
            }
            Some(b'0'..=b'9') => Ok(Value::Bytes(self.bytes()?)),
            Some(other) => Err(format!("unexpected byte 0x{:02x} at offset {}", other, self.pos)),
            None => Err("unexpected end of input".to_string()),
        }
    }

    fn bytes(&mut self) -> Result<Vec<u8>, String> {
        let len_text = self.until(b':')?;
        let len: usize = len_text
            .parse()
            .map_err(|_| format!("bad string length '{}'", len_text))?;
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.input.len())
            .ok_or_else(|| "string runs past end of input".to_string())?;
        let bytes = self.input[self.pos..end].to_vec();
        self.pos = end;
        Ok(bytes)
    }

    /// Text up to (not including) `terminator`; consumes the terminator
    fn until(&mut self, terminator: u8) -> Result<String, String> {
        let rest = &self.input[self.pos..];
        let idx = rest
            .iter()
            .position(|&b| b == terminator)
            .ok_or_else(|| "unexpected end of input".to_string())?;
        let text = String::from_utf8_lossy(&rest[..idx]).into_owned();
        self.pos += idx + 1;
        Ok(text)
    }
}
