//! Minimal ABI encoding and decoding for vault reads.
//!
//! The vault facets only return tuples of static words, strings, `bytes`
//! and `bytes32[]`, so a small cursor-based reader covers everything
//! without pulling in a full ABI library. Dynamic fields are encoded as a
//! head word holding an offset relative to the enclosing tuple; a nested
//! [`AbiReader`] follows that offset.

/// Error type for malformed ABI payloads.
#[derive(Debug, thiserror::Error)]
pub enum AbiError {
    /// An offset or length points past the end of the payload.
    #[error("ABI data truncated at byte {0}")]
    Truncated(usize),

    /// A string field held invalid UTF-8.
    #[error("ABI string is not valid UTF-8")]
    InvalidUtf8,
}

/// Build `eth_call` data: 4-byte selector followed by 32-byte argument words.
pub fn call_data(selector: [u8; 4], args: &[[u8; 32]]) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + args.len() * 32);
    data.extend_from_slice(&selector);
    for arg in args {
        data.extend_from_slice(arg);
    }
    data
}

/// Encode a `uint256` argument word.
pub fn uint_word(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Sequential reader over an ABI-encoded tuple.
///
/// Static fields consume one head word each; dynamic fields read an offset
/// from the head and dereference it relative to `base`.
pub struct AbiReader<'a> {
    data: &'a [u8],
    base: usize,
    cursor: usize,
}

impl<'a> AbiReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            base: 0,
            cursor: 0,
        }
    }

    fn word_at(&self, pos: usize) -> Result<&'a [u8], AbiError> {
        self.data
            .get(pos..pos + 32)
            .ok_or(AbiError::Truncated(pos))
    }

    fn next_word(&mut self) -> Result<&'a [u8], AbiError> {
        let word = self.word_at(self.base + self.cursor)?;
        self.cursor += 32;
        Ok(word)
    }

    fn word_to_usize(word: &[u8], pos: usize) -> Result<usize, AbiError> {
        if word[..24].iter().any(|&b| b != 0) {
            return Err(AbiError::Truncated(pos));
        }
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&word[24..]);
        usize::try_from(u64::from_be_bytes(bytes)).map_err(|_| AbiError::Truncated(pos))
    }

    /// Read a static unsigned integer (any `uintN`). Values beyond `u64`
    /// saturate; the registries never hold counters that large.
    pub fn uint(&mut self) -> Result<u64, AbiError> {
        let word = self.next_word()?;
        if word[..24].iter().any(|&b| b != 0) {
            return Ok(u64::MAX);
        }
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&word[24..]);
        Ok(u64::from_be_bytes(bytes))
    }

    pub fn bool(&mut self) -> Result<bool, AbiError> {
        Ok(self.next_word()?.iter().any(|&b| b != 0))
    }

    pub fn bytes32(&mut self) -> Result<[u8; 32], AbiError> {
        let word = self.next_word()?;
        let mut out = [0u8; 32];
        out.copy_from_slice(word);
        Ok(out)
    }

    /// Read an `address` as a lowercase `0x`-prefixed hex string.
    pub fn address(&mut self) -> Result<String, AbiError> {
        let word = self.next_word()?;
        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for byte in &word[12..] {
            out.push_str(&format!("{byte:02x}"));
        }
        Ok(out)
    }

    /// Follow a dynamic-field offset and return the payload bytes there.
    fn dynamic_bytes(&mut self) -> Result<&'a [u8], AbiError> {
        let pos = self.base + self.cursor;
        let offset = Self::word_to_usize(self.next_word()?, pos)?;
        let start = self.base + offset;
        let len = Self::word_to_usize(self.word_at(start)?, start)?;
        self.data
            .get(start + 32..start + 32 + len)
            .ok_or(AbiError::Truncated(start + 32))
    }

    pub fn bytes(&mut self) -> Result<Vec<u8>, AbiError> {
        Ok(self.dynamic_bytes()?.to_vec())
    }

    pub fn string(&mut self) -> Result<String, AbiError> {
        String::from_utf8(self.dynamic_bytes()?.to_vec()).map_err(|_| AbiError::InvalidUtf8)
    }

    pub fn bytes32_array(&mut self) -> Result<Vec<[u8; 32]>, AbiError> {
        let pos = self.base + self.cursor;
        let offset = Self::word_to_usize(self.next_word()?, pos)?;
        let start = self.base + offset;
        let len = Self::word_to_usize(self.word_at(start)?, start)?;
        let mut items = Vec::with_capacity(len);
        for i in 0..len {
            let word = self.word_at(start + 32 + i * 32)?;
            let mut item = [0u8; 32];
            item.copy_from_slice(word);
            items.push(item);
        }
        Ok(items)
    }

    /// Follow the offset of a dynamic tuple and return a reader positioned
    /// at its first field. Offsets inside the tuple are relative to it.
    pub fn tuple(&mut self) -> Result<AbiReader<'a>, AbiError> {
        let pos = self.base + self.cursor;
        let offset = Self::word_to_usize(self.next_word()?, pos)?;
        let base = self.base + offset;
        if base > self.data.len() {
            return Err(AbiError::Truncated(base));
        }
        Ok(AbiReader {
            data: self.data,
            base,
            cursor: 0,
        })
    }
}
