// lzw.rs
//
// Copyright (c) 2020-2026  Douglas Lau
//
//! Lempel-Ziv-Welch compression for GIF
use crate::error::{Error, Result};
use std::cmp::Ordering;
use std::ops::AddAssign;

/// Code Bits
#[derive(Clone, Copy, Debug, PartialEq)]
struct Bits(u8);

impl From<u8> for Bits {
    fn from(bits: u8) -> Self {
        Bits(bits.min(Self::MAX.0))
    }
}

impl From<Bits> for u8 {
    fn from(bits: Bits) -> Self {
        bits.0
    }
}

impl AddAssign<u8> for Bits {
    fn add_assign(&mut self, rhs: u8) {
        self.0 = (self.0 + rhs).min(Self::MAX.0)
    }
}

impl Bits {
    /// Maximum code bits allowed for GIF
    const MAX: Self = Bits(12);

    /// Get the number of entries
    fn entries(self) -> u16 {
        1 << (self.0 as u16)
    }
}

/// Code type
type Code = u16;

/// Node for code dictionary
#[derive(Clone, Copy, Debug)]
struct Node {
    /// Next node code
    next: Option<Code>,
    /// Left node code
    left: Option<Code>,
    /// Right node code
    right: Option<Code>,
    /// Byte value
    byte: u8,
}

/// Code dictionary trie
#[derive(Debug)]
struct Trie {
    /// Table of codes
    table: Vec<Node>,
    /// Minimum code bits
    min_code_bits: u8,
}

/// LZW Data Compressor
///
/// Codes are packed least-significant bit first.  The stream starts with the
/// first literal code (no leading clear code), and the dictionary is reset
/// with a clear code whenever the 12-bit code space is exhausted.
pub struct Compressor {
    /// Code dictionary
    trie: Trie,
    /// Minimum code bits
    min_code_bits: u8,
    /// Current code bits
    code_bits: Bits,
    /// Pending prefix code (not yet packed)
    prefix: Option<Code>,
    /// Current packed bits
    code: u32,
    /// Number of bits in current packed bits
    n_bits: u8,
}

impl Node {
    /// Create a new node
    fn new(byte: u8) -> Self {
        Node {
            next: None,
            left: None,
            right: None,
            byte,
        }
    }

    /// Get a link code
    fn link(&self, ordering: Ordering) -> Option<Code> {
        match ordering {
            Ordering::Less => self.left,
            Ordering::Equal => self.next,
            Ordering::Greater => self.right,
        }
    }

    /// Set a link code
    fn set_link(&mut self, ordering: Ordering, code: Code) {
        match ordering {
            Ordering::Less => self.left = Some(code),
            Ordering::Equal => self.next = Some(code),
            Ordering::Greater => self.right = Some(code),
        }
    }
}

impl Trie {
    /// Create a new code dictionary
    fn new(min_code_bits: u8) -> Self {
        let mut trie = Trie {
            table: Vec::with_capacity(Bits::MAX.entries().into()),
            min_code_bits,
        };
        trie.reset();
        trie
    }

    /// Get the clear code
    fn clear_code(&self) -> Code {
        1 << self.min_code_bits
    }

    /// Get the end code
    fn end_code(&self) -> Code {
        self.clear_code() + 1
    }

    /// Get the next available code
    fn next_code(&self) -> Code {
        self.table.len() as Code
    }

    /// Reset the dictionary
    fn reset(&mut self) {
        self.table.clear();
        for byte in 0..self.clear_code() {
            self.table.push(Node::new(byte as u8));
        }
        self.table.push(Node::new(0)); // clear code
        self.table.push(Node::new(0)); // end code
    }

    /// Get a mutable node
    fn node_mut(&mut self, code: Code) -> &mut Node {
        debug_assert!(code < self.next_code());
        &mut self.table[code as usize]
    }

    /// Search for a prefix code + byte, inserting it if not found.
    ///
    /// Returns the code if found, or `None` if it was inserted.
    fn search_insert(&mut self, code: Code, byte: u8) -> Option<Code> {
        let next_code = self.next_code();
        let mut node = self.node_mut(code);
        let mut ordering = Ordering::Equal;
        while let Some(code) = node.link(ordering) {
            node = self.node_mut(code);
            ordering = byte.cmp(&node.byte);
            if ordering == Ordering::Equal {
                return Some(code);
            }
        }
        node.set_link(ordering, next_code);
        self.table.push(Node::new(byte));
        None
    }
}

impl Compressor {
    /// Create a new compressor
    pub fn new(min_code_bits: u8) -> Self {
        let trie = Trie::new(min_code_bits);
        let code_bits = Bits::from(min_code_bits + 1);
        Compressor {
            trie,
            min_code_bits,
            code_bits,
            prefix: None,
            code: 0,
            n_bits: 0,
        }
    }

    /// Pack a code into a buffer
    fn pack(&mut self, code: Code, buffer: &mut Vec<u8>) {
        self.code |= (code as u32) << self.n_bits;
        self.n_bits += u8::from(self.code_bits);
        while self.n_bits >= 8 {
            buffer.push(self.code as u8);
            self.code >>= 8;
            self.n_bits -= 8;
        }
    }

    /// Adjust code bits after a code was packed.
    ///
    /// `next_code` is the next code the dictionary would assign.
    fn grow(&mut self, next_code: Code, buffer: &mut Vec<u8>) {
        if next_code == Bits::MAX.entries() {
            self.pack(self.trie.clear_code(), buffer);
            self.trie.reset();
            self.code_bits = Bits::from(self.min_code_bits + 1);
        } else if next_code > self.code_bits.entries() {
            self.code_bits += 1;
        }
    }

    /// Compress a byte buffer.
    ///
    /// May be called repeatedly; compressed output is appended to `buffer`.
    pub fn compress(
        &mut self,
        bytes: &[u8],
        buffer: &mut Vec<u8>,
    ) -> Result<()> {
        let clear_code = self.trie.clear_code();
        if let Some(byte) = bytes.iter().find(|b| Code::from(**b) >= clear_code)
        {
            return Err(Error::InvalidColorIndex(*byte));
        }
        for byte in bytes {
            self.prefix = match self.prefix {
                None => Some(Code::from(*byte)),
                Some(prefix) => match self.trie.search_insert(prefix, *byte) {
                    Some(code) => Some(code),
                    None => {
                        self.pack(prefix, buffer);
                        self.grow(self.trie.next_code(), buffer);
                        Some(Code::from(*byte))
                    }
                },
            };
        }
        Ok(())
    }

    /// Finish compression, packing the last code, end code and final bits.
    pub fn finish(&mut self, buffer: &mut Vec<u8>) {
        if let Some(prefix) = self.prefix.take() {
            self.pack(prefix, buffer);
            self.grow(self.trie.next_code() + 1, buffer);
        }
        self.pack(self.trie.end_code(), buffer);
        if self.n_bits > 0 {
            buffer.push(self.code as u8);
            self.code = 0;
            self.n_bits = 0;
        }
    }
}
