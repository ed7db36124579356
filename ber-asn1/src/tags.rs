//! BER identifier octets (tag class, constructed bit, tag number)

use ber_core::{Asn1Error, Asn1Result, Stream};

/// BER tag class
///
/// ASN.1 defines four tag classes:
/// - **Universal**: standard ASN.1 types (INTEGER, OCTET STRING, etc.)
/// - **Application**: application-specific types
/// - **Context-specific**: context-dependent types inside SEQUENCE/SET
/// - **Private**: implementation-specific types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagClass {
    /// Universal class (00)
    Universal = 0,
    /// Application class (01)
    Application = 1,
    /// Context-specific class (10)
    ContextSpecific = 2,
    /// Private class (11)
    Private = 3,
}

impl TagClass {
    /// Tag class from the top two bits of the first identifier octet
    pub fn from_bits(byte: u8) -> Self {
        match (byte >> 6) & 0x03 {
            0 => TagClass::Universal,
            1 => TagClass::Application,
            2 => TagClass::ContextSpecific,
            _ => TagClass::Private,
        }
    }

    /// Tag class positioned into bits 7-6 for encoding
    pub fn to_bits(self) -> u8 {
        (self as u8) << 6
    }
}

/// BER tag
///
/// Identifies the type of an ASN.1 value: class, constructed/primitive bit,
/// and tag number. Immutable once decoded.
///
/// # Encoding Format
///
/// Short form (tag number 0-30) is a single octet; larger numbers use the
/// high-tag-number form with base-128 continuation octets. Everything this
/// codec emits fits the short form, but both forms are decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag {
    class: TagClass,
    constructed: bool,
    number: u32,
}

/// Tag numbers of the universal types this codec recognizes
pub mod universal {
    pub const EOC: u32 = 0;
    pub const BOOLEAN: u32 = 1;
    pub const INTEGER: u32 = 2;
    pub const BIT_STRING: u32 = 3;
    pub const OCTET_STRING: u32 = 4;
    pub const NULL: u32 = 5;
    pub const OBJECT_IDENTIFIER: u32 = 6;
    pub const ENUMERATED: u32 = 10;
    pub const UTF8_STRING: u32 = 12;
    pub const SEQUENCE: u32 = 16;
    pub const SET: u32 = 17;
    pub const NUMERIC_STRING: u32 = 18;
    pub const PRINTABLE_STRING: u32 = 19;
    pub const T61_STRING: u32 = 20;
    pub const VIDEOTEX_STRING: u32 = 21;
    pub const IA5_STRING: u32 = 22;
    pub const UTC_TIME: u32 = 23;
    pub const GENERALIZED_TIME: u32 = 24;
    pub const GRAPHIC_STRING: u32 = 25;
    pub const VISIBLE_STRING: u32 = 26;
    pub const GENERAL_STRING: u32 = 27;
    pub const UNIVERSAL_STRING: u32 = 28;
    pub const BMP_STRING: u32 = 30;
}

impl Tag {
    pub const EOC: Tag = Tag::universal(false, universal::EOC);
    pub const BOOLEAN: Tag = Tag::universal(false, universal::BOOLEAN);
    pub const INTEGER: Tag = Tag::universal(false, universal::INTEGER);
    pub const BIT_STRING: Tag = Tag::universal(false, universal::BIT_STRING);
    pub const OCTET_STRING: Tag = Tag::universal(false, universal::OCTET_STRING);
    pub const OCTET_STRING_CONSTRUCTED: Tag = Tag::universal(true, universal::OCTET_STRING);
    pub const NULL: Tag = Tag::universal(false, universal::NULL);
    pub const OBJECT_IDENTIFIER: Tag = Tag::universal(false, universal::OBJECT_IDENTIFIER);
    pub const ENUMERATED: Tag = Tag::universal(false, universal::ENUMERATED);
    pub const UTF8_STRING: Tag = Tag::universal(false, universal::UTF8_STRING);
    pub const SEQUENCE: Tag = Tag::universal(true, universal::SEQUENCE);
    pub const SET: Tag = Tag::universal(true, universal::SET);
    pub const NUMERIC_STRING: Tag = Tag::universal(false, universal::NUMERIC_STRING);
    pub const PRINTABLE_STRING: Tag = Tag::universal(false, universal::PRINTABLE_STRING);
    pub const T61_STRING: Tag = Tag::universal(false, universal::T61_STRING);
    pub const IA5_STRING: Tag = Tag::universal(false, universal::IA5_STRING);
    pub const UTC_TIME: Tag = Tag::universal(false, universal::UTC_TIME);
    pub const GENERALIZED_TIME: Tag = Tag::universal(false, universal::GENERALIZED_TIME);
    pub const VISIBLE_STRING: Tag = Tag::universal(false, universal::VISIBLE_STRING);
    pub const GENERAL_STRING: Tag = Tag::universal(false, universal::GENERAL_STRING);
    pub const BMP_STRING: Tag = Tag::universal(false, universal::BMP_STRING);

    /// Create a universal-class tag
    pub const fn universal(constructed: bool, number: u32) -> Self {
        Self {
            class: TagClass::Universal,
            constructed,
            number,
        }
    }

    /// Create a context-specific primitive tag `[n]`
    pub const fn context(number: u32) -> Self {
        Self {
            class: TagClass::ContextSpecific,
            constructed: false,
            number,
        }
    }

    /// Create a context-specific constructed tag `[n]`
    pub const fn context_constructed(number: u32) -> Self {
        Self {
            class: TagClass::ContextSpecific,
            constructed: true,
            number,
        }
    }

    /// Create an application-class tag
    pub const fn application(constructed: bool, number: u32) -> Self {
        Self {
            class: TagClass::Application,
            constructed,
            number,
        }
    }

    pub fn class(&self) -> TagClass {
        self.class
    }

    pub fn is_constructed(&self) -> bool {
        self.constructed
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    /// Whether this is the same type ignoring the constructed bit
    pub fn same_type(&self, other: Tag) -> bool {
        self.class == other.class && self.number == other.number
    }

    /// Encode the identifier octets
    pub fn encode(&self) -> Vec<u8> {
        let leading = self.class.to_bits() | if self.constructed { 0x20 } else { 0x00 };
        if self.number <= 30 {
            return vec![leading | (self.number as u8 & 0x1F)];
        }

        // High-tag-number form: leading octet with all tag bits set, then
        // base-128 continuation octets, high bit set on all but the last
        let mut result = vec![leading | 0x1F];
        let mut groups = Vec::new();
        let mut remaining = self.number;
        while remaining > 0 {
            groups.push((remaining & 0x7F) as u8);
            remaining >>= 7;
        }
        for (i, &byte) in groups.iter().rev().enumerate() {
            if i < groups.len() - 1 {
                result.push(byte | 0x80);
            } else {
                result.push(byte);
            }
        }
        result
    }

    /// Number of identifier octets [`Tag::encode`] produces
    pub fn encoded_len(&self) -> usize {
        match self.number {
            0..=30 => 1,
            31..=0x7F => 2,
            0x80..=0x3FFF => 3,
            0x4000..=0x1F_FFFF => 4,
            _ => 5,
        }
    }

    /// Decode a tag from the stream, advancing past it
    pub fn read(stream: &mut Stream) -> Asn1Result<Tag> {
        let first = stream.read_byte()?;
        let class = TagClass::from_bits(first);
        let constructed = (first & 0x20) != 0;
        let low_bits = first & 0x1F;

        if low_bits < 31 {
            return Ok(Tag {
                class,
                constructed,
                number: low_bits as u32,
            });
        }

        // High-tag-number form, at most five octets for a u32
        let mut number = 0u32;
        for count in 0.. {
            if count >= 5 {
                return Err(stream.set_error(Asn1Error::BadData(
                    "tag number too large".to_string(),
                )));
            }
            let byte = stream.read_byte()?;
            number = number
                .checked_mul(128)
                .and_then(|n| n.checked_add((byte & 0x7F) as u32))
                .ok_or_else(|| Asn1Error::BadData("tag number overflow".to_string()))
                .map_err(|e| stream.set_error(e))?;
            if byte & 0x80 == 0 {
                break;
            }
        }
        Ok(Tag {
            class,
            constructed,
            number,
        })
    }

    /// Decode the tag at the current position without advancing
    pub fn peek(stream: &mut Stream) -> Asn1Result<Tag> {
        let saved = stream.snapshot();
        let tag = Tag::read(stream)?;
        stream.restore(saved);
        Ok(tag)
    }
}
