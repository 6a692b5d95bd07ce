use strum::Display;

/// Calling conventions recognised in the function-type part of a decorated name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum CallingConvention {
    /// `A`
    #[strum(serialize = "__cdecl")]
    Cdecl,
    /// `I`
    #[strum(serialize = "__fastcall")]
    Fastcall,
    /// `E`
    #[strum(serialize = "__thiscall")]
    Thiscall,
    /// `G`
    #[strum(serialize = "__stdcall")]
    Stdcall,
}

impl CallingConvention {
    /// Map a one-character convention code; unknown codes yield `None`.
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            b'A' => Some(CallingConvention::Cdecl),
            b'I' => Some(CallingConvention::Fastcall),
            b'E' => Some(CallingConvention::Thiscall),
            b'G' => Some(CallingConvention::Stdcall),
            _ => None,
        }
    }
}

/// Return / data type codes.
///
/// Indirections and aggregates are not followed; they collapse into the coarse
/// `void*`, `void[]`, `struct*` and `class*` placeholders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[allow(missing_docs)]
pub enum TypeCode {
    #[strum(serialize = "signed char")]
    SignedChar,
    #[strum(serialize = "char")]
    Char,
    #[strum(serialize = "unsigned char")]
    UnsignedChar,
    #[strum(serialize = "short")]
    Short,
    #[strum(serialize = "unsigned short")]
    UnsignedShort,
    #[strum(serialize = "int")]
    Int,
    #[strum(serialize = "unsigned int")]
    UnsignedInt,
    #[strum(serialize = "long")]
    Long,
    #[strum(serialize = "unsigned long")]
    UnsignedLong,
    #[strum(serialize = "float")]
    Float,
    #[strum(serialize = "double")]
    Double,
    #[strum(serialize = "long double")]
    LongDouble,
    #[strum(serialize = "void*")]
    Pointer,
    #[strum(serialize = "void[]")]
    Array,
    #[strum(serialize = "struct*")]
    Struct,
    #[strum(serialize = "class*")]
    Class,
    #[strum(serialize = "void")]
    Void,
    #[strum(serialize = "...")]
    Ellipsis,
}

impl TypeCode {
    /// Map a one-character type code; unknown codes yield `None`.
    #[must_use]
    pub fn from_code(code: u8) -> Option<Self> {
        let ty = match code {
            b'C' => TypeCode::SignedChar,
            b'D' => TypeCode::Char,
            b'E' => TypeCode::UnsignedChar,
            b'F' => TypeCode::Short,
            b'G' => TypeCode::UnsignedShort,
            b'H' => TypeCode::Int,
            b'I' => TypeCode::UnsignedInt,
            b'J' => TypeCode::Long,
            b'K' => TypeCode::UnsignedLong,
            b'M' => TypeCode::Float,
            b'N' => TypeCode::Double,
            b'O' => TypeCode::LongDouble,
            b'P' => TypeCode::Pointer,
            b'Q' => TypeCode::Array,
            b'U' => TypeCode::Struct,
            b'V' => TypeCode::Class,
            b'X' => TypeCode::Void,
            b'Z' => TypeCode::Ellipsis,
            _ => return None,
        };
        Some(ty)
    }
}

/// What follows the name segments: the kind of symbol, which decides whether a `this`
/// qualifier and a calling convention precede the type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SymbolClass {
    /// Free function: convention, then return type
    Global,
    /// Non-static member function: `this` qualifier, convention, return type
    Member,
    /// Static member function: convention, then return type
    Static,
    /// Variable: type only
    Data,
}

impl SymbolClass {
    pub(crate) fn from_code(code: u8) -> Option<Self> {
        match code {
            b'Y' | b'Z' => Some(SymbolClass::Global),
            b'A' | b'B' | b'E' | b'F' | b'I' | b'J' | b'M' | b'N' | b'Q' | b'R' | b'U'
            | b'V' => Some(SymbolClass::Member),
            b'C' | b'D' | b'K' | b'L' | b'S' | b'T' => Some(SymbolClass::Static),
            b'0'..=b'4' => Some(SymbolClass::Data),
            _ => None,
        }
    }
}
