//! Best-effort decoding of decorated C and C++ symbol names.
//!
//! Export and import names produced by the Microsoft toolchain are decorated. This module
//! turns them into something a human can read without attempting to be a complete
//! undecorator: parameter lists are never decoded and always render as `()`, indirections
//! collapse to coarse placeholders, and anything that is not understood is dropped rather
//! than reported. Decoding never fails and never reads outside the input.
//!
//! Two families of names are handled:
//!
//! - **C names** (`_Foo@4`, `Bar`): one leading `_` or `@` is removed, everything from the
//!   first `@` on is cut, and `()` is appended.
//! - **C++ names** (`?Name@Class@Namespace@@QAEHXZ`): up to three `@`-separated scope
//!   segments are read, constructors, destructors and assignment operators (`??0`, `??1`,
//!   `??4`) are recognised, and the return type plus calling convention are decoded from
//!   the type suffix unless only the qualified base name was requested.
//!
//! # Examples
//!
//! ```rust
//! use pesym::demangle::demangle;
//!
//! assert_eq!(demangle(b"_Foo@4", true), "Foo()");
//! assert_eq!(demangle(b"?Bar@@QAEXXZ", false), "void __thiscall Bar()");
//! assert_eq!(demangle(b"?Bar@@QAEXXZ", true), "Bar()");
//! assert_eq!(demangle(b"??0Widget@@QAE@XZ", true), "Widget::Widget()");
//! ```

mod codes;

pub use codes::{CallingConvention, TypeCode};

use std::borrow::Cow;

use crate::Parser;
use codes::SymbolClass;

const CXX_MARKER: u8 = b'?';
const SEPARATOR: u8 = b'@';
const TEMPLATE_MARKER: &[u8] = b"?$";
const EXTENDED_TYPE_MARKER: u8 = b'_';

const CONSTRUCTOR: u8 = b'0';
const DESTRUCTOR: u8 = b'1';
const ASSIGNMENT: u8 = b'4';

/// Decode a decorated symbol name.
///
/// With `base_name_only` set, C++ names are reduced to their qualified name followed by
/// `()`; otherwise the return type and calling convention are prepended when they can be
/// decoded. C names are unaffected by the flag. An empty input yields an empty string.
#[must_use]
pub fn demangle(mangled: &[u8], base_name_only: bool) -> String {
    match mangled.first() {
        None => String::new(),
        Some(&CXX_MARKER) => demangle_cxx(mangled, base_name_only),
        Some(_) => demangle_c(mangled),
    }
}

fn demangle_c(mangled: &[u8]) -> String {
    let mut parser = Parser::new(mangled);
    if !parser.eat(b'_') {
        parser.eat(SEPARATOR);
    }

    let name = parser.read_until(SEPARATOR);
    format!("{}()", text(name))
}

/// The `@`-separated scope segments of a C++ name, innermost first.
struct Segments<'a> {
    function: &'a [u8],
    class: &'a [u8],
    namespace: &'a [u8],
}

/// A segment is the last one if it runs to the end of the input, stops one byte short of
/// it, or is followed by the `@@` terminator.
fn at_last_segment(parser: &Parser) -> bool {
    parser.remaining() < 2 || matches!(parser.peek_byte_at(1), Ok(SEPARATOR))
}

fn read_segments<'a>(parser: &mut Parser<'a>) -> Segments<'a> {
    let function = parser.read_until(SEPARATOR);
    let mut class: &[u8] = &[];
    let mut namespace: &[u8] = &[];

    if !at_last_segment(parser) {
        parser.eat(SEPARATOR);
        class = parser.read_until(SEPARATOR);

        if !at_last_segment(parser) {
            parser.eat(SEPARATOR);
            namespace = parser.read_until(SEPARATOR);
        }
    }

    Segments {
        function,
        class,
        namespace,
    }
}

fn demangle_cxx(mangled: &[u8], base_name_only: bool) -> String {
    let mut parser = Parser::new(mangled);
    parser.eat(CXX_MARKER);

    let segments = read_segments(&mut parser);
    let class = scope_name(segments.class).unwrap_or_default();

    let decoded = if let [CXX_MARKER, code, name @ ..] = segments.function {
        qualify(&class, &special_member(*code, &text(name)))
    } else {
        let name = format!("{}()", qualify(&class, &text(segments.function)));
        if base_name_only {
            name
        } else {
            read_signature(&mut parser).render(&name)
        }
    };

    // The namespace goes in front of everything, return type included.
    match scope_name(segments.namespace) {
        Some(namespace) => format!("{namespace}::{decoded}"),
        None => decoded,
    }
}

fn qualify(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{scope}::{name}")
    }
}

/// Constructors, destructors and `operator=`. Other operator codes are not decoded and
/// render with a `???` placeholder.
fn special_member(code: u8, name: &str) -> String {
    match code {
        CONSTRUCTOR => format!("{name}::{name}()"),
        DESTRUCTOR => format!("{name}::~{name}()"),
        ASSIGNMENT => format!("{name}::operator=()"),
        _ => {
            let trimmed = name.trim_start_matches(|c: char| !c.is_ascii_alphabetic());
            format!("{trimmed}::???")
        }
    }
}

/// Return type and calling convention decoded from the type suffix of a C++ name.
#[derive(Debug, Default, PartialEq, Eq)]
struct Signature {
    return_type: Option<TypeCode>,
    convention: Option<CallingConvention>,
}

impl Signature {
    fn render(&self, name: &str) -> String {
        let mut rendered = String::new();
        if let Some(return_type) = self.return_type {
            rendered.push_str(&return_type.to_string());
            rendered.push(' ');
        }
        if let Some(convention) = self.convention {
            rendered.push_str(&convention.to_string());
            rendered.push(' ');
        }
        rendered.push_str(name);
        rendered
    }
}

fn read_signature(parser: &mut Parser) -> Signature {
    while parser.eat(SEPARATOR) {}

    let Some(class) = next_byte(parser).and_then(SymbolClass::from_code) else {
        return Signature::default();
    };

    let convention = match class {
        SymbolClass::Global | SymbolClass::Static => {
            next_byte(parser).and_then(CallingConvention::from_code)
        }
        SymbolClass::Member => {
            // this-pointer qualifier
            next_byte(parser);
            next_byte(parser).and_then(CallingConvention::from_code)
        }
        SymbolClass::Data => None,
    };

    parser.eat(EXTENDED_TYPE_MARKER);
    let return_type = next_byte(parser).and_then(TypeCode::from_code);

    Signature {
        return_type,
        convention,
    }
}

fn next_byte(parser: &mut Parser) -> Option<u8> {
    let byte = parser.peek_byte().ok()?;
    parser.advance().ok()?;
    Some(byte)
}

/// Render a class or namespace segment; templates lose their arguments and show `<T>`.
fn scope_name(segment: &[u8]) -> Option<String> {
    if segment.is_empty() {
        return None;
    }

    match segment.strip_prefix(TEMPLATE_MARKER) {
        Some(template) => Some(format!("{}<T>", text(template))),
        None => Some(text(segment).into_owned()),
    }
}

fn text(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}
