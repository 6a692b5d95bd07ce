pub mod all;
pub mod common;
pub mod demangle;
pub mod dos;
pub mod exports;
pub mod imports;
pub mod info;
pub mod sections;
