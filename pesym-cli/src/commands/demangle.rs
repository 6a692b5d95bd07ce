use serde::Serialize;

use crate::{
    app::GlobalOptions,
    output::{print_output, Align, TabWriter},
};

#[derive(Debug, Serialize)]
struct DecodedName {
    mangled: String,
    name: String,
}

pub fn run(symbols: &[String], full: bool, opts: &GlobalOptions) -> anyhow::Result<()> {
    let decoded: Vec<DecodedName> = symbols
        .iter()
        .map(|symbol| DecodedName {
            mangled: symbol.clone(),
            name: pesym::demangle(symbol.as_bytes(), !full),
        })
        .collect();

    print_output(&decoded, opts, |decoded| {
        let mut tw = TabWriter::new(&[("Func name", Align::Left), ("Mangled name", Align::Left)]);
        for entry in decoded {
            tw.row(vec![entry.name.clone(), entry.mangled.clone()]);
        }
        tw.print();
    })
}
