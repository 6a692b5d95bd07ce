use std::path::Path;

use pesym::File;
use serde::Serialize;

use crate::{
    app::GlobalOptions,
    commands::common::load_image,
    output::{print_banner, print_output},
};

/// Dwords per dump row.
const COLUMNS: usize = 6;

#[derive(Debug, Serialize)]
pub struct DumpRow {
    pub offset: usize,
    /// Each dword as its bytes read in file order
    pub dwords: Vec<u32>,
    pub ascii: String,
}

#[derive(Debug, Serialize)]
pub struct DosDump {
    pub e_magic: u16,
    pub e_lfanew: u32,
    pub rows: Vec<DumpRow>,
}

/// Split the stub into rows of six dwords. A trailing partial dword is not shown.
pub fn dump_rows(stub: &[u8]) -> Vec<DumpRow> {
    let whole = stub.len() - stub.len() % 4;

    stub[..whole]
        .chunks(COLUMNS * 4)
        .enumerate()
        .map(|(row, bytes)| DumpRow {
            offset: row * COLUMNS * 4,
            dwords: bytes
                .chunks_exact(4)
                .map(|dword| u32::from_be_bytes([dword[0], dword[1], dword[2], dword[3]]))
                .collect(),
            ascii: bytes
                .iter()
                .map(|&b| if (0x20..0x7F).contains(&b) { b as char } else { ' ' })
                .collect(),
        })
        .collect()
}

/// One line of the dump: hex columns, padding for missing dwords, then the ASCII column.
pub fn render_row(row: &DumpRow) -> String {
    let mut line = String::new();
    for dword in &row.dwords {
        line.push_str(&format!("{dword:08X} "));
    }
    for _ in row.dwords.len()..COLUMNS {
        line.push_str("         ");
    }

    line.push_str(&format!("| {:<width$} |", row.ascii, width = COLUMNS * 4));
    line
}

pub fn report(file: &File) -> DosDump {
    let layout = file.layout();

    DosDump {
        e_magic: layout.dos_header().signature,
        e_lfanew: layout.dos_header().pe_pointer,
        rows: dump_rows(layout.dos_stub()),
    }
}

pub fn display(dump: &DosDump) {
    print_banner("IMAGE_DOS_HEADER and DOS stub");

    for row in &dump.rows {
        println!("{}", render_row(row));
    }
}

pub fn run(path: &Path, opts: &GlobalOptions) -> anyhow::Result<()> {
    let file = load_image(path)?;
    let dump = report(&file);

    print_output(&dump, opts, display)
}
