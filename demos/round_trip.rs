// nrbf-parser - A high-performance MS-NRBF binary parser and encoder.
// Copyright (C) 2026  driedpampas@proton.me
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::env;
use std::fs;
use udlg_codec::File;
use udlg_codec::interleaved::{from_interleaved, to_interleaved};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <udlg_file>", args[0]);
        std::process::exit(1);
    }

    let input_path = &args[1];
    println!("Reading original file: {}", input_path);
    let original_data = fs::read(input_path)?;

    let file = File::parse(&original_data)?;
    println!(
        "Parsed {} records (compressed={}).",
        file.records.len(),
        file.compressed
    );

    let json = serde_json::to_string_pretty(file.records.records())?;
    fs::write("output.json", &json)?;
    println!("Saved records to output.json");

    let interleaved_json = to_interleaved(file.records.records());
    let interleaved_json_str = serde_json::to_string_pretty(&interleaved_json)?;
    fs::write("interleaved.json", &interleaved_json_str)?;
    println!("Saved interleaved records to interleaved.json");

    // Flat-record round trip: exact byte-for-byte reconstruction.
    let reconstructed = file.encode()?;
    fs::write("reconstructed.udlg", &reconstructed)?;
    if original_data == reconstructed {
        println!("SUCCESS: reconstructed binary is identical to original!");
    } else {
        println!("FAILURE: reconstructed binary differs from original.");
        report_first_difference(&original_data, &reconstructed);
    }

    // Interleaved round trip: lossy projection, not expected to be byte-exact.
    println!("--- Interleaved Round Trip Check ---");
    let interleaved_records = from_interleaved(interleaved_json);
    println!(
        "Deserialized {} records from interleaved JSON.",
        interleaved_records.len()
    );
    let interleaved_file = File {
        header: file.header,
        records: interleaved_records.into_iter().collect(),
        compressed: file.compressed,
    };
    let interleaved_reconstructed = interleaved_file.encode()?;
    fs::write("reconstructed_interleaved.udlg", &interleaved_reconstructed)?;

    Ok(())
}

fn report_first_difference(original: &[u8], reconstructed: &[u8]) {
    println!(
        "Original size: {}, Reconstructed size: {}",
        original.len(),
        reconstructed.len()
    );
    let min_len = original.len().min(reconstructed.len());
    for i in 0..min_len {
        if original[i] != reconstructed[i] {
            println!(
                "First difference at offset 0x{:x}: original 0x{:02x}, reconstructed 0x{:02x}",
                i, original[i], reconstructed[i]
            );
            break;
        }
    }
}
