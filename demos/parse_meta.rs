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

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <udlg_file> [output_json]", args[0]);
        std::process::exit(1);
    }

    let bytes = fs::read(&args[1])?;
    let file = udlg_codec::File::parse(&bytes)?;

    let output_path = args.get(2).map(|s| s.as_str()).unwrap_or("output.json");
    let json = serde_json::to_string_pretty(file.records.records())?;
    fs::write(output_path, json)?;

    println!(
        "Successfully parsed {} records (compressed={}) and saved to {}",
        file.records.len(),
        file.compressed,
        output_path
    );

    Ok(())
}
