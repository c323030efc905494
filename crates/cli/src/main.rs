//! Interactive shell for the DriftKV storage engine.
//!
//! Wraps the embedded [`engine::Engine`] in a small line-oriented REPL.
//! Keys and values are taken verbatim from the command line; the value of a
//! `set` may contain spaces (everything after the key belongs to it).

use std::io::{self, BufRead, Write};

use anyhow::Result;
use engine::{Config, Engine};

fn print_usage() {
    println!("Commands:");
    println!("  set <key> <value>  - store a key-value pair");
    println!("  get <key>          - retrieve a value by key");
    println!("  del <key>          - delete a key");
    println!("  flush              - force the memtable to disk");
    println!("  info               - show engine statistics");
    println!("  exit               - shut down");
}

fn main() -> Result<()> {
    env_logger::init();

    let data_dir = std::env::args().nth(1).unwrap_or_else(|| "./data".to_string());
    let mut engine = Engine::open(Config::new(&data_dir))?;

    println!("DriftKV — LSM key-value store (data dir: {})", data_dir);
    print_usage();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("driftkv> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }

        let mut parts = line.trim_end_matches(['\r', '\n']).splitn(3, ' ');
        let command = parts.next().unwrap_or("");

        match command {
            "set" | "put" => {
                let (key, value) = (parts.next(), parts.next());
                match (key, value) {
                    (Some(key), Some(value)) if !key.is_empty() && !value.is_empty() => {
                        match engine.put(key.as_bytes().to_vec(), value.as_bytes().to_vec()) {
                            Ok(()) => println!("OK"),
                            Err(e) => println!("ERROR: {:#}", e),
                        }
                    }
                    _ => println!("Usage: set <key> <value>"),
                }
            }
            "get" => match parts.next() {
                Some(key) if !key.is_empty() => match engine.get(key.as_bytes()) {
                    Some(value) => match String::from_utf8(value) {
                        Ok(s) => println!("\"{}\"", s),
                        Err(_) => println!("<binary data>"),
                    },
                    None => println!("(nil)"),
                },
                _ => println!("Usage: get <key>"),
            },
            "del" | "delete" => match parts.next() {
                Some(key) if !key.is_empty() => {
                    match engine.delete(key.as_bytes().to_vec()) {
                        Ok(()) => println!("OK (deleted)"),
                        Err(e) => println!("ERROR: {:#}", e),
                    }
                }
                _ => println!("Usage: del <key>"),
            },
            "flush" => match engine.flush() {
                Ok(()) => println!("OK ({} sstables)", engine.sstable_count()),
                Err(e) => println!("ERROR: {:#}", e),
            },
            "info" | "stats" => {
                println!("Memtable entries: {}", engine.memtable_len());
                println!("Memtable bytes:   {}", engine.memtable_size());
                println!("SSTables:         {}", engine.sstable_count());
            }
            "exit" | "quit" | "q" => break,
            "" => {}
            other => {
                println!("Unknown command: '{}'", other);
                print_usage();
            }
        }
    }

    Ok(())
}
