//! Simple CLI for working with heap files.
//!
//! Usage:
//!   heapdb_cli encode <types> <input.txt> <output.dat> [separator]
//!   heapdb_cli scan <types> <file.dat>
//!   heapdb_cli stats <types> <file.dat>
//!
//! `<types>` is a comma-separated column list such as `int,text,int`.
//! Set `HEAPDB_CONFIG` to a JSON file to override the page size or the
//! buffer pool size.

use heapdb::execution::OpIterator;
use heapdb::{Config, Database, Result, TransactionId, TupleDesc, Type};
use std::env;
use std::path::Path;
use std::process::exit;

fn usage() -> ! {
    eprintln!("Usage: heapdb_cli <command> <types> [args...]");
    eprintln!("Commands:");
    eprintln!("  encode <types> <input> <output> [sep] - Convert delimited text into a heap file");
    eprintln!("  scan <types> <file>                   - Print every row as a JSON array");
    eprintln!("  stats <types> <file>                  - Show page and tuple counts");
    exit(1);
}

fn parse_types(list: &str) -> Option<TupleDesc> {
    let types = list
        .split(',')
        .map(|t| match t.trim().to_ascii_lowercase().as_str() {
            "int" => Some(Type::Int),
            "text" | "string" => Some(Type::Text),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    Some(TupleDesc::new(
        types.into_iter().enumerate().map(|(i, t)| (format!("f{}", i), t)),
    ))
}

fn load_config() -> Result<Config> {
    match env::var("HEAPDB_CONFIG") {
        Ok(path) => Config::from_json(&std::fs::read_to_string(path)?),
        Err(_) => Ok(Config::default()),
    }
}

fn run(command: &str, desc: TupleDesc, args: &[String]) -> Result<()> {
    let db = Database::open(load_config()?)?;

    match command {
        "encode" => {
            if args.len() < 2 {
                usage();
            }
            let mut encoder = db.encoder(desc)?;
            if let Some(sep) = args.get(2).and_then(|s| s.chars().next()) {
                encoder = encoder.separator(sep);
            }
            let pages = encoder.convert_file(Path::new(&args[0]), Path::new(&args[1]))?;
            println!("OK: {} page(s)", pages);
        }

        "scan" => {
            let table = db.add_table(&args[0], desc, "t")?;
            let mut scan = db.scan(TransactionId::new(), table, "t")?;
            scan.open()?;
            while scan.has_next()? {
                let tuple = scan.next()?;
                match serde_json::to_string(tuple.fields()) {
                    Ok(line) => println!("{}", line),
                    Err(e) => eprintln!("ERROR: {}", e),
                }
            }
            scan.close();
        }

        "stats" => {
            let table = db.add_table(&args[0], desc, "t")?;
            let stats = db.table_stats(table)?;
            println!("page_count: {}", stats.page_count);
            println!("slots_per_page: {}", stats.slots_per_page);
            println!("tuple_count: {}", stats.tuple_count);
            println!("page_size: {}", db.page_size());
        }

        _ => usage(),
    }
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 4 {
        usage();
    }

    let command = &args[1];
    let desc = match parse_types(&args[2]) {
        Some(desc) => desc,
        None => {
            eprintln!("ERROR: Invalid column types: {}", args[2]);
            exit(1);
        }
    };

    if let Err(e) = run(command, desc, &args[3..]) {
        eprintln!("ERROR: {}", e);
        exit(1);
    }
}
