use std::path::PathBuf;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;

use amberdb::common::config::{DatabaseConfig, DEFAULT_BUFFER_POOL_SIZE};
use amberdb::common::types::DEFAULT_BLOCK_SIZE;
use amberdb::query::{ExecutionResult, QueryResultSet};
use amberdb::Database;

const HISTORY_FILE: &str = ".amberdb_history";

#[derive(Parser)]
#[command(author, version, about = "AmberDB - a small transactional database engine")]
struct Cli {
    /// Data directory holding table files and the log
    #[arg(short, long, default_value = "amberdb_data")]
    data_dir: PathBuf,

    /// Block size in bytes
    #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE)]
    block_size: usize,

    /// Buffer pool size (number of frames)
    #[arg(short, long, default_value_t = DEFAULT_BUFFER_POOL_SIZE)]
    buffers: usize,

    /// Command to execute
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive shell; each statement commits on its own
    Shell,

    /// Execute a single SQL statement
    Query {
        /// SQL statement to execute
        sql: String,
    },

    /// Load the student/exam sample tables and query them
    Demo,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = DatabaseConfig::new(&cli.data_dir)
        .with_block_size(cli.block_size)
        .with_buffer_pool_size(cli.buffers);
    let db = Database::open(config)
        .with_context(|| format!("failed to open database in {:?}", cli.data_dir))?;

    let outcome = match cli.command.unwrap_or(Commands::Shell) {
        Commands::Shell => run_shell(&db),
        Commands::Query { sql } => db
            .execute(&sql)
            .map(|result| display_result(&result))
            .map_err(Into::into),
        Commands::Demo => run_demo(&db),
    };
    db.buffer_pool()
        .flush_all_pages()
        .context("failed to flush buffer pool on shutdown")?;
    outcome
}

fn run_shell(db: &Database) -> Result<()> {
    println!("Welcome to AmberDB. Type 'help' for assistance or 'exit' to quit.");

    let mut rl = Editor::<(), DefaultHistory>::new()?;
    if rl.load_history(HISTORY_FILE).is_err() {
        info!("No previous shell history");
    }

    loop {
        match rl.readline("amberdb> ") {
            Ok(line) => {
                let _ = rl.add_history_entry(&line);
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match line.to_lowercase().as_str() {
                    "exit" | "quit" => {
                        println!("Goodbye!");
                        break;
                    }
                    "help" => print_help(),
                    "tables" => match list_tables(db) {
                        Ok(names) => println!("{}", names.join("\n")),
                        Err(err) => println!("Error: {}", err),
                    },
                    _ => match db.execute(line) {
                        Ok(result) => display_result(&result),
                        Err(err) => println!("Error: {}", err),
                    },
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Error: {}", err);
                break;
            }
        }
    }

    if let Err(err) = rl.save_history(HISTORY_FILE) {
        println!("Error saving history: {}", err);
    }
    Ok(())
}

fn list_tables(db: &Database) -> Result<Vec<String>> {
    let metadata = db.metadata();
    Ok(db.run(|tx| Ok(metadata.table_names(tx)?))?)
}

fn run_demo(db: &Database) -> Result<()> {
    let students = [
        (1, "joe", 10, 2021),
        (2, "amy", 20, 2020),
        (3, "max", 10, 2022),
        (4, "sue", 20, 2022),
        (5, "bob", 30, 2020),
        (6, "kim", 20, 2020),
        (7, "art", 30, 2021),
        (8, "pat", 20, 2019),
        (9, "lee", 10, 2021),
    ];
    let exams = [(1, "A"), (2, "B"), (3, "A"), (4, "C"), (5, "A"), (9, "B")];

    if !list_tables(db)?.iter().any(|t| t == "student") {
        db.execute("create table student (id int, name varchar(10), majorid int, gradyear int)")?;
        db.execute("create table exam (stuid int, grade varchar(2))")?;
        let planner = db.planner();
        db.run(|tx| {
            for (id, name, major, year) in students {
                planner.execute_update(
                    &format!(
                        "insert into student (id, name, majorid, gradyear) values ({}, '{}', {}, {})",
                        id, name, major, year
                    ),
                    tx,
                )?;
            }
            for (stuid, grade) in exams {
                planner.execute_update(
                    &format!("insert into exam (stuid, grade) values ({}, '{}')", stuid, grade),
                    tx,
                )?;
            }
            Ok(())
        })?;
        println!("Loaded {} students and {} exams", students.len(), exams.len());
    }

    let sql = "select name from student, exam where id = stuid and grade = 'A'";
    println!("{}", sql);
    display_result(&db.execute(sql)?);
    Ok(())
}

fn print_help() {
    println!("Available commands:");
    println!("  CREATE TABLE <t> (<f> INT, <f> VARCHAR(<n>), ...)  - Create a new table");
    println!("  INSERT INTO <t> (<f>, ...) VALUES (<c>, ...)       - Insert a record");
    println!("  SELECT <f>, ... | * FROM <t>, ... [WHERE ...]      - Query tables");
    println!("  UPDATE <t> SET <f> = <expr> [WHERE ...]            - Modify records");
    println!("  DELETE FROM <t> [WHERE ...]                        - Delete records");
    println!("  Predicates are equalities joined by AND.");
    println!();
    println!("Other commands:");
    println!("  tables   - List tables");
    println!("  help     - Display this help message");
    println!("  exit     - Exit the shell");
}

fn display_result(result: &ExecutionResult) {
    match result {
        ExecutionResult::Rows(rows) => display_rows(rows),
        ExecutionResult::Affected(count) => println!("{} record(s) affected", count),
    }
}

fn display_rows(result: &QueryResultSet) {
    let headers = result.columns();
    let cells: Vec<Vec<String>> = result
        .rows()
        .iter()
        .map(|row| row.iter().map(|v| v.to_string()).collect())
        .collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.len().max(3)).collect();
    for row in &cells {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    print!("|");
    for (header, width) in headers.iter().zip(&widths) {
        print!(" {:<width$} |", header, width = width);
    }
    println!();

    print!("+");
    for width in &widths {
        print!("{:-<width$}+", "", width = width + 2);
    }
    println!();

    for row in &cells {
        print!("|");
        for (cell, width) in row.iter().zip(&widths) {
            print!(" {:<width$} |", cell, width = width);
        }
        println!();
    }
    println!("({} rows)", cells.len());
}
