use colored::Colorize;
use std::process;

fn main() {
    match canon_validator::run() {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("{} {:#}", "error:".bright_red().bold(), err);
            process::exit(3);
        }
    }
}
