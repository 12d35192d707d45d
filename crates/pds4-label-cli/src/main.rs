use std::process;

fn main() {
    match pds4_label_cli::run() {
        Ok(code) => process::exit(code as i32),
        Err(err) => {
            eprintln!("pds4-label error: {err:#}");
            process::exit(pds4_label_cli::exit_code_for(&err) as i32);
        }
    }
}
