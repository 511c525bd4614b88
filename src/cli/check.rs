use std::env;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use anyhow::Result;

use cphagg::config::{DEFAULT_FLAG_PLACEHOLDER, DEFAULT_ID_FLAG, DEFAULT_THREAD_FLAG};
use cphagg::command::CommandTemplate;

fn is_executable(path: &Path) -> bool {
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

// EXPLICIT PATHS ARE CHECKED AS GIVEN, BARE NAMES ARE SEARCHED ON PATH
fn resolve_program(program: &str) -> Option<PathBuf> {
    if program.contains('/') {
        let path = PathBuf::from(program);
        return is_executable(&path).then_some(path);
    }
    let search = env::var_os("PATH")?;
    env::split_paths(&search)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
}

pub fn run_check(command: &str) -> Result<()> {
    println!("CPHAGG WORKER CHECK");
    println!();

    let mut ok = true;
    let parsed = CommandTemplate::parse(
        command,
        DEFAULT_THREAD_FLAG,
        DEFAULT_ID_FLAG,
        DEFAULT_FLAG_PLACEHOLDER,
    );
    match parsed {
        Ok(template) => {
            println!("  {:<24}OK", "command tokenizes");
            match resolve_program(template.program()) {
                Some(path) => println!("  {:<24}OK ({})", template.program(), path.display()),
                None => {
                    println!("  {:<24}MISSING", template.program());
                    ok = false;
                }
            }
        }
        Err(e) => {
            println!("  {:<24}FAILED ({})", "command tokenizes", e);
            ok = false;
        }
    }
    println!();

    if ok {
        println!("ALL CHECKS PASSED");
    } else {
        println!("SOME CHECKS FAILED");
        std::process::exit(1);
    }

    Ok(())
}
