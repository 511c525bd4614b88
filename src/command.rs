// CPHAGG WORKER COMMAND TEMPLATE
// TOKENIZES THE BASE COMMAND ONCE, THEN STAMPS OUT ONE ARGV PER WORKER
// WITH THE THREAD-COUNT AND WORKER-ID FLAGS FORCED TO THAT WORKER'S VALUES.

use crate::error::{FleetError, Result};

// SET `flag` TO `value` IN A COPY OF `tokens`.
// PRESENT: THE TOKEN AFTER THE FIRST OCCURRENCE IS REPLACED.
// ABSENT: `flag placeholder` IS APPENDED, THEN THE PLACEHOLDER SLOT IS REPLACED.
// APPLYING THE SAME VALUE TWICE GIVES THE SAME TOKENS AS APPLYING IT ONCE.
pub fn set_flag(tokens: &[String], flag: &str, placeholder: &str, value: &str) -> Vec<String> {
    let mut out = tokens.to_vec();
    let slot = match out.iter().position(|t| t == flag) {
        Some(i) => i + 1,
        None => {
            out.push(flag.to_string());
            out.push(placeholder.to_string());
            out.len() - 1
        }
    };
    // FLAG WAS THE FINAL TOKEN WITH NO VALUE
    if slot == out.len() {
        out.push(value.to_string());
    } else {
        out[slot] = value.to_string();
    }
    out
}

#[derive(Clone, Debug)]
pub struct CommandTemplate {
    tokens: Vec<String>,
    thread_flag: String,
    id_flag: String,
}

impl CommandTemplate {
    pub fn parse(
        command: &str,
        thread_flag: &str,
        id_flag: &str,
        placeholder: &str,
    ) -> Result<Self> {
        let tokens = shlex::split(command).ok_or_else(|| {
            FleetError::InvalidConfiguration(format!("cannot tokenize worker command: {}", command))
        })?;
        if tokens.is_empty() {
            return Err(FleetError::InvalidConfiguration(
                "worker command is empty".to_string(),
            ));
        }

        let tokens = set_flag(&tokens, thread_flag, placeholder, placeholder);
        let tokens = set_flag(&tokens, id_flag, placeholder, placeholder);

        Ok(Self {
            tokens,
            thread_flag: thread_flag.to_string(),
            id_flag: id_flag.to_string(),
        })
    }

    pub fn program(&self) -> &str {
        &self.tokens[0]
    }

    pub fn for_worker(&self, index: usize, threads: u32) -> Vec<String> {
        let argv = set_flag(&self.tokens, &self.thread_flag, "", &threads.to_string());
        set_flag(&argv, &self.id_flag, "", &index.to_string())
    }
}
