//! Argument-vector command lines with exact-token lookups.

use std::fmt;

const NOTHING_TO_DO: [&str; 4] = ["recon-all:", "nothing", "to", "do"];

/// Program plus arguments, rendered space-separated for display and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    program: String,
    args: Vec<String>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Placeholder emitted when every step is already up to date.
    pub fn nothing_to_do() -> Self {
        let mut cmd = Self::new("echo");
        cmd.extend(NOTHING_TO_DO);
        cmd
    }

    pub fn is_nothing_to_do(&self) -> bool {
        self.program == "echo" && self.args.iter().map(String::as_str).eq(NOTHING_TO_DO)
    }

    pub fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    pub fn extend<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// True if `token` appears as a whole argument.
    pub fn has_arg(&self, token: &str) -> bool {
        self.args.iter().any(|arg| arg == token)
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

fn quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| !c.is_whitespace() && !matches!(c, '\'' | '"' | '\\' | '$' | '`'));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
