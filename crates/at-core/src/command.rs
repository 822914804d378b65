//! Parsing raw input into typed commands.
//!
//! Input is trimmed, lower-cased and split on whitespace. The first word picks
//! the command; the remaining words are its arguments.

use std::fmt;

use thiserror::Error;

/// Ages outside this range are rejected as invalid arguments.
pub const MAX_AGE: u32 = 150;

/// Count used by `contar` when no argument is given.
pub const DEFAULT_COUNT: u32 = 5;

/// A demo scenario with its typed arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `servidor`
    Server,
    /// `idade N`
    Age(u32),
    /// `download`
    Download,
    /// `login USER [PASS]`
    Login { username: String, password: String },
    /// `usuario`
    UserProfile,
    /// `contar [N]`
    Count(u32),
    /// `corrida`
    Race,
    /// `todas`
    AllSettled,
    /// `ajuda`
    Help,
    /// `limpar`
    Clear,
}

impl Command {
    /// The command word as typed by the user.
    pub fn keyword(&self) -> &'static str {
        match self {
            Command::Server => "servidor",
            Command::Age(_) => "idade",
            Command::Download => "download",
            Command::Login { .. } => "login",
            Command::UserProfile => "usuario",
            Command::Count(_) => "contar",
            Command::Race => "corrida",
            Command::AllSettled => "todas",
            Command::Help => "ajuda",
            Command::Clear => "limpar",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Age(n) => write!(f, "idade {n}"),
            Command::Login { username, password } if password.is_empty() => {
                write!(f, "login {username}")
            }
            Command::Login { username, password } => write!(f, "login {username} {password}"),
            Command::Count(n) => write!(f, "contar {n}"),
            other => f.write_str(other.keyword()),
        }
    }
}

/// Bounds applied while parsing arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseLimits {
    pub max_count: u32,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self { max_count: 20 }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Comando desconhecido: {0}. Digite 'ajuda' para ver os comandos disponíveis.")]
    Unknown(String),
    #[error("Argumento inválido para '{command}': {reason}. Digite 'ajuda' para ver o uso.")]
    InvalidArgument {
        command: &'static str,
        reason: String,
    },
}

/// Parse one line of input.
///
/// `raw` is reported verbatim (trimmed) in `ParseError::Unknown`.
pub fn parse(raw: &str, limits: ParseLimits) -> Result<Command, ParseError> {
    let trimmed = raw.trim();
    let normalized = trimmed.to_lowercase();
    let mut words = normalized.split_whitespace();
    let Some(head) = words.next() else {
        return Err(ParseError::Unknown(trimmed.to_string()));
    };
    let args: Vec<&str> = words.collect();

    let command = match head {
        "servidor" => no_args(Command::Server, &args)?,
        "download" => no_args(Command::Download, &args)?,
        "usuario" => no_args(Command::UserProfile, &args)?,
        "corrida" => no_args(Command::Race, &args)?,
        "todas" => no_args(Command::AllSettled, &args)?,
        "ajuda" => no_args(Command::Help, &args)?,
        "limpar" => no_args(Command::Clear, &args)?,
        "idade" => match args.as_slice() {
            [n] => Command::Age(parse_number("idade", n, 0, MAX_AGE)?),
            [] => return Err(invalid("idade", "informe a idade")),
            _ => return Err(invalid("idade", "argumentos demais")),
        },
        "contar" => match args.as_slice() {
            [] => Command::Count(DEFAULT_COUNT.min(limits.max_count.max(1))),
            [n] => Command::Count(parse_number("contar", n, 1, limits.max_count)?),
            _ => return Err(invalid("contar", "argumentos demais")),
        },
        "login" => match args.as_slice() {
            [user] => Command::Login {
                username: (*user).to_string(),
                password: String::new(),
            },
            [user, pass] => Command::Login {
                username: (*user).to_string(),
                password: (*pass).to_string(),
            },
            [] => return Err(invalid("login", "informe o usuário")),
            _ => return Err(invalid("login", "argumentos demais")),
        },
        _ => return Err(ParseError::Unknown(trimmed.to_string())),
    };

    Ok(command)
}

fn no_args(command: Command, args: &[&str]) -> Result<Command, ParseError> {
    if args.is_empty() {
        Ok(command)
    } else {
        Err(invalid(command.keyword(), "este comando não aceita argumentos"))
    }
}

fn parse_number(command: &'static str, s: &str, min: u32, max: u32) -> Result<u32, ParseError> {
    let n: u32 = s
        .parse()
        .map_err(|_| invalid(command, format!("'{s}' não é um número")))?;
    if n < min || n > max {
        return Err(invalid(command, format!("{n} fora do intervalo {min}..={max}")));
    }
    Ok(n)
}

fn invalid(command: &'static str, reason: impl Into<String>) -> ParseError {
    ParseError::InvalidArgument {
        command,
        reason: reason.into(),
    }
}
