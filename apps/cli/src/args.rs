//! Command-line arguments.

use std::path::PathBuf;

use anyhow::{Context, bail};
use steamconf_steam::FileKind;

pub const USAGE: &str = "\
usage: steamconf [--root <dir>] [--user <id>] [--strip] [--append] <command>

commands:
  show [kind...]          load kinds (default: all editable kinds) and print them as JSON
  dump [kind] <file>      decode a single file and print it as JSON; the kind
                          is taken from the file name when not given
  users                   list login users and the detected user
  apps                    list app manifests from every library
  set <setting> <value>   change a known setting and save it
  backup <file>           write a minimal JSON backup of the loaded configuration
  tags [--force]          print the store's popular tags (cached)
";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Show(Vec<FileKind>),
    Dump { kind: Option<FileKind>, path: PathBuf },
    Users,
    Apps,
    Set { name: String, value: String },
    Backup(PathBuf),
    Tags { force: bool },
    Help,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Args {
    pub root: Option<PathBuf>,
    pub user: Option<String>,
    pub strip: bool,
    pub append: bool,
    pub command: Command,
}

impl Args {
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> anyhow::Result<Self> {
        let mut root = None;
        let mut user = None;
        let mut strip = false;
        let mut append = false;
        let mut rest = Vec::new();

        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--root" => root = Some(PathBuf::from(iter.next().context("--root needs a value")?)),
                "--user" => user = Some(iter.next().context("--user needs a value")?),
                "--strip" => strip = true,
                "--append" => append = true,
                "-h" | "--help" => rest.insert(0, "help".to_string()),
                _ => rest.push(arg),
            }
        }

        let command = match rest.first().map(String::as_str) {
            None | Some("help") => Command::Help,
            Some("show") => Command::Show(
                rest[1..]
                    .iter()
                    .map(|k| k.parse::<FileKind>())
                    .collect::<Result<_, _>>()?,
            ),
            Some("dump") => match (rest.get(1), rest.get(2)) {
                (Some(kind), Some(path)) => Command::Dump {
                    kind: Some(kind.parse()?),
                    path: PathBuf::from(path),
                },
                (Some(path), None) => Command::Dump {
                    kind: None,
                    path: PathBuf::from(path),
                },
                _ => bail!("dump needs a file"),
            },
            Some("users") => Command::Users,
            Some("apps") => Command::Apps,
            Some("set") => match (rest.get(1), rest.get(2)) {
                (Some(name), Some(value)) => Command::Set {
                    name: name.clone(),
                    value: value.clone(),
                },
                _ => bail!("set needs a setting name and a value"),
            },
            Some("backup") => Command::Backup(PathBuf::from(rest.get(1).context("backup needs a file")?)),
            Some("tags") => Command::Tags {
                force: rest[1..].iter().any(|a| a == "--force"),
            },
            Some(other) => bail!("unknown command '{other}'\n\n{USAGE}"),
        };

        Ok(Self {
            root,
            user,
            strip,
            append,
            command,
        })
    }
}
